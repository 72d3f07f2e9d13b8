// Fallback synthesis when the generation backend is unavailable
//
// Produces a readable article from nothing but the topic feed entry. Rows
// built here carry is_fallback_content = TRUE and remain eligible for one
// rewrite once the backend recovers.

use chrono::{DateTime, Utc};

use crate::domains::articles::models::KeyConcept;

/// A synthesized article body plus its derived metadata.
#[derive(Debug, Clone)]
pub struct FallbackBody {
    pub content: String,
    pub key_insights: Vec<String>,
    pub key_concepts: Vec<KeyConcept>,
    pub daily_practice: Vec<String>,
}

/// Synthesize article content from a topic title and feed description.
pub fn synthesize(
    description: &str,
    published_at: Option<DateTime<Utc>>,
) -> FallbackBody {
    let published_line = published_at
        .map(|d| format!("\n\n*Published: {}*", d.format("%B %-d, %Y")))
        .unwrap_or_default();

    let content = format!(
        "**Recent Research Highlight**\n\n\
         {description}{published_line}\n\n\
         **Understanding the Context**\n\n\
         The human mind remains one of the most fascinating frontiers of scientific exploration. \
         Every day, researchers around the world are uncovering new insights into how our brains \
         work, how our thoughts and emotions are formed, and how we can better understand and \
         support mental health.\n\n\
         This particular research adds another piece to the vast puzzle of psychological science. \
         While each individual study may seem small, together they build a comprehensive picture \
         of human cognition, behavior, and well-being.\n\n\
         **Why This Matters**\n\n\
         Research like this has implications that extend far beyond the laboratory. Understanding \
         the mechanisms of the mind helps us develop better treatments for mental health \
         conditions, design more effective educational approaches, and create environments that \
         support human flourishing.\n\n\
         For individuals, staying informed about psychological research can provide valuable \
         insights for personal growth and well-being. Science-based knowledge empowers us to make \
         better decisions about our mental health and to understand ourselves and others more \
         deeply.\n\n\
         **Practical Implications**\n\n\
         While we wait for research findings to translate into clinical applications, there are \
         always steps we can take to support our psychological well-being:\n\n\
         Stay curious about how your mind works. Practice evidence-based strategies for mental \
         health, such as regular exercise, adequate sleep, and maintaining social connections.\n\n\
         Be open to updating your understanding as new research emerges. Seek professional help \
         when needed; it's a sign of strength, not weakness.\n\n\
         **Looking Forward**\n\n\
         Psychology and neuroscience are rapidly evolving fields. What we understand today may be \
         refined or expanded by tomorrow's discoveries. This is the nature of science, a \
         continuous journey toward better understanding.\n\n\
         We encourage you to explore the original research linked below for the complete \
         findings, methodology, and expert commentary.\n\n\
         ---\n\n\
         *This summary is based on research reported on ScienceDaily. For complete details and \
         sources, see the original article linked below.*"
    );

    let first_sentence = description
        .split('.')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .unwrap_or_else(|| "New psychology research has been published.".to_string());

    FallbackBody {
        content,
        key_insights: vec![
            first_sentence,
            "Understanding brain and behavior research helps us make informed decisions about \
             mental health."
                .to_string(),
            "Scientific discoveries often have practical applications we can use in daily life."
                .to_string(),
            "For complete research details and methodology, see the original source.".to_string(),
        ],
        key_concepts: vec![
            KeyConcept {
                term: "Psychological Research".to_string(),
                detail: "Scientific studies that investigate mental processes, behavior, and \
                         their underlying mechanisms."
                    .to_string(),
            },
            KeyConcept {
                term: "Evidence-Based Practice".to_string(),
                detail: "Approaches and interventions that are supported by scientific research \
                         and data."
                    .to_string(),
            },
            KeyConcept {
                term: "Neuroplasticity".to_string(),
                detail: "The brain's ability to change and adapt throughout life by forming new \
                         neural connections."
                    .to_string(),
            },
        ],
        daily_practice: vec![
            "Take a few minutes to reflect on how today's topic relates to your own experiences."
                .to_string(),
            "Consider one thing you learned that you could share with someone else.".to_string(),
            "Think about whether this knowledge might change any of your daily habits or \
             perspectives."
                .to_string(),
            "Write down one question this article raised for you.".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::articles::generator::normalize_content;
    use chrono::TimeZone;

    #[test]
    fn test_synthesized_content_embeds_description() {
        let body = synthesize("Researchers found sleep consolidates memory. More text.", None);
        assert!(body
            .content
            .contains("Researchers found sleep consolidates memory."));
        assert!(body.content.starts_with("**Recent Research Highlight**"));
    }

    #[test]
    fn test_published_line_present_when_date_known() {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let body = synthesize("Some finding.", Some(at));
        assert!(body.content.contains("*Published: March 10, 2025*"));
    }

    #[test]
    fn test_empty_description_still_yields_an_insight() {
        let body = synthesize("", None);
        assert_eq!(
            body.key_insights[0],
            "New psychology research has been published."
        );
        assert_eq!(body.key_insights.len(), 4);
    }

    #[test]
    fn test_first_insight_is_first_sentence() {
        let body = synthesize("Stress alters attention. It also alters memory.", None);
        assert_eq!(body.key_insights[0], "Stress alters attention.");
    }

    #[test]
    fn test_synthesized_content_is_already_normalized() {
        let body = synthesize("A finding about cognition.", None);
        assert_eq!(normalize_content(&body.content), body.content);
    }
}
