// Article generation: prompts, output normalization, derived metadata
//
// The generation backend returns free-form markdown-ish text. Everything
// here is pure: the adapter call itself lives behind BaseGenerator in the
// kernel, and the service composes the two.

use crate::domains::articles::error::GenerateError;
use crate::domains::articles::models::KeyConcept;
use crate::kernel::traits::{BaseGenerator, TopicCandidate};

pub const ARTICLE_MAX_TOKENS: u32 = 5000;
pub const REWRITE_MAX_TOKENS: u32 = 5000;

const SYSTEM_PROMPT: &str = "\
You are an expert psychology and neuroscience educator who writes engaging, comprehensive educational articles.

Your writing style:
- Clear and accessible to general audiences
- Scientifically accurate but not overly technical
- Engaging with real-world examples, analogies, and stories
- Well-structured with clear sections
- IMPORTANT: Write 1000-1600 words (5-8 minute read)

FORMATTING RULES (CRITICAL):
- Start each new paragraph on a new line
- Leave a blank line between paragraphs
- Use **Section Title** for headers (with blank lines before and after)
- Write in flowing paragraphs, not bullet points
- Each paragraph should be 3-5 sentences
- Never write wall-of-text - always use paragraph breaks";

/// Structural classification of one normalized paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paragraph<'a> {
    /// A whole paragraph wrapped in `**...**`.
    Header(&'a str),
    /// A lone `---` paragraph.
    Divider,
    /// Regular prose (may carry `*italic*` and inline `**bold**` spans).
    Text(&'a str),
}

/// Everything a successful generation produces, before persistence.
#[derive(Debug, Clone)]
pub struct GeneratedBody {
    pub content: String,
    pub key_insights: Vec<String>,
    pub key_concepts: Vec<KeyConcept>,
    pub daily_practice: Vec<String>,
}

fn is_header_line(line: &str) -> bool {
    line.len() > 4
        && line.starts_with("**")
        && line.ends_with("**")
        // no interior bold terminator, so "**a** and **b**" stays prose
        && !line[2..line.len() - 2].contains("**")
}

fn is_divider_line(line: &str) -> bool {
    line == "---"
}

/// Classify an already-normalized paragraph.
pub fn classify_paragraph(paragraph: &str) -> Paragraph<'_> {
    if is_divider_line(paragraph) {
        Paragraph::Divider
    } else if is_header_line(paragraph) {
        Paragraph::Header(&paragraph[2..paragraph.len() - 2])
    } else {
        Paragraph::Text(paragraph)
    }
}

/// Normalize raw generated text into blank-line-delimited paragraphs.
///
/// Section headers (`**Title**` alone on a line) and dividers (`---`) are
/// pulled out into their own paragraphs; everything else keeps its lines
/// joined as prose. Idempotent: a second pass finds every header and
/// divider already isolated and every paragraph already trimmed.
pub fn normalize_content(raw: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |current: &mut Vec<&str>, paragraphs: &mut Vec<String>| {
        if !current.is_empty() {
            paragraphs.push(current.join(" "));
            current.clear();
        }
    };

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut current, &mut paragraphs);
        } else if is_header_line(line) || is_divider_line(line) {
            flush(&mut current, &mut paragraphs);
            paragraphs.push(line.to_string());
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut paragraphs);

    paragraphs.join("\n\n")
}

fn build_article_prompt(topic: &TopicCandidate) -> String {
    format!(
        "Write a comprehensive educational article about this psychology research.\n\n\
         TITLE: {}\n\n\
         RESEARCH SUMMARY: {}\n\n\
         SOURCE: {}\n\n\
         Write the article with these sections. IMPORTANT: Put a blank line between every paragraph!\n\n\
         **The Discovery**\n\n\
         Write 2-3 paragraphs introducing the key finding. Make it engaging and set the scene.\n\n\
         **Understanding the Science**\n\n\
         Write 3-4 paragraphs explaining the psychology/neuroscience concepts. Use analogies and everyday examples.\n\n\
         **The Research in Detail**\n\n\
         Write 2-3 paragraphs about how scientists study this and what they found.\n\n\
         **Why This Matters**\n\n\
         Write 2-3 paragraphs on broader implications for mental health and daily life.\n\n\
         **The Bigger Picture**\n\n\
         Write 2 paragraphs placing this in context. What questions remain?\n\n\
         **Practical Applications**\n\n\
         Write 2-3 paragraphs with concrete takeaways readers can apply.\n\n\
         **Final Thoughts**\n\n\
         Write 1-2 concluding paragraphs.\n\n\
         End with:\n\n\
         ---\n\n\
         *This article was inspired by research reported on ScienceDaily. For the original research summary and sources, see the link below.*\n\n\
         REMEMBER:\n\
         - 1000-1600 words total (5-8 minute read)\n\
         - Blank line between EVERY paragraph\n\
         - NO walls of text\n\
         - Flowing, readable paragraphs",
        topic.title,
        topic.description,
        topic.link,
    )
}

/// Generate and normalize a full article for a topic.
pub async fn generate_article(
    generator: &dyn BaseGenerator,
    topic: &TopicCandidate,
) -> Result<GeneratedBody, GenerateError> {
    let raw = generator
        .generate(SYSTEM_PROMPT, &build_article_prompt(topic), ARTICLE_MAX_TOKENS)
        .await?;

    Ok(GeneratedBody {
        content: normalize_content(&raw),
        key_insights: default_insights(&topic.title),
        key_concepts: default_concepts(),
        daily_practice: default_practice(&topic.title),
    })
}

/// Regenerate an article body from an existing (fallback) article. The
/// previous content stands in for the research summary so the rewrite stays
/// on topic.
pub async fn rewrite_article(
    generator: &dyn BaseGenerator,
    title: &str,
    previous_content: &str,
    source_url: &str,
) -> Result<GeneratedBody, GenerateError> {
    let topic = TopicCandidate {
        title: title.to_string(),
        description: summarize_for_prompt(previous_content),
        link: source_url.to_string(),
        published_at: None,
    };
    let raw = generator
        .generate(SYSTEM_PROMPT, &build_article_prompt(&topic), REWRITE_MAX_TOKENS)
        .await?;

    Ok(GeneratedBody {
        content: normalize_content(&raw),
        key_insights: default_insights(title),
        key_concepts: default_concepts(),
        daily_practice: default_practice(title),
    })
}

/// First ~500 characters of prose, cut at a paragraph boundary.
fn summarize_for_prompt(content: &str) -> String {
    let mut out = String::new();
    for paragraph in content.split("\n\n") {
        if let Paragraph::Text(text) = classify_paragraph(paragraph) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
            if out.len() >= 500 {
                break;
            }
        }
    }
    out
}

fn default_insights(title: &str) -> Vec<String> {
    vec![
        format!("This research on \"{title}\" reveals new insights about how our minds work."),
        "Scientific discoveries in psychology often have practical applications for daily life."
            .to_string(),
        "Understanding the brain helps us make better decisions about our mental well-being."
            .to_string(),
        "For complete research details and methodology, see the original source below.".to_string(),
    ]
}

fn default_concepts() -> Vec<KeyConcept> {
    vec![
        KeyConcept {
            term: "Neuroscience".to_string(),
            detail: "The scientific study of the nervous system and brain, exploring how neural \
                     activity creates thoughts, emotions, and behaviors."
                .to_string(),
        },
        KeyConcept {
            term: "Psychology".to_string(),
            detail: "The scientific study of mind and behavior, examining how we think, feel, \
                     and act in various situations."
                .to_string(),
        },
        KeyConcept {
            term: "Cognition".to_string(),
            detail: "The mental processes involved in gaining knowledge and understanding, \
                     including thinking, remembering, and problem-solving."
                .to_string(),
        },
        KeyConcept {
            term: "Neuroplasticity".to_string(),
            detail: "The brain's ability to reorganize itself by forming new neural connections \
                     throughout life, allowing adaptation and learning."
                .to_string(),
        },
    ]
}

fn default_practice(title: &str) -> Vec<String> {
    vec![
        format!(
            "Take 5 minutes to reflect on how \"{title}\" relates to your own experiences or \
             observations."
        ),
        "Share one insight from this article with a friend or family member today.".to_string(),
        "Write down one thing you learned that surprised you or changed your perspective."
            .to_string(),
        "Consider one small change you could make in your daily life based on this knowledge."
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_isolates_headers_and_dividers() {
        let raw = "intro line one\nintro line two\n**The Discovery**\nbody text here\n---\n*closing note*";
        let normalized = normalize_content(raw);
        assert_eq!(
            normalized,
            "intro line one intro line two\n\n**The Discovery**\n\nbody text here\n\n---\n\n*closing note*"
        );
    }

    #[test]
    fn test_normalize_collapses_extra_blank_lines() {
        let raw = "first paragraph\n\n\n\n\nsecond paragraph\n\n";
        assert_eq!(normalize_content(raw), "first paragraph\n\nsecond paragraph");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        let raw = "   padded line   \n\n  another  ";
        assert_eq!(normalize_content(raw), "padded line\n\nanother");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "intro\n**Header**\nbody\n---\n*italic close*",
            "a\n\n\nb\nc\n**H1**\n**H2**\nd",
            "",
            "just prose with **bold** inline and *italic* spans",
            "**only a header**",
            "---",
        ];
        for raw in inputs {
            let once = normalize_content(raw);
            assert_eq!(normalize_content(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn test_classify_header() {
        assert_eq!(
            classify_paragraph("**Understanding the Science**"),
            Paragraph::Header("Understanding the Science")
        );
    }

    #[test]
    fn test_classify_divider() {
        assert_eq!(classify_paragraph("---"), Paragraph::Divider);
    }

    #[test]
    fn test_inline_bold_is_not_a_header() {
        let p = "**stress** and **sleep** interact";
        assert_eq!(classify_paragraph(p), Paragraph::Text(p));
    }

    #[test]
    fn test_empty_bold_markers_are_prose() {
        assert_eq!(classify_paragraph("****"), Paragraph::Text("****"));
    }

    #[test]
    fn test_summarize_skips_headers() {
        let content = "**Intro**\n\nfirst prose paragraph\n\n---\n\nsecond prose paragraph";
        assert_eq!(
            summarize_for_prompt(content),
            "first prose paragraph second prose paragraph"
        );
    }

    #[test]
    fn test_default_metadata_mentions_topic() {
        let insights = default_insights("Sleep and Memory");
        assert!(insights[0].contains("Sleep and Memory"));
        assert_eq!(default_concepts().len(), 4);
        assert_eq!(default_practice("Sleep and Memory").len(), 4);
    }
}
