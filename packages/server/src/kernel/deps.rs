// Dependency container wiring infrastructure to the domain

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::domains::articles::gate::{GenerationGate, ResetBoundary};
use crate::kernel::groq::GroqGenerator;
use crate::kernel::topic_feed::ScienceDailyFeed;
use crate::kernel::traits::{BaseGenerator, BaseTopicSource};

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub generator: Arc<dyn BaseGenerator>,
    pub topics: Arc<dyn BaseTopicSource>,
    pub gate: Arc<GenerationGate>,
}

impl ServerDeps {
    pub fn new(config: &Config, db_pool: PgPool) -> Self {
        let boundary = ResetBoundary::new(config.reset_hour, config.reset_minute);
        Self {
            db_pool,
            generator: Arc::new(GroqGenerator::new(
                config.groq_api_key.clone(),
                config.generation_timeout,
            )),
            topics: Arc::new(ScienceDailyFeed::new(config.psychology_rss_url.clone())),
            gate: Arc::new(GenerationGate::new(
                boundary,
                config.min_generation_interval,
            )),
        }
    }
}
