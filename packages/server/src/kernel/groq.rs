// Groq-backed generation adapter

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use groq_client::{ChatRequest, GroqClient, Message, LLAMA_70B};

use crate::domains::articles::error::GenerateError;
use crate::kernel::traits::BaseGenerator;

pub struct GroqGenerator {
    client: GroqClient,
    timeout: Duration,
}

impl GroqGenerator {
    pub fn new(api_key: Option<String>, request_timeout: Duration) -> Self {
        Self {
            client: GroqClient::new(api_key),
            timeout: request_timeout,
        }
    }
}

#[async_trait]
impl BaseGenerator for GroqGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerateError> {
        let request = ChatRequest::new(LLAMA_70B)
            .message(Message::system(system_prompt))
            .message(Message::user(user_prompt))
            .temperature(0.7)
            .top_p(0.9)
            .max_tokens(max_tokens);

        info!(model = LLAMA_70B, max_tokens, "Starting generation request");

        let response = timeout(self.timeout, self.client.chat_completion(request))
            .await
            .map_err(|_| GenerateError::Network {
                detail: format!("generation timed out after {:?}", self.timeout),
            })??;

        info!(chars = response.content.len(), "Generation complete");
        Ok(response.content)
    }

    async fn check_available(&self) -> bool {
        let available = match timeout(self.timeout, self.client.check_available()).await {
            Ok(available) => available,
            Err(_) => {
                warn!("Availability probe timed out");
                false
            }
        };
        info!(available, "Groq availability probe");
        available
    }
}
