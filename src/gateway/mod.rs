pub mod chat_completions;
pub mod error;

use async_trait::async_trait;

pub use chat_completions::ChatCompletionsClient;
pub use error::{GatewayError, GatewayErrorKind};

/// One prompt sent to a text-generation backend.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub request_id: String,
    pub model: String,
    pub prompt: String,
}

/// Port to the black-box text generator: prompt in, completion out.
///
/// Implementations are non-deterministic and may take arbitrarily long;
/// callers own any deadline. The returned string is raw model output and
/// carries no structural guarantees.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError>;
}
