use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::gateway::{GenerateRequest, GatewayError, GatewayErrorKind, TextGenerator};

/// Generator stand-in that replays a fixed script of responses and records
/// every prompt it was handed, in call order. Used by the integration tests
/// to drive the retry loop deterministically.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<VecDeque<Result<String, GatewayError>>>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_ok(&self, response: impl Into<String>) {
        self.script.lock().await.push_back(Ok(response.into()));
    }

    pub async fn push_err(&self, err: GatewayError) {
        self.script.lock().await.push_back(Err(err));
    }

    /// Every request seen so far, in call order.
    pub async fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        self.requests.lock().await.push(request);
        self.script.lock().await.pop_front().unwrap_or_else(|| {
            Err(GatewayError::new(
                GatewayErrorKind::Internal,
                "scripted generator ran out of responses",
            ))
        })
    }
}
