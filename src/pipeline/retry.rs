use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{Duration, timeout};
use uuid::Uuid;

use crate::{
    config::StageRoutesConfig,
    gateway::{GatewayErrorKind, GenerateRequest, TextGenerator},
    pipeline::{
        error::{PipelineError, generator_failure, retry_exhausted},
        extract::extract_json_object,
        prompts,
        runtime::{PipelineTelemetryEvent, PipelineTelemetryHook, emit_event},
        stage::Stage,
        validate::validate,
    },
};

fn default_max_attempts() -> u32 {
    5
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryLimits {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

/// Drives up to `max_attempts` of compose -> generate -> extract -> validate
/// for one stage, feeding each failure's missing keys back into the next
/// attempt's prompt.
///
/// Attempts are strictly sequential: the corrective clause is derived from
/// the immediately preceding failure, so there is no speculative generation.
/// A per-attempt deadline bounds tail latency; a timed-out attempt — whether
/// the local deadline fired or the backend reported the timeout itself —
/// counts like a parse failure. Any other transport error from the generator
/// aborts the loop immediately and is mapped by the caller (fallback at the
/// ACC stage, fatal at the Thalamus stage).
pub struct RetryOrchestrator {
    generator: Arc<dyn TextGenerator>,
    routes: StageRoutesConfig,
    limits: RetryLimits,
    telemetry_hook: Option<PipelineTelemetryHook>,
}

impl RetryOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        routes: StageRoutesConfig,
        limits: RetryLimits,
    ) -> Self {
        Self {
            generator,
            routes,
            limits,
            telemetry_hook: None,
        }
    }

    pub fn with_telemetry_hook(mut self, telemetry_hook: Option<PipelineTelemetryHook>) -> Self {
        self.telemetry_hook = telemetry_hook;
        self
    }

    pub async fn run(
        &self,
        stage: Stage,
        payload_json: &str,
        request_id: &str,
    ) -> Result<Value, PipelineError> {
        let max_attempts = self.limits.max_attempts.max(1);
        let deadline = Duration::from_millis(self.limits.attempt_timeout_ms.max(1));
        let mut feedback: Option<BTreeSet<String>> = None;
        let mut last_raw = String::new();

        for attempt in 1..=max_attempts {
            emit_event(
                &self.telemetry_hook,
                PipelineTelemetryEvent::StageAttempt {
                    request_id: request_id.to_string(),
                    stage: stage.name(),
                    attempt,
                },
            );

            let prompt = prompts::compose(stage, payload_json, feedback.as_ref());
            let request = GenerateRequest {
                request_id: format!("{}-{}-{}", stage.name(), attempt, Uuid::now_v7()),
                model: stage.resolve_route(&self.routes),
                prompt,
            };
            tracing::debug!(
                target: "pipeline",
                stage = stage.name(),
                attempt = attempt,
                request_id = %request.request_id,
                model = %request.model,
                "attempt_started"
            );

            let raw = match timeout(deadline, self.generator.generate(request)).await {
                Ok(Ok(raw)) => raw,
                // A backend-reported timeout gets the same treatment as the
                // local deadline: the attempt is spent, the loop goes on.
                Ok(Err(err)) if err.kind == GatewayErrorKind::Timeout => {
                    tracing::warn!(
                        target: "pipeline",
                        stage = stage.name(),
                        attempt = attempt,
                        error = %err,
                        "generator_reported_timeout"
                    );
                    last_raw.clear();
                    feedback = Some(full_required_set(stage));
                    continue;
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        target: "pipeline",
                        stage = stage.name(),
                        attempt = attempt,
                        error = %err,
                        error_kind = ?err.kind,
                        "generator_transport_failed"
                    );
                    return Err(generator_failure(format!(
                        "{} stage generator call failed: {}",
                        stage.name(),
                        err
                    )));
                }
                Err(_) => {
                    tracing::warn!(
                        target: "pipeline",
                        stage = stage.name(),
                        attempt = attempt,
                        deadline_ms = deadline.as_millis() as u64,
                        "attempt_timed_out"
                    );
                    last_raw.clear();
                    feedback = Some(full_required_set(stage));
                    continue;
                }
            };

            last_raw = raw.clone();
            let Some(parsed) = extract_json_object(&raw) else {
                tracing::warn!(
                    target: "pipeline",
                    stage = stage.name(),
                    attempt = attempt,
                    output_chars = raw.len(),
                    "attempt_unparseable"
                );
                feedback = Some(full_required_set(stage));
                continue;
            };

            let report = validate(stage, &parsed);
            if report.ok {
                tracing::debug!(
                    target: "pipeline",
                    stage = stage.name(),
                    attempt = attempt,
                    "attempt_succeeded"
                );
                return Ok(parsed);
            }

            tracing::warn!(
                target: "pipeline",
                stage = stage.name(),
                attempt = attempt,
                missing_keys = %join_keys(&report.missing_keys),
                "attempt_schema_violation"
            );
            feedback = Some(report.missing_keys);
        }

        Err(retry_exhausted(
            stage,
            max_attempts,
            last_raw,
            feedback.unwrap_or_else(|| full_required_set(stage)),
        ))
    }
}

/// Feedback for attempts that produced nothing parseable: ask for the whole
/// contract again.
fn full_required_set(stage: Stage) -> BTreeSet<String> {
    stage
        .required_keys()
        .iter()
        .map(|key| key.to_string())
        .collect()
}

fn join_keys(keys: &BTreeSet<String>) -> String {
    keys.iter().cloned().collect::<Vec<_>>().join(",")
}
