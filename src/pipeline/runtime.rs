use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::StageRoutesConfig,
    gateway::TextGenerator,
    pipeline::{
        error::{PipelineError, PipelineErrorKind, internal_error},
        fallback::fallback_verdict,
        retry::{RetryLimits, RetryOrchestrator},
        stage::Stage,
    },
    types::{PerceptionRecord, SensorEvent, Verdict},
};

#[derive(Debug, Clone)]
pub enum PipelineTelemetryEvent {
    RouteStarted {
        request_id: String,
    },
    StageAttempt {
        request_id: String,
        stage: &'static str,
        attempt: u32,
    },
    StageFailed {
        request_id: String,
        stage: &'static str,
        reason: &'static str,
    },
    FallbackUsed {
        request_id: String,
        reason: &'static str,
    },
    RouteCompleted {
        request_id: String,
        fallback_used: bool,
    },
}

pub type PipelineTelemetryHook = Arc<dyn Fn(PipelineTelemetryEvent) + Send + Sync>;

/// Top-level coordinator: SensorEvent -> Thalamus stage -> PerceptionRecord
/// -> ACC stage -> Verdict.
///
/// The stages run strictly in sequence; the ACC prompt is built from the
/// Thalamus output. Each `route` call is an independent pipeline instance
/// with no shared mutable state, so requests run concurrently without locks.
/// A Thalamus failure is fatal (a perception with no region is meaningless
/// downstream); an ACC failure of any kind degrades silently to the
/// deterministic fallback verdict, observable only through telemetry.
#[derive(Clone)]
pub struct RoutingPipeline {
    orchestrator: Arc<RetryOrchestrator>,
    telemetry_hook: Option<PipelineTelemetryHook>,
}

impl RoutingPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        routes: StageRoutesConfig,
        limits: RetryLimits,
        telemetry_hook: Option<PipelineTelemetryHook>,
    ) -> Self {
        let orchestrator = RetryOrchestrator::new(generator, routes, limits)
            .with_telemetry_hook(telemetry_hook.clone());
        Self {
            orchestrator: Arc::new(orchestrator),
            telemetry_hook,
        }
    }

    pub async fn route(&self, event: &SensorEvent) -> Result<Verdict, PipelineError> {
        let request_id = Uuid::now_v7().to_string();
        self.emit(PipelineTelemetryEvent::RouteStarted {
            request_id: request_id.clone(),
        });

        let event_json = serde_json::to_string(event)
            .map_err(|err| internal_error(format!("failed to serialize sensor event: {}", err)))?;

        let thalamus_output = match self
            .orchestrator
            .run(Stage::Thalamus, &event_json, &request_id)
            .await
        {
            Ok(parsed) => parsed,
            Err(err) => {
                // No safe fallback exists for the routing stage: nothing can
                // fabricate a perception. Surface the failure.
                self.emit(PipelineTelemetryEvent::StageFailed {
                    request_id: request_id.clone(),
                    stage: Stage::Thalamus.name(),
                    reason: failure_reason(&err),
                });
                tracing::warn!(
                    target: "pipeline",
                    request_id = %request_id,
                    error = %err,
                    "thalamus_stage_fatal"
                );
                return Err(err);
            }
        };

        let record = build_perception_record(&thalamus_output, event_json);
        let record_json = serde_json::to_string(&record)
            .map_err(|err| internal_error(format!("failed to serialize perception: {}", err)))?;

        let (verdict, fallback_used) = match self
            .orchestrator
            .run(Stage::Acc, &record_json, &request_id)
            .await
        {
            Ok(parsed) => match decode_verdict(&parsed) {
                Some(verdict) => (verdict.clamped(), false),
                None => {
                    self.emit(PipelineTelemetryEvent::StageFailed {
                        request_id: request_id.clone(),
                        stage: Stage::Acc.name(),
                        reason: "verdict_decode_failed",
                    });
                    (self.degrade(&request_id, "verdict_decode_failed", &record), true)
                }
            },
            Err(err) => {
                let reason = failure_reason(&err);
                self.emit(PipelineTelemetryEvent::StageFailed {
                    request_id: request_id.clone(),
                    stage: Stage::Acc.name(),
                    reason,
                });
                (self.degrade(&request_id, reason, &record), true)
            }
        };

        self.emit(PipelineTelemetryEvent::RouteCompleted {
            request_id,
            fallback_used,
        });
        Ok(verdict)
    }

    fn degrade(&self, request_id: &str, reason: &'static str, record: &PerceptionRecord) -> Verdict {
        self.emit(PipelineTelemetryEvent::FallbackUsed {
            request_id: request_id.to_string(),
            reason,
        });
        fallback_verdict(record)
    }

    fn emit(&self, event: PipelineTelemetryEvent) {
        emit_event(&self.telemetry_hook, event);
    }
}

/// Single emission path for pipeline telemetry: every event is logged via
/// `tracing` and then handed to the hook, whichever component produced it.
pub(crate) fn emit_event(hook: &Option<PipelineTelemetryHook>, event: PipelineTelemetryEvent) {
    match &event {
        PipelineTelemetryEvent::RouteStarted { request_id } => {
            tracing::debug!(target: "pipeline", request_id = %request_id, "route_started");
        }
        PipelineTelemetryEvent::StageAttempt {
            request_id,
            stage,
            attempt,
        } => {
            tracing::debug!(
                target: "pipeline",
                request_id = %request_id,
                stage = *stage,
                attempt = *attempt,
                "stage_attempt"
            );
        }
        PipelineTelemetryEvent::StageFailed {
            request_id,
            stage,
            reason,
        } => {
            tracing::warn!(
                target: "pipeline",
                request_id = %request_id,
                stage = *stage,
                reason = *reason,
                "stage_failed"
            );
        }
        PipelineTelemetryEvent::FallbackUsed { request_id, reason } => {
            tracing::warn!(
                target: "pipeline",
                request_id = %request_id,
                reason = *reason,
                "fallback_used"
            );
        }
        PipelineTelemetryEvent::RouteCompleted {
            request_id,
            fallback_used,
        } => {
            tracing::debug!(
                target: "pipeline",
                request_id = %request_id,
                fallback_used = *fallback_used,
                "route_completed"
            );
        }
    }

    if let Some(hook) = hook {
        hook(event);
    }
}

fn failure_reason(err: &PipelineError) -> &'static str {
    match err.kind {
        PipelineErrorKind::RetryExhausted => "retry_exhausted",
        PipelineErrorKind::GeneratorFailure => "generator_failed",
        PipelineErrorKind::InvalidInput => "invalid_input",
        PipelineErrorKind::Internal => "internal",
    }
}

/// Validation guarantees key presence, not value types; non-string values
/// are carried as their JSON text rather than rejected.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn build_perception_record(thalamus_output: &Value, message: String) -> PerceptionRecord {
    PerceptionRecord {
        region: value_to_text(&thalamus_output["region"]),
        schema: value_to_text(&thalamus_output["schema"]),
        perception: value_to_text(&thalamus_output["perception"]),
        message,
    }
}

fn decode_verdict(parsed: &Value) -> Option<Verdict> {
    serde_json::from_value::<Verdict>(parsed.clone()).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{build_perception_record, decode_verdict};

    #[test]
    fn perception_record_coerces_non_string_values() {
        let output = json!({"region": "amygdala", "schema": 7, "perception": true});
        let record = build_perception_record(&output, "{}".to_string());
        assert_eq!(record.region, "amygdala");
        assert_eq!(record.schema, "7");
        assert_eq!(record.perception, "true");
        assert_eq!(record.message, "{}");
    }

    #[test]
    fn verdict_decode_rejects_mistyped_values() {
        let parsed = json!({
            "pass_doubt": "yes",
            "threshold_score": 0.9,
            "feelings": "fine",
            "significance": 0.5
        });
        assert!(decode_verdict(&parsed).is_none());
    }

    #[test]
    fn verdict_decode_accepts_well_typed_objects() {
        let parsed = json!({
            "pass_doubt": true,
            "threshold_score": 0.9,
            "feelings": "fine",
            "significance": 0.5
        });
        let verdict = decode_verdict(&parsed).expect("well-typed verdict decodes");
        assert!(verdict.pass_doubt);
    }
}
