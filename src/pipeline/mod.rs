pub mod error;
pub mod extract;
pub mod fallback;
pub mod prompts;
pub mod retry;
pub mod runtime;
pub mod stage;
pub mod testing;
pub mod validate;

pub use error::{ExhaustionReport, PipelineError, PipelineErrorKind};
pub use extract::extract_json_object;
pub use fallback::fallback_verdict;
pub use retry::{RetryLimits, RetryOrchestrator};
pub use runtime::{PipelineTelemetryEvent, PipelineTelemetryHook, RoutingPipeline};
pub use stage::Stage;
pub use validate::{ValidationReport, validate};
