use std::{collections::BTreeSet, fmt};

use crate::pipeline::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    GeneratorFailure,
    RetryExhausted,
    Internal,
}

/// Terminal state of an exhausted retry loop: what the generator last said
/// and which contract keys it still owed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustionReport {
    pub stage: Stage,
    pub attempts: u32,
    pub last_raw_response: String,
    pub last_missing_keys: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub kind: PipelineErrorKind,
    pub message: String,
    pub exhaustion: Option<ExhaustionReport>,
}

impl PipelineError {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exhaustion: None,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PipelineError {}

pub fn invalid_input(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::InvalidInput, message)
}

pub fn generator_failure(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::GeneratorFailure, message)
}

pub fn internal_error(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::Internal, message)
}

pub fn retry_exhausted(
    stage: Stage,
    attempts: u32,
    last_raw_response: String,
    last_missing_keys: BTreeSet<String>,
) -> PipelineError {
    let mut err = PipelineError::new(
        PipelineErrorKind::RetryExhausted,
        format!(
            "{} stage produced no valid object within {} attempts",
            stage.name(),
            attempts
        ),
    );
    err.exhaustion = Some(ExhaustionReport {
        stage,
        attempts,
        last_raw_response,
        last_missing_keys,
    });
    err
}
