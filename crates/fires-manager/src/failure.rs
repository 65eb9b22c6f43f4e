//! Per-fire failure handling.
//!
//! A stage runs an operation over every fire in the collection. What happens
//! when one fire fails depends on the [`FailurePolicy`]: fail fast and
//! surface the error, or set the fire aside and keep going.

use std::backtrace::Backtrace;
use std::error::Error as _;
use std::fmt::Write as _;

use fire_common::{FailureDetail, FireError};

/// What to do when processing a single fire fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the stage on the first failure.
    #[default]
    FailFast,
    /// Remove the failing fire, record it, and continue.
    Skip,
}

impl FailurePolicy {
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip {
            FailurePolicy::Skip
        } else {
            FailurePolicy::FailFast
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, FailurePolicy::Skip)
    }
}

/// Result of processing one fire.
#[derive(Debug)]
pub enum FireOutcome<T> {
    Succeeded { fire_id: String, value: T },
    Failed { fire_id: String, detail: FailureDetail },
}

impl<T> FireOutcome<T> {
    pub fn fire_id(&self) -> &str {
        match self {
            FireOutcome::Succeeded { fire_id, .. } | FireOutcome::Failed { fire_id, .. } => fire_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FireOutcome::Succeeded { .. })
    }
}

/// Outcomes of a whole pass, in collection order.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub outcomes: Vec<FireOutcome<T>>,
}

impl<T> BatchOutcome<T> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Values from successful fires.
    pub fn into_values(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                FireOutcome::Succeeded { value, .. } => Some(value),
                FireOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

/// Capture an error as a message plus a traceback string.
///
/// The traceback lists the error's source chain followed by the stack at
/// the point of capture.
pub fn failure_detail(error: &FireError) -> FailureDetail {
    let mut traceback = format!("{:?}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(traceback, "\nCaused by: {}", cause);
        source = cause.source();
    }
    let _ = write!(traceback, "\n\nStack backtrace:\n{}", Backtrace::force_capture());

    FailureDetail {
        message: error.to_string(),
        traceback,
    }
}
