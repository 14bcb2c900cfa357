#![forbid(unsafe_code)]

//! Submission capabilities and pipeline types.
//!
//! Every form submits through one asynchronous capability selected by its
//! descriptor — a mail-client hand-off, a simulated network call, or an
//! injected handler. The special cases the capability replaces (dispatch by
//! form name) do not exist here.

use std::fmt;
use std::rc::Rc;

use rand::Rng;
use rand::rngs::StdRng;

use crate::validate::FormData;

/// Label shown on the submit control while a submission is in flight.
pub const SENDING_LABEL: &str = "Sending...";

/// Restore label when the control had no text captured.
pub const FALLBACK_SUBMIT_LABEL: &str = "Submit";

/// How long the `form-success` / `form-error` feedback class stays on.
pub const FEEDBACK_CLASS_MS: u64 = 3000;

/// Debounce window for real-time input validation.
pub const INPUT_DEBOUNCE_MS: u64 = 500;

pub const GENERIC_SUCCESS_MESSAGE: &str = "Form submitted successfully!";
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";
pub const MAIL_HANDOFF_MESSAGE: &str =
    "Your email client should open. If not, please email me directly.";

/// Per-form pipeline state. `Submitting` doubles as the in-flight guard:
/// re-entrant submits while in this state are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Validating,
    Submitting,
}

/// Outcome contract of every submission capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub success: bool,
    pub message: String,
}

impl SubmitResult {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Outcome model for simulated submissions.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Succeed with probability `success_rate`, reporting the matching
    /// message.
    Flaky {
        success_rate: f64,
        success: String,
        failure: String,
    },
    /// Always succeed with `message`.
    Always { message: String },
}

/// Injected submission function: returns the result or an error string,
/// which the pipeline treats as an unexpected failure.
pub type SubmitHandler = Rc<dyn Fn(&FormData) -> Result<SubmitResult, String>>;

/// How a form submits once validation passes.
#[derive(Clone)]
pub enum Submission {
    /// Build a `mailto:` URI from the validated values and hand it to the
    /// configured launcher. Success is unconditional.
    MailClient { recipient: String },
    /// Resolve `outcome` after `delay_ms` of virtual time.
    Simulated { delay_ms: u64, outcome: Outcome },
    /// Call `handler` after `delay_ms` of virtual time.
    Custom { delay_ms: u64, handler: SubmitHandler },
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MailClient { recipient } => f
                .debug_struct("MailClient")
                .field("recipient", recipient)
                .finish(),
            Self::Simulated { delay_ms, outcome } => f
                .debug_struct("Simulated")
                .field("delay_ms", delay_ms)
                .field("outcome", outcome)
                .finish(),
            Self::Custom { delay_ms, .. } => f
                .debug_struct("Custom")
                .field("delay_ms", delay_ms)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolve a simulated outcome.
pub(crate) fn resolve_outcome(outcome: &Outcome, rng: &mut StdRng) -> SubmitResult {
    match outcome {
        Outcome::Always { message } => SubmitResult::success(message.clone()),
        Outcome::Flaky {
            success_rate,
            success,
            failure,
        } => {
            if rng.random_bool(success_rate.clamp(0.0, 1.0)) {
                SubmitResult::success(success.clone())
            } else {
                SubmitResult::failure(failure.clone())
            }
        }
    }
}
