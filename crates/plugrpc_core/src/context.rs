//! Execution-context trust gate.
//!
//! # Responsibility
//! - Classify the running process side as trusted (server) or untrusted
//!   (client).
//! - Provide the single hard error used for trust-boundary violations.
//!
//! # Invariants
//! - Service population and embedded factory invocation require
//!   `ExecutionContext::Trusted`.
//! - An untrusted context never observes collaborator services.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Process side the composition engine is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    /// Server side; may hold and inject real collaborator services.
    Trusted,
    /// Client side; always sees an empty service set.
    Untrusted,
}

impl ExecutionContext {
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::Trusted)
    }

    /// Stable string id used in configuration and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
            Self::Untrusted => "untrusted",
        }
    }

    /// Fails with [`TrustBoundaryError`] unless running trusted.
    pub fn require_trusted(self, operation: &'static str) -> Result<(), TrustBoundaryError> {
        if self.is_trusted() {
            return Ok(());
        }
        Err(TrustBoundaryError { operation })
    }
}

impl Display for ExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trust-boundary violation: a trusted-only operation ran in an untrusted
/// context. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustBoundaryError {
    pub operation: &'static str,
}

impl Display for TrustBoundaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` may only run in a trusted execution context",
            self.operation
        )
    }
}

impl Error for TrustBoundaryError {}
