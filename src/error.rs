use crate::expression::ExpressionError;
use thiserror::Error;

/// Errors surfaced to the host by an optimization run.
///
/// Each variant is a distinct condition so a host can, for example, retry with a
/// corrected expression without reloading configuration.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid expression '{expression}': {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: ExpressionError,
    },

    #[error("unsupported output variant '{0}' (expected \"txt\" or \"html\")")]
    UnsupportedOutputVariant(String),

    #[error("dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("the starting point must have at least one coordinate")]
    EmptyPoint,

    #[error("trace output failed: {0}")]
    Trace(#[from] std::io::Error),
}

impl OptimizerError {
    pub(crate) fn invalid_expression(expression: &str, source: ExpressionError) -> Self {
        Self::InvalidExpression {
            expression: expression.to_string(),
            source,
        }
    }
}

pub type Result<T, E = OptimizerError> = std::result::Result<T, E>;
