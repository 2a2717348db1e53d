#[cfg(feature = "python")]
use pyo3::prelude::*;

mod config;
mod error;
mod expression;
mod optimization;
mod optimizer;
#[cfg(feature = "python")]
mod python;
mod trace;
mod vector;

pub use config::{AlgorithmConfig, ConfigError, DEFAULT_CONFIG_PATH};
pub use error::{OptimizerError, Result};
pub use expression::{CompiledExpression, ExpressionError, Function, evaluate, variable_names};
pub use optimization::*;
pub use optimizer::Optimizer;
pub use trace::{
    DEFAULT_LOG_BASE, MarkupSink, OutputVariant, PlainTextSink, TraceSink, open_trace_sink,
    trace_path,
};
pub use vector::{Point, add, divide, mass_center, scale, subtract};

/// Minimize `expression` over `x1..x{dimension}` from `start_point`.
///
/// Coefficients come from `config.json` in the working directory (created with
/// defaults when missing) and the trace goes to `log.txt` or `log.html` next to it.
pub fn find_minimum(
    dimension: usize,
    start_point: &[f64],
    expression: &str,
    observer: Option<&mut dyn SimplexObserver>,
) -> Result<Vec<f64>> {
    Optimizer::new().optimize(dimension, start_point, expression, observer)
}

#[cfg(feature = "python")]
#[pymodule]
fn simplexoptimizer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
