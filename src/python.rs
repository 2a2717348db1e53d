use crate::config::{AlgorithmConfig, DEFAULT_CONFIG_PATH};
use crate::error::OptimizerError;
use crate::optimization::SimplexObserver;
use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;
use std::path::PathBuf;

create_exception!(simplexoptimizer, InvalidExpressionError, PyException);
create_exception!(simplexoptimizer, UnsupportedOutputVariantError, PyException);
create_exception!(simplexoptimizer, OptimizationError, PyException);

fn to_py_err(err: OptimizerError) -> PyErr {
    match err {
        OptimizerError::InvalidExpression { .. } => InvalidExpressionError::new_err(err.to_string()),
        OptimizerError::UnsupportedOutputVariant(_) => {
            UnsupportedOutputVariantError::new_err(err.to_string())
        }
        _ => OptimizationError::new_err(err.to_string()),
    }
}

/// Forwards every vertex to a Python callable as a list of floats.
///
/// The solver cannot be interrupted from an observer, so the first Python
/// exception is kept and raised once the run returns.
struct PyObserver<'py> {
    callback: Bound<'py, PyAny>,
    error: Option<PyErr>,
}

impl SimplexObserver for PyObserver<'_> {
    fn on_vertex(&mut self, point: &[f64]) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.callback.call1((point.to_vec(),)) {
            self.error = Some(e);
        }
    }
}

#[pyfunction]
fn evaluate(point: Vec<f64>, expression: &str) -> PyResult<f64> {
    crate::evaluate(&point, expression).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(signature = (dimension, start_point, expression, observer=None))]
fn find_minimum(
    dimension: usize,
    start_point: Vec<f64>,
    expression: &str,
    observer: Option<Bound<'_, PyAny>>,
) -> PyResult<Vec<f64>> {
    let mut observer = observer.map(|callback| PyObserver {
        callback,
        error: None,
    });

    let result = crate::find_minimum(
        dimension,
        &start_point,
        expression,
        observer.as_mut().map(|o| o as &mut dyn SimplexObserver),
    );

    if let Some(err) = observer.and_then(|o| o.error) {
        return Err(err);
    }
    result.map_err(to_py_err)
}

/// Load (or create) the configuration file and return it as JSON text
#[pyfunction]
#[pyo3(signature = (path=None))]
fn load_config(path: Option<PathBuf>) -> PyResult<String> {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AlgorithmConfig::load_or_default(&path);
    serde_json::to_string(&config).map_err(|e| OptimizationError::new_err(e.to_string()))
}

pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(find_minimum, m)?)?;
    m.add_function(wrap_pyfunction!(load_config, m)?)?;

    let py = m.py();
    m.add("InvalidExpressionError", py.get_type_bound::<InvalidExpressionError>())?;
    m.add(
        "UnsupportedOutputVariantError",
        py.get_type_bound::<UnsupportedOutputVariantError>(),
    )?;
    m.add("OptimizationError", py.get_type_bound::<OptimizationError>())?;
    Ok(())
}
