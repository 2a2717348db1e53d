use crate::config::{AlgorithmConfig, DEFAULT_CONFIG_PATH};
use crate::error::OptimizerError;
use crate::optimization::{
    ExpressionProblem, NelderMeadOptimizer, SimplexObserver, Solver, SolverResult,
};
use crate::trace::{DEFAULT_LOG_BASE, OutputVariant};
use std::path::{Path, PathBuf};

/// Host-facing entry point for one or more independent optimization runs.
///
/// Every call to [`Optimizer::optimize`] loads its own configuration, opens its
/// own trace file and builds its own simplex, so runs never share state.
#[derive(Clone, Debug)]
pub struct Optimizer {
    config_path: PathBuf,
    config: Option<AlgorithmConfig>,
    log_base: PathBuf,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            config: None,
            log_base: PathBuf::from(DEFAULT_LOG_BASE),
        }
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read coefficients from `path` (load-or-create-default) on every run
    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = path.as_ref().to_path_buf();
        self
    }

    /// Use `config` as-is and skip the configuration store entirely
    pub fn with_config(mut self, config: AlgorithmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Base path of the trace artifact; the variant's extension is appended
    pub fn with_log_base(mut self, base: impl AsRef<Path>) -> Self {
        self.log_base = base.as_ref().to_path_buf();
        self
    }

    fn load_config(&self) -> AlgorithmConfig {
        match &self.config {
            Some(config) => config.clone(),
            None => AlgorithmConfig::load_or_default(&self.config_path),
        }
    }

    /// Minimize `expression` over `x1..x{dimension}` starting at `start_point`.
    pub fn optimize(
        &self,
        dimension: usize,
        start_point: &[f64],
        expression: &str,
        observer: Option<&mut dyn SimplexObserver>,
    ) -> Result<Vec<f64>, OptimizerError> {
        self.optimize_with_result(dimension, start_point, expression, observer)
            .map(|result| result.params)
    }

    /// Like [`Optimizer::optimize`], returning the full solver report.
    ///
    /// Configuration, output variant and expression syntax are all validated
    /// before the trace file is created or the objective is evaluated.
    pub fn optimize_with_result(
        &self,
        dimension: usize,
        start_point: &[f64],
        expression: &str,
        observer: Option<&mut dyn SimplexObserver>,
    ) -> Result<SolverResult, OptimizerError> {
        if dimension == 0 {
            return Err(OptimizerError::EmptyPoint);
        }
        if start_point.len() != dimension {
            return Err(OptimizerError::DimensionMismatch {
                expected: dimension,
                actual: start_point.len(),
            });
        }

        let config = self.load_config();
        let variant: OutputVariant = config.output_variant.parse()?;
        let problem = ExpressionProblem::new(expression, start_point.to_vec())?;
        let output = variant.open(&self.log_base)?;

        log::debug!(
            "Minimizing '{}' in {} dimensions from {:?}",
            expression,
            dimension,
            start_point
        );

        let mut solver = NelderMeadOptimizer::new(config, output);
        solver.solve(&problem, observer)
    }
}
