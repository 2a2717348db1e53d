use crate::error::OptimizerError;

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub converged: bool,
    /// Function value at `params`
    pub value: f64,
    pub iterations: u32,
    pub message: String,
    pub params: Vec<f64>,
    pub cost_evals: usize,
}

/// Synchronous observer of the simplex.
///
/// Each iteration the solver calls `on_iteration` once and then `on_vertex` for
/// every vertex in ascending order of function value. The point is only borrowed
/// for the duration of the call; copy it to keep it.
pub trait SimplexObserver {
    fn on_iteration(&mut self, _iteration: u32) {}

    fn on_vertex(&mut self, point: &[f64]);
}

impl<F> SimplexObserver for F
where
    F: FnMut(&[f64]),
{
    fn on_vertex(&mut self, point: &[f64]) {
        self(point)
    }
}

/// Core problem definition - just the essentials
pub trait Problem {
    /// Evaluate the objective at `params`
    fn cost(&self, params: &[f64]) -> Result<f64, OptimizerError>;

    /// Number of parameters
    fn num_params(&self) -> usize;

    /// Initial parameter values
    fn initial_params(&self) -> &[f64];
}

/// Solver interface - takes problem and an optional observer
pub trait Solver {
    fn name(&self) -> &str;

    fn solve(
        &mut self,
        problem: &dyn Problem,
        observer: Option<&mut dyn SimplexObserver>,
    ) -> Result<SolverResult, OptimizerError>;
}
