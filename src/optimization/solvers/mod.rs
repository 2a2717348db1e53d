mod nelder_mead;
pub mod traits;

pub use nelder_mead::NelderMeadOptimizer;
pub use traits::{Problem, SimplexObserver, Solver, SolverResult};
