pub mod callback;
pub mod problem;
pub mod simplex;
pub mod solvers;

pub use callback::{ChannelObserver, SimplexEvent, SimplexRecorder};
pub use problem::ExpressionProblem;
pub use simplex::{Element, Simplex};
pub use solvers::{NelderMeadOptimizer, Problem, SimplexObserver, Solver, SolverResult};
