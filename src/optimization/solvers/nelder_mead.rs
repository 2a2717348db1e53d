use super::traits::{Problem, SimplexObserver, Solver, SolverResult};
use crate::config::AlgorithmConfig;
use crate::error::OptimizerError;
use crate::optimization::simplex::{Element, Simplex};
use crate::trace::TraceSink;
use crate::vector::{add, scale, subtract};

/// How the worst vertex was replaced in one iteration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transformation {
    Reflection,
    Expansion,
    Contraction,
    Shrink,
}

/// Nelder-Mead simplex minimizer.
///
/// Owns the run's coefficients and trace output. The sink is closed when
/// [`Solver::solve`] returns, whether the run converged, ran out of steps, or
/// failed to evaluate the objective.
pub struct NelderMeadOptimizer {
    params: AlgorithmConfig,
    output: Box<dyn TraceSink>,
}

impl NelderMeadOptimizer {
    pub fn new(params: AlgorithmConfig, output: Box<dyn TraceSink>) -> Self {
        Self { params, output }
    }

    pub fn params(&self) -> &AlgorithmConfig {
        &self.params
    }

    fn write(&mut self, line: &str) -> Result<(), OptimizerError> {
        self.output.write(line)?;
        Ok(())
    }

    fn log_simplex(&mut self, step: u32, simplex: &Simplex) -> Result<(), OptimizerError> {
        self.write(&format!("Step #{step}"))?;
        self.write("Simplex vertices:")?;
        for (i, element) in simplex.elements().iter().enumerate() {
            self.write(&format!("X{}={}", i, format_point(element.point())))?;
        }
        Ok(())
    }

    /// Replace the worst vertex (or shrink the whole simplex) once.
    ///
    /// Expects a sorted simplex. Returns the transformation applied and the
    /// number of objective evaluations it took.
    fn change_simplex(
        &mut self,
        simplex: &mut Simplex,
        problem: &dyn Problem,
    ) -> Result<(Transformation, usize), OptimizerError> {
        let alpha = self.params.reflection_coeff;
        let beta = self.params.contraction_coeff;
        let gamma = self.params.expansion_coeff;

        let best_value = simplex.best().value();
        let second_worst_value = simplex.second_worst().value();
        let worst_value = simplex.worst().value();
        let worst_point = simplex.worst().point().to_vec();

        let center = simplex.mass_center();

        let reflection = Element::new(
            subtract(&scale(&center, 1.0 + alpha), &scale(&worst_point, alpha)),
            problem,
        )?;
        self.write(&format!("Reflection: {}", format_point(reflection.point())))?;

        if best_value <= reflection.value() && reflection.value() <= second_worst_value {
            simplex.replace_worst(reflection);
            return Ok((Transformation::Reflection, 1));
        }

        if reflection.value() < best_value {
            let expansion = Element::new(
                add(&scale(&center, 1.0 - gamma), &scale(reflection.point(), gamma)),
                problem,
            )?;
            self.write(&format!("Expansion: {}", format_point(expansion.point())))?;

            if expansion.value() < reflection.value() {
                simplex.replace_worst(expansion);
                return Ok((Transformation::Expansion, 2));
            }
            simplex.replace_worst(reflection);
            return Ok((Transformation::Reflection, 2));
        }

        // Contract toward whichever of the worst vertex and the reflection is worse
        let toward = if worst_value <= reflection.value() {
            worst_point.as_slice()
        } else {
            reflection.point()
        };
        let contraction = Element::new(
            add(&center, &scale(&subtract(toward, &center), beta)),
            problem,
        )?;
        self.write(&format!("Contraction: {}", format_point(contraction.point())))?;

        if contraction.value() < worst_value.min(reflection.value()) {
            simplex.replace_worst(contraction);
            return Ok((Transformation::Contraction, 2));
        }

        self.write("Shrink towards X0")?;
        let evaluated = simplex.shrink(problem)?;
        Ok((Transformation::Shrink, 2 + evaluated))
    }

    fn run(
        &mut self,
        problem: &dyn Problem,
        mut observer: Option<&mut dyn SimplexObserver>,
    ) -> Result<SolverResult, OptimizerError> {
        let n = problem.num_params();
        let mut simplex = Simplex::from_start(problem.initial_params(), self.params.scale, problem)?;
        let mut cost_evals = n + 1;

        let mut converged = false;
        let mut iterations = 0u32;

        while iterations < self.params.max_steps {
            simplex.sort();
            iterations += 1;

            if let Some(observer) = observer.as_deref_mut() {
                observer.on_iteration(iterations);
                for element in simplex.elements() {
                    observer.on_vertex(element.point());
                }
            }

            if simplex.is_converged(self.params.eps) {
                converged = true;
                break;
            }

            self.log_simplex(iterations, &simplex)?;
            let (transformation, evals) = self.change_simplex(&mut simplex, problem)?;
            cost_evals += evals;

            log::debug!(
                "Step {}: {:?}, best value {:.6e}, spread {:.6e}",
                iterations,
                transformation,
                simplex.best().value(),
                simplex.spread()
            );
        }

        if !converged {
            // The last iteration transformed the simplex after sorting it
            simplex.sort();
        }

        let best = simplex.best().clone();
        self.write(&format!("Best solution: {}", format_point(best.point())))?;

        let message = if converged {
            "Converged"
        } else {
            "Max iterations reached"
        };
        log::info!(
            "Nelder-Mead finished after {} iterations ({} evaluations): {}, f = {:.6e}",
            iterations,
            cost_evals,
            message,
            best.value()
        );

        Ok(SolverResult {
            converged,
            value: best.value(),
            iterations,
            message: message.into(),
            params: best.into_point(),
            cost_evals,
        })
    }
}

impl Solver for NelderMeadOptimizer {
    fn name(&self) -> &str {
        "NelderMead"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        observer: Option<&mut dyn SimplexObserver>,
    ) -> Result<SolverResult, OptimizerError> {
        let result = self.run(problem, observer);
        let closed = self.output.close();
        let result = result?;
        closed?;
        Ok(result)
    }
}

/// `(a, b, ...)` with six decimals per coordinate
pub(crate) fn format_point(point: &[f64]) -> String {
    let coords: Vec<String> = point.iter().map(|x| format!("{x:.6}")).collect();
    format!("({})", coords.join(", "))
}
