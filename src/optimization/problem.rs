use super::solvers::Problem;
use crate::error::OptimizerError;
use crate::expression::CompiledExpression;

/// Objective given as a runtime expression over `x1..xN`.
///
/// The expression is compiled once per problem; every evaluation binds the
/// variables afresh from the point it is given.
pub struct ExpressionProblem {
    expression: String,
    compiled: CompiledExpression,
    start: Vec<f64>,
}

impl ExpressionProblem {
    /// Compile `expression` for the dimension of `start`.
    ///
    /// Syntax errors and unknown symbols are reported here, before any evaluation.
    pub fn new(expression: &str, start: Vec<f64>) -> Result<Self, OptimizerError> {
        if start.is_empty() {
            return Err(OptimizerError::EmptyPoint);
        }

        let compiled = CompiledExpression::for_dimension(expression, start.len())
            .map_err(|e| OptimizerError::invalid_expression(expression, e))?;

        Ok(Self {
            expression: expression.to_string(),
            compiled,
            start,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Problem for ExpressionProblem {
    fn cost(&self, params: &[f64]) -> Result<f64, OptimizerError> {
        self.compiled
            .evaluate(params)
            .map_err(|e| OptimizerError::invalid_expression(&self.expression, e))
    }

    fn num_params(&self) -> usize {
        self.start.len()
    }

    fn initial_params(&self) -> &[f64] {
        &self.start
    }
}
