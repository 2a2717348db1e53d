use super::solvers::Problem;
use crate::error::OptimizerError;
use crate::vector::{self, Point};

/// A simplex vertex paired with the objective value computed when it was built.
///
/// Immutable: moving a vertex means building a new `Element`.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    point: Point,
    value: f64,
}

impl Element {
    pub fn new(point: Point, problem: &dyn Problem) -> Result<Self, OptimizerError> {
        let value = problem.cost(&point)?;
        Ok(Self { point, value })
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn into_point(self) -> Point {
        self.point
    }
}

/// The N+1 working vertices of a Nelder-Mead run.
///
/// After [`Simplex::sort`] index 0 is the best vertex and the last index the worst.
#[derive(Clone, Debug)]
pub struct Simplex {
    elements: Vec<Element>,
}

impl Simplex {
    /// Start vertex plus one vertex per axis, offset from `start` by `scale`.
    pub fn from_start(
        start: &[f64],
        scale: f64,
        problem: &dyn Problem,
    ) -> Result<Self, OptimizerError> {
        let mut elements = Vec::with_capacity(start.len() + 1);
        elements.push(Element::new(start.to_vec(), problem)?);

        for i in 0..start.len() {
            let mut point = start.to_vec();
            point[i] += scale;
            elements.push(Element::new(point, problem)?);
        }

        Ok(Self { elements })
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        assert!(elements.len() >= 2, "a simplex needs at least two vertices");
        Self { elements }
    }

    /// Number of coordinates per vertex; the simplex holds one more vertex than this
    pub fn dimension(&self) -> usize {
        self.elements.len() - 1
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn best(&self) -> &Element {
        &self.elements[0]
    }

    pub fn worst(&self) -> &Element {
        &self.elements[self.elements.len() - 1]
    }

    pub fn second_worst(&self) -> &Element {
        &self.elements[self.elements.len() - 2]
    }

    /// Stable ascending sort by value
    pub fn sort(&mut self) {
        self.elements.sort_by(|a, b| a.value.total_cmp(&b.value));
    }

    /// Root-mean-square deviation of the non-best values from the best value.
    ///
    /// Measures flatness in function-value space, not geometric size, so a
    /// simplex sitting on a plateau reports zero spread.
    pub fn spread(&self) -> f64 {
        let best = self.best().value;
        let others = &self.elements[1..];
        let sum: f64 = others.iter().map(|e| (e.value - best).powi(2)).sum();
        (sum / others.len() as f64).sqrt()
    }

    pub fn is_converged(&self, eps: f64) -> bool {
        self.spread() <= eps
    }

    /// Centroid of every vertex except the worst
    pub fn mass_center(&self) -> Point {
        let n = self.dimension();
        vector::mass_center(self.elements[..n].iter().map(Element::point))
    }

    pub fn replace_worst(&mut self, element: Element) {
        let last = self.dimension();
        self.elements[last] = element;
    }

    /// Move every vertex except the best halfway toward the best.
    ///
    /// Returns the number of objective evaluations, one per moved vertex. The
    /// simplex is left unchanged if any evaluation fails.
    pub fn shrink(&mut self, problem: &dyn Problem) -> Result<usize, OptimizerError> {
        let best = self.best().point.clone();
        let moved = self.elements[1..]
            .iter()
            .map(|e| {
                let step = vector::divide(&vector::subtract(&best, &e.point), 2.0);
                Element::new(vector::add(&e.point, &step), problem)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = moved.len();
        for (slot, element) in self.elements[1..].iter_mut().zip(moved) {
            *slot = element;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    /// Sum of squares that counts its evaluations
    struct Counting {
        start: Vec<f64>,
        evals: Cell<usize>,
    }

    impl Counting {
        fn new(start: Vec<f64>) -> Self {
            Self {
                start,
                evals: Cell::new(0),
            }
        }
    }

    impl Problem for Counting {
        fn cost(&self, params: &[f64]) -> Result<f64, OptimizerError> {
            self.evals.set(self.evals.get() + 1);
            Ok(params.iter().map(|x| x * x).sum())
        }

        fn num_params(&self) -> usize {
            self.start.len()
        }

        fn initial_params(&self) -> &[f64] {
            &self.start
        }
    }

    fn element(point: Vec<f64>, value: f64) -> Element {
        Element { point, value }
    }

    #[test]
    fn start_simplex_is_offset_from_start() {
        let problem = Counting::new(vec![0.0, 0.0]);
        let simplex = Simplex::from_start(&[0.0, 0.0], 1.0, &problem).unwrap();

        let points: Vec<&[f64]> = simplex.elements().iter().map(Element::point).collect();
        assert_eq!(points, vec![&[0.0, 0.0][..], &[1.0, 0.0][..], &[0.0, 1.0][..]]);
        assert_eq!(problem.evals.get(), 3);
    }

    #[test]
    fn start_simplex_away_from_origin() {
        let problem = Counting::new(vec![2.0, -1.0]);
        let simplex = Simplex::from_start(&[2.0, -1.0], 0.5, &problem).unwrap();

        assert_eq!(simplex.dimension(), 2);
        assert_eq!(simplex.elements().len(), 3);
        assert_eq!(simplex.elements()[1].point(), &[2.5, -1.0]);
        assert_eq!(simplex.elements()[2].point(), &[2.0, -0.5]);
        assert_relative_eq!(simplex.elements()[1].value(), 7.25);
    }

    #[test]
    fn sort_orders_by_value() {
        let mut simplex = Simplex::from_elements(vec![
            element(vec![3.0], 9.0),
            element(vec![1.0], 1.0),
            element(vec![2.0], 4.0),
        ]);
        simplex.sort();
        assert_eq!(simplex.best().value(), 1.0);
        assert_eq!(simplex.second_worst().value(), 4.0);
        assert_eq!(simplex.worst().value(), 9.0);
    }

    #[test]
    fn spread_convergence_example() {
        let simplex = Simplex::from_elements(vec![
            element(vec![0.0, 0.0], 1.0),
            element(vec![1.0, 0.0], 1.0001),
            element(vec![0.0, 1.0], 1.0002),
        ]);
        // sqrt((1e-4^2 + 2e-4^2) / 2)
        assert_relative_eq!(simplex.spread(), 1.5811e-4, epsilon = 1e-7);
        assert!(simplex.is_converged(0.001));
        assert!(!simplex.is_converged(0.0001));
    }

    #[test]
    fn flat_simplex_is_converged() {
        let simplex = Simplex::from_elements(vec![
            element(vec![0.0], 5.0),
            element(vec![10.0], 5.0),
        ]);
        assert_eq!(simplex.spread(), 0.0);
        assert!(simplex.is_converged(0.0));
    }

    #[test]
    fn mass_center_skips_worst() {
        let simplex = Simplex::from_elements(vec![
            element(vec![0.0, 0.0], 0.0),
            element(vec![2.0, 2.0], 1.0),
            element(vec![100.0, 100.0], 2.0),
        ]);
        assert_eq!(simplex.mass_center(), vec![1.0, 1.0]);
    }

    #[test]
    fn shrink_reevaluates_all_but_best() {
        let problem = Counting::new(vec![0.0, 0.0]);
        let mut simplex = Simplex::from_start(&[0.0, 0.0], 2.0, &problem).unwrap();
        simplex.sort();
        let best_before = simplex.best().clone();
        problem.evals.set(0);

        let evaluated = simplex.shrink(&problem).unwrap();

        assert_eq!(evaluated, 2);
        assert_eq!(problem.evals.get(), 2);
        assert_eq!(simplex.best(), &best_before);
        assert_eq!(simplex.elements()[1].point(), &[1.0, 0.0]);
        assert_eq!(simplex.elements()[2].point(), &[0.0, 1.0]);
        assert_relative_eq!(simplex.elements()[2].value(), 1.0);
    }

    #[test]
    fn replace_worst_only_touches_last_slot() {
        let mut simplex = Simplex::from_elements(vec![
            element(vec![0.0], 0.0),
            element(vec![1.0], 1.0),
        ]);
        simplex.replace_worst(element(vec![0.5], 0.25));
        assert_eq!(simplex.best().point(), &[0.0]);
        assert_eq!(simplex.worst().point(), &[0.5]);
    }
}
