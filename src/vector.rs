//! Elementwise arithmetic over fixed-length points.
//!
//! Operands must have equal length; the dimension is fixed for a run, so a
//! mismatch is a bug and panics.

/// A point in N-dimensional space
pub type Point = Vec<f64>;

pub fn scale(v: &[f64], k: f64) -> Point {
    v.iter().map(|&x| x * k).collect()
}

pub fn divide(v: &[f64], k: f64) -> Point {
    v.iter().map(|&x| x / k).collect()
}

pub fn add(v1: &[f64], v2: &[f64]) -> Point {
    assert_eq!(v1.len(), v2.len(), "point dimensions differ");
    v1.iter().zip(v2).map(|(&a, &b)| a + b).collect()
}

pub fn subtract(v1: &[f64], v2: &[f64]) -> Point {
    assert_eq!(v1.len(), v2.len(), "point dimensions differ");
    v1.iter().zip(v2).map(|(&a, &b)| a - b).collect()
}

/// Arithmetic mean of `points`, which must be non-empty.
pub fn mass_center<'a, I>(points: I) -> Point
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut points = points.into_iter();
    let Some(first) = points.next() else {
        panic!("mass center of an empty set of points");
    };

    let mut sum = first.to_vec();
    let mut count = 1usize;
    for p in points {
        sum = add(&sum, p);
        count += 1;
    }
    divide(&sum, count as f64)
}
