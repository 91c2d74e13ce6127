use std::cmp::Ordering;
use thiserror::Error;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a probability outside of [0, 1].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid input value: {message}")]
pub struct InputValueError {
    pub message: String,
}

impl InputValueError {
    pub fn new<S: Into<String>>(message: S) -> InputValueError {
        InputValueError {
            message: message.into(),
        }
    }
}

/// argmax returns the index of the maximum value in the array x. If the maximum occurs more than
/// once, the first occurrence wins. x must not be empty.
pub fn argmax<T: std::cmp::PartialOrd + std::marker::Copy>(x: &[T]) -> usize {
    let mut idx_max = 0;
    let mut val_max = x[0];

    for (i, &val) in x.iter().enumerate().skip(1) {
        if val > val_max {
            val_max = val;
            idx_max = i;
        }
    }

    idx_max
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their input order in both directions. NaN values are ordered by f64::total_cmp.
pub fn argsort(x: &[f64], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    argsort_into(x, order, &mut indices);
    indices
}

/// argsort_into does the same as argsort but reuses the inserted index buffer, which is needed
/// in hot loops.
pub fn argsort_into(x: &[f64], order: SortOrder, indices: &mut Vec<usize>) {
    indices.clear();
    indices.extend(0..x.len());
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| cmp_f64(x[a], x[b])),
        SortOrder::Descending => indices.sort_by(|&a, &b| cmp_f64(x[b], x[a])),
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Inspired by numpy.interp.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if xp.len() != fp.len() {
        panic!("Number of items in xp and fp must be equal!")
    }

    if x <= xp[0] {
        return fp[0];
    }

    for i in 1..xp.len() {
        if x <= xp[i] {
            return fp[i - 1] + (x - xp[i - 1]) * (fp[i] - fp[i - 1]) / (xp[i] - xp[i - 1]);
        }
    }

    fp[fp.len() - 1]
}

/// round_to rounds x to the given number of decimal places (half away from zero).
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[3.0, 7.0, 7.0, 1.0]), 1);
        assert_eq!(argmax(&[5.0]), 0);
        assert_eq!(argmax(&[2u32, 2, 2]), 0);
    }

    #[test]
    fn argsort_is_stable_for_ties() {
        let x = [1.0, 3.0, 3.0, 2.0];
        assert_eq!(argsort(&x, SortOrder::Descending), vec![1, 2, 3, 0]);
        assert_eq!(argsort(&x, SortOrder::Ascending), vec![0, 3, 1, 2]);
    }

    #[test]
    fn argsort_does_not_panic_on_nan() {
        let x = [1.0, f64::NAN, 2.0];
        assert_eq!(argsort(&x, SortOrder::Descending).len(), 3);
    }

    #[test]
    fn lin_interp_clamps_and_interpolates() {
        let xp = [0.0, 1.0, 2.0];
        let fp = [11.0, 10.0, 9.0];
        assert_relative_eq!(lin_interp(-1.0, &xp, &fp), 11.0);
        assert_relative_eq!(lin_interp(0.25, &xp, &fp), 10.75);
        assert_relative_eq!(lin_interp(1.5, &xp, &fp), 9.5);
        assert_relative_eq!(lin_interp(5.0, &xp, &fp), 9.0);
    }

    #[test]
    fn round_to_one_decimal() {
        assert_relative_eq!(round_to(33.349, 1), 33.3);
        assert_relative_eq!(round_to(66.65, 1), 66.7, epsilon = 1e-9);
        assert_relative_eq!(round_to(100.0, 1), 100.0);
    }
}
