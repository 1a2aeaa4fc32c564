//! Numerical quadrature over sampled profiles.

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Composite trapezoid rule over (possibly uneven) samples.
pub fn trapezoid(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]))
        .sum()
}

/// Composite Simpson rule over evenly spaced samples.
///
/// With an odd number of intervals the last interval is closed with the
/// trapezoid rule.
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 3 {
        return trapezoid(&y[..n], &x[..n]);
    }

    let intervals = n - 1;
    let even = intervals - intervals % 2;
    let h = (x[even] - x[0]) / even as f64;

    let mut sum = y[0] + y[even];
    for i in 1..even {
        sum += if i % 2 == 1 { 4.0 * y[i] } else { 2.0 * y[i] };
    }
    let mut area = sum * h / 3.0;

    if even < intervals {
        area += trapezoid(&y[even..n], &x[even..n]);
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linspace_endpoints() {
        let x = linspace(2.0, 4.0, 5);
        assert_eq!(x, vec![2.0, 2.5, 3.0, 3.5, 4.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    #[test]
    fn test_trapezoid_exact_for_linear() {
        let x = vec![0.0, 0.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        assert_abs_diff_eq!(trapezoid(&y, &x), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simpson_exact_for_cubic() {
        let x = linspace(0.0, 2.0, 11);
        let y: Vec<f64> = x.iter().map(|v| v * v * v).collect();
        assert_abs_diff_eq!(simpson(&y, &x), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simpson_odd_interval_count() {
        let x = linspace(0.0, 3.0, 4);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v).collect();
        assert_abs_diff_eq!(simpson(&y, &x), 13.5, epsilon = 1e-12);
    }
}
