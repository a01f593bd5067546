//! Time-series primitives: differentiation, trapezoid integrals,
//! horizontal rotation, and cumulative absolute velocity.

/// Backward first-difference of a velocity series, in place of a true
/// derivative. The first sample has no backward neighbour and is set to 0,
/// so the output length always equals the input length.
///
/// First-order and noisier than a central difference, but this exact
/// scheme is part of the pipeline contract.
pub fn differentiate(v: &[f64], dt: f64) -> Vec<f64> {
    let mut out = vec![0.0; v.len()];
    for i in 1..v.len() {
        out[i] = (v[i] - v[i - 1]) / dt;
    }
    out
}

/// Cumulative trapezoid integral with an initial 0, matching
/// `cumtrapz(y, dx, initial=0)`: output length equals input length.
pub fn cumtrapz(y: &[f64], dx: f64) -> Vec<f64> {
    let mut out = vec![0.0; y.len()];
    for i in 1..y.len() {
        out[i] = out[i - 1] + dx * (y[i] + y[i - 1]) / 2.0;
    }
    out
}

/// Trapezoid integral over the whole series.
pub fn trapz(y: &[f64], dx: f64) -> f64 {
    if y.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 1..y.len() {
        sum += dx * (y[i] + y[i - 1]) / 2.0;
    }
    sum
}

/// Largest absolute value in the series (0 for an empty series).
pub fn abs_max(y: &[f64]) -> f64 {
    y.iter().fold(0.0f64, |m, &v| m.max(v.abs()))
}

/// Cumulative absolute velocity: time-integral of |acceleration|.
pub fn cav(acceleration: &[f64], dt: f64) -> f64 {
    let abs: Vec<f64> = acceleration.iter().map(|a| a.abs()).collect();
    trapz(&abs, dt)
}

/// Rotate two horizontal components by `angle_deg` (counter-clockwise):
///   x' =  cos·x + sin·y
///   y' = -sin·x + cos·y
/// Both outputs are truncated to the shorter input.
pub fn rotate_pair(x: &[f64], y: &[f64], angle_deg: f64) -> (Vec<f64>, Vec<f64>) {
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    let n = x.len().min(y.len());
    let mut rx = Vec::with_capacity(n);
    let mut ry = Vec::with_capacity(n);
    for i in 0..n {
        rx.push(cos * x[i] + sin * y[i]);
        ry.push(-sin * x[i] + cos * y[i]);
    }
    (rx, ry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn differentiate_keeps_length_and_zeroes_first_sample() {
        let v = [1.0, 3.0, 6.0, 10.0];
        let a = differentiate(&v, 0.5);
        assert_eq!(a.len(), v.len());
        assert_eq!(a[0], 0.0);
        assert_relative_eq!(a[1], 4.0);
        assert_relative_eq!(a[3], 8.0);
    }

    #[test]
    fn cumtrapz_of_constant_is_linear_ramp() {
        let y = [2.0; 5];
        let out = cumtrapz(&y, 0.1);
        assert_eq!(out[0], 0.0);
        assert_relative_eq!(out[4], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn trapz_matches_cumtrapz_last_entry() {
        let y = [0.0, 1.0, 4.0, 9.0, 16.0];
        let cum = cumtrapz(&y, 0.25);
        assert_relative_eq!(trapz(&y, 0.25), *cum.last().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let x = [1.0, -2.0, 3.0];
        let y = [0.5, 0.25, -0.125];
        let (rx, ry) = rotate_pair(&x, &y, 0.0);
        assert_eq!(rx, x.to_vec());
        assert_eq!(ry, y.to_vec());
    }

    #[test]
    fn rotate_by_90_swaps_components() {
        let x = [1.0, 0.0];
        let y = [0.0, 2.0];
        let (rx, ry) = rotate_pair(&x, &y, 90.0);
        assert_relative_eq!(rx[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(rx[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(ry[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(ry[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn cav_of_square_wave() {
        // |a| = 1 over 4 intervals of dt = 0.5 → integral 2.0.
        let a = [1.0, -1.0, 1.0, -1.0, 1.0];
        assert_relative_eq!(cav(&a, 0.5), 2.0, epsilon = 1e-12);
    }
}
