//! Rotation-invariant intensity measures (the GMRotDpp family).
//!
//! The two horizontal components are swept through rotation angles
//! 0°..=89°; per angle the geometric mean of the two rotated peaks is
//! taken per channel, and the requested percentile across angles gives
//! the rotation-invariant value. Channels are PGA, PGV, PGD and one
//! oscillator response per period; CAV gets its own sweep over the raw
//! acceleration records.

use crate::error::GmError;
use crate::measures::IntensityMeasures;
use crate::signal::{abs_max, cav, cumtrapz, rotate_pair};
use crate::spectrum::{response_spectrum, AccelUnits, SpectralMethod};

/// Tolerance on the upper percentile bound (floating slack for 100.0).
const PERCENTILE_TOL: f64 = 1e-9;

/// The fixed angle sweep: 0°, 1°, …, 89°. Angle 0 is the identity.
pub fn sweep_angles() -> Vec<f64> {
    (0..90).map(|a| a as f64).collect()
}

/// Linear-interpolation percentile of `values` (NumPy default): rank
/// p/100·(n−1) interpolated between the surrounding order statistics.
/// NaN for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    // The validated upper bound admits 100 + 1e-9; clamp the rank so the
    // tolerance never indexes past the last order statistic.
    let max_rank = (sorted.len() - 1) as f64;
    let rank = (p / 100.0 * max_rank).clamp(0.0, max_rank);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn validate_percentile(p: f64) -> Result<(), GmError> {
    if p < 0.0 || p > 100.0 + PERCENTILE_TOL {
        return Err(GmError::InvalidPercentile(p));
    }
    Ok(())
}

/// Per-angle geometric means of channel peaks.
///
/// `x` and `y` hold the same channels for the two components. Row `a` of
/// the result is, for each channel, `sqrt(max|x_rot| · max|y_rot|)` after
/// rotating the pair by `angles[a]`; angle 0 skips the rotation entirely
/// and combines the raw peaks.
pub fn sweep_geometric_means(x: &[Vec<f64>], y: &[Vec<f64>], angles: &[f64]) -> Vec<Vec<f64>> {
    let n_chan = x.len();
    let mut rows = Vec::with_capacity(angles.len());
    for (iloc, &theta) in angles.iter().enumerate() {
        let mut row = Vec::with_capacity(n_chan);
        for ch in 0..n_chan {
            let gm = if iloc == 0 {
                (abs_max(&x[ch]) * abs_max(&y[ch])).sqrt()
            } else {
                let (rx, ry) = rotate_pair(&x[ch], &y[ch], theta);
                (abs_max(&rx) * abs_max(&ry)).sqrt()
            };
            row.push(gm);
        }
        rows.push(row);
    }
    rows
}

/// Rotational CAV: geometric mean of the two components' cumulative
/// absolute velocities per angle (identity at angle 0), aggregated by
/// `percentile_value` across the sweep.
pub fn cav_gmrot(
    acc_x: &[f64],
    dt_x: f64,
    acc_y: &[f64],
    dt_y: f64,
    angles: &[f64],
    percentile_value: f64,
) -> f64 {
    let mut cav_theta = Vec::with_capacity(angles.len());
    for (iloc, &theta) in angles.iter().enumerate() {
        let value = if iloc == 0 {
            (cav(acc_x, dt_x) * cav(acc_y, dt_y)).sqrt()
        } else {
            let (rx, ry) = rotate_pair(acc_x, acc_y, theta);
            (cav(&rx, dt_x) * cav(&ry, dt_y)).sqrt()
        };
        cav_theta.push(value);
    }
    percentile(&cav_theta, percentile_value)
}

/// GMRotDpp with peak ground channels: the full rotation-invariant
/// metric computation for one station.
///
/// Fails with `InvalidPercentile` before touching the signals if the
/// percentile is outside [0, 100 + 1e-9].
#[allow(clippy::too_many_arguments)]
pub fn gmrotdpp_with_pg(
    acc_x: &[f64],
    dt_x: f64,
    acc_y: &[f64],
    dt_y: f64,
    periods: &[f64],
    percentile_value: f64,
    damping: f64,
    units: AccelUnits,
    method: SpectralMethod,
) -> Result<IntensityMeasures, GmError> {
    validate_percentile(percentile_value)?;

    // SDOF response per component.
    let resp_x = response_spectrum(acc_x, dt_x, periods, damping, units, method);
    let resp_y = response_spectrum(acc_y, dt_y, periods, damping, units, method);

    // Peak ground channels from the raw records: the last sample is
    // dropped so lengths line up with the n-1 oscillator series.
    let n_x = acc_x.len().saturating_sub(1);
    let n_y = acc_y.len().saturating_sub(1);
    let vel_x = cumtrapz(&acc_x[..n_x], dt_x);
    let disp_x = cumtrapz(&vel_x, dt_x);
    let vel_y = cumtrapz(&acc_y[..n_y], dt_y);
    let disp_y = cumtrapz(&vel_y, dt_y);

    // Equalise every channel to the common shortest length before the
    // sweep; rotation needs aligned samples.
    let mut n = n_x.min(n_y);
    for ts in resp_x.accel_ts.iter().chain(resp_y.accel_ts.iter()) {
        n = n.min(ts.len());
    }

    let mut channels_x: Vec<Vec<f64>> = Vec::with_capacity(3 + periods.len());
    let mut channels_y: Vec<Vec<f64>> = Vec::with_capacity(3 + periods.len());
    channels_x.push(acc_x[..n].to_vec());
    channels_x.push(vel_x[..n].to_vec());
    channels_x.push(disp_x[..n].to_vec());
    channels_y.push(acc_y[..n].to_vec());
    channels_y.push(vel_y[..n].to_vec());
    channels_y.push(disp_y[..n].to_vec());
    for ts in &resp_x.accel_ts {
        channels_x.push(ts[..n].to_vec());
    }
    for ts in &resp_y.accel_ts {
        channels_y.push(ts[..n].to_vec());
    }

    let angles = sweep_angles();
    let gm_rows = sweep_geometric_means(&channels_x, &channels_y, &angles);

    // Percentile across angles, independently per channel.
    let n_chan = channels_x.len();
    let mut gmrotd = Vec::with_capacity(n_chan);
    for ch in 0..n_chan {
        let per_angle: Vec<f64> = gm_rows.iter().map(|row| row[ch]).collect();
        gmrotd.push(percentile(&per_angle, percentile_value));
    }

    let cav_value = cav_gmrot(acc_x, dt_x, acc_y, dt_y, &angles, percentile_value);

    Ok(IntensityMeasures {
        pga: gmrotd[0],
        pgv: gmrotd[1],
        pgd: gmrotd[2],
        cav: cav_value,
        sa: gmrotd[3..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(n: usize, dt: f64, freq: f64, amp: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * std::f64::consts::PI * freq * i as f64 * dt).sin())
            .collect()
    }

    #[test]
    fn percentile_rejected_outside_bounds() {
        let acc = sine(64, 0.01, 1.0, 1.0);
        for p in [-0.1, 100.1, 1e6, -1e6] {
            let err = gmrotdpp_with_pg(
                &acc, 0.01, &acc, 0.01, &[1.0], p, 0.05,
                AccelUnits::CmPerSec2, SpectralMethod::NigamJennings,
            )
            .unwrap_err();
            assert!(matches!(err, GmError::InvalidPercentile(v) if v == p));
        }
        // The documented tolerance admits 100 + 1e-10.
        assert!(gmrotdpp_with_pg(
            &acc, 0.01, &acc, 0.01, &[1.0], 100.0 + 1e-10, 0.05,
            AccelUnits::CmPerSec2, SpectralMethod::NigamJennings,
        )
        .is_ok());
    }

    #[test]
    fn percentile_linear_interpolation_matches_numpy() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&v, 0.0), 1.0);
        assert_relative_eq!(percentile(&v, 100.0), 4.0);
        assert_relative_eq!(percentile(&v, 50.0), 2.5);
        assert_relative_eq!(percentile(&v, 25.0), 1.75);
    }

    #[test]
    fn zero_angle_row_is_unrotated_geometric_mean() {
        let x = vec![sine(128, 0.01, 2.0, 3.0)];
        let y = vec![sine(128, 0.01, 3.0, 5.0)];
        let rows = sweep_geometric_means(&x, &y, &sweep_angles());
        let expected = (abs_max(&x[0]) * abs_max(&y[0])).sqrt();
        assert_relative_eq!(rows[0][0], expected, epsilon = 1e-12);
        assert_eq!(rows.len(), 90);
    }

    #[test]
    fn identical_components_peak_at_angle_zero() {
        // With x == y, the angle-θ geometric mean is max|x|·sqrt(|cos 2θ|),
        // so the 100th percentile across the sweep recovers max|x|.
        let acc = sine(256, 0.01, 1.5, 2.0);
        let m = gmrotdpp_with_pg(
            &acc, 0.01, &acc, 0.01, &[0.5], 100.0, 0.05,
            AccelUnits::CmPerSec2, SpectralMethod::NigamJennings,
        )
        .unwrap();
        let expected = abs_max(&acc[..acc.len() - 1]);
        assert_relative_eq!(m.pga, expected, epsilon = 1e-9);
        assert_eq!(m.sa.len(), 1);
    }

    #[test]
    fn cav_sweep_angle_zero_is_identity_geomean() {
        let x = sine(128, 0.01, 2.0, 1.0);
        let y = sine(128, 0.01, 5.0, 1.0);
        let v = cav_gmrot(&x, 0.01, &y, 0.01, &[0.0], 50.0);
        let expected = (cav(&x, 0.01) * cav(&y, 0.01)).sqrt();
        assert_relative_eq!(v, expected, epsilon = 1e-12);
    }
}
