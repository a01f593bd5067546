//! Single-degree-of-freedom response spectra via Nigam-Jennings
//! piecewise-exact integration.
//!
//! This is the numerics capability the metric engine consumes: input
//! acceleration history + periods + damping → per-period oscillator
//! response time series and spectral peaks. The integrator works in
//! cm/s/s internally; inputs in other units are converted on entry.

use serde::{Deserialize, Serialize};

use crate::signal::{abs_max, cumtrapz};

/// Units tag for an input acceleration history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccelUnits {
    /// cm/s² — the integrator's native unit, no conversion.
    CmPerSec2,
    /// m/s² — scaled ×100 on entry.
    MPerSec2,
    /// Fractions of g — scaled ×981 on entry.
    G,
}

impl AccelUnits {
    fn to_cm_per_sec2(self, a: f64) -> f64 {
        match self {
            AccelUnits::CmPerSec2 => a,
            AccelUnits::MPerSec2 => a * 100.0,
            AccelUnits::G => a * 981.0,
        }
    }
}

/// Response-spectrum integration scheme. Closed so new integrators can be
/// added without touching callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectralMethod {
    NigamJennings,
}

/// Full output of one response-spectrum evaluation.
///
/// The oscillator time series have `n - 1` samples for an `n`-sample input
/// (the recurrence consumes one forward difference per step).
#[derive(Debug, Clone)]
pub struct SdofResponse {
    pub periods: Vec<f64>,
    /// Peak oscillator acceleration per period.
    pub sa: Vec<f64>,
    /// Peak oscillator velocity per period.
    pub sv: Vec<f64>,
    /// Peak oscillator displacement per period.
    pub sd: Vec<f64>,
    /// Peak ground acceleration/velocity/displacement of the input motion.
    pub pga: f64,
    pub pgv: f64,
    pub pgd: f64,
    /// Oscillator acceleration response, indexed [period][time].
    pub accel_ts: Vec<Vec<f64>>,
}

/// Compute the SDOF response of `acceleration` (sampled at `dt`) for each
/// oscillator period, at the given damping ratio.
pub fn response_spectrum(
    acceleration: &[f64],
    dt: f64,
    periods: &[f64],
    damping: f64,
    units: AccelUnits,
    method: SpectralMethod,
) -> SdofResponse {
    let acc: Vec<f64> = acceleration
        .iter()
        .map(|&a| units.to_cm_per_sec2(a))
        .collect();

    // Ground-motion peaks: velocity and displacement by cumulative
    // trapezoid integration of the converted record.
    let velocity = cumtrapz(&acc, dt);
    let displacement = cumtrapz(&velocity, dt);
    let pga = abs_max(&acc);
    let pgv = abs_max(&velocity);
    let pgd = abs_max(&displacement);

    let n_per = periods.len();
    let mut sa = vec![0.0; n_per];
    let mut sv = vec![0.0; n_per];
    let mut sd = vec![0.0; n_per];
    let mut accel_ts = Vec::with_capacity(n_per);

    let n_rows = acc.len().saturating_sub(1);
    for (p, &period) in periods.iter().enumerate() {
        let (x_a, x_v, x_d) = match method {
            SpectralMethod::NigamJennings => nigam_jennings(&acc, dt, period, damping, n_rows),
        };
        sa[p] = abs_max(&x_a);
        sv[p] = abs_max(&x_v);
        sd[p] = abs_max(&x_d);
        accel_ts.push(x_a);
    }

    SdofResponse {
        periods: periods.to_vec(),
        sa,
        sv,
        sd,
        pga,
        pgv,
        pgd,
        accel_ts,
    }
}

/// Nigam-Jennings (1969) recurrence for one oscillator period: exact
/// solution of the damped SDOF equation under piecewise-linear loading.
/// Returns (acceleration, velocity, displacement) oscillator series.
fn nigam_jennings(
    acc: &[f64],
    dt: f64,
    period: f64,
    damping: f64,
    n_rows: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let omega = 2.0 * std::f64::consts::PI / period;
    let omega2 = omega * omega;
    let omega3 = omega2 * omega;
    let omega_d = omega * (1.0 - damping * damping).sqrt();

    let f1 = 2.0 * damping / (omega3 * dt);
    let f2 = 1.0 / omega2;
    let f3 = damping * omega;
    let f4 = 1.0 / omega_d;
    let f5 = f3 * f4;
    let f6 = 2.0 * f3;
    let e = (-f3 * dt).exp();
    let g1 = e * (omega_d * dt).sin();
    let g2 = e * (omega_d * dt).cos();
    let h1 = omega_d * g2 - f3 * g1;
    let h2 = omega_d * g1 + f3 * g2;

    let mut x_a = vec![0.0; n_rows];
    let mut x_v = vec![0.0; n_rows];
    let mut x_d = vec![0.0; n_rows];

    for k in 0..n_rows {
        let dug = acc[k + 1] - acc[k];
        let z_1 = f2 * dug;
        let z_2 = f2 * acc[k];
        let z_3 = f1 * dug;
        let z_4 = z_1 / dt;
        let (a_val, b_val) = if k == 0 {
            let b = z_2 - z_3;
            (f5 * b + f4 * z_4, b)
        } else {
            let b = x_d[k - 1] + z_2 - z_3;
            (f4 * x_v[k - 1] + f5 * b + f4 * z_4, b)
        };
        x_d[k] = a_val * g1 + b_val * g2 + z_3 - z_2 - z_1;
        x_v[k] = a_val * h1 - b_val * h2 - z_4;
        x_a[k] = -f6 * x_v[k] - omega2 * x_d[k];
    }

    (x_a, x_v, x_d)
}
