//! Intensity-measure bundle and the closed metric enumeration.
//!
//! Metric identity is a tagged enum rather than a string key, so a typo
//! cannot silently alias a metric to a zeroed field.

use serde::{Deserialize, Serialize};

/// One named scalar output of the metric engine. `Sa` carries the index
/// into the configured oscillator-period list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Pga,
    Pgv,
    Pgd,
    Cav,
    Sa(usize),
}

impl MetricKind {
    /// Every metric for a run with `n_periods` configured periods, in the
    /// persisted output order: PGA, PGV, PGD, CAV, then one per period.
    pub fn all(n_periods: usize) -> Vec<MetricKind> {
        let mut kinds = vec![
            MetricKind::Pga,
            MetricKind::Pgv,
            MetricKind::Pgd,
            MetricKind::Cav,
        ];
        kinds.extend((0..n_periods).map(MetricKind::Sa));
        kinds
    }

    /// Stable label used for field persistence and map titles, e.g.
    /// `RSA_T_0.100` for spectral acceleration at T = 0.1 s.
    pub fn label(&self, periods: &[f64]) -> String {
        match self {
            MetricKind::Pga => "PGA".to_string(),
            MetricKind::Pgv => "PGV".to_string(),
            MetricKind::Pgd => "PGD".to_string(),
            MetricKind::Cav => "CAV".to_string(),
            MetricKind::Sa(i) => format!("RSA_T_{:.3}", periods[*i]),
        }
    }
}

/// Intensity measures for one query point, in the units of the input
/// acceleration (typically cm/s/s). Created fresh per grid node and never
/// mutated after the engine returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntensityMeasures {
    pub pga: f64,
    pub pgv: f64,
    pub pgd: f64,
    pub cav: f64,
    /// Spectral acceleration, aligned with the configured period list.
    pub sa: Vec<f64>,
}

impl IntensityMeasures {
    /// All-zero bundle; the graceful-degradation default when the engine
    /// cannot produce a value.
    pub fn zeroed(n_periods: usize) -> Self {
        Self {
            pga: 0.0,
            pgv: 0.0,
            pgd: 0.0,
            cav: 0.0,
            sa: vec![0.0; n_periods],
        }
    }

    /// Value for one metric; `None` when a spectral entry is absent
    /// (shorter `sa` than the configured period list).
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Pga => Some(self.pga),
            MetricKind::Pgv => Some(self.pgv),
            MetricKind::Pgd => Some(self.pgd),
            MetricKind::Cav => Some(self.cav),
            MetricKind::Sa(i) => self.sa.get(i).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_metric_in_output_order() {
        let kinds = MetricKind::all(2);
        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds[0], MetricKind::Pga);
        assert_eq!(kinds[4], MetricKind::Sa(0));
    }

    #[test]
    fn sa_labels_use_three_decimal_periods() {
        let periods = [0.1, 1.5];
        assert_eq!(MetricKind::Sa(0).label(&periods), "RSA_T_0.100");
        assert_eq!(MetricKind::Sa(1).label(&periods), "RSA_T_1.500");
        assert_eq!(MetricKind::Cav.label(&periods), "CAV");
    }

    #[test]
    fn missing_spectral_entry_is_none_not_zero() {
        let m = IntensityMeasures::zeroed(1);
        assert_eq!(m.get(MetricKind::Sa(0)), Some(0.0));
        assert_eq!(m.get(MetricKind::Sa(3)), None);
    }
}
