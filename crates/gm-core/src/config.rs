use serde::{Deserialize, Serialize};

use crate::spectrum::{AccelUnits, SpectralMethod};

/// Straight strike-parallel fault segment along the x-axis, used for the
/// Joyner-Boore distance field. The segment spans [x_min, x_max] at y = 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaultGeometry {
    pub x_min: f64,
    pub x_max: f64,
}

/// Immutable run configuration, passed by reference into every component.
///
/// One value describes the whole run: output sampling interval, oscillator
/// periods, percentile/damping for the rotation sweep, fault geometry, and
/// the chunk-file naming scheme. There is no process-wide mutable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmConfig {
    /// Sampling interval of the surface output in seconds
    /// (simulation timestep × output stride).
    pub dt: f64,
    /// Oscillator periods (s) for the response-spectrum channels.
    pub periods: Vec<f64>,
    /// GMRotDpp percentile, in [0, 100].
    pub percentile: f64,
    /// SDOF damping ratio.
    pub damping: f64,
    /// Units of the acceleration handed to the metric engine.
    pub units: AccelUnits,
    pub method: SpectralMethod,
    pub fault: FaultGeometry,
    /// Chunk coordinate files are named `<coord_prefix><chunk_id>`.
    pub coord_prefix: String,
    /// Chunk velocity binaries are named `<velocity_prefix><chunk_id>`.
    pub velocity_prefix: String,
    /// Chunk ids 0..max_chunks are scanned; absent ids are skipped.
    pub max_chunks: u32,
}

impl Default for GmConfig {
    fn default() -> Self {
        Self {
            dt: 0.05,
            periods: vec![
                0.100, 0.125, 0.25, 0.4, 0.5, 0.75, 1.0, 1.5, 2.0, 2.5, 3.0, 5.0,
            ],
            percentile: 50.0,
            damping: 0.05,
            units: AccelUnits::CmPerSec2,
            method: SpectralMethod::NigamJennings,
            fault: FaultGeometry {
                x_min: -20e3,
                x_max: 20e3,
            },
            coord_prefix: "surface_coor.txt".to_string(),
            velocity_prefix: "gm".to_string(),
            max_chunks: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_periods_cover_short_and_long_oscillators() {
        let cfg = GmConfig::default();
        assert_eq!(cfg.periods.len(), 12);
        assert_eq!(cfg.periods[0], 0.100);
        assert_eq!(*cfg.periods.last().unwrap(), 5.0);
        assert_eq!(cfg.percentile, 50.0);
    }
}
