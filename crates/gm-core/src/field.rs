//! 2-D metric fields and their persisted bundle format.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::GmError;

/// A 2-D scalar field aligned with the evaluation grid, row-major with
/// `ny` rows (y) of `nx` columns (x). Coordinate bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricField {
    pub data: Vec<f64>,
    pub nx: usize,
    pub ny: usize,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl MetricField {
    pub fn new(
        nx: usize,
        ny: usize,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        fill: f64,
    ) -> Self {
        Self {
            data: vec![fill; nx * ny],
            nx,
            ny,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.nx + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.nx + col] = val;
    }

    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Ordered mapping from metric label to field, persisted as
/// gzip-compressed JSON (one bundle per run).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldBundle {
    pub fields: BTreeMap<String, MetricField>,
}

impl FieldBundle {
    pub fn insert(&mut self, label: impl Into<String>, field: MetricField) {
        self.fields.insert(label.into(), field);
    }

    pub fn get(&self, label: &str) -> Option<&MetricField> {
        self.fields.get(label)
    }

    pub fn save_gz(&self, path: &Path) -> Result<(), GmError> {
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    pub fn load_gz(path: &Path) -> Result<Self, GmError> {
        if !path.exists() {
            return Err(GmError::MissingDataFile {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(serde_json::from_reader(decoder)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_get_set() {
        let mut f = MetricField::new(3, 2, 0.0, 10.0, 0.0, 5.0, 0.0);
        f.set(1, 2, 7.5);
        assert_eq!(f.get(1, 2), 7.5);
        assert_eq!(f.data[5], 7.5);
        assert_eq!(f.max_value(), 7.5);
    }

    #[test]
    fn bundle_round_trips_through_gzip_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json.gz");

        let mut field = MetricField::new(2, 2, 0.0, 1.0, 0.0, 1.0, 0.0);
        field.set(0, 1, 3.25);
        let mut bundle = FieldBundle::default();
        bundle.insert("PGA", field);
        bundle.save_gz(&path).unwrap();

        let loaded = FieldBundle::load_gz(&path).unwrap();
        assert_eq!(loaded.get("PGA").unwrap().get(0, 1), 3.25);
        assert!(loaded.get("PGV").is_none());
    }
}
