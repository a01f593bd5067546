//! Station index: scans per-chunk coordinate files into a consolidated,
//! deduplicated spatial index.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::GmConfig;
use crate::error::GmError;

/// Raw concatenated index, one row per station per chunk.
pub const RAW_INDEX_FILE: &str = "gmStLocIndex.txt";
/// Deduplicated index: one row per unique station coordinate.
pub const UNIQUE_INDEX_FILE: &str = "gmUniqueStLocIndex.txt";

/// One indexed surface station: position plus its owning chunk and that
/// chunk's station count. The in-chunk ordinal is deliberately absent —
/// deduplication discards it, and the resolver recovers it from the raw
/// chunk file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub chunk_id: u32,
    pub station_count: u32,
}

/// Deduplicated station index over all present chunks.
#[derive(Debug, Clone)]
pub struct StationIndex {
    pub records: Vec<StationRecord>,
}

/// Read one chunk's coordinate file (`<prefix><chunk_id>`), first three
/// columns per row. `Ok(None)` when the file does not exist — an absent
/// chunk id is expected during a scan, not an error.
pub fn load_chunk_coords(
    dir: &Path,
    prefix: &str,
    chunk_id: u32,
) -> Result<Option<Vec<[f64; 3]>>, GmError> {
    let path = dir.join(format!("{prefix}{chunk_id}"));
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    let mut coords = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let mut coord = [0.0f64; 3];
        for c in coord.iter_mut() {
            *c = fields
                .next()
                .and_then(|f| f.parse::<f64>().ok())
                .ok_or_else(|| GmError::MalformedCoordinate {
                    path: path.clone(),
                    line: lineno + 1,
                })?;
        }
        coords.push(coord);
    }
    Ok(Some(coords))
}

impl StationIndex {
    /// Scan chunk ids `0..cfg.max_chunks` under `dir`, concatenate every
    /// present chunk's stations, persist the raw index, then deduplicate
    /// and persist the unique index. Fails with `EmptyIndex` when no
    /// chunk file is found at all.
    pub fn build(dir: &Path, cfg: &GmConfig) -> Result<Self, GmError> {
        let mut raw = Vec::new();
        for chunk_id in 0..cfg.max_chunks {
            if let Some(coords) = load_chunk_coords(dir, &cfg.coord_prefix, chunk_id)? {
                let station_count = coords.len() as u32;
                raw.extend(coords.into_iter().map(|[x, y, z]| StationRecord {
                    x,
                    y,
                    z,
                    chunk_id,
                    station_count,
                }));
            }
        }
        if raw.is_empty() {
            return Err(GmError::EmptyIndex);
        }

        save_records(&dir.join(RAW_INDEX_FILE), &raw)?;

        let unique = deduplicate(&raw);
        save_records(&dir.join(UNIQUE_INDEX_FILE), &unique)?;

        Ok(Self { records: unique })
    }

    /// Load a previously persisted index file.
    pub fn load(path: &Path) -> Result<Self, GmError> {
        if !path.exists() {
            return Err(GmError::MissingDataFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<f64> = line
                .split_whitespace()
                .map(|f| f.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| GmError::MalformedCoordinate {
                    path: path.to_path_buf(),
                    line: lineno + 1,
                })?;
            if fields.len() < 5 {
                return Err(GmError::MalformedCoordinate {
                    path: path.to_path_buf(),
                    line: lineno + 1,
                });
            }
            records.push(StationRecord {
                x: fields[0],
                y: fields[1],
                z: fields[2],
                chunk_id: fields[3] as u32,
                station_count: fields[4] as u32,
            });
        }
        Ok(Self { records })
    }
}

/// Collapse duplicate coordinates, keeping one representative per unique
/// (x, y, z). Rows are sorted by coordinate; among duplicates the row
/// from the lowest chunk id (and lowest ordinal within it) wins, since
/// the input comes in ascending scan order and the sort is stable. The
/// sorted output makes a second deduplication a no-op.
pub fn deduplicate(records: &[StationRecord]) -> Vec<StationRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    });
    sorted.dedup_by(|b, a| a.x == b.x && a.y == b.y && a.z == b.z);
    sorted
}

/// Tab-delimited, fixed 6-decimal formatting for every column (chunk id
/// and station count included, matching the index file format).
fn save_records(path: &Path, records: &[StationRecord]) -> Result<(), GmError> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    for r in records {
        writeln!(
            w,
            "{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            r.x, r.y, r.z, r.chunk_id as f64, r.station_count as f64
        )?;
    }
    w.flush()?;
    Ok(())
}

/// Path of a chunk's coordinate file under `dir`.
pub fn coord_path(dir: &Path, prefix: &str, chunk_id: u32) -> PathBuf {
    dir.join(format!("{prefix}{chunk_id}"))
}
