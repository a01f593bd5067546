//! Velocity time-series extraction from chunked binary surface output.
//!
//! A chunk binary (`gm<chunk_id>`) is a flat array of platform-native
//! 8-byte IEEE doubles in row-major (time_step, station, component)
//! order, three components per station: along-strike, fault-normal,
//! vertical. The time-step count is derived from the file size; nothing
//! else in the file describes its own layout.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{NativeEndian, ReadBytesExt};

use crate::error::GmError;

const VALUE_SIZE: u64 = 8;
/// Velocity components per station in the surface output.
pub const N_COMPONENTS: usize = 3;

/// The two horizontal velocity components of one station, equal length.
#[derive(Debug, Clone)]
pub struct VelocityPair {
    pub along_strike: Vec<f64>,
    pub fault_normal: Vec<f64>,
}

fn chunk_path(dir: &Path, prefix: &str, chunk_id: u32) -> PathBuf {
    dir.join(format!("{prefix}{chunk_id}"))
}

fn open_chunk(dir: &Path, prefix: &str, chunk_id: u32) -> Result<(File, u64), GmError> {
    let path = chunk_path(dir, prefix, chunk_id);
    if !path.exists() {
        // A resolved station points here; absence is an inconsistency,
        // never grounds for substituting zeros.
        return Err(GmError::MissingDataFile { path });
    }
    let file = File::open(&path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

/// Extract the two horizontal velocity histories of the station at
/// `ordinal` within chunk `chunk_id`, which holds `station_count`
/// stations. Reads one 3-component record per time step at byte offset
/// `(step·station_count·3 + ordinal·3)·8` and keeps the first two
/// components.
pub fn extract_velocity(
    dir: &Path,
    prefix: &str,
    chunk_id: u32,
    station_count: usize,
    ordinal: usize,
) -> Result<VelocityPair, GmError> {
    // A chunk that owns no stations has nothing to extract; the record
    // layout (and the step-count division) is only defined for count > 0.
    if station_count == 0 {
        return Ok(VelocityPair {
            along_strike: Vec::new(),
            fault_normal: Vec::new(),
        });
    }
    let (mut file, size) = open_chunk(dir, prefix, chunk_id)?;
    let values_per_step = (station_count * N_COMPONENTS) as u64;
    let n_steps = (size / VALUE_SIZE / values_per_step) as usize;

    let mut along_strike = Vec::with_capacity(n_steps);
    let mut fault_normal = Vec::with_capacity(n_steps);
    let mut record = [0.0f64; N_COMPONENTS];
    for step in 0..n_steps {
        let index = step as u64 * values_per_step + (ordinal * N_COMPONENTS) as u64;
        file.seek(SeekFrom::Start(index * VALUE_SIZE))?;
        file.read_f64_into::<NativeEndian>(&mut record)?;
        along_strike.push(record[0]);
        fault_normal.push(record[1]);
    }

    Ok(VelocityPair {
        along_strike,
        fault_normal,
    })
}

/// Read one component of every station in a chunk at a single time step
/// (a wavefield snapshot). `n_components` is the record width of the
/// file: 3 for surface velocity output, 1 for scalar source output.
pub fn read_snapshot(
    dir: &Path,
    prefix: &str,
    chunk_id: u32,
    station_count: usize,
    time_step: usize,
    component: usize,
    n_components: usize,
) -> Result<Vec<f64>, GmError> {
    if station_count == 0 {
        return Ok(Vec::new());
    }
    let (mut file, size) = open_chunk(dir, prefix, chunk_id)?;
    let values_per_step = (station_count * n_components) as u64;
    let n_steps = (size / VALUE_SIZE / values_per_step) as usize;
    if time_step >= n_steps {
        return Err(GmError::TimeStepOutOfRange {
            requested: time_step,
            available: n_steps,
        });
    }

    let start = time_step as u64 * values_per_step;
    let mut values = Vec::with_capacity(station_count);
    for st in 0..station_count {
        let index = start + (st * n_components + component) as u64;
        file.seek(SeekFrom::Start(index * VALUE_SIZE))?;
        values.push(file.read_f64::<NativeEndian>()?);
    }
    Ok(values)
}
