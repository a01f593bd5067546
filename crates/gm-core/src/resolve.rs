//! Nearest-station resolution against the deduplicated index.
//!
//! Resolution is two-pass by necessity: the global R-tree finds the
//! nearest unique coordinate and its owning chunk, but deduplication has
//! discarded the station's position within that chunk's local file
//! ordering. The chunk's raw coordinate list is re-loaded and searched
//! again to recover the true in-chunk ordinal — skipping this yields
//! wrong ordinals whenever deduplication reordered rows.

use std::path::{Path, PathBuf};

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::error::GmError;
use crate::index::{coord_path, load_chunk_coords, StationIndex, StationRecord};

type IndexedStation = GeomWithData<[f64; 3], usize>;

/// A resolved query: the nearest indexed station, its in-chunk ordinal,
/// and the Euclidean distance from the query point.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedStation {
    pub station: StationRecord,
    /// Position within the owning chunk's local (non-deduplicated)
    /// file ordering; indexes the chunk's binary record layout.
    pub ordinal: usize,
    pub distance: f64,
}

/// Nearest-neighbour resolver over a deduplicated station index.
pub struct StationResolver {
    tree: RTree<IndexedStation>,
    records: Vec<StationRecord>,
    data_dir: PathBuf,
    coord_prefix: String,
}

impl StationResolver {
    pub fn new(index: &StationIndex, data_dir: impl Into<PathBuf>, coord_prefix: &str) -> Self {
        let points: Vec<IndexedStation> = index
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| GeomWithData::new([r.x, r.y, r.z], i))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
            records: index.records.clone(),
            data_dir: data_dir.into(),
            coord_prefix: coord_prefix.to_string(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve the globally nearest station to `query` (no distance
    /// cutoff — the nearest station is returned however far it is).
    pub fn resolve(&self, query: [f64; 3]) -> Result<ResolvedStation, GmError> {
        let hit = self
            .tree
            .nearest_neighbor(&query)
            .ok_or(GmError::EmptyIndex)?;
        let station = self.records[hit.data];

        // Second pass: the owning chunk's coordinate file must still
        // exist; its absence now is an index inconsistency.
        let coords = load_chunk_coords(&self.data_dir, &self.coord_prefix, station.chunk_id)?
            .ok_or_else(|| GmError::MissingDataFile {
                path: coord_path(&self.data_dir, &self.coord_prefix, station.chunk_id),
            })?;
        let ordinal = nearest_ordinal(&coords, query);

        let dx = station.x - query[0];
        let dy = station.y - query[1];
        let dz = station.z - query[2];
        Ok(ResolvedStation {
            station,
            ordinal,
            distance: (dx * dx + dy * dy + dz * dz).sqrt(),
        })
    }
}

/// Index of the coordinate nearest to `query`; the first of equally
/// distant rows wins, keeping resolution deterministic.
fn nearest_ordinal(coords: &[[f64; 3]], query: [f64; 3]) -> usize {
    let mut best = 0usize;
    let mut best_d2 = f64::INFINITY;
    for (i, c) in coords.iter().enumerate() {
        let dx = c[0] - query[0];
        let dy = c[1] - query[1];
        let dz = c[2] - query[2];
        let d2 = dx * dx + dy * dy + dz * dz;
        if d2 < best_d2 {
            best_d2 = d2;
            best = i;
        }
    }
    best
}
