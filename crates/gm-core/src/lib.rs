//! Ground-motion intensity measures from rupture-simulation surface output.
//!
//! The pipeline: scan per-chunk station coordinate files into a
//! deduplicated spatial index ([`index`]), resolve arbitrary query points
//! to the nearest recorded station ([`resolve`]), extract its velocity
//! history from the chunked binary layout ([`extract`]), differentiate to
//! acceleration ([`signal`]), and compute rotation-invariant GMRotDpp
//! intensity measures ([`rotdpp`]) over a regular grid ([`grid`]).

pub mod config;
pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod index;
pub mod measures;
pub mod resolve;
pub mod rotdpp;
pub mod signal;
pub mod spectrum;

pub use config::GmConfig;
pub use error::GmError;
