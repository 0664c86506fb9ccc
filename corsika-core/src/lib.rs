//! Reader for CORSIKA air-shower simulation raw output.
//!
//! A CORSIKA raw file is a sequence of FORTRAN records, each holding 21
//! fixed-size blocks. Blocks are either headers (`RUNH`, `EVTH`, `EVTE`,
//! `RUNE`, `LONG`) or packed particle records. This crate decodes the framing,
//! classifies blocks and offers two access modes: block by block, or as one
//! flat particle sequence spanning block boundaries.
//!
//! # Example
//!
//! ```no_run
//! use corsika_core::RawStream;
//!
//! let mut stream = RawStream::open("DAT000001").unwrap();
//!
//! // Run header and event header
//! let runh = stream.next_block().unwrap().unwrap();
//! let evth = stream.next_block().unwrap().unwrap();
//! println!("run {:?}, event {:?}", runh.run_number(), evth.event_number());
//!
//! for particle in stream.particles() {
//!     let p = particle.unwrap();
//!     println!("{} {} {}", p.px, p.py, p.pz);
//! }
//! ```
//!
//! # Features
//!
//! - Unthinned and thinned layouts with 32- or 64-bit record markers,
//!   detected from the first record
//! - Reusable block buffers via [`RawStream::next_block_into`]
//! - Seeking by block number
//! - Lazy particle iteration that skips headers and padding records

pub mod output;
pub mod parser;
pub mod particles;
pub mod stream;
pub mod types;

// Unit tests share the integration tests' file builder, which names this
// crate by its external path.
#[cfg(test)]
extern crate self as corsika_core;
#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod common;
#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use output::OutputError;
pub use particles::{ParticleCursor, ParticleStream, ParticleView};
pub use stream::{Blocks, RawStream, Result, StreamError};
pub use types::{
    Block, BlockKind, Format, Layout, MarkerWidth, Particle, BLOCKS_PER_RECORD,
    PARTICLES_PER_BLOCK,
};
