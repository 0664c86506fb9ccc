//! Core types for CORSIKA block and particle data.
//!
//! This module defines the block kinds, the on-disk format parameters and the
//! particle record layout used by CORSIKA raw binary output.

use std::fmt;

/// Number of blocks (sub-blocks in CORSIKA terms) packed into one FORTRAN record.
pub const BLOCKS_PER_RECORD: usize = 21;

/// Number of particle records held by one particle-data block.
pub const PARTICLES_PER_BLOCK: usize = 39;

/// Kind of a block, classified once from its leading 4-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    /// Run header (`RUNH`)
    RunHeader,
    /// Event header (`EVTH`)
    EventHeader,
    /// Run end (`RUNE`)
    RunEnd,
    /// Event end (`EVTE`)
    EventEnd,
    /// Longitudinal distribution (`LONG`)
    Longitudinal,
    /// Anything else: packed particle records
    #[default]
    ParticleData,
}

impl BlockKind {
    /// Classifies a block from its leading tag bytes.
    #[inline]
    pub fn from_tag(tag: &[u8; 4]) -> Self {
        match tag {
            b"RUNH" => Self::RunHeader,
            b"EVTH" => Self::EventHeader,
            b"RUNE" => Self::RunEnd,
            b"EVTE" => Self::EventEnd,
            b"LONG" => Self::Longitudinal,
            _ => Self::ParticleData,
        }
    }

    /// Returns the 4-character tag, or an empty string for particle data.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RunHeader => "RUNH",
            Self::EventHeader => "EVTH",
            Self::RunEnd => "RUNE",
            Self::EventEnd => "EVTE",
            Self::Longitudinal => "LONG",
            Self::ParticleData => "",
        }
    }

    /// True for every kind that does not carry particle records.
    #[inline]
    pub fn is_header(&self) -> bool {
        !matches!(self, Self::ParticleData)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParticleData => f.write_str("DATA"),
            other => f.write_str(other.tag()),
        }
    }
}

/// Block payload layout.
///
/// Thinned files append a weight to every particle record, which grows the
/// block from 273 to 312 words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    NotThinned,
    Thinned,
}

impl Layout {
    /// Number of 32-bit words per particle record.
    #[inline]
    pub fn words_per_particle(&self) -> usize {
        match self {
            Self::NotThinned => 7,
            Self::Thinned => 8,
        }
    }

    /// Number of 32-bit words per block.
    #[inline]
    pub fn block_words(&self) -> usize {
        self.words_per_particle() * PARTICLES_PER_BLOCK
    }

    /// Number of bytes per block.
    #[inline]
    pub fn block_bytes(&self) -> usize {
        self.block_words() * 4
    }
}

/// Width of the FORTRAN record-length markers framing each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerWidth {
    #[default]
    Bits32,
    Bits64,
}

impl MarkerWidth {
    #[inline]
    pub fn bytes(&self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }
}

/// On-disk format of a CORSIKA raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Format {
    pub layout: Layout,
    pub marker: MarkerWidth,
}

impl Format {
    pub fn new(layout: Layout, marker: MarkerWidth) -> Self {
        Self { layout, marker }
    }

    /// Record payload size in bytes; also the value stored in each marker.
    #[inline]
    pub fn record_payload_bytes(&self) -> usize {
        self.layout.block_bytes() * BLOCKS_PER_RECORD
    }

    /// Full record size in bytes, markers included.
    #[inline]
    pub fn record_bytes(&self) -> usize {
        self.record_payload_bytes() + 2 * self.marker.bytes()
    }

    /// Byte offset of block `index` within a record.
    #[inline]
    pub fn block_offset(&self, index: usize) -> usize {
        self.marker.bytes() + index * self.layout.block_bytes()
    }
}

/// One decoded block.
///
/// `data` holds every word of the block, including the tag word of header
/// blocks. Its length is fixed by the stream's [`Layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub layout: Layout,
    pub data: Vec<f32>,
}

impl Default for Block {
    fn default() -> Self {
        Self::new(Layout::default())
    }
}

impl Block {
    /// Creates a zeroed particle-data block for the given layout.
    pub fn new(layout: Layout) -> Self {
        Self {
            kind: BlockKind::ParticleData,
            layout,
            data: vec![0.0; layout.block_words()],
        }
    }

    /// The block tag (`RUNH`, `EVTH`, ...), empty for particle data.
    #[inline]
    pub fn id(&self) -> &'static str {
        self.kind.tag()
    }

    /// Returns a CORSIKA header word using the manual's 1-based numbering.
    pub fn word(&self, n: usize) -> Option<f32> {
        n.checked_sub(1).and_then(|i| self.data.get(i)).copied()
    }

    /// Run number stored in word 2 of `RUNH` and `RUNE` blocks.
    pub fn run_number(&self) -> Option<u32> {
        match self.kind {
            BlockKind::RunHeader | BlockKind::RunEnd => self.word(2).map(|w| w as u32),
            _ => None,
        }
    }

    /// Event number stored in word 2 of `EVTH` and `EVTE` blocks.
    pub fn event_number(&self) -> Option<u32> {
        match self.kind {
            BlockKind::EventHeader | BlockKind::EventEnd => self.word(2).map(|w| w as u32),
            _ => None,
        }
    }

    /// True if every word is zero (unused trailing block of a record).
    pub fn is_padding(&self) -> bool {
        self.data.iter().all(|&w| w == 0.0)
    }
}

/// A single particle record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    /// Particle description word (type and flags)
    pub description: f32,
    /// Momentum x component
    pub px: f32,
    /// Momentum y component
    pub py: f32,
    /// Momentum z component
    pub pz: f32,
    /// Position x
    pub x: f32,
    /// Position y
    pub y: f32,
    /// Time or height, depending on the run configuration
    pub t_or_z: f32,
    /// Thinning weight, present only for thinned files
    pub weight: Option<f32>,
}

impl Particle {
    /// Builds a particle from one record's worth of words.
    ///
    /// # Panics
    ///
    /// Panics if `words` holds fewer than 7 words. An eighth word, if
    /// present, is the thinning weight; further words are ignored.
    #[inline]
    pub fn from_words(words: &[f32]) -> Self {
        debug_assert!(
            words.len() >= 7,
            "particle record needs at least 7 words, got {}",
            words.len()
        );
        Self {
            description: words[0],
            px: words[1],
            py: words[2],
            pz: words[3],
            x: words[4],
            y: words[5],
            t_or_z: words[6],
            weight: words.get(7).copied(),
        }
    }

    /// True for the all-zero records filling unused slots of a block.
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.description == 0.0
            && self.px == 0.0
            && self.py == 0.0
            && self.pz == 0.0
            && self.x == 0.0
            && self.y == 0.0
            && self.t_or_z == 0.0
            && self.weight.unwrap_or(0.0) == 0.0
    }
}
