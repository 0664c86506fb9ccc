//! Low-level decoding of CORSIKA records and blocks.
//!
//! A raw file is a sequence of FORTRAN unformatted records. Each record is
//! framed by a length marker on both sides and carries
//! [`BLOCKS_PER_RECORD`](crate::types::BLOCKS_PER_RECORD) fixed-size blocks:
//!
//! ```text
//! +-------------------+
//! | marker (4 or 8)   |  record payload length, little-endian
//! +-------------------+
//! | block 0           |  273 or 312 little-endian f32 words
//! | ...               |
//! | block 20          |
//! +-------------------+
//! | marker (4 or 8)   |  must equal the leading marker
//! +-------------------+
//! ```

use crate::stream::{Result, StreamError};
use crate::types::{Block, BlockKind, Format, Layout, MarkerWidth};
use byteorder::{ByteOrder, LittleEndian};

/// Detects the file format from the first 8 bytes of a file.
///
/// Candidates are tried in the order 64-bit thinned, 64-bit unthinned,
/// 32-bit thinned, 32-bit unthinned.
pub fn detect_format(head: &[u8; 8]) -> Option<Format> {
    let len64 = LittleEndian::read_u64(head);
    let len32 = LittleEndian::read_u32(&head[..4]) as u64;

    [
        (len64, Format::new(Layout::Thinned, MarkerWidth::Bits64)),
        (len64, Format::new(Layout::NotThinned, MarkerWidth::Bits64)),
        (len32, Format::new(Layout::Thinned, MarkerWidth::Bits32)),
        (len32, Format::new(Layout::NotThinned, MarkerWidth::Bits32)),
    ]
    .into_iter()
    .find(|(len, format)| *len == format.record_payload_bytes() as u64)
    .map(|(_, format)| format)
}

/// Reads a record-length marker.
#[inline]
pub fn read_marker(bytes: &[u8], width: MarkerWidth) -> u64 {
    match width {
        MarkerWidth::Bits32 => LittleEndian::read_u32(bytes) as u64,
        MarkerWidth::Bits64 => LittleEndian::read_u64(bytes),
    }
}

/// Validates a full record and returns its payload (the blocks, without markers).
pub fn record_payload(record: &[u8], format: Format) -> Result<&[u8]> {
    if record.len() != format.record_bytes() {
        return Err(StreamError::MalformedBlock {
            expected: format.record_bytes(),
            actual: record.len(),
        });
    }

    let width = format.marker.bytes();
    let start = read_marker(&record[..width], format.marker);
    let end = read_marker(&record[record.len() - width..], format.marker);
    if start != end {
        return Err(StreamError::MarkerMismatch { start, end });
    }

    Ok(&record[width..record.len() - width])
}

/// Classifies a block from its first four bytes.
#[inline]
pub fn classify(window: &[u8]) -> BlockKind {
    match window.get(..4) {
        Some(&[a, b, c, d]) => BlockKind::from_tag(&[a, b, c, d]),
        _ => BlockKind::ParticleData,
    }
}

/// Decodes one block-sized byte window into `out`, reusing its buffer.
pub fn decode_block_into(window: &[u8], layout: Layout, out: &mut Block) -> Result<()> {
    if window.len() != layout.block_bytes() {
        return Err(StreamError::MalformedBlock {
            expected: layout.block_bytes(),
            actual: window.len(),
        });
    }

    out.kind = classify(window);
    out.layout = layout;
    out.data.resize(layout.block_words(), 0.0);
    LittleEndian::read_f32_into(window, &mut out.data);
    Ok(())
}

/// Decodes one block-sized byte window into a fresh [`Block`].
pub fn decode_block(window: &[u8], layout: Layout) -> Result<Block> {
    let mut block = Block::new(layout);
    decode_block_into(window, layout, &mut block)?;
    Ok(block)
}
