//! Synthetic CORSIKA file builder shared by integration tests and benches.
#![allow(dead_code)]

use corsika_core::{Format, MarkerWidth, BLOCKS_PER_RECORD, PARTICLES_PER_BLOCK};

/// Builds a run with `events` showers of `blocks_per_event` full particle
/// blocks each. Particle `p` of block `b` in event `e` has
/// `px = e`, `py = b`, `pz = p`.
pub fn build_run(format: Format, events: usize, blocks_per_event: usize) -> Vec<u8> {
    let layout = format.layout;
    let words = layout.block_words();
    let wpp = layout.words_per_particle();

    let header = |tag: &[u8; 4], number: usize| {
        let mut block = vec![0.0f32; words];
        block[0] = f32::from_le_bytes(*tag);
        block[1] = number as f32;
        block
    };

    let mut blocks = vec![header(b"RUNH", 1)];
    for e in 0..events {
        blocks.push(header(b"EVTH", e + 1));
        for b in 0..blocks_per_event {
            let mut block = Vec::with_capacity(words);
            for p in 0..PARTICLES_PER_BLOCK {
                let mut particle = vec![1031.0, e as f32, b as f32, p as f32, 10.0, 20.0, 30.0];
                particle.resize(wpp, 1.0);
                block.extend(particle);
            }
            blocks.push(block);
        }
        blocks.push(header(b"EVTE", e + 1));
    }
    blocks.push(header(b"RUNE", 1));

    frame(format, &blocks)
}

/// Packs blocks into marker-framed records, zero-filling the last record.
pub fn frame(format: Format, blocks: &[Vec<f32>]) -> Vec<u8> {
    let marker = format.record_payload_bytes() as u64;
    let empty = vec![0.0f32; format.layout.block_words()];
    let mut out = Vec::new();

    let write_marker = |out: &mut Vec<u8>| match format.marker {
        MarkerWidth::Bits32 => out.extend_from_slice(&(marker as u32).to_le_bytes()),
        MarkerWidth::Bits64 => out.extend_from_slice(&marker.to_le_bytes()),
    };

    for record in blocks.chunks(BLOCKS_PER_RECORD) {
        write_marker(&mut out);
        for i in 0..BLOCKS_PER_RECORD {
            for word in record.get(i).unwrap_or(&empty) {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
        write_marker(&mut out);
    }
    out
}
