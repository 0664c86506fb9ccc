//! Synthetic CORSIKA files for unit tests.

use crate::types::{Format, Layout};

pub use crate::common::frame as build_file;

/// Words of a header block: tag in word 1, plus `(1-based word, value)` pairs.
pub fn header_words(tag: &[u8; 4], layout: Layout, fields: &[(usize, f32)]) -> Vec<f32> {
    let mut words = vec![0.0f32; layout.block_words()];
    words[0] = f32::from_le_bytes(*tag);
    for &(n, value) in fields {
        words[n - 1] = value;
    }
    words
}

/// Words of a particle block holding `particles`, zero padded.
pub fn particle_words(layout: Layout, particles: &[Vec<f32>]) -> Vec<f32> {
    let mut words = Vec::with_capacity(layout.block_words());
    for particle in particles {
        words.extend_from_slice(particle);
    }
    words.resize(layout.block_words(), 0.0);
    words
}

pub fn encode_words(words: &[f32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// A single-event shower: RUNH, EVTH, `n_particle_blocks` full particle
/// blocks, EVTE, RUNE.
pub fn simple_shower(format: Format, n_particle_blocks: usize) -> Vec<Vec<f32>> {
    let layout = format.layout;
    let wpp = layout.words_per_particle();
    let mut blocks = vec![
        header_words(b"RUNH", layout, &[(2, 1.0)]),
        header_words(b"EVTH", layout, &[(2, 1.0)]),
    ];
    for b in 0..n_particle_blocks {
        let particles: Vec<Vec<f32>> = (0..crate::types::PARTICLES_PER_BLOCK)
            .map(|p| {
                let mut words = vec![1031.0, b as f32, p as f32, 1.0, 2.0, 3.0, 4.0];
                words.resize(wpp, 1.0);
                words
            })
            .collect();
        blocks.push(particle_words(layout, &particles));
    }
    blocks.push(header_words(b"EVTE", layout, &[(2, 1.0)]));
    blocks.push(header_words(b"RUNE", layout, &[(2, 1.0), (3, 1.0)]));
    blocks
}
