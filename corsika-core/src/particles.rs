//! Particle access on top of block iteration.
//!
//! [`ParticleView`] reinterprets one block as particle records.
//! [`ParticleCursor`] and [`ParticleStream`] pull blocks from a [`RawStream`]
//! on demand and flatten their particles into one sequence.

use crate::stream::{RawStream, Result, StreamError};
use crate::types::{Block, Particle};
use std::io::{Read, Seek};

/// Read-only view of a block's words as particle records.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView<'a> {
    block: &'a Block,
}

impl<'a> ParticleView<'a> {
    pub fn new(block: &'a Block) -> Self {
        Self { block }
    }

    /// Number of record slots in the block, padding included.
    #[inline]
    pub fn len(&self) -> usize {
        self.block.data.len() / self.block.layout.words_per_particle()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns record slot `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Particle> {
        let wpp = self.block.layout.words_per_particle();
        let start = index * wpp;
        self.block
            .data
            .get(start..start + wpp)
            .map(Particle::from_words)
    }

    /// All record slots in order, padding included.
    pub fn records(&self) -> impl Iterator<Item = Particle> + 'a {
        let block = self.block;
        block
            .data
            .chunks_exact(block.layout.words_per_particle())
            .map(Particle::from_words)
    }

    /// Records with padding slots removed.
    pub fn particles(&self) -> impl Iterator<Item = Particle> + 'a {
        self.records().filter(|p| !p.is_padding())
    }
}

impl Block {
    /// Views this block's words as particle records.
    pub fn particle_view(&self) -> ParticleView<'_> {
        ParticleView::new(self)
    }
}

/// Resumable particle iteration state.
///
/// The cursor holds the block currently being drained and pulls the next one
/// from whatever stream it is given. Callers must pass the same stream on
/// every call.
#[derive(Debug, Default)]
pub struct ParticleCursor {
    block: Block,
    index: usize,
    loaded: bool,
    done: bool,
}

impl ParticleCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the underlying stream ended or failed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the next non-padding particle, pulling blocks as needed.
    pub fn next_particle<R: Read + Seek>(
        &mut self,
        stream: &mut RawStream<R>,
    ) -> Result<Option<Particle>> {
        if !stream.is_open() {
            self.done = true;
            return Err(StreamError::StreamClosed);
        }

        loop {
            if self.loaded {
                let view = ParticleView::new(&self.block);
                while let Some(particle) = view.get(self.index) {
                    self.index += 1;
                    if !particle.is_padding() {
                        return Ok(Some(particle));
                    }
                }
                self.loaded = false;
            }

            if self.done {
                return Ok(None);
            }

            match stream.next_block_into(&mut self.block) {
                Ok(true) if self.block.kind.is_header() => {}
                Ok(true) => {
                    self.loaded = true;
                    self.index = 0;
                }
                Ok(false) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }
}

/// Lazy particle iterator borrowing a [`RawStream`].
///
/// Yields nothing further after the first error.
pub struct ParticleStream<'a, R> {
    stream: &'a mut RawStream<R>,
    cursor: ParticleCursor,
}

impl<'a, R: Read + Seek> ParticleStream<'a, R> {
    pub fn new(stream: &'a mut RawStream<R>, cursor: ParticleCursor) -> Self {
        Self { stream, cursor }
    }

    /// Block position of the underlying stream.
    pub fn position(&self) -> usize {
        self.stream.position()
    }
}

impl<R: Read + Seek> Iterator for ParticleStream<'_, R> {
    type Item = Result<Particle>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_particle(self.stream).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_file, header_words, particle_words, simple_shower};
    use crate::types::{Format, Layout, MarkerWidth, PARTICLES_PER_BLOCK};
    use std::io::Cursor;

    fn open(format: Format, blocks: &[Vec<f32>]) -> RawStream<Cursor<Vec<u8>>> {
        RawStream::from_reader(Cursor::new(build_file(format, blocks))).unwrap()
    }

    #[test]
    fn test_view_records() {
        let layout = Layout::NotThinned;
        let mut block = Block::new(layout);
        block.data = particle_words(
            layout,
            &[
                vec![1031.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                vec![5031.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0],
            ],
        );

        let view = block.particle_view();
        assert_eq!(view.len(), PARTICLES_PER_BLOCK);
        assert_eq!(view.records().count(), PARTICLES_PER_BLOCK);
        assert_eq!(view.particles().count(), 2);

        let second = view.get(1).unwrap();
        assert_eq!(second.description, 5031.0);
        assert_eq!(second.t_or_z, 12.0);
        assert_eq!(second.weight, None);
        assert!(view.get(2).unwrap().is_padding());
        assert!(view.get(PARTICLES_PER_BLOCK).is_none());

        // Re-deriving the view yields the same records.
        let first: Vec<_> = block.particle_view().records().collect();
        let again: Vec<_> = block.particle_view().records().collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_thinned_view() {
        let layout = Layout::Thinned;
        let mut block = Block::new(layout);
        block.data = particle_words(layout, &[vec![1031.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.25]]);
        let particles: Vec<_> = block.particle_view().particles().collect();
        assert_eq!(particles.len(), 1);
        assert_eq!(particles[0].weight, Some(0.25));
    }

    #[test]
    fn test_stream_skips_headers_and_padding() {
        let format = Format::default();
        let layout = format.layout;
        let blocks = vec![
            header_words(b"RUNH", layout, &[]),
            header_words(b"EVTH", layout, &[(2, 1.0)]),
            particle_words(layout, &[vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]]),
            header_words(b"LONG", layout, &[]),
            particle_words(
                layout,
                &[
                    vec![2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                    vec![0.0; 7],
                    vec![3.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                ],
            ),
            header_words(b"EVTE", layout, &[]),
            header_words(b"EVTH", layout, &[(2, 2.0)]),
            particle_words(layout, &[vec![4.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]]),
            header_words(b"EVTE", layout, &[]),
            header_words(b"RUNE", layout, &[]),
        ];

        let mut stream = open(format, &blocks);
        let descriptions: Vec<f32> = stream
            .particles()
            .map(|p| p.unwrap().description)
            .collect();
        assert_eq!(descriptions, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_stream_counts_across_records() {
        let format = Format::new(Layout::Thinned, MarkerWidth::Bits64);
        let mut stream = open(format, &simple_shower(format, 40));
        let particles: Vec<_> = stream.particles().map(|p| p.unwrap()).collect();
        assert_eq!(particles.len(), 40 * PARTICLES_PER_BLOCK);
        assert!(particles.iter().all(|p| !p.is_padding()));
        assert!(particles.iter().all(|p| p.weight.is_some()));
    }

    #[test]
    fn test_particles_continue_from_stream_position() {
        let format = Format::default();
        let mut stream = open(format, &simple_shower(format, 3));

        // Consume RUNH, EVTH and the first particle block.
        for _ in 0..3 {
            stream.next_block().unwrap();
        }
        let first: Vec<_> = stream.particles().map(|p| p.unwrap()).collect();
        assert_eq!(first.len(), 2 * PARTICLES_PER_BLOCK);
        assert_eq!(first[0].px, 1.0);

        // The first call drained the stream; a second call sees nothing.
        assert_eq!(stream.particles().count(), 0);
    }

    #[test]
    fn test_particles_from() {
        let format = Format::default();
        let mut stream = open(format, &simple_shower(format, 3));
        while stream.next_block().unwrap().is_some() {}

        let particles: Vec<_> = stream.particles_from(4).unwrap().map(|p| p.unwrap()).collect();
        assert_eq!(particles.len(), PARTICLES_PER_BLOCK);
        assert_eq!(particles[0].px, 2.0);
    }

    #[test]
    fn test_cursor_reports_closed_stream() {
        let format = Format::default();
        let mut stream = open(format, &simple_shower(format, 2));
        let mut cursor = ParticleCursor::new();

        assert!(cursor.next_particle(&mut stream).unwrap().is_some());
        stream.close().unwrap();
        assert!(matches!(
            cursor.next_particle(&mut stream),
            Err(StreamError::StreamClosed)
        ));
        assert!(cursor.is_done());
    }
}
