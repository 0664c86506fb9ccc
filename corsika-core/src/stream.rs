//! Sequential block stream over a CORSIKA raw file.
//!
//! [`RawStream`] owns the byte source, loads one FORTRAN record at a time and
//! hands out its blocks in order. Positions count blocks, not bytes.

use crate::parser;
use crate::particles::{ParticleCursor, ParticleStream};
use crate::types::{Block, BlockKind, Format, Layout, BLOCKS_PER_RECORD};
use log::{debug, trace, warn};
use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading a CORSIKA stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot open CORSIKA stream: {0}")]
    Open(String),

    #[error("Truncated block at end of file: {available} of {expected} bytes")]
    TruncatedBlock { expected: usize, available: usize },

    #[error("Malformed block: expected {expected} bytes, got {actual}")]
    MalformedBlock { expected: usize, actual: usize },

    #[error("Record length markers disagree: {start} != {end}")]
    MarkerMismatch { start: u64, end: u64 },

    #[error("Stream is closed")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, StreamError>;

/// Block stream over a seekable byte source.
#[derive(Debug)]
pub struct RawStream<R> {
    source: Option<R>,
    format: Format,

    // Current record buffer, markers included
    record: Vec<u8>,
    record_valid: bool,

    // Cursor: next block is `record_index * BLOCKS_PER_RECORD + block_index`
    record_index: usize,
    block_index: usize,

    exhausted: bool,
}

impl RawStream<BufReader<File>> {
    /// Opens a raw file, detecting its format from the first record.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| StreamError::Open(format!("{}: {}", path.display(), e)))?;
        debug!("opening CORSIKA file {}", path.display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> RawStream<R> {
    /// Creates a stream over `reader`, detecting the format from its first
    /// 8 bytes. The reader must be positioned at the start of the file.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let mut head = [0u8; 8];
        let n = read_full(&mut reader, &mut head).map_err(|e| StreamError::Open(e.to_string()))?;
        if n < head.len() {
            return Err(StreamError::Open(
                "file is shorter than one block".to_string(),
            ));
        }

        let format = parser::detect_format(&head).ok_or_else(|| {
            StreamError::Open("can't determine type of CORSIKA file".to_string())
        })?;
        debug!(
            "detected {:?} layout with {}-byte record markers",
            format.layout,
            format.marker.bytes()
        );

        Self::start(reader, format, &head)
    }

    /// Creates a stream over `reader` with an explicit format.
    pub fn with_format(reader: R, format: Format) -> Result<Self> {
        Self::start(reader, format, &[])
    }

    /// Loads and validates the first record. `head` holds bytes already
    /// consumed from the reader.
    fn start(mut reader: R, format: Format, head: &[u8]) -> Result<Self> {
        let mut record = vec![0u8; format.record_bytes()];
        record[..head.len()].copy_from_slice(head);

        let n = read_full(&mut reader, &mut record[head.len()..])
            .map_err(|e| StreamError::Open(e.to_string()))?;
        if head.len() + n < record.len() {
            return Err(StreamError::Open(
                "file is shorter than one record".to_string(),
            ));
        }

        let payload = parser::record_payload(&record, format)
            .map_err(|e| StreamError::Open(e.to_string()))?;
        if parser::classify(payload) != BlockKind::RunHeader {
            return Err(StreamError::Open(
                "first block is not a run header".to_string(),
            ));
        }

        Ok(Self {
            source: Some(reader),
            format,
            record,
            record_valid: true,
            record_index: 0,
            block_index: 0,
            exhausted: false,
        })
    }

    /// The detected or configured file format.
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_thinned(&self) -> bool {
        self.format.layout == Layout::Thinned
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Number of the block returned by the next read.
    pub fn position(&self) -> usize {
        self.record_index * BLOCKS_PER_RECORD + self.block_index
    }

    /// Reads the next block into `block`.
    ///
    /// Returns `Ok(false)` at end of stream. After an error the stream is
    /// finished and keeps returning `Ok(false)` until it is repositioned.
    pub fn next_block_into(&mut self, block: &mut Block) -> Result<bool> {
        let reader = self.source.as_mut().ok_or(StreamError::StreamClosed)?;
        if self.exhausted {
            return Ok(false);
        }

        if !self.record_valid {
            // A failed read leaves the reader inside the record; end the stream.
            let n = match read_full(reader, &mut self.record) {
                Ok(n) => n,
                Err(e) => {
                    warn!("read error in record {}: {}", self.record_index, e);
                    self.exhausted = true;
                    return Err(e.into());
                }
            };
            if n == 0 {
                self.exhausted = true;
                return Ok(false);
            }
            if n < self.record.len() {
                warn!(
                    "truncated record {} at end of file: {} of {} bytes",
                    self.record_index,
                    n,
                    self.record.len()
                );
                self.exhausted = true;
                return Err(StreamError::TruncatedBlock {
                    expected: self.record.len(),
                    available: n,
                });
            }
            if let Err(e) = parser::record_payload(&self.record, self.format) {
                warn!("record {}: {}", self.record_index, e);
                self.exhausted = true;
                return Err(e);
            }
            trace!("loaded record {}", self.record_index);
            self.record_valid = true;
        }

        let layout = self.format.layout;
        let offset = self.format.block_offset(self.block_index);
        parser::decode_block_into(
            &self.record[offset..offset + layout.block_bytes()],
            layout,
            block,
        )?;

        self.block_index += 1;
        if self.block_index == BLOCKS_PER_RECORD {
            self.record_index += 1;
            self.block_index = 0;
            self.record_valid = false;
        }
        Ok(true)
    }

    /// Reads the next block, or `None` at end of stream.
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        let mut block = Block::new(self.format.layout);
        Ok(self.next_block_into(&mut block)?.then_some(block))
    }

    /// Repositions the stream so the next block read is `position`.
    pub fn seek_to(&mut self, position: usize) -> Result<()> {
        let reader = self.source.as_mut().ok_or(StreamError::StreamClosed)?;
        let record_index = position / BLOCKS_PER_RECORD;
        let offset = record_index
            .checked_mul(self.format.record_bytes())
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| {
                io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("block {} is past any addressable offset", position),
                )
            })?;
        reader.seek(SeekFrom::Start(offset))?;
        trace!("seek to block {} (byte offset {})", position, offset);

        self.record_index = record_index;
        self.block_index = position % BLOCKS_PER_RECORD;
        self.record_valid = false;
        self.exhausted = false;
        Ok(())
    }

    /// Releases the byte source. Closing twice fails with `StreamClosed`.
    pub fn close(&mut self) -> Result<()> {
        self.source
            .take()
            .map(drop)
            .ok_or(StreamError::StreamClosed)
    }

    /// Iterates over the remaining blocks.
    pub fn blocks(&mut self) -> Blocks<'_, R> {
        Blocks {
            stream: self,
            done: false,
        }
    }

    /// Iterates over particles from the current position onwards.
    ///
    /// Header blocks are skipped and padding records filtered. The stream is
    /// not rewound, so successive calls continue where the previous one
    /// stopped.
    pub fn particles(&mut self) -> ParticleStream<'_, R> {
        ParticleStream::new(self, ParticleCursor::new())
    }

    /// Seeks to block `start` and iterates over particles from there.
    pub fn particles_from(&mut self, start: usize) -> Result<ParticleStream<'_, R>> {
        self.seek_to(start)?;
        Ok(self.particles())
    }
}

/// Iterator over the blocks of a [`RawStream`].
pub struct Blocks<'a, R> {
    stream: &'a mut RawStream<R>,
    done: bool,
}

impl<R: Read + Seek> Iterator for Blocks<'_, R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stream.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
