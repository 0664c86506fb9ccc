//! CSV export of decoded particles.

use crate::stream::StreamError;
use crate::types::{Layout, Particle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

/// CSV output writer for particle records.
pub struct ParticleCsvWriter<W: Write> {
    writer: BufWriter<W>,
    layout: Layout,
}

impl<W: Write> ParticleCsvWriter<W> {
    /// Creates a new CSV writer. Thinned layouts get an extra weight column.
    pub fn new(writer: W, layout: Layout) -> Self {
        Self {
            writer: BufWriter::new(writer),
            layout,
        }
    }

    pub fn write_header(&mut self) -> Result<(), OutputError> {
        match self.layout {
            Layout::NotThinned => writeln!(self.writer, "description,px,py,pz,x,y,t_or_z")?,
            Layout::Thinned => writeln!(self.writer, "description,px,py,pz,x,y,t_or_z,weight")?,
        }
        Ok(())
    }

    /// Writes a single particle.
    #[inline]
    pub fn write_particle(&mut self, p: &Particle) -> Result<(), OutputError> {
        write!(
            self.writer,
            "{},{},{},{},{},{},{}",
            p.description, p.px, p.py, p.pz, p.x, p.y, p.t_or_z
        )?;
        if self.layout == Layout::Thinned {
            write!(self.writer, ",{}", p.weight.unwrap_or(0.0))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes every particle of `particles` to a CSV file and returns the count.
///
/// Stops at the first stream error.
pub fn write_particles_csv<P, I>(path: P, layout: Layout, particles: I) -> Result<u64, OutputError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Result<Particle, StreamError>>,
{
    let file = File::create(path)?;
    let mut writer = ParticleCsvWriter::new(file, layout);
    writer.write_header()?;

    let mut count = 0u64;
    for particle in particles {
        writer.write_particle(&particle?)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
