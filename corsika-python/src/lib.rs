//! Python bindings for the CORSIKA raw stream reader.
//!
//! This module exposes block-level and particle-level access through PyO3,
//! with block payloads returned as numpy arrays.

use corsika_core::{
    Block as CoreBlock, Particle as CoreParticle, ParticleCursor, RawStream as CoreRawStream,
    StreamError,
};
use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::PyIOError;
use pyo3::prelude::*;
use std::fs::File;
use std::io::BufReader;

fn to_py_err(e: StreamError) -> PyErr {
    PyIOError::new_err(e.to_string())
}

/// A reusable block buffer.
///
/// Pass it to `RawStream.get_next_block` to fill it with the next block.
#[pyclass]
#[derive(Default)]
pub struct Block {
    inner: CoreBlock,
}

#[pymethods]
impl Block {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    /// Block tag: "RUNH", "EVTH", "EVTE", "RUNE", "LONG", or "" for particle data.
    #[getter(ID)]
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    /// Block kind name ("DATA" for particle data).
    #[getter]
    fn kind(&self) -> String {
        self.inner.kind.to_string()
    }

    /// Returns all words of the block as a float32 numpy array.
    ///
    /// Reshape with `data.reshape((-1, 7))` to get one row per particle.
    #[getter]
    fn data<'py>(&self, py: Python<'py>) -> &'py PyArray1<f32> {
        self.inner.data.clone().into_pyarray(py)
    }

    /// Returns the non-padding particles of this block.
    fn particles(&self) -> Vec<Particle> {
        self.inner
            .particle_view()
            .particles()
            .map(Particle::from)
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.data.len()
    }

    fn __repr__(&self) -> String {
        format!("Block(kind={}, words={})", self.inner.kind, self.inner.data.len())
    }
}

/// A single particle record.
#[pyclass]
#[derive(Clone)]
pub struct Particle {
    #[pyo3(get)]
    description: f32,
    #[pyo3(get)]
    px: f32,
    #[pyo3(get)]
    py: f32,
    #[pyo3(get)]
    pz: f32,
    #[pyo3(get)]
    x: f32,
    #[pyo3(get)]
    y: f32,
    #[pyo3(get)]
    t_or_z: f32,
    /// Thinning weight, None for unthinned files
    #[pyo3(get)]
    weight: Option<f32>,
}

impl From<CoreParticle> for Particle {
    fn from(p: CoreParticle) -> Self {
        Self {
            description: p.description,
            px: p.px,
            py: p.py,
            pz: p.pz,
            x: p.x,
            y: p.y,
            t_or_z: p.t_or_z,
            weight: p.weight,
        }
    }
}

#[pymethods]
impl Particle {
    fn __repr__(&self) -> String {
        format!(
            "Particle(description={}, px={}, py={}, pz={}, x={}, y={}, t_or_z={})",
            self.description, self.px, self.py, self.pz, self.x, self.y, self.t_or_z
        )
    }
}

/// Block stream over a CORSIKA raw file.
///
/// Example:
///     >>> import corsika
///     >>> raw = corsika.RawStream("DAT000001")
///     >>> block = corsika.Block()
///     >>> raw.get_next_block(block)  # RUNH
///     >>> raw.get_next_block(block)  # EVTH
///     >>> for p in raw.particles():
///     ...     print(p.px, p.py, p.pz)
#[pyclass]
pub struct RawStream {
    inner: CoreRawStream<BufReader<File>>,
}

#[pymethods]
impl RawStream {
    #[new]
    fn new(path: &str) -> PyResult<Self> {
        let inner = CoreRawStream::open(path).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Fills `block` with the next block. Returns False at end of file.
    fn get_next_block(&mut self, mut block: PyRefMut<'_, Block>) -> PyResult<bool> {
        self.inner
            .next_block_into(&mut block.inner)
            .map_err(to_py_err)
    }

    /// Number of the block read by the next call to `get_next_block`.
    fn get_next_position(&self) -> usize {
        self.inner.position()
    }

    /// Seeks so that the next block read is `position`.
    fn seek_to(&mut self, position: usize) -> PyResult<()> {
        self.inner.seek_to(position).map_err(to_py_err)
    }

    /// Closes the file. Closing twice raises an IOError.
    fn close(&mut self) -> PyResult<()> {
        self.inner.close().map_err(to_py_err)
    }

    #[getter]
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    #[getter]
    fn is_thinned(&self) -> bool {
        self.inner.is_thinned()
    }

    /// Iterates over particles from the current position, or from block
    /// `start` when given. The stream is not rewound otherwise.
    #[pyo3(signature = (start=None))]
    fn particles(mut slf: PyRefMut<'_, Self>, start: Option<usize>) -> PyResult<ParticleIterator> {
        if let Some(start) = start {
            slf.inner.seek_to(start).map_err(to_py_err)?;
        }
        Ok(ParticleIterator {
            stream: slf.into(),
            cursor: ParticleCursor::new(),
        })
    }
}

/// Lazy particle iterator sharing its stream with the owning `RawStream`.
#[pyclass]
pub struct ParticleIterator {
    stream: Py<RawStream>,
    cursor: ParticleCursor,
}

#[pymethods]
impl ParticleIterator {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(mut slf: PyRefMut<'_, Self>, py: Python<'_>) -> PyResult<Option<Particle>> {
        let stream = slf.stream.clone_ref(py);
        let mut stream = stream.try_borrow_mut(py)?;
        let particle = slf
            .cursor
            .next_particle(&mut stream.inner)
            .map_err(to_py_err)?;
        Ok(particle.map(Particle::from))
    }
}

/// CORSIKA raw file reader module for Python.
#[pymodule]
fn corsika(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<RawStream>()?;
    m.add_class::<Block>()?;
    m.add_class::<Particle>()?;
    m.add_class::<ParticleIterator>()?;
    Ok(())
}
