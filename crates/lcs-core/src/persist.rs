//! Binary persistence.
//!
//! A saved system is laid out little-endian as:
//!
//! ```text
//! magic "LCS1" | version u32
//! x_dim u32 | y_dim u32 | n_actions u32 | time u64
//! count u64
//! count × classifier:
//!     numerosity u32 | fitness f64 | error f64 | experience u64 | time_stamp u64
//!     action u32 | rates: len u32, len × f64
//!     condition blob: len u64, bytes | prediction blob: len u64, bytes
//! ```
//!
//! Condition and prediction blobs are opaque here; their layout belongs to the
//! representation that wrote them and starts with a representation tag.

use std::io::{Read, Write};

use crate::{
    classifier::Classifier,
    error::LcsError,
    param::{Dimensions, Params},
    sam::MutationRates,
};

pub(crate) const MAGIC: [u8; 4] = *b"LCS1";
pub(crate) const VERSION: u32 = 1;

/// Upper bound on a single length prefix; anything larger is a corrupt file.
const MAX_LEN: u64 = 1 << 32;

#[derive(Debug)]
pub(crate) struct Encoder<W> {
    inner: W,
}

impl<W> Encoder<W>
where
    W: Write,
{
    pub(crate) fn new(inner: W) -> Self {
        Self { inner }
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> Result<(), LcsError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub(crate) fn u32(&mut self, value: u32) -> Result<(), LcsError> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn u64(&mut self, value: u64) -> Result<(), LcsError> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn usize(&mut self, value: usize) -> Result<(), LcsError> {
        let value = u32::try_from(value)
            .map_err(|_| LcsError::malformed(format!("value {value} does not fit in 32 bits")))?;
        self.u32(value)
    }

    pub(crate) fn f64(&mut self, value: f64) -> Result<(), LcsError> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn f64s(&mut self, values: &[f64]) -> Result<(), LcsError> {
        self.usize(values.len())?;
        values.iter().try_for_each(|v| self.f64(*v))
    }

    pub(crate) fn blob(&mut self, blob: &[u8]) -> Result<(), LcsError> {
        self.u64(blob.len() as u64)?;
        self.bytes(blob)
    }
}

#[derive(Debug)]
pub(crate) struct Decoder<R> {
    inner: R,
}

impl<R> Decoder<R>
where
    R: Read,
{
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], LcsError> {
        let mut buf = [0; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, LcsError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32, LcsError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, LcsError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn usize(&mut self) -> Result<usize, LcsError> {
        Ok(self.u32()? as usize)
    }

    pub(crate) fn f64(&mut self) -> Result<f64, LcsError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    pub(crate) fn f64s(&mut self) -> Result<Vec<f64>, LcsError> {
        let len = self.usize()?;
        (0..len).map(|_| self.f64()).collect()
    }

    pub(crate) fn blob(&mut self) -> Result<Vec<u8>, LcsError> {
        let len = self.u64()?;
        if len > MAX_LEN {
            return Err(LcsError::malformed(format!("blob length {len} too large")));
        }
        let mut blob = Vec::new();
        let read = (&mut self.inner).take(len).read_to_end(&mut blob)?;
        if read as u64 != len {
            return Err(LcsError::malformed("unexpected end of data"));
        }
        Ok(blob)
    }

    /// Errors unless every byte has been consumed.
    pub(crate) fn finish(mut self) -> Result<(), LcsError> {
        let mut rest = [0; 1];
        if self.inner.read(&mut rest)? != 0 {
            return Err(LcsError::malformed("trailing bytes after data"));
        }
        Ok(())
    }
}

pub(crate) fn write_header<W>(
    enc: &mut Encoder<W>,
    dims: Dimensions,
    time: u64,
) -> Result<(), LcsError>
where
    W: Write,
{
    enc.bytes(&MAGIC)?;
    enc.u32(VERSION)?;
    enc.usize(dims.x_dim)?;
    enc.usize(dims.y_dim)?;
    enc.usize(dims.n_actions)?;
    enc.u64(time)
}

pub(crate) fn read_header<R>(dec: &mut Decoder<R>) -> Result<(Dimensions, u64), LcsError>
where
    R: Read,
{
    if dec.array::<4>()? != MAGIC {
        return Err(LcsError::malformed("missing magic bytes"));
    }
    let version = dec.u32()?;
    if version != VERSION {
        return Err(LcsError::malformed(format!(
            "unsupported format version {version}"
        )));
    }
    let dims = Dimensions {
        x_dim: dec.usize()?,
        y_dim: dec.usize()?,
        n_actions: dec.usize()?,
    };
    let time = dec.u64()?;
    Ok((dims, time))
}

pub(crate) fn write_classifier<W>(enc: &mut Encoder<W>, cl: &Classifier) -> Result<(), LcsError>
where
    W: Write,
{
    enc.u32(cl.numerosity())?;
    enc.f64(cl.fitness())?;
    enc.f64(cl.error())?;
    enc.u64(cl.experience())?;
    enc.u64(cl.time_stamp())?;
    enc.usize(cl.action())?;
    enc.f64s(cl.mutation_rates().as_slice())?;
    enc.blob(&cl.condition().to_blob())?;
    enc.blob(&cl.prediction().to_blob())
}

pub(crate) fn read_classifier<R>(
    dec: &mut Decoder<R>,
    dims: Dimensions,
    params: &Params,
) -> Result<Classifier, LcsError>
where
    R: Read,
{
    let numerosity = dec.u32()?;
    let fitness = dec.f64()?;
    let error = dec.f64()?;
    let experience = dec.u64()?;
    let time_stamp = dec.u64()?;
    let action = dec.usize()?;
    let rates = dec.f64s()?;
    let condition = params
        .condition
        .kind
        .from_blob(dims.x_dim, &params.condition, &dec.blob()?)?;
    let prediction = params
        .prediction
        .kind
        .from_blob(dims, &params.prediction, &dec.blob()?)?;

    if numerosity == 0 {
        return Err(LcsError::malformed("classifier with zero numerosity"));
    }
    if !(fitness.is_finite() && fitness >= 0.0 && error.is_finite() && error >= 0.0) {
        return Err(LcsError::malformed(format!(
            "invalid fitness {fitness} or error {error}"
        )));
    }
    if action >= dims.n_actions {
        return Err(LcsError::malformed(format!("action {action} out of range")));
    }
    if rates.len() != params.ea.num_sam
        || rates
            .iter()
            .any(|mu| !(params.ea.mutation_floor..=1.0).contains(mu))
    {
        return Err(LcsError::malformed("invalid mutation rates"));
    }

    Ok(Classifier {
        condition,
        prediction,
        action,
        fitness,
        error,
        numerosity,
        experience,
        time_stamp,
        mutation_rates: MutationRates::from_vec(rates),
    })
}

/// Appends `values` to a representation blob in the [`Decoder::f64s`] layout.
#[expect(clippy::cast_possible_truncation)]
pub(crate) fn push_f64s(blob: &mut Vec<u8>, values: &[f64]) {
    blob.extend((values.len() as u32).to_le_bytes());
    for value in values {
        blob.extend(value.to_le_bytes());
    }
}
