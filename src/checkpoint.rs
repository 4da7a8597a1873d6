//! Binary checkpoint of the adaptive state.
//!
//! ```text
//! offset size field
//! 0      4    magic "ADFC"
//! 4      1    byte order: 1 = little-endian, 2 = big-endian
//! 5      1    format version
//! 6      1    variant tag: 0 LMS, 1 NLMS, 2 Sign-LMS, 3 RLS
//! 7      1    element width in bytes: 4 or 8
//! 8      4    order N (u32, declared byte order)
//! 12     N·w  coefficients
//! …      N²·w RLS only: P, row-major
//! ```
//!
//! The delay line and monitor statistics are not part of a checkpoint; a
//! restored filter starts from an empty history.

use alloc::vec::Vec;

use crate::config::{Precision, Variant};
use crate::error::CheckpointError;

pub const MAGIC: [u8; 4] = *b"ADFC";
pub const FORMAT_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 12;

/// Byte order of header integers and payload elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    fn marker(self) -> u8 {
        match self {
            ByteOrder::Little => 1,
            ByteOrder::Big => 2,
        }
    }

    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            1 => Some(ByteOrder::Little),
            2 => Some(ByteOrder::Big),
            _ => None,
        }
    }
}

/// Decoded checkpoint contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub variant: Variant,
    pub precision: Precision,
    pub coefficients: Vec<f64>,
    /// Row-major `P`, present exactly for RLS.
    pub inverse_correlation: Option<Vec<f64>>,
}

impl Checkpoint {
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Serialize with the given byte order.
    ///
    /// With [`Precision::Single`] elements are written as `f32`; values held
    /// by a single-precision filter are already representable, so nothing is
    /// lost.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::OrderTooLarge`] if the order does not fit the
    /// header's 32-bit field.
    pub fn to_bytes(&self, order: ByteOrder) -> Result<Vec<u8>, CheckpointError> {
        let width = self.precision.width() as usize;
        let n = self.order();
        let n32 = header_order(n)?;
        let p_len = self.inverse_correlation.as_ref().map_or(0, Vec::len);
        let mut out = Vec::with_capacity(HEADER_LEN + (n + p_len) * width);

        out.extend_from_slice(&MAGIC);
        out.push(order.marker());
        out.push(FORMAT_VERSION);
        out.push(self.variant.tag());
        out.push(self.precision.width());
        out.extend_from_slice(&match order {
            ByteOrder::Little => n32.to_le_bytes(),
            ByteOrder::Big => n32.to_be_bytes(),
        });

        let values = self
            .coefficients
            .iter()
            .chain(self.inverse_correlation.iter().flatten());
        for &v in values {
            write_element(&mut out, v, self.precision, order);
        }
        Ok(out)
    }

    /// Decode and validate a checkpoint.
    ///
    /// # Errors
    ///
    /// Fails on a malformed header, a payload whose length does not match
    /// the header exactly, or any non-finite element.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        if bytes.len() < HEADER_LEN || bytes[0..4] != MAGIC {
            return Err(CheckpointError::BadMagic);
        }
        let order = ByteOrder::from_marker(bytes[4]).ok_or(CheckpointError::ByteOrder(bytes[4]))?;
        if bytes[5] != FORMAT_VERSION {
            return Err(CheckpointError::Version(bytes[5]));
        }
        let variant = Variant::from_tag(bytes[6]).ok_or(CheckpointError::UnknownVariant(bytes[6]))?;
        let precision = match bytes[7] {
            4 => Precision::Single,
            8 => Precision::Double,
            other => return Err(CheckpointError::ElementWidth(other)),
        };
        let n_bytes = [bytes[8], bytes[9], bytes[10], bytes[11]];
        let n = match order {
            ByteOrder::Little => u32::from_le_bytes(n_bytes),
            ByteOrder::Big => u32::from_be_bytes(n_bytes),
        } as usize;

        let elements = match variant {
            Variant::Rls => n.checked_mul(n).and_then(|p| p.checked_add(n)),
            _ => Some(n),
        };
        let expected = elements
            .and_then(|e| e.checked_mul(precision.width() as usize))
            .and_then(|e| e.checked_add(HEADER_LEN))
            .unwrap_or(usize::MAX);
        if bytes.len() != expected {
            return Err(CheckpointError::Length {
                expected,
                actual: bytes.len(),
            });
        }

        let mut values = bytes[HEADER_LEN..]
            .chunks_exact(precision.width() as usize)
            .map(|chunk| read_element(chunk, order));
        let coefficients: Vec<f64> = values.by_ref().take(n).collect();
        let inverse_correlation = match variant {
            Variant::Rls => Some(values.collect::<Vec<f64>>()),
            _ => None,
        };

        let all_finite = coefficients
            .iter()
            .chain(inverse_correlation.iter().flatten())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(CheckpointError::NonFinite);
        }

        Ok(Self {
            variant,
            precision,
            coefficients,
            inverse_correlation,
        })
    }
}

fn header_order(n: usize) -> Result<u32, CheckpointError> {
    u32::try_from(n).map_err(|_| CheckpointError::OrderTooLarge(n))
}

fn write_element(out: &mut Vec<u8>, value: f64, precision: Precision, order: ByteOrder) {
    match (precision, order) {
        (Precision::Single, ByteOrder::Little) => out.extend_from_slice(&(value as f32).to_le_bytes()),
        (Precision::Single, ByteOrder::Big) => out.extend_from_slice(&(value as f32).to_be_bytes()),
        (Precision::Double, ByteOrder::Little) => out.extend_from_slice(&value.to_le_bytes()),
        (Precision::Double, ByteOrder::Big) => out.extend_from_slice(&value.to_be_bytes()),
    }
}

/// `chunk` is exactly 4 or 8 bytes.
fn read_element(chunk: &[u8], order: ByteOrder) -> f64 {
    if let Ok(raw) = <[u8; 4]>::try_from(chunk) {
        let v = match order {
            ByteOrder::Little => f32::from_le_bytes(raw),
            ByteOrder::Big => f32::from_be_bytes(raw),
        };
        return v as f64;
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(chunk);
    match order {
        ByteOrder::Little => f64::from_le_bytes(raw),
        ByteOrder::Big => f64::from_be_bytes(raw),
    }
}
