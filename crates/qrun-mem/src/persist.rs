//! Saved-state binary format.
//!
//! ```text
//! [ N : u64 LE ][ re_0 : f64 LE ][ im_0 : f64 LE ] ... [ re_{N-1} ][ im_{N-1} ]
//! ```
//!
//! No magic number or version: writer and reader must agree exactly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use num_complex::Complex64;

use crate::error::{MemError, MemResult};

const HEADER_BYTES: usize = 8;
const AMPLITUDE_BYTES: usize = 16;

/// Serialize amplitudes into the saved-state layout.
pub fn encode(amplitudes: &[Complex64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + amplitudes.len() * AMPLITUDE_BYTES);
    out.extend_from_slice(&(amplitudes.len() as u64).to_le_bytes());
    for amp in amplitudes {
        out.extend_from_slice(&amp.re.to_le_bytes());
        out.extend_from_slice(&amp.im.to_le_bytes());
    }
    out
}

/// Parse the saved-state layout. The blob length must match the header.
pub fn decode(bytes: &[u8]) -> MemResult<Vec<Complex64>> {
    let (header, body) = bytes
        .split_first_chunk::<HEADER_BYTES>()
        .ok_or_else(|| MemError::CorruptState("missing length header".to_string()))?;
    let count = u64::from_le_bytes(*header);

    let expected = usize::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(AMPLITUDE_BYTES))
        .ok_or_else(|| MemError::CorruptState(format!("implausible length {count}")))?;
    if body.len() != expected {
        return Err(MemError::CorruptState(format!(
            "header declares {count} amplitudes ({expected} bytes) but body has {} bytes",
            body.len()
        )));
    }

    Ok(body
        .chunks_exact(AMPLITUDE_BYTES)
        .map(|chunk| {
            let (re, im) = chunk.split_at(8);
            Complex64::new(f64_le(re), f64_le(im))
        })
        .collect())
}

fn f64_le(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    f64::from_le_bytes(buf)
}

/// Write amplitudes to `path`, replacing any existing file.
pub fn write_file(path: &Path, amplitudes: &[Complex64]) -> MemResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&encode(amplitudes))?;
    writer.flush()?;
    Ok(())
}

/// Read amplitudes from `path`.
pub fn read_file(path: &Path) -> MemResult<Vec<Complex64>> {
    decode(&std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_little_endian() {
        let bytes = encode(&[Complex64::new(1.0, -2.0)]);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], &1u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[16..24], &(-2.0f64).to_le_bytes());
    }

    #[test]
    fn test_decode_rejects_truncated_body() {
        let mut bytes = encode(&[Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5)]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(decode(&bytes), Err(MemError::CorruptState(_))));
    }

    #[test]
    fn test_decode_rejects_missing_header() {
        assert!(matches!(decode(&[1, 2, 3]), Err(MemError::CorruptState(_))));
    }

    #[test]
    fn test_decode_empty_vector() {
        assert!(decode(&encode(&[])).unwrap().is_empty());
    }
}
