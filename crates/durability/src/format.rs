//! Weight checkpoint encoding
//!
//! ## Checkpoint Format (Version 0x0001)
//!
//! ```text
//! [Magic: "DRWV"]
//! [Version: u16 LE]
//! [Reserved: u16 LE, zero]
//! [Dims: u64 LE]
//! [Epoch: u64 LE]
//! [Nnz: u64 LE]
//! [Indptr Length: u64 LE]
//! [Data: nnz * f32 LE]
//! [Indices: nnz * u32 LE]
//! [Indptr: indptr_len * u64 LE]
//! [CRC32 of everything above: u32 LE]
//! ```
//!
//! `data`, `indices` and `indptr` are the one-row CSR triple of the weight
//! vector, so a decoded checkpoint reproduces the same stored positions and
//! values bit for bit.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use duelrank_core::{Error, Result, WeightVector};
use std::io::{Cursor, Read};

/// File magic
pub const CHECKPOINT_MAGIC: [u8; 4] = *b"DRWV";

/// Current format version
pub const CHECKPOINT_FORMAT_VERSION: u16 = 1;

/// Fixed header size in bytes
pub const CHECKPOINT_HEADER_SIZE: usize = 40;

/// Serialize a weight vector into checkpoint bytes
pub fn encode_weight(weight: &WeightVector) -> Result<Vec<u8>> {
    let (data, indices, indptr) = weight.to_csr();
    let mut buf = Vec::with_capacity(CHECKPOINT_HEADER_SIZE + data.len() * 8 + indptr.len() * 8 + 4);

    buf.extend_from_slice(&CHECKPOINT_MAGIC);
    buf.write_u16::<LittleEndian>(CHECKPOINT_FORMAT_VERSION)?;
    buf.write_u16::<LittleEndian>(0)?;
    buf.write_u64::<LittleEndian>(weight.dims() as u64)?;
    buf.write_u64::<LittleEndian>(weight.epoch())?;
    buf.write_u64::<LittleEndian>(data.len() as u64)?;
    buf.write_u64::<LittleEndian>(indptr.len() as u64)?;

    for v in &data {
        buf.write_f32::<LittleEndian>(*v)?;
    }
    for i in &indices {
        buf.write_u32::<LittleEndian>(*i)?;
    }
    for p in &indptr {
        buf.write_u64::<LittleEndian>(*p)?;
    }

    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    Ok(buf)
}

/// Parse and validate checkpoint bytes
///
/// # Errors
///
/// `Error::Corruption` for a bad magic, unknown version, CRC mismatch,
/// truncated body or trailing bytes; CSR validation errors propagate.
pub fn decode_weight(bytes: &[u8]) -> Result<WeightVector> {
    if bytes.len() < CHECKPOINT_HEADER_SIZE + 4 {
        return Err(Error::Corruption(format!(
            "checkpoint too small: {} bytes",
            bytes.len()
        )));
    }

    let (body, crc_bytes) = bytes.split_at(bytes.len() - 4);
    let stored_crc = Cursor::new(crc_bytes).read_u32::<LittleEndian>()?;
    let computed_crc = crc32fast::hash(body);
    if stored_crc != computed_crc {
        return Err(Error::Corruption(format!(
            "CRC mismatch: stored {:#010x}, computed {:#010x}",
            stored_crc, computed_crc
        )));
    }

    let mut cursor = Cursor::new(body);
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != CHECKPOINT_MAGIC {
        return Err(Error::Corruption(format!("invalid magic {:?}", magic)));
    }

    let version = cursor.read_u16::<LittleEndian>()?;
    if version != CHECKPOINT_FORMAT_VERSION {
        return Err(Error::Corruption(format!(
            "unsupported checkpoint version {}",
            version
        )));
    }
    let _reserved = cursor.read_u16::<LittleEndian>()?;

    let dims = cursor.read_u64::<LittleEndian>()? as usize;
    let epoch = cursor.read_u64::<LittleEndian>()?;
    let nnz = cursor.read_u64::<LittleEndian>()? as usize;
    let indptr_len = cursor.read_u64::<LittleEndian>()? as usize;

    let expected_len = nnz
        .checked_mul(8)
        .and_then(|n| indptr_len.checked_mul(8).and_then(|m| n.checked_add(m)))
        .and_then(|n| n.checked_add(CHECKPOINT_HEADER_SIZE));
    if expected_len != Some(body.len()) {
        return Err(Error::Corruption(format!(
            "body length {} does not match nnz {} and indptr length {}",
            body.len(),
            nnz,
            indptr_len
        )));
    }

    let mut data = Vec::with_capacity(nnz);
    for _ in 0..nnz {
        data.push(cursor.read_f32::<LittleEndian>()?);
    }
    let mut indices = Vec::with_capacity(nnz);
    for _ in 0..nnz {
        indices.push(cursor.read_u32::<LittleEndian>()?);
    }
    let mut indptr = Vec::with_capacity(indptr_len);
    for _ in 0..indptr_len {
        indptr.push(cursor.read_u64::<LittleEndian>()?);
    }

    WeightVector::from_csr(data, indices, indptr, dims, epoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelrank_core::SparseVector;

    fn weight() -> WeightVector {
        WeightVector::from_vector(SparseVector::from_dense(&[0.0, 1.25, 0.0, -3.5, 0.0]), 7)
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode_weight(&weight()).unwrap();
        assert_eq!(&bytes[..4], b"DRWV");
        // header + 2 * (f32 + u32) + 2 * u64 + crc
        assert_eq!(bytes.len(), CHECKPOINT_HEADER_SIZE + 16 + 16 + 4);
    }

    #[test]
    fn test_decode_restores_weight() {
        let w = weight();
        let decoded = decode_weight(&encode_weight(&w).unwrap()).unwrap();
        assert_eq!(decoded, w);
        assert_eq!(decoded.epoch(), 7);
        assert_eq!(decoded.dims(), 5);
    }

    #[test]
    fn test_decode_empty_weight() {
        let w = WeightVector::new(100_000);
        let decoded = decode_weight(&encode_weight(&w).unwrap()).unwrap();
        assert_eq!(decoded, w);
    }

    #[test]
    fn test_decode_detects_bit_flip() {
        let mut bytes = encode_weight(&weight()).unwrap();
        bytes[CHECKPOINT_HEADER_SIZE] ^= 0x01;
        assert!(matches!(decode_weight(&bytes), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_decode_detects_truncation() {
        let bytes = encode_weight(&weight()).unwrap();
        assert!(decode_weight(&bytes[..bytes.len() - 6]).is_err());
        assert!(decode_weight(&bytes[..10]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = encode_weight(&weight()).unwrap();
        bytes[0] = b'X';
        // fix up the CRC so only the magic is wrong
        let body_len = bytes.len() - 4;
        let crc = crc32fast::hash(&bytes[..body_len]);
        bytes[body_len..].copy_from_slice(&crc.to_le_bytes());
        match decode_weight(&bytes) {
            Err(Error::Corruption(msg)) => assert!(msg.contains("magic")),
            other => panic!("expected corruption, got {:?}", other),
        }
    }
}
