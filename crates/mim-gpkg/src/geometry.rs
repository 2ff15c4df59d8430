//! GeoPackage binary geometry header decoding
//!
//! A GeoPackage geometry blob is a small header (`GP` magic, version, flags,
//! SRS id, optional envelope) followed by a standard WKB geometry.

use crate::{GpkgError, GpkgResult};

const MAGIC: &[u8; 2] = b"GP";
const HEADER_LEN: usize = 8;
const WKB_PREFIX_LEN: usize = 5;

const FLAG_LITTLE_ENDIAN: u8 = 0b0000_0001;
const FLAG_ENVELOPE_MASK: u8 = 0b0000_1110;
const FLAG_EMPTY: u8 = 0b0001_0000;
const FLAG_EXTENDED: u8 = 0b0010_0000;

/// Bounding box carried in the geometry header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub z: Option<(f64, f64)>,
    pub m: Option<(f64, f64)>,
}

/// Decoded geometry blob header
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryHeader {
    pub version: u8,
    pub little_endian: bool,
    pub srs_id: i32,
    pub envelope: Option<Envelope>,
    pub is_empty: bool,
    pub is_extended: bool,
    /// WKB geometry type code of the payload (1 = Point, 3 = Polygon, ...)
    pub wkb_type: u32,
}

impl GeometryHeader {
    /// Decode the header of a GeoPackage geometry blob
    pub fn parse(blob: &[u8]) -> GpkgResult<Self> {
        if blob.len() < HEADER_LEN {
            return Err(GpkgError::InvalidGeometry(format!(
                "blob too short: expected at least {} bytes, got {}",
                HEADER_LEN,
                blob.len()
            )));
        }

        if &blob[0..2] != MAGIC {
            return Err(GpkgError::InvalidGeometry(format!(
                "bad magic {:02x}{:02x}, expected 'GP'",
                blob[0], blob[1]
            )));
        }

        let version = blob[2];
        let flags = blob[3];
        let little_endian = flags & FLAG_LITTLE_ENDIAN != 0;
        let srs_id = read_i32(&blob[4..8], little_endian);

        let (envelope, envelope_len) = match (flags & FLAG_ENVELOPE_MASK) >> 1 {
            0 => (None, 0),
            indicator @ 1..=4 => {
                let len = envelope_len(indicator);
                if blob.len() < HEADER_LEN + len {
                    return Err(GpkgError::InvalidGeometry(format!(
                        "envelope truncated: expected {} bytes, got {}",
                        len,
                        blob.len() - HEADER_LEN
                    )));
                }
                let values: Vec<f64> = blob[HEADER_LEN..HEADER_LEN + len]
                    .chunks_exact(8)
                    .map(|chunk| read_f64(chunk, little_endian))
                    .collect();
                (Some(envelope_from(indicator, &values)), len)
            }
            other => {
                return Err(GpkgError::InvalidGeometry(format!(
                    "invalid envelope indicator {}",
                    other
                )))
            }
        };

        let wkb = &blob[HEADER_LEN + envelope_len..];
        if wkb.len() < WKB_PREFIX_LEN {
            return Err(GpkgError::InvalidGeometry(format!(
                "WKB body truncated: {} bytes",
                wkb.len()
            )));
        }
        let wkb_little_endian = match wkb[0] {
            0 => false,
            1 => true,
            other => {
                return Err(GpkgError::InvalidGeometry(format!(
                    "invalid WKB byte order marker {}",
                    other
                )))
            }
        };
        let wkb_type = read_i32(&wkb[1..5], wkb_little_endian) as u32;

        Ok(Self {
            version,
            little_endian,
            srs_id,
            envelope,
            is_empty: flags & FLAG_EMPTY != 0,
            is_extended: flags & FLAG_EXTENDED != 0,
            wkb_type,
        })
    }
}

fn envelope_len(indicator: u8) -> usize {
    match indicator {
        1 => 32,
        2 | 3 => 48,
        _ => 64,
    }
}

fn envelope_from(indicator: u8, v: &[f64]) -> Envelope {
    let (z, m) = match indicator {
        2 => (Some((v[4], v[5])), None),
        3 => (None, Some((v[4], v[5]))),
        4 => (Some((v[4], v[5])), Some((v[6], v[7]))),
        _ => (None, None),
    };
    Envelope {
        min_x: v[0],
        max_x: v[1],
        min_y: v[2],
        max_y: v[3],
        z,
        m,
    }
}

fn read_i32(bytes: &[u8], little_endian: bool) -> i32 {
    let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if little_endian {
        i32::from_le_bytes(raw)
    } else {
        i32::from_be_bytes(raw)
    }
}

fn read_f64(bytes: &[u8], little_endian: bool) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    if little_endian {
        f64::from_le_bytes(raw)
    } else {
        f64::from_be_bytes(raw)
    }
}

/// Encode a little-endian GeoPackage point blob without envelope
pub fn encode_point(srs_id: i32, x: f64, y: f64) -> Vec<u8> {
    let mut blob = Vec::with_capacity(HEADER_LEN + 21);
    blob.extend_from_slice(MAGIC);
    blob.push(0);
    blob.push(FLAG_LITTLE_ENDIAN);
    blob.extend_from_slice(&srs_id.to_le_bytes());
    blob.push(1);
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&x.to_le_bytes());
    blob.extend_from_slice(&y.to_le_bytes());
    blob
}
