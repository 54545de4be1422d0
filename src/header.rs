//! Block Header Codec — the fixed 8-byte, big-endian frame prefix.
//!
//! ```text
//! offset 0:  uint32  compressed_payload_length   (bytes after header)
//! offset 4:  uint32  version_and_level
//!              bits [31..8]  format version       (24-bit unsigned)
//!              bits  [7..0]  level                (8-bit; stores logical level enum)
//! ```
//!
//! The on-disk form is big-endian regardless of host byte order — this is
//! the one place in the adapter where host endianness matters, so every
//! read/write here goes through `to_be_bytes`/`from_be_bytes` explicitly.
//! Both operations are pure and constant-time: no allocation, no codec call.

use crate::level::Logical;

/// Size of the block header prefix, in bytes.
pub const HEADER_SIZE: usize = 8;

/// Current on-disk format version. Monotonically assigned; only ever
/// increases as the frame layout (not the payload format) evolves.
pub const FORMAT_VERSION: u32 = 1;

/// A decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub payload_len: u32,
    pub version: u32,
    pub level: Logical,
}

/// Header decode failure: the frame prefix violates one of its invariants
/// (length doesn't fit, or the level byte isn't a known enumeration
/// member).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// `src_len` is smaller than [`HEADER_SIZE`].
    Truncated,
    /// `payload_len + HEADER_SIZE > src_len`.
    PayloadLengthInvalid,
    /// The level byte does not correspond to a known [`Logical`] variant.
    UnknownLevel,
}

impl std::fmt::Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            HeaderError::Truncated => "block header truncated (fewer than 8 bytes)",
            HeaderError::PayloadLengthInvalid => {
                "block header claims a payload length that overruns the source buffer"
            }
            HeaderError::UnknownLevel => "block header level byte is not a known logical level",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for HeaderError {}

/// Encodes a block header into `dest[0..8]`.
///
/// Returns the number of bytes written (always [`HEADER_SIZE`]).
///
/// # Panics
///
/// Panics if `dest` is shorter than [`HEADER_SIZE`] — callers must reserve
/// the header's space in `dst_cap` before calling this, as the facade does.
pub fn encode(dest: &mut [u8], payload_len: u32, level: Logical) -> usize {
    dest[0..4].copy_from_slice(&payload_len.to_be_bytes());
    let version_and_level = (FORMAT_VERSION << 8) | (level.tag() as u32);
    dest[4..8].copy_from_slice(&version_and_level.to_be_bytes());
    HEADER_SIZE
}

/// Decodes and validates a block header from `src`.
///
/// Requires `src.len() >= HEADER_SIZE`; rejects a header whose claimed
/// `payload_len` would overrun `src`, or whose level byte is unknown.
pub fn decode(src: &[u8]) -> Result<Header, HeaderError> {
    if src.len() < HEADER_SIZE {
        return Err(HeaderError::Truncated);
    }

    let payload_len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
    let version_and_level = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
    let version = version_and_level >> 8;
    let level_tag = (version_and_level & 0xFF) as u8;

    let payload_len_usize = payload_len as usize;
    if payload_len_usize
        .checked_add(HEADER_SIZE)
        .map(|total| total > src.len())
        .unwrap_or(true)
    {
        return Err(HeaderError::PayloadLengthInvalid);
    }

    let level = Logical::from_tag(level_tag).ok_or(HeaderError::UnknownLevel)?;

    Ok(Header {
        payload_len,
        version,
        level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = [0u8; 64];
        let written = encode(&mut buf, 40, Logical::Fast3);
        assert_eq!(written, HEADER_SIZE);

        let header = decode(&buf[..48]).unwrap();
        assert_eq!(header.payload_len, 40);
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.level, Logical::Fast3);
    }

    #[test]
    fn big_endian_on_wire() {
        let mut buf = [0u8; 8];
        encode(&mut buf, 0x0102_0304, Logical::Level1);
        // compressed_payload_length occupies the first 4 bytes, big-endian.
        assert_eq!(&buf[0..4], &[0x01, 0x02, 0x03, 0x04]);
        // version_and_level: version=1 in bits [31..8], level tag in bits [7..0].
        assert_eq!(buf[7], Logical::Level1.tag());
    }

    #[test]
    fn truncated_header_rejected() {
        let buf = [0u8; 4];
        assert_eq!(decode(&buf), Err(HeaderError::Truncated));
    }

    #[test]
    fn payload_length_overrun_rejected() {
        let mut buf = [0u8; 16];
        // Claim a payload of 1000 bytes in a 16-byte buffer.
        encode(&mut buf, 1000, Logical::Level1);
        assert_eq!(decode(&buf), Err(HeaderError::PayloadLengthInvalid));
    }

    #[test]
    fn tampered_length_rejected_without_touching_payload() {
        // Overwrite byte 0 with 0xFF, claiming a huge payload length.
        let mut buf = [0u8; 32];
        encode(&mut buf, 20, Logical::Level1);
        buf[0] = 0xFF;
        assert_eq!(decode(&buf), Err(HeaderError::PayloadLengthInvalid));
    }

    #[test]
    fn unknown_level_byte_rejected() {
        let mut buf = [0u8; 16];
        encode(&mut buf, 4, Logical::Level1);
        buf[7] = 255; // not a known tag
        assert_eq!(decode(&buf), Err(HeaderError::UnknownLevel));
    }

    #[test]
    fn exact_boundary_payload_length_accepted() {
        let mut buf = [0u8; 16];
        // payload_len + HEADER_SIZE == src.len() exactly.
        encode(&mut buf, 8, Logical::Level2);
        let header = decode(&buf).unwrap();
        assert_eq!(header.payload_len, 8);
    }
}
