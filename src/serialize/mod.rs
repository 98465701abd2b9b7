// Versioned binary serialization
// Single stream format: header (magic, version, reserved), body in a
// fixed order, FNV-1a trailer checksum. All multi-byte fields are
// little-endian; strings are length-prefixed with a fixed maximum.

pub mod reader;
pub mod writer;

pub use reader::VersionedReader;
pub use writer::VersionedWriter;

/// Stream magic, "GSEQ" in little-endian byte order.
pub const MAGIC: u32 = u32::from_le_bytes(*b"GSEQ");

/// Initial release format.
pub const VERSION_INITIAL: u32 = 1;
/// Added arp MIDI-keyboard flag and curve note filter.
pub const VERSION_ARP_KEYBOARD: u32 = 2;

/// Version written by this build. Readers accept anything up to and
/// including this and default the fields a stream predates.
pub const CURRENT_VERSION: u32 = VERSION_ARP_KEYBOARD;

/// Errors surfaced by the load/save API. A failed load leaves the
/// caller's existing project untouched.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid magic number")]
    BadMagic,

    #[error("unsupported project version {0}")]
    UnsupportedVersion(u32),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("malformed stream: {0}")]
    Malformed(&'static str),
}

pub(crate) const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
pub(crate) const FNV_PRIME: u32 = 0x0100_0193;

pub(crate) fn fnv1a_step(hash: u32, byte: u8) -> u32 {
    (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(MAGIC.to_le_bytes(), *b"GSEQ");
    }

    #[test]
    fn test_fnv1a_known_value() {
        // FNV-1a of "a" is 0xe40c292c
        let hash = fnv1a_step(FNV_OFFSET_BASIS, b'a');
        assert_eq!(hash, 0xe40c_292c);
    }
}
