// Versioned stream writer

use crate::config::NAME_LENGTH;
use crate::serialize::{fnv1a_step, SerializeError, CURRENT_VERSION, FNV_OFFSET_BASIS, MAGIC};
use std::io::Write;

/// Writes the versioned binary stream: header up front, checksum of
/// everything written when `finish` is called.
pub struct VersionedWriter<'a> {
    inner: &'a mut dyn Write,
    version: u32,
    hash: u32,
}

impl<'a> VersionedWriter<'a> {
    /// Create a writer emitting the current format version.
    pub fn new(inner: &'a mut dyn Write) -> Result<Self, SerializeError> {
        Self::with_version(inner, CURRENT_VERSION)
    }

    /// Create a writer emitting a specific version (used by tests to
    /// exercise forward-compatible reads).
    pub fn with_version(inner: &'a mut dyn Write, version: u32) -> Result<Self, SerializeError> {
        let mut writer = Self {
            inner,
            version,
            hash: FNV_OFFSET_BASIS,
        };
        writer.write_u32(MAGIC)?;
        writer.write_u32(version)?;
        writer.write_u32(0)?; // reserved
        Ok(writer)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerializeError> {
        for &byte in bytes {
            self.hash = fnv1a_step(self.hash, byte);
        }
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), SerializeError> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), SerializeError> {
        self.write_u8(value as u8)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), SerializeError> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), SerializeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), SerializeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), SerializeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), SerializeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Length-prefixed string, truncated to `NAME_LENGTH` bytes.
    pub fn write_name(&mut self, name: &str) -> Result<(), SerializeError> {
        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_LENGTH);
        self.write_u8(len as u8)?;
        self.write_bytes(&bytes[..len])
    }

    /// Write the trailer checksum and consume the writer.
    pub fn finish(mut self) -> Result<(), SerializeError> {
        self.inner.write_all(&self.hash.to_le_bytes())?;
        Ok(())
    }
}
