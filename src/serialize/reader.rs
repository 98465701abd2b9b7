// Versioned stream reader

use crate::config::NAME_LENGTH;
use crate::serialize::{fnv1a_step, SerializeError, CURRENT_VERSION, FNV_OFFSET_BASIS, MAGIC};
use std::io::Read;

/// Reads the versioned binary stream. The declared version gates which
/// fields exist in the stream; model readers substitute defaults for
/// fields newer than it. `finish` validates the trailer checksum.
pub struct VersionedReader<'a> {
    inner: &'a mut dyn Read,
    version: u32,
    hash: u32,
}

impl<'a> VersionedReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Result<Self, SerializeError> {
        let mut reader = Self {
            inner,
            version: 0,
            hash: FNV_OFFSET_BASIS,
        };
        if reader.read_u32()? != MAGIC {
            return Err(SerializeError::BadMagic);
        }
        let version = reader.read_u32()?;
        if version == 0 || version > CURRENT_VERSION {
            return Err(SerializeError::UnsupportedVersion(version));
        }
        reader.read_u32()?; // reserved
        reader.version = version;
        Ok(reader)
    }

    /// The version declared by the stream.
    pub fn version(&self) -> u32 {
        self.version
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<(), SerializeError> {
        self.inner.read_exact(buffer)?;
        for &byte in buffer.iter() {
            self.hash = fnv1a_step(self.hash, byte);
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, SerializeError> {
        let mut buffer = [0u8; 1];
        self.read_bytes(&mut buffer)?;
        Ok(buffer[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, SerializeError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, SerializeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, SerializeError> {
        let mut buffer = [0u8; 2];
        self.read_bytes(&mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    pub fn read_u32(&mut self) -> Result<u32, SerializeError> {
        let mut buffer = [0u8; 4];
        self.read_bytes(&mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    pub fn read_i32(&mut self) -> Result<i32, SerializeError> {
        let mut buffer = [0u8; 4];
        self.read_bytes(&mut buffer)?;
        Ok(i32::from_le_bytes(buffer))
    }

    pub fn read_f32(&mut self) -> Result<f32, SerializeError> {
        let mut buffer = [0u8; 4];
        self.read_bytes(&mut buffer)?;
        Ok(f32::from_le_bytes(buffer))
    }

    /// Length-prefixed string capped at `NAME_LENGTH`.
    pub fn read_name(&mut self) -> Result<String, SerializeError> {
        let len = self.read_u8()? as usize;
        if len > NAME_LENGTH {
            return Err(SerializeError::Malformed("name too long"));
        }
        let mut buffer = [0u8; NAME_LENGTH];
        self.read_bytes(&mut buffer[..len])?;
        Ok(String::from_utf8_lossy(&buffer[..len]).into_owned())
    }

    /// Read the trailer checksum and verify it.
    pub fn finish(mut self) -> Result<(), SerializeError> {
        let expected = self.hash;
        let mut buffer = [0u8; 4];
        self.inner.read_exact(&mut buffer)?;
        if u32::from_le_bytes(buffer) != expected {
            return Err(SerializeError::ChecksumMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::VersionedWriter;
    use std::io::Cursor;

    #[test]
    fn test_scalar_round_trip() {
        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            writer.write_u8(0xab).unwrap();
            writer.write_i8(-5).unwrap();
            writer.write_bool(true).unwrap();
            writer.write_u16(0x1234).unwrap();
            writer.write_u32(0xdead_beef).unwrap();
            writer.write_i32(-123456).unwrap();
            writer.write_f32(142.5).unwrap();
            writer.write_name("Kick").unwrap();
            writer.finish().unwrap();
        }

        let mut cursor = Cursor::new(buffer);
        let mut reader = VersionedReader::new(&mut cursor).unwrap();
        assert_eq!(reader.version(), CURRENT_VERSION);
        assert_eq!(reader.read_u8().unwrap(), 0xab);
        assert_eq!(reader.read_i8().unwrap(), -5);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(reader.read_i32().unwrap(), -123456);
        assert_eq!(reader.read_f32().unwrap(), 142.5);
        assert_eq!(reader.read_name().unwrap(), "Kick");
        reader.finish().unwrap();
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buffer = vec![0u8; 16];
        let mut cursor = Cursor::new(&mut buffer[..]);
        assert!(matches!(
            VersionedReader::new(&mut cursor),
            Err(SerializeError::BadMagic)
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&MAGIC.to_le_bytes());
        buffer.extend_from_slice(&(CURRENT_VERSION + 1).to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor = Cursor::new(buffer);
        assert!(matches!(
            VersionedReader::new(&mut cursor),
            Err(SerializeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_corrupted_byte_fails_checksum() {
        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            writer.write_u32(42).unwrap();
            writer.finish().unwrap();
        }
        // flip a bit in the body
        buffer[12] ^= 0x01;

        let mut cursor = Cursor::new(buffer);
        let mut reader = VersionedReader::new(&mut cursor).unwrap();
        reader.read_u32().unwrap();
        assert!(matches!(
            reader.finish(),
            Err(SerializeError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            writer.write_u32(42).unwrap();
            writer.finish().unwrap();
        }
        buffer.truncate(13);

        let mut cursor = Cursor::new(buffer);
        let mut reader = VersionedReader::new(&mut cursor).unwrap();
        assert!(matches!(
            reader.read_u32(),
            Err(SerializeError::Io(_))
        ));
    }

    #[test]
    fn test_long_name_truncated_on_write() {
        let mut buffer = Vec::new();
        {
            let mut writer = VersionedWriter::new(&mut buffer).unwrap();
            writer.write_name("a name much longer than sixteen bytes").unwrap();
            writer.finish().unwrap();
        }

        let mut cursor = Cursor::new(buffer);
        let mut reader = VersionedReader::new(&mut cursor).unwrap();
        assert_eq!(reader.read_name().unwrap().len(), NAME_LENGTH);
        reader.finish().unwrap();
    }
}
