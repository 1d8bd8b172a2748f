//! Length-prefixed field reader and writer for the OpenSSH key blob.

use super::KeyFormatError;

/// Cursor over a decoded key blob.
pub(super) struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub(super) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    #[expect(
        clippy::big_endian_bytes,
        reason = "OpenSSH length prefixes are big-endian on the wire"
    )]
    fn read_len(&mut self) -> Result<usize, KeyFormatError> {
        let end = self.pos.saturating_add(4);
        let chunk = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| KeyFormatError::new("truncated length prefix"))?;
        let prefix: [u8; 4] = chunk
            .try_into()
            .map_err(|_| KeyFormatError::new("truncated length prefix"))?;
        self.pos = end;
        usize::try_from(u32::from_be_bytes(prefix))
            .map_err(|_| KeyFormatError::new("field length does not fit in memory"))
    }

    /// Reads the next length-prefixed field.
    pub(super) fn read_field(&mut self) -> Result<&'a [u8], KeyFormatError> {
        let len = self.read_len()?;
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| KeyFormatError::new("field length overflow"))?;
        let field = self.bytes.get(self.pos..end).ok_or_else(|| {
            KeyFormatError::new(format!(
                "field of {len} bytes exceeds remaining {} bytes",
                self.bytes.len().saturating_sub(self.pos)
            ))
        })?;
        self.pos = end;
        Ok(field)
    }

    /// Reads the next field as ASCII text.
    pub(super) fn read_text(&mut self) -> Result<String, KeyFormatError> {
        let field = self.read_field()?;
        std::str::from_utf8(field)
            .map(str::to_owned)
            .map_err(|_| KeyFormatError::new("key type is not valid text"))
    }
}

/// Accumulates length-prefixed fields into a key blob.
#[derive(Default)]
pub(super) struct WireWriter {
    bytes: Vec<u8>,
}

impl WireWriter {
    #[expect(
        clippy::big_endian_bytes,
        reason = "OpenSSH length prefixes are big-endian on the wire"
    )]
    pub(super) fn write_field(&mut self, field: &[u8]) -> Result<(), KeyFormatError> {
        let len = u32::try_from(field.len())
            .map_err(|_| KeyFormatError::new("field too large to encode"))?;
        self.bytes.extend_from_slice(&len.to_be_bytes());
        self.bytes.extend_from_slice(field);
        Ok(())
    }

    pub(super) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
