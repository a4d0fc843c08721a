//! ISO 15693 (NFC-V) standard commands.
//!
//! Frames are `flags cmd [uid] params...`. The UID travels least-significant
//! byte first; callers hold it in display order (`E0 04 ...`) and the codec
//! reverses it on the wire.

use bytes::{BufMut, Bytes, BytesMut};
use chipscope_core::constants::{ISO15693_RESPONSE_ERROR, ISO15693_UID_LENGTH};
use chipscope_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Request flag: high sub-carrier data rate.
pub const FLAG_HIGH_DATA_RATE: u8 = 0x02;

/// Request flag: address the tag by UID.
pub const FLAG_ADDRESSED: u8 = 0x20;

/// Request flag: option bit (command-specific).
pub const FLAG_OPTION: u8 = 0x40;

pub const CMD_READ_SINGLE_BLOCK: u8 = 0x20;
pub const CMD_WRITE_SINGLE_BLOCK: u8 = 0x21;
pub const CMD_READ_MULTIPLE_BLOCKS: u8 = 0x23;
pub const CMD_GET_SYSTEM_INFO: u8 = 0x2B;
pub const CMD_GET_EXTENDED_SYSTEM_INFO: u8 = 0x3B;

/// Info-flag bits of a system-info reply.
const INFO_DSFID: u8 = 0x01;
const INFO_AFI: u8 = 0x02;
const INFO_MEMORY: u8 = 0x04;
const INFO_IC_REFERENCE: u8 = 0x08;

/// Extended system info: request every optional field.
const EXTENDED_REQUEST_ALL: u8 = 0x0F;

/// Error code reported when a failed reply omits it.
const ERROR_CODE_UNKNOWN: u8 = 0x0F;

/// How a request selects its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Whichever tag is in the field answers.
    Unaddressed,
    /// Only the tag with this UID (display order) answers.
    Addressed([u8; ISO15693_UID_LENGTH]),
}

impl AddressMode {
    /// Addressed mode from a UID slice in display order.
    ///
    /// # Errors
    ///
    /// Returns an error unless the UID is exactly eight bytes.
    pub fn addressed(uid: &[u8]) -> Result<Self> {
        let uid: [u8; ISO15693_UID_LENGTH] = uid.try_into().map_err(|_| {
            Error::invalid_argument(format!(
                "ISO15693 UID must be {ISO15693_UID_LENGTH} bytes, got {}",
                uid.len()
            ))
        })?;
        Ok(AddressMode::Addressed(uid))
    }

    fn flags(&self) -> u8 {
        match self {
            AddressMode::Unaddressed => FLAG_HIGH_DATA_RATE,
            AddressMode::Addressed(_) => FLAG_HIGH_DATA_RATE | FLAG_ADDRESSED,
        }
    }
}

/// Start a frame: flags, command, optional manufacturer code, UID.
pub(crate) fn frame_header(mode: &AddressMode, command: u8, manufacturer: Option<u8>) -> BytesMut {
    let mut buf = BytesMut::with_capacity(16);
    buf.put_u8(mode.flags());
    buf.put_u8(command);
    if let Some(code) = manufacturer {
        buf.put_u8(code);
    }
    if let AddressMode::Addressed(uid) = mode {
        for byte in uid.iter().rev() {
            buf.put_u8(*byte);
        }
    }
    buf
}

/// A standard ISO 15693 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iso15693Command {
    GetSystemInfo,
    GetExtendedSystemInfo,
    ReadSingleBlock { block: u8 },
    ReadMultipleBlocks { first: u8, count: u8 },
    WriteSingleBlock { block: u8, data: Vec<u8> },
}

impl Iso15693Command {
    /// Encode for the given address mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_protocol::{AddressMode, Iso15693Command};
    ///
    /// let uid = [0xE0, 0x04, 0x01, 0x08, 0x11, 0x22, 0x33, 0x44];
    /// let frame = Iso15693Command::GetSystemInfo.to_bytes(&AddressMode::Addressed(uid));
    /// assert_eq!(
    ///     frame.as_ref(),
    ///     &[0x22, 0x2B, 0x44, 0x33, 0x22, 0x11, 0x08, 0x01, 0x04, 0xE0]
    /// );
    /// ```
    pub fn to_bytes(&self, mode: &AddressMode) -> Bytes {
        match self {
            Iso15693Command::GetSystemInfo => frame_header(mode, CMD_GET_SYSTEM_INFO, None).freeze(),
            Iso15693Command::GetExtendedSystemInfo => {
                // The info-request byte precedes the UID for this command.
                let mut buf = BytesMut::with_capacity(11);
                buf.put_u8(mode.flags());
                buf.put_u8(CMD_GET_EXTENDED_SYSTEM_INFO);
                buf.put_u8(EXTENDED_REQUEST_ALL);
                if let AddressMode::Addressed(uid) = mode {
                    for byte in uid.iter().rev() {
                        buf.put_u8(*byte);
                    }
                }
                buf.freeze()
            }
            Iso15693Command::ReadSingleBlock { block } => {
                let mut buf = frame_header(mode, CMD_READ_SINGLE_BLOCK, None);
                buf.put_u8(*block);
                buf.freeze()
            }
            Iso15693Command::ReadMultipleBlocks { first, count } => {
                let mut buf = frame_header(mode, CMD_READ_MULTIPLE_BLOCKS, None);
                buf.put_u8(*first);
                buf.put_u8(count.saturating_sub(1));
                buf.freeze()
            }
            Iso15693Command::WriteSingleBlock { block, data } => {
                let mut buf = frame_header(mode, CMD_WRITE_SINGLE_BLOCK, None);
                buf.put_u8(*block);
                buf.put_slice(data);
                buf.freeze()
            }
        }
    }
}

/// A reply split into its flag byte and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iso15693Response {
    pub flags: u8,
    pub payload: Bytes,
}

impl Iso15693Response {
    /// Parse a reply, turning the error flag into [`Error::Iso15693`].
    ///
    /// # Errors
    ///
    /// Returns an error for an empty reply or one with the error flag set.
    pub fn parse(reply: &[u8]) -> Result<Self> {
        let (&flags, rest) = reply.split_first().ok_or_else(|| Error::short(1, 0))?;
        if flags & ISO15693_RESPONSE_ERROR != 0 {
            let code = rest.first().copied().unwrap_or(ERROR_CODE_UNKNOWN);
            return Err(Error::Iso15693(code));
        }
        Ok(Self {
            flags,
            payload: Bytes::copy_from_slice(rest),
        })
    }
}

/// Decoded GET SYSTEM INFO reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// UID in display order.
    pub uid: [u8; ISO15693_UID_LENGTH],
    pub dsfid: Option<u8>,
    pub afi: Option<u8>,
    pub block_count: Option<u16>,
    pub block_size: Option<u8>,
    pub ic_reference: Option<u8>,
}

impl SystemInfo {
    /// Decode the payload of a GET SYSTEM INFO reply (after the flag byte).
    ///
    /// # Errors
    ///
    /// Returns an error if a field announced by the info flags is missing.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(payload);
        let info_flags = cursor.u8()?;
        let uid = cursor.uid()?;
        let dsfid = cursor.optional(info_flags & INFO_DSFID != 0)?;
        let afi = cursor.optional(info_flags & INFO_AFI != 0)?;
        let (block_count, block_size) = if info_flags & INFO_MEMORY != 0 {
            let count = cursor.u8()? as u16 + 1;
            let size = (cursor.u8()? & 0x1F) + 1;
            (Some(count), Some(size))
        } else {
            (None, None)
        };
        let ic_reference = cursor.optional(info_flags & INFO_IC_REFERENCE != 0)?;
        Ok(Self {
            uid,
            dsfid,
            afi,
            block_count,
            block_size,
            ic_reference,
        })
    }

    /// Decode an extended system-info payload, which carries a two-byte
    /// block count.
    pub fn parse_extended(payload: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(payload);
        let info_flags = cursor.u8()?;
        let uid = cursor.uid()?;
        let dsfid = cursor.optional(info_flags & INFO_DSFID != 0)?;
        let afi = cursor.optional(info_flags & INFO_AFI != 0)?;
        let (block_count, block_size) = if info_flags & INFO_MEMORY != 0 {
            let low = cursor.u8()?;
            let high = cursor.u8()?;
            let count = u16::from_le_bytes([low, high]).saturating_add(1);
            let size = (cursor.u8()? & 0x1F) + 1;
            (Some(count), Some(size))
        } else {
            (None, None)
        };
        let ic_reference = cursor.optional(info_flags & INFO_IC_REFERENCE != 0)?;
        Ok(Self {
            uid,
            dsfid,
            afi,
            block_count,
            block_size,
            ic_reference,
        })
    }

    /// User memory in bytes, when the tag reported its geometry.
    pub fn memory_bytes(&self) -> Option<u32> {
        Some(self.block_count? as u32 * self.block_size? as u32)
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::short(self.pos + 1, self.data.len()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn optional(&mut self, present: bool) -> Result<Option<u8>> {
        if present { self.u8().map(Some) } else { Ok(None) }
    }

    fn uid(&mut self) -> Result<[u8; ISO15693_UID_LENGTH]> {
        let end = self.pos + ISO15693_UID_LENGTH;
        let wire = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| Error::short(end, self.data.len()))?;
        let mut uid = [0u8; ISO15693_UID_LENGTH];
        for (slot, byte) in uid.iter_mut().zip(wire.iter().rev()) {
            *slot = *byte;
        }
        self.pos = end;
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: [u8; 8] = [0xE0, 0x04, 0x01, 0x50, 0xAA, 0xBB, 0xCC, 0xDD];

    fn wire_uid() -> Vec<u8> {
        UID.iter().rev().copied().collect()
    }

    #[test]
    fn test_unaddressed_read_block() {
        let frame = Iso15693Command::ReadSingleBlock { block: 5 }.to_bytes(&AddressMode::Unaddressed);
        assert_eq!(frame.as_ref(), &[0x02, 0x20, 0x05]);
    }

    #[test]
    fn test_addressed_read_multiple() {
        let frame = Iso15693Command::ReadMultipleBlocks { first: 0, count: 4 }
            .to_bytes(&AddressMode::Addressed(UID));
        assert_eq!(frame[0], 0x22);
        assert_eq!(frame[1], 0x23);
        assert_eq!(&frame[2..10], wire_uid().as_slice());
        assert_eq!(&frame[10..], &[0x00, 0x03]);
    }

    #[test]
    fn test_extended_request_byte_precedes_uid() {
        let frame = Iso15693Command::GetExtendedSystemInfo.to_bytes(&AddressMode::Addressed(UID));
        assert_eq!(&frame[..3], &[0x22, 0x3B, 0x0F]);
        assert_eq!(&frame[3..], wire_uid().as_slice());
    }

    #[test]
    fn test_address_mode_rejects_short_uid() {
        assert!(AddressMode::addressed(&[0xE0, 0x04]).is_err());
        assert_eq!(AddressMode::addressed(&UID).unwrap(), AddressMode::Addressed(UID));
    }

    #[test]
    fn test_error_reply() {
        assert_eq!(Iso15693Response::parse(&[0x01, 0x02]), Err(Error::Iso15693(0x02)));
        assert_eq!(Iso15693Response::parse(&[0x01]), Err(Error::Iso15693(0x0F)));
        assert!(Iso15693Response::parse(&[]).is_err());
    }

    #[test]
    fn test_system_info_full() {
        let mut payload = vec![0x0F];
        payload.extend(wire_uid());
        payload.extend([0xC2, 0x54, 0x4F, 0x03, 0x52]);
        let info = SystemInfo::parse(&payload).unwrap();
        assert_eq!(info.uid, UID);
        assert_eq!(info.dsfid, Some(0xC2));
        assert_eq!(info.afi, Some(0x54));
        assert_eq!(info.block_count, Some(80));
        assert_eq!(info.block_size, Some(4));
        assert_eq!(info.ic_reference, Some(0x52));
        assert_eq!(info.memory_bytes(), Some(320));
    }

    #[test]
    fn test_system_info_without_optional_fields() {
        let mut payload = vec![0x00];
        payload.extend(wire_uid());
        let info = SystemInfo::parse(&payload).unwrap();
        assert_eq!(info.dsfid, None);
        assert_eq!(info.memory_bytes(), None);
    }

    #[test]
    fn test_system_info_truncated() {
        let mut payload = vec![0x0C];
        payload.extend(wire_uid());
        payload.push(0x1B);
        assert!(SystemInfo::parse(&payload).is_err());
    }

    #[test]
    fn test_extended_system_info_large_memory() {
        let mut payload = vec![0x0C];
        payload.extend(wire_uid());
        payload.extend([0xFF, 0x01, 0x03, 0x58]);
        let info = SystemInfo::parse_extended(&payload).unwrap();
        assert_eq!(info.block_count, Some(512));
        assert_eq!(info.memory_bytes(), Some(2048));
        assert_eq!(info.ic_reference, Some(0x58));
    }
}
