//! NFC Forum Type 2 commands (NTAG / Ultralight family).
//!
//! Type 2 frames are a single instruction byte followed by page addresses.
//! A tag that rejects a command answers with a 4-bit NAK instead of data;
//! readers surface it as a one-byte reply.

use bytes::Bytes;
use chipscope_core::constants::{TYPE2_ACK, TYPE2_PAGE_SIZE, TYPE2_READ_SIZE};
use chipscope_core::{Error, Result, VersionBlock};

/// GET_VERSION instruction.
pub const CMD_GET_VERSION: u8 = 0x60;

/// READ instruction (four pages).
pub const CMD_READ: u8 = 0x30;

/// FAST_READ instruction (page range).
pub const CMD_FAST_READ: u8 = 0x3A;

/// Length of a GET_VERSION reply including the fixed header byte.
pub const VERSION_RESPONSE_LEN: usize = 8;

/// A Type 2 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type2Command {
    GetVersion,
    /// Read four pages starting at `page`.
    Read { page: u8 },
    /// Read pages `start..=end`.
    FastRead { start: u8, end: u8 },
}

impl Type2Command {
    pub fn to_bytes(&self) -> Bytes {
        match *self {
            Type2Command::GetVersion => Bytes::from_static(&[CMD_GET_VERSION]),
            Type2Command::Read { page } => Bytes::copy_from_slice(&[CMD_READ, page]),
            Type2Command::FastRead { start, end } => {
                Bytes::copy_from_slice(&[CMD_FAST_READ, start, end])
            }
        }
    }

    /// Number of data bytes a successful reply carries.
    pub fn expected_len(&self) -> usize {
        match *self {
            Type2Command::GetVersion => VERSION_RESPONSE_LEN,
            Type2Command::Read { .. } => TYPE2_READ_SIZE,
            Type2Command::FastRead { start, end } => {
                (end.saturating_sub(start) as usize + 1) * TYPE2_PAGE_SIZE
            }
        }
    }
}

/// Reject one-byte NAK replies.
///
/// # Errors
///
/// Returns [`Error::Nak`] when the reply is a single byte that is not ACK.
pub fn check_nak(response: &[u8]) -> Result<()> {
    match response {
        [code] if code & 0x0F != TYPE2_ACK => Err(Error::Nak(*code)),
        _ => Ok(()),
    }
}

/// Decode a GET_VERSION reply.
///
/// The reply is a fixed header byte followed by the seven version bytes.
///
/// # Examples
///
/// ```
/// use chipscope_protocol::type2::parse_version;
///
/// let block = parse_version(&[0x00, 0x04, 0x04, 0x02, 0x01, 0x00, 0x11, 0x03]).unwrap();
/// assert_eq!(block.vendor, 0x04);
/// assert_eq!(block.storage_size, 0x11);
/// ```
pub fn parse_version(response: &[u8]) -> Result<VersionBlock> {
    check_nak(response)?;
    if response.len() < VERSION_RESPONSE_LEN {
        return Err(Error::short(VERSION_RESPONSE_LEN, response.len()));
    }
    let mut bytes = [0u8; 7];
    bytes.copy_from_slice(&response[1..VERSION_RESPONSE_LEN]);
    Ok(VersionBlock::from_bytes(bytes))
}

/// Validate a READ reply and return its sixteen data bytes.
pub fn parse_read(response: &[u8]) -> Result<&[u8]> {
    check_nak(response)?;
    response
        .get(..TYPE2_READ_SIZE)
        .ok_or_else(|| Error::short(TYPE2_READ_SIZE, response.len()))
}
