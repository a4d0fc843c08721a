//! ISO 7816-4 status words.
//!
//! Success is signalled by SW1 `0x90` or `0x91`. The `0x91` range belongs to
//! ISO-wrapped DESFire native commands, where SW2 carries the native status:
//! `0x00` is terminal success, `0xAF` means the card holds another frame.
//! Every other `0x91 xx` is a native error code.

use chipscope_core::constants::{SW1_DESFIRE, SW1_OK, SW2_ADDITIONAL_FRAME, SW2_OPERATION_OK};
use chipscope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-byte status trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

/// Successful outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Terminal success.
    Complete,
    /// Success; send an additional-frame request for the rest.
    MoreData,
}

impl StatusWord {
    pub const OK: StatusWord = StatusWord::new(SW1_OK, 0x00);
    pub const MORE_DATA: StatusWord = StatusWord::new(SW1_DESFIRE, SW2_ADDITIONAL_FRAME);
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);

    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Combined value, e.g. `0x9000`.
    pub fn as_u16(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Classify the status word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StatusWord`] for anything that is not success.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_protocol::{Completion, StatusWord};
    ///
    /// assert_eq!(StatusWord::new(0x90, 0x00).completion().unwrap(), Completion::Complete);
    /// assert_eq!(StatusWord::new(0x91, 0xAF).completion().unwrap(), Completion::MoreData);
    /// assert!(StatusWord::new(0x6A, 0x82).completion().is_err());
    /// ```
    pub fn completion(&self) -> Result<Completion> {
        match (self.sw1, self.sw2) {
            (SW1_OK, _) => Ok(Completion::Complete),
            (SW1_DESFIRE, SW2_OPERATION_OK) => Ok(Completion::Complete),
            (SW1_DESFIRE, SW2_ADDITIONAL_FRAME) => Ok(Completion::MoreData),
            (sw1, sw2) => Err(Error::StatusWord { sw1, sw2 }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.completion().is_ok()
    }

    pub fn has_more(&self) -> bool {
        matches!(self.completion(), Ok(Completion::MoreData))
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}
