//! NXP custom commands for ICODE / NTAG 5 tags.
//!
//! Custom commands insert the IC manufacturer code after the command byte:
//! `flags cmd 04 [uid] params...`. NTAG 5 exposes its session registers
//! through READ_CONFIG / WRITE_CONFIG and its I2C master through READ_I2C /
//! WRITE_I2C.

use bytes::{BufMut, Bytes};
use chipscope_core::constants::VENDOR_NXP;

use crate::iso15693::{AddressMode, frame_header};

pub const CMD_READ_CONFIG: u8 = 0xC0;
pub const CMD_WRITE_CONFIG: u8 = 0xC1;
pub const CMD_WRITE_I2C: u8 = 0xD4;
pub const CMD_READ_I2C: u8 = 0xD5;

// ============================================================================
// NTAG 5 session registers
// ============================================================================

/// Status register.
pub const REG_STATUS: u8 = 0xA0;

/// Energy-harvesting configuration register.
pub const REG_EH_CONFIG: u8 = 0xA7;

/// EH_CONFIG byte 0: enable energy harvesting.
pub const EH_ENABLE: u8 = 0x01;

/// EH_CONFIG byte 0: trigger harvesting once enabled.
pub const EH_TRIGGER: u8 = 0x08;

/// STATUS byte 1: harvested supply is loaded and usable.
pub const STATUS_EH_LOAD_OK: u8 = 0x02;

/// Byte index of [`STATUS_EH_LOAD_OK`] within the status register.
pub const STATUS_EH_BYTE: usize = 1;

/// I2C parameter bit that suppresses the STOP condition.
const I2C_NO_STOP: u8 = 0x80;

/// An NXP custom command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NxpCustomCommand {
    /// Read `count` four-byte configuration blocks.
    ReadConfig { block: u8, count: u8 },
    WriteConfig { block: u8, data: [u8; 4] },
    /// Write bytes to a 7-bit I2C slave address.
    WriteI2c { address: u8, data: Vec<u8> },
    /// Read `len` bytes from a 7-bit I2C slave address.
    ReadI2c { address: u8, len: u8 },
}

impl NxpCustomCommand {
    /// Encode for the given address mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_protocol::{AddressMode, NxpCustomCommand};
    ///
    /// let cmd = NxpCustomCommand::ReadI2c { address: 0x48, len: 2 };
    /// assert_eq!(cmd.to_bytes(&AddressMode::Unaddressed).as_ref(), &[0x02, 0xD5, 0x04, 0x48, 0x01]);
    /// ```
    pub fn to_bytes(&self, mode: &AddressMode) -> Bytes {
        match self {
            NxpCustomCommand::ReadConfig { block, count } => {
                let mut buf = frame_header(mode, CMD_READ_CONFIG, Some(VENDOR_NXP));
                buf.put_u8(*block);
                buf.put_u8(count.saturating_sub(1));
                buf.freeze()
            }
            NxpCustomCommand::WriteConfig { block, data } => {
                let mut buf = frame_header(mode, CMD_WRITE_CONFIG, Some(VENDOR_NXP));
                buf.put_u8(*block);
                buf.put_slice(data);
                buf.freeze()
            }
            NxpCustomCommand::WriteI2c { address, data } => {
                let mut buf = frame_header(mode, CMD_WRITE_I2C, Some(VENDOR_NXP));
                buf.put_u8(address & !I2C_NO_STOP);
                buf.put_u8((data.len() as u8).saturating_sub(1));
                buf.put_slice(data);
                buf.freeze()
            }
            NxpCustomCommand::ReadI2c { address, len } => {
                let mut buf = frame_header(mode, CMD_READ_I2C, Some(VENDOR_NXP));
                buf.put_u8(address & !I2C_NO_STOP);
                buf.put_u8(len.saturating_sub(1));
                buf.freeze()
            }
        }
    }

    /// Whether the tag may finish this command without answering in time.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            NxpCustomCommand::WriteConfig { .. } | NxpCustomCommand::WriteI2c { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const UID: [u8; 8] = [0xE0, 0x04, 0x01, 0x58, 0x01, 0x02, 0x03, 0x04];

    #[rstest]
    #[case(NxpCustomCommand::ReadConfig { block: REG_STATUS, count: 1 }, &[0x02, 0xC0, 0x04, 0xA0, 0x00])]
    #[case(
        NxpCustomCommand::WriteConfig { block: REG_EH_CONFIG, data: [EH_ENABLE, 0, 0, 0] },
        &[0x02, 0xC1, 0x04, 0xA7, 0x01, 0x00, 0x00, 0x00]
    )]
    #[case(NxpCustomCommand::WriteI2c { address: 0x18, data: vec![0x05] }, &[0x02, 0xD4, 0x04, 0x18, 0x00, 0x05])]
    #[case(NxpCustomCommand::ReadI2c { address: 0x49, len: 2 }, &[0x02, 0xD5, 0x04, 0x49, 0x01])]
    fn test_unaddressed_frames(#[case] cmd: NxpCustomCommand, #[case] expected: &[u8]) {
        assert_eq!(cmd.to_bytes(&AddressMode::Unaddressed).as_ref(), expected);
    }

    #[test]
    fn test_addressed_places_uid_after_manufacturer() {
        let frame = NxpCustomCommand::ReadConfig { block: REG_STATUS, count: 1 }
            .to_bytes(&AddressMode::Addressed(UID));
        assert_eq!(&frame[..3], &[0x22, 0xC0, 0x04]);
        assert_eq!(&frame[3..11], &[0x04, 0x03, 0x02, 0x01, 0x58, 0x01, 0x04, 0xE0]);
        assert_eq!(&frame[11..], &[0xA0, 0x00]);
    }

    #[test]
    fn test_is_write() {
        assert!(NxpCustomCommand::WriteConfig { block: 0, data: [0; 4] }.is_write());
        assert!(!NxpCustomCommand::ReadI2c { address: 0x48, len: 2 }.is_write());
    }
}
