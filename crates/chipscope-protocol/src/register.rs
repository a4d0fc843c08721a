//! Register write/verify sequences and I2C passthrough transfers.
//!
//! NTAG 5 may commit a configuration write without answering before the
//! reader's deadline. A timed-out write is therefore only [`Provisional`]:
//! the caller reads a status register back and treats the write as done
//! once [`RegisterWrite::verify`] passes.
//!
//! [`Provisional`]: WriteOutcome::Provisional

use chipscope_core::{Error, Result};

use crate::iso15693::Iso15693Response;
use crate::nxp::NxpCustomCommand;

/// How a custom-command write was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The tag acknowledged the write.
    Acknowledged,
    /// No reply arrived in time; the write still has to be verified.
    Provisional,
}

impl WriteOutcome {
    /// Classify a write reply. `None` stands for a transport timeout.
    ///
    /// # Errors
    ///
    /// Returns the tag's error code if it answered with the error flag.
    pub fn from_reply(reply: Option<&[u8]>) -> Result<Self> {
        match reply {
            None => Ok(WriteOutcome::Provisional),
            Some(bytes) => Iso15693Response::parse(bytes).map(|_| WriteOutcome::Acknowledged),
        }
    }
}

/// A configuration-register write plus the check that confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub block: u8,
    pub data: [u8; 4],
    verify_block: u8,
    verify_byte: usize,
    verify_mask: u8,
}

impl RegisterWrite {
    /// Write `data` to `block`, verified by reading the same block back and
    /// checking the bits set in byte 0.
    pub fn new(block: u8, data: [u8; 4]) -> Self {
        Self {
            block,
            data,
            verify_block: block,
            verify_byte: 0,
            verify_mask: data[0],
        }
    }

    /// Verify through another register: every bit of `mask` must be set in
    /// byte `byte` of `block`.
    pub fn verified_by(mut self, block: u8, byte: usize, mask: u8) -> Self {
        self.verify_block = block;
        self.verify_byte = byte;
        self.verify_mask = mask;
        self
    }

    pub fn command(&self) -> NxpCustomCommand {
        NxpCustomCommand::WriteConfig {
            block: self.block,
            data: self.data,
        }
    }

    pub fn read_back(&self) -> NxpCustomCommand {
        NxpCustomCommand::ReadConfig {
            block: self.verify_block,
            count: 1,
        }
    }

    /// Check a read-back reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VerifyFailed`] when the masked bits are not all set,
    /// or a parse error when the reply is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_protocol::RegisterWrite;
    ///
    /// let write = RegisterWrite::new(0xA7, [0x01, 0, 0, 0]).verified_by(0xA0, 1, 0x02);
    /// assert!(write.verify(&[0x00, 0x00, 0x02, 0x00, 0x00]).is_ok());
    /// assert!(write.verify(&[0x00, 0x00, 0x00, 0x00, 0x00]).is_err());
    /// ```
    pub fn verify(&self, reply: &[u8]) -> Result<()> {
        let response = Iso15693Response::parse(reply)?;
        let actual = *response
            .payload
            .get(self.verify_byte)
            .ok_or_else(|| Error::short(self.verify_byte + 2, reply.len()))?;
        if actual & self.verify_mask == self.verify_mask {
            Ok(())
        } else {
            Err(Error::VerifyFailed {
                register: self.verify_block,
                expected: vec![self.verify_mask],
                actual: vec![actual],
            })
        }
    }
}

/// Read of an I2C slave register through the tag: write the register
/// pointer, then read `len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cTransfer {
    /// 7-bit slave address.
    pub address: u8,
    pub pointer: u8,
    pub len: u8,
}

impl I2cTransfer {
    pub fn new(address: u8, pointer: u8, len: u8) -> Self {
        Self { address, pointer, len }
    }

    pub fn pointer_write(&self) -> NxpCustomCommand {
        NxpCustomCommand::WriteI2c {
            address: self.address,
            data: vec![self.pointer],
        }
    }

    pub fn read(&self) -> NxpCustomCommand {
        NxpCustomCommand::ReadI2c {
            address: self.address,
            len: self.len,
        }
    }

    /// Extract the register bytes from a READ_I2C reply.
    pub fn parse(&self, reply: &[u8]) -> Result<Vec<u8>> {
        let response = Iso15693Response::parse(reply)?;
        let len = self.len as usize;
        response
            .payload
            .get(..len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::short(len + 1, reply.len()))
    }

    /// Extract a big-endian 16-bit register value.
    pub fn parse_u16(&self, reply: &[u8]) -> Result<u16> {
        match self.parse(reply)?.as_slice() {
            [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
            other => Err(Error::short(2, other.len())),
        }
    }
}
