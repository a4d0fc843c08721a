//! ISO 7816-4 command and response APDUs.
//!
//! Only short APDUs are built (Lc and Le fit in one byte); nothing the
//! detectors send needs extended length.

use bytes::{BufMut, Bytes, BytesMut};
use chipscope_core::{Error, Result};

use crate::status::{Completion, StatusWord};

/// ISO CLA byte.
pub const CLA_ISO: u8 = 0x00;

/// GlobalPlatform proprietary CLA byte.
pub const CLA_GP: u8 = 0x80;

/// SELECT instruction.
pub const INS_SELECT: u8 = 0xA4;

/// GET DATA instruction.
pub const INS_GET_DATA: u8 = 0xCA;

/// Minimum AID length accepted by SELECT (RID only).
pub const MIN_AID_LENGTH: usize = 5;

/// Maximum AID length accepted by SELECT.
pub const MAX_AID_LENGTH: usize = 16;

/// Largest body a short APDU can carry.
pub const MAX_SHORT_DATA_LENGTH: usize = 255;

/// A command APDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apdu {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Bytes,
    /// Expected response length; `Some(0)` requests up to 256 bytes.
    pub le: Option<u8>,
}

impl Apdu {
    /// Case 1 APDU (header only).
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
            le: None,
        }
    }

    /// Attach a command body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not fit a short APDU's one-byte Lc.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() > MAX_SHORT_DATA_LENGTH {
            return Err(Error::invalid_argument(format!(
                "APDU body must be at most {MAX_SHORT_DATA_LENGTH} bytes, got {}",
                data.len()
            )));
        }
        self.data = data;
        Ok(self)
    }

    /// Attach an expected length.
    pub fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// SELECT by DF name (AID), first or only occurrence.
    ///
    /// # Errors
    ///
    /// Returns an error if the AID is not 5-16 bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_protocol::Apdu;
    ///
    /// let apdu = Apdu::select(&[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]).unwrap();
    /// assert_eq!(
    ///     apdu.to_bytes().as_ref(),
    ///     &[0x00, 0xA4, 0x04, 0x00, 0x07, 0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10, 0x00]
    /// );
    /// ```
    pub fn select(aid: &[u8]) -> Result<Self> {
        if !(MIN_AID_LENGTH..=MAX_AID_LENGTH).contains(&aid.len()) {
            return Err(Error::invalid_argument(format!(
                "AID must be {MIN_AID_LENGTH}-{MAX_AID_LENGTH} bytes, got {}",
                aid.len()
            )));
        }
        Ok(Self::new(CLA_ISO, INS_SELECT, 0x04, 0x00)
            .with_data(Bytes::copy_from_slice(aid))?
            .with_le(0x00))
    }

    /// GlobalPlatform GET DATA for a two-byte tag.
    pub fn get_data(tag: u16) -> Self {
        let [p1, p2] = tag.to_be_bytes();
        Self::new(CLA_GP, INS_GET_DATA, p1, p2).with_le(0x00)
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(6 + self.data.len());
        buf.put_u8(self.cla);
        buf.put_u8(self.ins);
        buf.put_u8(self.p1);
        buf.put_u8(self.p2);
        if !self.data.is_empty() {
            buf.put_u8(self.data.len() as u8);
            buf.put_slice(&self.data);
        }
        if let Some(le) = self.le {
            buf.put_u8(le);
        }
        buf.freeze()
    }
}

/// A response APDU split into payload and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    payload: Bytes,
    status: StatusWord,
}

impl ApduResponse {
    /// Split a raw response into payload and trailing status word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShortResponse`] if fewer than two bytes were received.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(Error::short(2, raw.len()));
        }
        let (payload, trailer) = raw.split_at(raw.len() - 2);
        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status: StatusWord::new(trailer[0], trailer[1]),
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn status(&self) -> StatusWord {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// See [`StatusWord::completion`].
    pub fn completion(&self) -> Result<Completion> {
        self.status.completion()
    }

    /// Payload of a successful response.
    ///
    /// # Errors
    ///
    /// Returns the status error if the command failed.
    pub fn success_payload(&self) -> Result<&[u8]> {
        self.status.completion()?;
        Ok(&self.payload)
    }
}
