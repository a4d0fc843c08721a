//! Byte-exact command codecs for contactless chips.
//!
//! Four wire formats are covered, one module each:
//!
//! - [`type2`]: NFC Forum Type 2 commands (single instruction byte + address)
//! - [`apdu`]: ISO 7816-4 APDUs, including ISO-wrapped DESFire native
//!   commands ([`desfire`])
//! - [`iso15693`]: ISO 15693 standard commands and NXP custom commands
//!   ([`nxp`])
//! - [`register`]: register write/read-back verification and I2C passthrough
//!   frames layered on the NXP custom commands
//!
//! Builders return [`bytes::Bytes`]; parsers take `&[u8]` and return typed
//! values or a [`chipscope_core::Error`].
//!
//! # Example
//!
//! ```
//! use chipscope_protocol::{ApduResponse, Completion};
//!
//! let response = ApduResponse::parse(&[0x01, 0x02, 0x91, 0xAF]).unwrap();
//! assert_eq!(response.payload(), &[0x01, 0x02]);
//! assert_eq!(response.completion().unwrap(), Completion::MoreData);
//! ```

pub mod aid;
pub mod apdu;
pub mod desfire;
pub mod iso15693;
pub mod nxp;
pub mod register;
pub mod status;
pub mod type2;

pub use aid::WellKnownAid;
pub use apdu::{Apdu, ApduResponse};
pub use iso15693::{AddressMode, Iso15693Command, Iso15693Response, SystemInfo};
pub use nxp::NxpCustomCommand;
pub use register::{I2cTransfer, RegisterWrite, WriteOutcome};
pub use status::{Completion, StatusWord};
pub use type2::Type2Command;
