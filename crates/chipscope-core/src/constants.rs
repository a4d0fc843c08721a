//! Protocol-level constants shared by the codec, detectors and tables.
//!
//! Byte values here come from the ISO 14443, ISO 7816-4 and ISO 15693
//! standards and from NXP product data sheets. They are grouped by the layer
//! that uses them.
//!
//! # Usage
//!
//! ```
//! use chipscope_core::constants::*;
//!
//! // Version responses from NXP silicon carry this vendor byte.
//! assert_eq!(VENDOR_NXP, 0x04);
//!
//! fn is_plausible_uid(len: usize) -> bool {
//!     (MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len)
//! }
//! assert!(is_plausible_uid(7));
//! ```

// ============================================================================
// Vendors
// ============================================================================

/// Silicon vendor byte reported by NXP version queries.
///
/// This is also the ISO/IEC 7816-6 manufacturer code and appears as the
/// first byte of NXP ISO14443-A UIDs and as byte 6 of ICODE/NTAG5 UIDs.
pub const VENDOR_NXP: u8 = 0x04;

/// CPLC IC fabricator code for NXP.
pub const CPLC_FABRICATOR_NXP: u16 = 0x4790;

/// CPLC IC fabricator code for Infineon.
pub const CPLC_FABRICATOR_INFINEON: u16 = 0x4090;

// ============================================================================
// UID
// ============================================================================

/// Minimum UID length in bytes (single-size ISO 14443 UID).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (triple-size ISO 14443 UID).
pub const MAX_UID_LENGTH: usize = 10;

/// Length of an ISO 15693 UID in bytes.
pub const ISO15693_UID_LENGTH: usize = 8;

// ============================================================================
// ISO 14443-3A
// ============================================================================

/// SAK bit signalling ISO 14443-4 (ISO-DEP) compliance.
pub const SAK_ISO14443_4: u8 = 0x20;

/// SAK bit signalling an incomplete UID (cascade continues).
pub const SAK_UID_INCOMPLETE: u8 = 0x04;

// ============================================================================
// ISO 7816-4 status words
// ============================================================================

/// SW1 for normal completion.
pub const SW1_OK: u8 = 0x90;

/// SW1 used by wrapped DESFire native commands.
pub const SW1_DESFIRE: u8 = 0x91;

/// SW2 that, with [`SW1_DESFIRE`], means "additional frame follows".
pub const SW2_ADDITIONAL_FRAME: u8 = 0xAF;

/// SW2 that, with [`SW1_DESFIRE`], means "operation OK".
pub const SW2_OPERATION_OK: u8 = 0x00;

// ============================================================================
// Type 2 tags
// ============================================================================

/// Size of one Type-2 memory page.
pub const TYPE2_PAGE_SIZE: usize = 4;

/// Bytes returned by one Type-2 READ (four pages).
pub const TYPE2_READ_SIZE: usize = 16;

/// Type-2 positive acknowledge nibble.
pub const TYPE2_ACK: u8 = 0x0A;

// ============================================================================
// ISO 15693
// ============================================================================

/// Default block size (bytes) when a tag does not report one.
pub const ISO15693_DEFAULT_BLOCK_SIZE: usize = 4;

/// Response flag bit signalling an error code follows.
pub const ISO15693_RESPONSE_ERROR: u8 = 0x01;
