//! DESFire native commands in ISO 7816-4 wrapping.
//!
//! A native command `cmd data...` travels as `90 cmd 00 00 [Lc data] 00`.
//! Replies carry the native status in SW2 under SW1 `0x91`; long replies are
//! chunked and continued with [`additional_frame`].

use chipscope_core::{Error, ProductionInfo, Result, VersionBlock};

use crate::apdu::Apdu;

/// CLA used for ISO-wrapped native commands.
pub const CLA_NATIVE_WRAP: u8 = 0x90;

/// GetVersion.
pub const CMD_GET_VERSION: u8 = 0x60;

/// GetApplicationIDs.
pub const CMD_GET_APPLICATION_IDS: u8 = 0x6A;

/// Additional frame request.
pub const CMD_ADDITIONAL_FRAME: u8 = 0xAF;

/// Size of a hardware or software version frame.
pub const VERSION_FRAME_LEN: usize = 7;

/// Size of the production frame (UID, batch, week, year).
pub const PRODUCTION_FRAME_LEN: usize = 14;

/// Size of one DESFire application identifier.
pub const AID_LEN: usize = 3;

/// Wrap a native command with a body.
///
/// # Errors
///
/// Returns an error if the body does not fit a short APDU.
///
/// # Examples
///
/// ```
/// use chipscope_protocol::desfire::wrap;
///
/// let apdu = wrap(0x5A, &[0x01, 0x02, 0x03]).unwrap();
/// assert_eq!(apdu.to_bytes().as_ref(), &[0x90, 0x5A, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03, 0x00]);
/// ```
pub fn wrap(command: u8, data: &[u8]) -> Result<Apdu> {
    native(command).with_data(bytes::Bytes::copy_from_slice(data))
}

/// Wrap a native command that carries no body.
fn native(command: u8) -> Apdu {
    Apdu::new(CLA_NATIVE_WRAP, command, 0x00, 0x00).with_le(0x00)
}

pub fn get_version() -> Apdu {
    native(CMD_GET_VERSION)
}

pub fn additional_frame() -> Apdu {
    native(CMD_ADDITIONAL_FRAME)
}

pub fn get_application_ids() -> Apdu {
    native(CMD_GET_APPLICATION_IDS)
}

/// Decode a hardware or software version frame.
///
/// # Errors
///
/// Returns [`Error::ShortResponse`] if fewer than seven bytes are present.
pub fn parse_version_frame(payload: &[u8]) -> Result<VersionBlock> {
    let bytes: [u8; VERSION_FRAME_LEN] = payload
        .get(..VERSION_FRAME_LEN)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| Error::short(VERSION_FRAME_LEN, payload.len()))?;
    Ok(VersionBlock::from_bytes(bytes))
}

/// Decode the production frame: 7-byte UID, 5-byte batch, BCD week and year.
pub fn parse_production_frame(payload: &[u8]) -> Result<ProductionInfo> {
    if payload.len() < PRODUCTION_FRAME_LEN {
        return Err(Error::short(PRODUCTION_FRAME_LEN, payload.len()));
    }
    Ok(ProductionInfo {
        uid: payload[..7].to_vec(),
        batch: payload[7..12].to_vec(),
        week: from_bcd(payload[12])?,
        year: from_bcd(payload[13])?,
    })
}

/// Decode a list of little-endian 3-byte application identifiers.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the length is not a multiple of 3.
pub fn parse_application_ids(payload: &[u8]) -> Result<Vec<u32>> {
    if payload.len() % AID_LEN != 0 {
        return Err(Error::malformed(format!(
            "application ID list of {} bytes is not a multiple of {AID_LEN}",
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(AID_LEN)
        .map(|aid| u32::from_le_bytes([aid[0], aid[1], aid[2], 0]))
        .collect())
}

fn from_bcd(byte: u8) -> Result<u8> {
    let (high, low) = (byte >> 4, byte & 0x0F);
    if high > 9 || low > 9 {
        return Err(Error::malformed(format!("0x{byte:02X} is not BCD")));
    }
    Ok(high * 10 + low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_with_data() {
        let apdu = wrap(0x5A, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(
            apdu.to_bytes().as_ref(),
            &[0x90, 0x5A, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03, 0x00]
        );
    }

    #[test]
    fn test_wrap_rejects_oversize_body() {
        assert!(wrap(0x3D, &[0u8; 256]).is_err());
    }

    #[test]
    fn test_get_version_frame() {
        assert_eq!(get_version().to_bytes().as_ref(), &[0x90, 0x60, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_additional_frame() {
        assert_eq!(
            additional_frame().to_bytes().as_ref(),
            &[0x90, 0xAF, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_parse_version_frame() {
        let block = parse_version_frame(&[0x04, 0x01, 0x01, 0x12, 0x00, 0x1A, 0x05]).unwrap();
        assert_eq!(block.vendor, 0x04);
        assert_eq!(block.major, 0x12);
        assert_eq!(block.storage_size, 0x1A);
        assert!(parse_version_frame(&[0x04, 0x01]).is_err());
    }

    #[test]
    fn test_parse_production_frame() {
        let mut payload = vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        payload.extend_from_slice(&[0xBA, 0x34, 0x56, 0x78, 0x90]);
        payload.extend_from_slice(&[0x21, 0x19]);
        let info = parse_production_frame(&payload).unwrap();
        assert_eq!(info.uid.len(), 7);
        assert_eq!(info.week, 21);
        assert_eq!(info.year, 19);
    }

    #[test]
    fn test_parse_production_rejects_non_bcd() {
        let mut payload = vec![0u8; 12];
        payload.extend_from_slice(&[0x2A, 0x19]);
        assert!(parse_production_frame(&payload).is_err());
    }

    #[test]
    fn test_parse_application_ids() {
        let ids = parse_application_ids(&[0x30, 0x10, 0xF2, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(ids, vec![0xF21030, 0x000001]);
        assert!(parse_application_ids(&[0x01, 0x02]).is_err());
        assert!(parse_application_ids(&[]).unwrap().is_empty());
    }
}
