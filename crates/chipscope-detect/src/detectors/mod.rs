//! Per-protocol detectors.
//!
//! Pure detectors take the [`RawTagReading`] alone; probing detectors also
//! exchange frames through a [`Session`]. Either kind returns
//! `Ok(None)` when its evidence is inconclusive so the waterfall can move on.

use bytes::Bytes;
use chipscope_core::{Error, RawTagReading};
use chipscope_hardware::{Channel, Session, Transport};
use chipscope_protocol::desfire::additional_frame;
use chipscope_protocol::{AddressMode, Apdu, ApduResponse, Completion, Iso15693Response};

use crate::error::{ProbeError, Result};

pub mod anomaly;
pub mod classic;
pub mod desfire;
pub mod iso15693;
pub mod javacard;
pub mod ntag;
pub mod sensor;

/// Send an APDU over ISO-DEP and split the reply.
pub(crate) async fn send_apdu<T: Transport>(session: &mut Session<T>, apdu: &Apdu) -> Result<ApduResponse> {
    let reply = session.transceive(Channel::IsoDep, &apdu.to_bytes()).await?;
    Ok(ApduResponse::parse(&reply)?)
}

/// Send a native command and follow additional-frame replies, returning the
/// payload of every frame.
pub(crate) async fn send_chunked<T: Transport>(
    session: &mut Session<T>,
    apdu: &Apdu,
    max_continuations: usize,
) -> Result<Vec<Bytes>> {
    let mut frames = Vec::new();
    let mut response = send_apdu(session, apdu).await?;
    loop {
        let completion = response.completion()?;
        frames.push(response.into_payload());
        if completion == Completion::Complete {
            return Ok(frames);
        }
        if frames.len() > max_continuations {
            return Err(ProbeError::Protocol(Error::malformed(format!(
                "more than {max_continuations} continuation frames"
            ))));
        }
        response = send_apdu(session, &additional_frame()).await?;
    }
}

/// Send an ISO 15693 frame and check the reply's error flag.
pub(crate) async fn send_nfcv<T: Transport>(session: &mut Session<T>, frame: &[u8]) -> Result<Iso15693Response> {
    let reply = session.transceive(Channel::NfcV, frame).await?;
    Ok(Iso15693Response::parse(&reply)?)
}

/// Address ISO 15693 requests to the reading's UID when it has the right
/// length.
pub(crate) fn address_mode(reading: &RawTagReading) -> AddressMode {
    AddressMode::addressed(&reading.uid).unwrap_or(AddressMode::Unaddressed)
}

/// ATS with the TL byte removed, when the platform supplied one.
pub(crate) fn ats_body(reading: &RawTagReading) -> Option<&[u8]> {
    let ats = reading.ats.as_deref()?;
    match ats.first() {
        Some(&tl) if tl as usize == ats.len() => Some(&ats[1..]),
        Some(_) => Some(ats),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]).unwrap()
    }

    #[test]
    fn test_ats_body_strips_tl() {
        let r = reading().with_ats(vec![0x06, 0x75, 0x77, 0x81, 0x02, 0x80]);
        assert_eq!(ats_body(&r), Some(&[0x75, 0x77, 0x81, 0x02, 0x80][..]));
        let r = reading().with_ats(vec![0x75, 0x77, 0x81, 0x02, 0x80]);
        assert_eq!(ats_body(&r), Some(&[0x75, 0x77, 0x81, 0x02, 0x80][..]));
        assert_eq!(ats_body(&reading()), None);
    }

    #[test]
    fn test_address_mode_needs_eight_bytes() {
        assert_eq!(address_mode(&reading()), AddressMode::Unaddressed);
        let uid = [0xE0, 0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let r = RawTagReading::new(uid.to_vec()).unwrap();
        assert_eq!(address_mode(&r), AddressMode::Addressed(uid));
    }
}
