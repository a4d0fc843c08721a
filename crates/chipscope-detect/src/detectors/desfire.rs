//! DESFire, DESFire Light, NTAG DNA and MIFARE Plus detection.
//!
//! The primary path reads the ISO-wrapped GetVersion frames. The fallback
//! path matches ATS and SAK/ATQA signatures and never claims more than
//! Medium confidence.

use chipscope_core::constants::VENDOR_NXP;
use chipscope_core::{
    AppletInfo, ChipIdentity, Confidence, DesfireVersion, RawTagReading, Transponder, VersionInfo,
};
use chipscope_hardware::{Session, Transport};
use chipscope_protocol::Completion;
use chipscope_protocol::desfire::{
    additional_frame, get_application_ids, get_version, parse_application_ids, parse_production_frame,
    parse_version_frame,
};
use tracing::{debug, warn};

use super::{ats_body, send_apdu, send_chunked};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::tables::applications;
use crate::tables::desfire::{self as table, ProductLine};

/// Classify from the GetVersion frames.
///
/// Returns `Ok(None)` when the chip answers but is not an NXP part of a
/// known product line, leaving the decision to later steps.
pub async fn detect_version<T: Transport>(
    session: &mut Session<T>,
    config: &DetectorConfig,
) -> Result<Option<Transponder>> {
    let reading = session.reading().clone();
    let Some(version) = read_version(session).await? else {
        return Ok(None);
    };
    let hardware = version.hardware;

    if hardware.vendor != VENDOR_NXP {
        debug!("GetVersion vendor {:02X} is not NXP", hardware.vendor);
        return Ok(None);
    }
    let Some(line) = table::product_line(hardware.product_type) else {
        debug!("Unlisted product type {:02X}", hardware.product_type);
        return Ok(None);
    };

    let mut label = None;
    let (identity, confidence) = match line {
        ProductLine::Desfire => table::desfire_generation(hardware.major),
        ProductLine::DesfireLight => (ChipIdentity::DesfireLight, Confidence::High),
        ProductLine::NtagDna => match table::dna_variant(hardware.subtype) {
            Some(identity) => (identity, Confidence::High),
            None => {
                label = Some(format!("NTAG DNA (subtype {:02X})", hardware.subtype));
                (ChipIdentity::NtagDnaUnknown, Confidence::Low)
            }
        },
        ProductLine::MifarePlus => match table::plus_generation(hardware.major) {
            ChipIdentity::MifarePlusUnknown => (ChipIdentity::MifarePlusUnknown, Confidence::Low),
            identity => (identity, Confidence::High),
        },
    };
    debug!("GetVersion resolved {} ({} confidence)", identity, confidence);

    let mut builder = Transponder::builder(identity, confidence, reading);
    if let Some(label) = label {
        builder = builder.label(label);
    }
    if matches!(line, ProductLine::Desfire | ProductLine::MifarePlus) {
        match table::storage_size(hardware.storage_size) {
            Some(size) if size.approximate => builder = builder.approximate_memory(size.bytes),
            Some(size) => builder = builder.memory(size.bytes),
            None => {}
        }
    }
    if line == ProductLine::Desfire && config.enumerate_desfire_apps {
        if let Some(applets) = enumerate_applications(session, config).await {
            builder = builder.applets(applets);
        }
    }
    Ok(Some(builder.version(VersionInfo::Desfire(version)).build()))
}

/// Read hardware, software and production frames.
///
/// The hardware frame is required. The software frame follows when the
/// card signals more data; the production frame is optional and its
/// failure is ignored unless the session itself failed.
async fn read_version<T: Transport>(session: &mut Session<T>) -> Result<Option<DesfireVersion>> {
    let response = send_apdu(session, &get_version()).await?;
    let completion = response.completion()?;
    let hardware = parse_version_frame(response.payload())?;

    let mut version = DesfireVersion {
        hardware,
        software: None,
        production: None,
    };
    if completion == Completion::Complete {
        return Ok(Some(version));
    }

    let response = send_apdu(session, &additional_frame()).await?;
    let completion = response.completion()?;
    version.software = Some(parse_version_frame(response.payload())?);
    if completion == Completion::Complete {
        return Ok(Some(version));
    }

    match send_apdu(session, &additional_frame()).await {
        Ok(response) => match response
            .success_payload()
            .and_then(parse_production_frame)
        {
            Ok(production) => version.production = Some(production),
            Err(e) => debug!("Production frame unreadable: {}", e),
        },
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => debug!("Production frame failed: {}", e),
    }
    Ok(Some(version))
}

/// List installed applications. Best effort: failures yield `None`.
pub async fn enumerate_applications<T: Transport>(
    session: &mut Session<T>,
    config: &DetectorConfig,
) -> Option<Vec<AppletInfo>> {
    let frames = match send_chunked(session, &get_application_ids(), config.max_continuation_frames).await {
        Ok(frames) => frames,
        Err(e) => {
            if e.is_fatal() {
                warn!("Application enumeration aborted: {}", e);
            } else {
                debug!("Application enumeration failed: {}", e);
            }
            return None;
        }
    };
    let payload: Vec<u8> = frames.iter().flat_map(|frame| frame.iter().copied()).collect();
    match parse_application_ids(&payload) {
        Ok(ids) => {
            debug!("Found {} DESFire applications", ids.len());
            Some(ids.into_iter().map(applications::describe).collect())
        }
        Err(e) => {
            debug!("Application list malformed: {}", e);
            None
        }
    }
}

/// Fallback classification from ATS and SAK/ATQA signatures.
pub fn detect_ats(reading: &RawTagReading) -> Option<Transponder> {
    if let Some(signature) = ats_body(reading).and_then(table::match_ats) {
        debug!("ATS matches {}", signature.label);
        return Some(
            Transponder::builder(signature.identity, Confidence::Medium, reading.clone())
                .label(signature.label)
                .build(),
        );
    }
    if reading.sak == Some(table::DESFIRE_SAK) && reading.atqa == Some(table::DESFIRE_ATQA) {
        debug!("SAK/ATQA match MIFARE DESFire");
        return Some(
            Transponder::builder(ChipIdentity::DesfireUnknown, Confidence::Medium, reading.clone())
                .label("MIFARE DESFire")
                .build(),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipscope_core::ChipFamily;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]).unwrap()
    }

    #[test]
    fn test_ats_light() {
        let t = detect_ats(&reading().with_ats(vec![0x06, 0x78, 0x77, 0x71, 0x02, 0x80])).unwrap();
        assert_eq!(t.identity(), ChipIdentity::DesfireLight);
        assert_eq!(t.confidence, Confidence::Medium);
    }

    #[test]
    fn test_ats_ntag_dna_stays_in_ntag_family() {
        let t = detect_ats(&reading().with_ats(vec![0x06, 0x77, 0x77, 0x71, 0x02, 0x80])).unwrap();
        assert_eq!(t.identity(), ChipIdentity::NtagDnaUnknown);
        assert_eq!(t.family(), ChipFamily::Ntag);
        assert_eq!(t.label, "NTAG DNA");
        assert!(!t.cloneability().cloneable);
    }

    #[test]
    fn test_sak_atqa_fallback() {
        let t = detect_ats(&reading().with_sak(0x20).with_atqa(0x0344)).unwrap();
        assert_eq!(t.identity(), ChipIdentity::DesfireUnknown);
        assert_eq!(t.label, "MIFARE DESFire");
        assert!(t.confidence <= Confidence::Medium);
    }

    #[test]
    fn test_no_signature() {
        assert!(detect_ats(&reading().with_sak(0x20).with_atqa(0x0004)).is_none());
    }
}
