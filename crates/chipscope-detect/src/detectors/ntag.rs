//! NTAG / Ultralight detection via the Type 2 GET_VERSION command.

use chipscope_core::constants::VENDOR_NXP;
use chipscope_core::{
    ChipIdentity, Confidence, RawTagReading, TechCapability, Transponder, TransponderBuilder,
    VersionInfo,
};
use chipscope_hardware::{Channel, Session, Transport};
use chipscope_protocol::Type2Command;
use chipscope_protocol::type2::{parse_read, parse_version};
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::error::{ProbeError, Result};
use crate::tables::ntag;

/// Classify a Type 2 tag.
///
/// A decoded version resolves at High confidence. When GET_VERSION is not
/// supported (original Ultralight silicon) the platform's Ultralight hint
/// gives Medium, and anything else is an unknown Type 2 tag at Low.
pub async fn detect<T: Transport>(
    session: &mut Session<T>,
    config: &DetectorConfig,
) -> Result<Option<Transponder>> {
    let reading = session.reading().clone();
    if !reading.is_type2_candidate() {
        return Ok(None);
    }

    let version = session
        .transceive(Channel::NfcA, &Type2Command::GetVersion.to_bytes())
        .await
        .map_err(ProbeError::from)
        .and_then(|reply| Ok(parse_version(&reply)?));

    let mut builder = match version {
        Ok(block) => {
            let (identity, confidence) = match ntag::lookup(&block) {
                Some(identity) if block.vendor == VENDOR_NXP => {
                    debug!("GET_VERSION resolved {}", identity);
                    (identity, Confidence::High)
                }
                _ => {
                    debug!("Unlisted Type 2 version {:02X?}", block);
                    (ChipIdentity::Type2Unknown, Confidence::Low)
                }
            };
            Transponder::builder(identity, confidence, reading.clone()).version(VersionInfo::Ntag(block))
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            debug!("GET_VERSION failed: {}", e);
            fallback(&reading)
        }
    };

    if config.probe_implant_name {
        let identity = builder.identity();
        if let Some(name) = implant_name(session, &reading, identity).await {
            builder = builder.implant_name(name);
        }
    }
    Ok(Some(builder.build()))
}

fn fallback(reading: &RawTagReading) -> TransponderBuilder {
    if reading.has(TechCapability::MifareUltralight) {
        Transponder::builder(ChipIdentity::UltralightOriginal, Confidence::Medium, reading.clone())
    } else {
        Transponder::builder(ChipIdentity::Type2Unknown, Confidence::Low, reading.clone())
    }
}

/// Look for an implant vendor marker, first in cached NDEF records, then in
/// the last four user pages. Best effort: every failure yields `None`.
pub async fn implant_name<T: Transport>(
    session: &mut Session<T>,
    reading: &RawTagReading,
    identity: ChipIdentity,
) -> Option<String> {
    let cached = reading
        .ndef_records
        .iter()
        .find_map(|record| ntag::implant_marker(&record.payload));
    if let Some(name) = cached {
        return Some(name.to_string());
    }

    let (first, last) = ntag::user_pages(identity)?;
    let page = last.saturating_sub(3).max(first);
    let reply = match session
        .transceive(Channel::NfcA, &Type2Command::Read { page }.to_bytes())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            if e.is_fatal() {
                warn!("Implant name probe aborted: {}", e);
            } else {
                debug!("Implant name read failed: {}", e);
            }
            return None;
        }
    };
    let data = parse_read(&reply).ok()?;
    ntag::implant_marker(data).map(str::to_string)
}
