//! ICODE SLIX, ICODE DNA and NTAG 5 detection over ISO 15693.

use chipscope_core::{ChipIdentity, Confidence, RawTagReading, TechCapability, Transponder};
use chipscope_hardware::{Session, Transport};
use chipscope_protocol::{AddressMode, Iso15693Command, SystemInfo};
use tracing::debug;

use super::{address_mode, send_nfcv, sensor};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::tables::iso15693::{self as table, sensor_signature};

/// A one-byte block count field saturates at this value; larger tags only
/// report their size through the extended command.
const SATURATED_BLOCK_COUNT: u16 = 256;

/// Classify an NfcV tag from its system information.
///
/// Always terminates for NfcV tags: when system information is unavailable
/// the result is `Iso15693Unknown` at Low confidence.
pub async fn detect<T: Transport>(
    session: &mut Session<T>,
    config: &DetectorConfig,
) -> Result<Option<Transponder>> {
    let reading = session.reading().clone();
    if !reading.has(TechCapability::NfcV) {
        return Ok(None);
    }
    let mode = address_mode(&reading);

    let report = match read_system_info(session, &mode).await {
        Ok(report) => report,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            debug!("System info unavailable: {}", e);
            return Ok(Some(unknown(reading, None)));
        }
    };

    let info = &report.info;

    if !table::is_nxp_uid(&info.uid) {
        debug!("UID {} is not an NXP ISO 15693 tag", hex::encode_upper(info.uid));
        let mut transponder = unknown(reading, info.memory_bytes());
        transponder.memory_approximate = report.saturated;
        return Ok(Some(transponder));
    }

    let (identity, confidence) = if report.saturated {
        table::resolve_at_least(info.ic_reference)
    } else {
        table::resolve(info.ic_reference, info.block_count)
    };
    debug!(
        "IC reference {:?}, {:?} blocks (saturated: {}) -> {} ({} confidence)",
        info.ic_reference, info.block_count, report.saturated, identity, confidence
    );

    let mut builder = Transponder::builder(identity, confidence, reading);
    match info.memory_bytes() {
        Some(bytes) if report.saturated => builder = builder.approximate_memory(bytes),
        Some(bytes) => builder = builder.memory(bytes),
        None => {}
    }

    if let Some(signature) = sensor_signature(info.dsfid, info.afi) {
        debug!("Sensor signature matched: {}", signature.label);
        let mut label = signature.label.to_string();
        if config.probe_sensors {
            let readings = sensor::probe(session, &mode, config).await;
            if readings.len() > 1 {
                label.push_str(" (dual sensor)");
            }
            builder = builder.temperatures(readings);
        }
        builder = builder.label(label);
    }
    Ok(Some(builder.build()))
}

/// System information as read from the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfoReport {
    pub info: SystemInfo,
    /// The block count is the saturated one-byte value and only bounds the
    /// tag's size from below.
    pub saturated: bool,
}

/// GET SYSTEM INFO, extended when the block count is missing or saturated.
pub async fn read_system_info<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
) -> Result<SystemInfoReport> {
    let response = send_nfcv(session, &Iso15693Command::GetSystemInfo.to_bytes(mode)).await?;
    let info = SystemInfo::parse(&response.payload)?;
    if info.block_count.is_some_and(|count| count < SATURATED_BLOCK_COUNT) {
        return Ok(SystemInfoReport { info, saturated: false });
    }
    let saturated = info.block_count.is_some();

    match read_extended(session, mode).await {
        Ok(extended) if extended.block_count.is_some() => Ok(SystemInfoReport {
            info: SystemInfo {
                ic_reference: info.ic_reference.or(extended.ic_reference),
                ..extended
            },
            saturated: false,
        }),
        Ok(_) => Ok(SystemInfoReport { info, saturated }),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("Extended system info unavailable: {}", e);
            Ok(SystemInfoReport { info, saturated })
        }
    }
}

async fn read_extended<T: Transport>(session: &mut Session<T>, mode: &AddressMode) -> Result<SystemInfo> {
    let response = send_nfcv(session, &Iso15693Command::GetExtendedSystemInfo.to_bytes(mode)).await?;
    Ok(SystemInfo::parse_extended(&response.payload)?)
}

fn unknown(reading: RawTagReading, memory: Option<u32>) -> Transponder {
    let mut builder = Transponder::builder(ChipIdentity::Iso15693Unknown, Confidence::Low, reading);
    if let Some(bytes) = memory {
        builder = builder.memory(bytes);
    }
    builder.build()
}
