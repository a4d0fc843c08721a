//! Energy-harvest handshake and I2C temperature reads for sensing implants.
//!
//! The tag powers its I2C bus from the reader field only after energy
//! harvesting is enabled and triggered. The configuration write may commit
//! without answering in time, so each write is checked by reading a
//! register back, and readiness is polled against a deadline.

use chipscope_core::{SensorChannel, TemperatureReading};
use chipscope_hardware::{Channel, Session, Transport, TransportError};
use chipscope_protocol::nxp::{EH_ENABLE, EH_TRIGGER, REG_EH_CONFIG, REG_STATUS, STATUS_EH_BYTE, STATUS_EH_LOAD_OK};
use chipscope_protocol::{AddressMode, I2cTransfer, NxpCustomCommand, RegisterWrite, WriteOutcome};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::tables::iso15693::{PLAUSIBLE_CELSIUS, SENSOR_SLOTS, SensorSlot};

/// Bridged sensors reported at most.
const MAX_CHANNELS: usize = 2;

/// Harvest energy and read every responding sensor.
///
/// Best effort: any failure is logged and yields the readings gathered so
/// far, possibly none.
pub async fn probe<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    config: &DetectorConfig,
) -> Vec<TemperatureReading> {
    match harvest(session, mode, config).await {
        Ok(true) => {}
        Ok(false) => {
            debug!("Energy harvesting never reported ready");
            return Vec::new();
        }
        Err(e) => {
            warn!("Energy harvest handshake failed: {}", e);
            return Vec::new();
        }
    }

    let mut readings = Vec::new();
    for slot in SENSOR_SLOTS {
        if readings.len() == MAX_CHANNELS {
            break;
        }
        let channel = if readings.is_empty() {
            SensorChannel::Primary
        } else {
            SensorChannel::Secondary
        };
        match read_slot(session, mode, config, slot, channel).await {
            Ok(Some(reading)) => readings.push(reading),
            Ok(None) => debug!("No usable reading from sensor at {:02X}", slot.address),
            Err(e) => {
                warn!("Sensor read aborted at {:02X}: {}", slot.address, e);
                break;
            }
        }
    }
    if readings.len() == MAX_CHANNELS {
        debug!("Both sensor channels responded");
    }
    readings
}

/// Enable then trigger harvesting and wait for the load-ok status bit.
///
/// `Ok(false)` means the deadline passed, which is not an error.
pub async fn harvest<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    config: &DetectorConfig,
) -> Result<bool> {
    let enable = RegisterWrite::new(REG_EH_CONFIG, [EH_ENABLE, 0x00, 0x00, 0x00]);
    if !write_register(session, mode, &enable).await? {
        return Ok(false);
    }

    let trigger = RegisterWrite::new(REG_EH_CONFIG, [EH_ENABLE | EH_TRIGGER, 0x00, 0x00, 0x00])
        .verified_by(REG_STATUS, STATUS_EH_BYTE, STATUS_EH_LOAD_OK);
    let outcome = send_write(session, mode, &trigger).await?;
    debug!("Harvest trigger {:?}", outcome);

    let deadline = Instant::now() + config.harvest_timeout();
    loop {
        if check(session, mode, &trigger).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        session.sleep(config.harvest_poll_interval()).await?;
    }
}

/// Send a register write; a timeout counts as provisionally accepted.
async fn send_write<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    write: &RegisterWrite,
) -> Result<WriteOutcome> {
    send_custom(session, mode, &write.command()).await
}

/// Send a custom command. Writes that time out are provisionally accepted;
/// a timeout on anything else is a transport failure.
async fn send_custom<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    command: &NxpCustomCommand,
) -> Result<WriteOutcome> {
    let frame = command.to_bytes(mode);
    match session.transceive(Channel::NfcV, &frame).await {
        Ok(reply) => Ok(WriteOutcome::from_reply(Some(&reply))?),
        Err(TransportError::Timeout { duration_ms }) if command.is_write() => {
            debug!("{:?} timed out after {}ms", command, duration_ms);
            Ok(WriteOutcome::from_reply(None)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Write a register and confirm provisional writes by read-back.
async fn write_register<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    write: &RegisterWrite,
) -> Result<bool> {
    match send_write(session, mode, write).await? {
        WriteOutcome::Acknowledged => Ok(true),
        WriteOutcome::Provisional => check(session, mode, write).await,
    }
}

/// Read the verify register back. Unreadable or unset counts as `false`.
async fn check<T: Transport>(session: &mut Session<T>, mode: &AddressMode, write: &RegisterWrite) -> Result<bool> {
    let frame = write.read_back().to_bytes(mode);
    let reply = match session.transceive(Channel::NfcV, &frame).await {
        Ok(reply) => reply,
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(e) => {
            debug!("Read-back of {:02X} failed: {}", write.block, e);
            return Ok(false);
        }
    };
    Ok(write.verify(&reply).is_ok())
}

/// Read one sensor slot, retrying sentinel or implausible values.
async fn read_slot<T: Transport>(
    session: &mut Session<T>,
    mode: &AddressMode,
    config: &DetectorConfig,
    slot: &SensorSlot,
    channel: SensorChannel,
) -> Result<Option<TemperatureReading>> {
    let transfer = I2cTransfer::new(slot.address, slot.register, 2);
    let attempts = config.sensor_read_retries.max(1);

    for attempt in 1..=attempts {
        if attempt > 1 {
            session.sleep(config.harvest_poll_interval()).await?;
        }
        let raw = match read_raw(session, mode, &transfer).await {
            Ok(raw) => raw,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("Sensor {:02X} attempt {}: {}", slot.address, attempt, e);
                continue;
            }
        };
        match slot.kind.celsius(raw) {
            Some(celsius) if PLAUSIBLE_CELSIUS.contains(&celsius) => {
                debug!("Sensor {:02X} reads {:.2} C", slot.address, celsius);
                return Ok(Some(TemperatureReading {
                    channel,
                    i2c_address: slot.address,
                    raw,
                    celsius,
                }));
            }
            _ => debug!("Sensor {:02X} attempt {}: rejected raw {:04X}", slot.address, attempt, raw),
        }
    }
    Ok(None)
}

async fn read_raw<T: Transport>(session: &mut Session<T>, mode: &AddressMode, transfer: &I2cTransfer) -> Result<u16> {
    let outcome = send_custom(session, mode, &transfer.pointer_write()).await?;
    if outcome == WriteOutcome::Provisional {
        debug!("Pointer write to {:02X} unconfirmed; reading anyway", transfer.address);
    }
    let reply = session.transceive(Channel::NfcV, &transfer.read().to_bytes(mode)).await?;
    Ok(transfer.parse_u16(&reply)?)
}
