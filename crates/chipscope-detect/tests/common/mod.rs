#![allow(dead_code)]

use chipscope_core::{RawTagReading, TechCapability};
use chipscope_hardware::{Exchange, MockTransport, Session};
use chipscope_protocol::nxp::{EH_ENABLE, EH_TRIGGER, REG_EH_CONFIG, REG_STATUS};
use chipscope_protocol::{AddressMode, I2cTransfer, Iso15693Command, NxpCustomCommand, RegisterWrite};

pub const NFCV_UID: [u8; 8] = [0xE0, 0x04, 0x01, 0x50, 0x11, 0x22, 0x33, 0x44];

pub fn session(reading: RawTagReading, exchanges: Vec<Exchange>) -> Session<MockTransport> {
    Session::new(transport(reading, exchanges))
}

pub fn transport(reading: RawTagReading, exchanges: Vec<Exchange>) -> MockTransport {
    let (mut transport, _handle) = MockTransport::new(reading);
    for exchange in exchanges {
        transport.push(exchange);
    }
    transport
}

pub fn with_status(payload: &[u8], sw1: u8, sw2: u8) -> Vec<u8> {
    let mut reply = payload.to_vec();
    reply.extend([sw1, sw2]);
    reply
}

pub fn ok(payload: &[u8]) -> Vec<u8> {
    with_status(payload, 0x90, 0x00)
}

pub fn type2_reading() -> RawTagReading {
    RawTagReading::new(vec![0x04, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6])
        .unwrap()
        .with_sak(0x00)
        .with_atqa(0x0044)
        .with_capability(TechCapability::NfcA)
        .with_capability(TechCapability::MifareUltralight)
}

pub fn iso_dep_reading() -> RawTagReading {
    RawTagReading::new(vec![0x04, 0x51, 0x62, 0x73, 0x84, 0x95, 0xA6])
        .unwrap()
        .with_sak(0x20)
        .with_capability(TechCapability::NfcA)
        .with_capability(TechCapability::IsoDep)
}

pub fn nfcv_reading() -> RawTagReading {
    RawTagReading::new(NFCV_UID.to_vec())
        .unwrap()
        .with_capability(TechCapability::NfcV)
}

pub fn nfcv_mode() -> AddressMode {
    AddressMode::addressed(&NFCV_UID).unwrap()
}

/// GET SYSTEM INFO reply: flags, info flags, wire-order UID, fields.
pub fn system_info_reply(dsfid_afi: Option<(u8, u8)>, blocks: Option<u8>, ic_reference: Option<u8>) -> Vec<u8> {
    let mut info_flags = 0u8;
    let mut fields = Vec::new();
    if let Some((dsfid, afi)) = dsfid_afi {
        info_flags |= 0x03;
        fields.extend([dsfid, afi]);
    }
    if let Some(count) = blocks {
        info_flags |= 0x04;
        fields.extend([count, 0x03]);
    }
    if let Some(ic) = ic_reference {
        info_flags |= 0x08;
        fields.push(ic);
    }
    let mut reply = vec![0x00, info_flags];
    reply.extend(NFCV_UID.iter().rev());
    reply.extend(fields);
    reply
}

pub fn extended_system_info_reply(dsfid_afi: Option<(u8, u8)>, blocks_minus_one: u16) -> Vec<u8> {
    let mut info_flags = 0x04u8;
    let mut fields = Vec::new();
    if let Some((dsfid, afi)) = dsfid_afi {
        info_flags |= 0x03;
        fields.extend([dsfid, afi]);
    }
    fields.extend(blocks_minus_one.to_le_bytes());
    fields.push(0x03);
    let mut reply = vec![0x00, info_flags];
    reply.extend(NFCV_UID.iter().rev());
    reply.extend(fields);
    reply
}

pub fn nfcv(command: Iso15693Command) -> Vec<u8> {
    command.to_bytes(&nfcv_mode()).to_vec()
}

pub fn nxp(command: NxpCustomCommand) -> Vec<u8> {
    command.to_bytes(&nfcv_mode()).to_vec()
}

pub fn harvest_enable() -> Vec<u8> {
    nxp(RegisterWrite::new(REG_EH_CONFIG, [EH_ENABLE, 0, 0, 0]).command())
}

pub fn harvest_trigger() -> Vec<u8> {
    nxp(RegisterWrite::new(REG_EH_CONFIG, [EH_ENABLE | EH_TRIGGER, 0, 0, 0]).command())
}

pub fn status_read() -> Vec<u8> {
    nxp(NxpCustomCommand::ReadConfig {
        block: REG_STATUS,
        count: 1,
    })
}

pub fn i2c_pointer(address: u8, register: u8) -> Vec<u8> {
    nxp(I2cTransfer::new(address, register, 2).pointer_write())
}

pub fn i2c_read(address: u8, register: u8) -> Vec<u8> {
    nxp(I2cTransfer::new(address, register, 2).read())
}
