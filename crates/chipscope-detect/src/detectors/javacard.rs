//! JavaCard platform and applet detection.
//!
//! Three steps of the ISO-DEP sub-waterfall live here: the CPLC probe, the
//! historical-byte pattern fallback and the applet re-probe.

use chipscope_core::{AppletCategory, AppletInfo, ChipIdentity, Confidence, RawTagReading, Transponder};
use chipscope_hardware::{Session, Transport};
use chipscope_protocol::{Apdu, WellKnownAid};
use tracing::{debug, warn};

use super::send_apdu;
use crate::error::Result;
use crate::tables::javacard::{CPLC_TAG, Cplc, match_historical};

/// Applets found by a presence probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppletScan {
    pub found: Vec<WellKnownAid>,
}

impl AppletScan {
    pub fn contains(&self, aid: WellKnownAid) -> bool {
        self.found.contains(&aid)
    }

    /// Memory manager or platform-discovery applet alone identifies JCOP4.
    pub fn implies_jcop4(&self) -> bool {
        self.contains(WellKnownAid::MemoryManager) || self.contains(WellKnownAid::FidesmoPlatform)
    }

    /// Name of the first payment network found.
    pub fn payment_network(&self) -> Option<&'static str> {
        self.found
            .iter()
            .find(|aid| aid.is_payment())
            .map(|aid| aid.label())
    }

    pub fn applets(&self) -> Vec<AppletInfo> {
        self.found
            .iter()
            .map(|aid| AppletInfo::new(aid.aid(), aid.label(), aid.category()))
            .collect()
    }
}

/// SELECT an application; `Ok(false)` when the card answers but refuses.
async fn select<T: Transport>(session: &mut Session<T>, aid: WellKnownAid) -> Result<bool> {
    match send_apdu(session, &aid.select()).await {
        Ok(response) => Ok(response.is_success()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("SELECT {} failed: {}", aid.label(), e);
            Ok(false)
        }
    }
}

/// Try every applet of the probe set.
pub async fn probe_applets<T: Transport>(session: &mut Session<T>) -> Result<AppletScan> {
    let mut scan = AppletScan::default();
    for aid in WellKnownAid::PROBE_SET {
        if select(session, aid).await? {
            debug!("Applet present: {}", aid.label());
            scan.found.push(aid);
        }
    }
    Ok(scan)
}

/// Select a card manager and read its CPLC block.
async fn read_cplc<T: Transport>(session: &mut Session<T>) -> Result<Option<(WellKnownAid, Cplc)>> {
    for manager in WellKnownAid::CARD_MANAGERS {
        if !select(session, manager).await? {
            continue;
        }
        let response = send_apdu(session, &Apdu::get_data(CPLC_TAG)).await?;
        let cplc = Cplc::parse(response.success_payload()?)?;
        return Ok(Some((manager, cplc)));
    }
    Ok(None)
}

fn with_applets(
    identity: ChipIdentity,
    confidence: Confidence,
    reading: RawTagReading,
    mut applets: Vec<AppletInfo>,
    scan: &AppletScan,
) -> Transponder {
    applets.extend(scan.applets());
    let mut builder = Transponder::builder(identity, confidence, reading).applets(applets);
    if let Some(network) = scan.payment_network() {
        builder = builder.payment_network(network);
    }
    builder.build()
}

/// Classify from CPLC data, then record which applets are installed.
pub async fn detect_cplc<T: Transport>(session: &mut Session<T>) -> Result<Option<Transponder>> {
    let reading = session.reading().clone();
    let Some((manager, cplc)) = read_cplc(session).await? else {
        return Ok(None);
    };
    let (mut identity, mut confidence) = cplc.platform();
    debug!(
        "CPLC fabricator {:04X} ({}) OS {:04X} -> {}",
        cplc.ic_fabricator,
        cplc.fabricator_name(),
        cplc.os_id,
        identity
    );

    // Applets refine an unlisted CPLC platform and are recorded either way.
    let scan = match probe_applets(session).await {
        Ok(scan) => scan,
        Err(e) => {
            warn!("Applet probe aborted: {}", e);
            AppletScan::default()
        }
    };
    if identity == ChipIdentity::JavaCardUnknown && scan.implies_jcop4() {
        debug!("CPLC platform unlisted; installed applets imply JCOP4");
        (identity, confidence) = (ChipIdentity::Jcop4, Confidence::Medium);
    }
    let manager_info = AppletInfo::new(manager.aid(), manager.label(), AppletCategory::CardManager);
    Ok(Some(with_applets(identity, confidence, reading, vec![manager_info], &scan)))
}

/// Fallback classification from historical-byte patterns.
pub fn detect_ats(reading: &RawTagReading) -> Option<Transponder> {
    let historical = reading.historical()?;
    let (identity, label) = match_historical(&historical)?;
    debug!("Historical bytes match {}", label);
    Some(
        Transponder::builder(identity, Confidence::Medium, reading.clone())
            .label(label)
            .build(),
    )
}

/// Classify from applet presence alone.
pub async fn detect_applets<T: Transport>(session: &mut Session<T>) -> Result<Option<Transponder>> {
    let reading = session.reading().clone();
    let scan = probe_applets(session).await?;
    if scan.found.is_empty() {
        return Ok(None);
    }
    let (identity, confidence) = if scan.implies_jcop4() {
        (ChipIdentity::Jcop4, Confidence::Medium)
    } else {
        (ChipIdentity::JavaCardUnknown, Confidence::Low)
    };
    debug!("Applet probe found {} applets -> {}", scan.found.len(), identity);
    Ok(Some(with_applets(identity, confidence, reading, Vec::new(), &scan)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x08, 0x11, 0x22, 0x33]).unwrap()
    }

    #[test]
    fn test_scan_payment_network() {
        let scan = AppletScan {
            found: vec![WellKnownAid::OpenPgp, WellKnownAid::Mastercard],
        };
        assert_eq!(scan.payment_network(), Some("Mastercard"));
        assert!(!scan.implies_jcop4());
        assert_eq!(scan.applets().len(), 2);
    }

    #[test]
    fn test_scan_jcop4_markers() {
        for marker in [WellKnownAid::MemoryManager, WellKnownAid::FidesmoPlatform] {
            assert!(AppletScan { found: vec![marker] }.implies_jcop4());
        }
    }

    #[test]
    fn test_historical_fallback() {
        let r = reading().with_historical_bytes(b"JCOP4 J3R180".to_vec());
        let t = detect_ats(&r).unwrap();
        assert_eq!(t.identity(), ChipIdentity::Jcop4);
        assert_eq!(t.confidence, Confidence::Medium);
        assert!(detect_ats(&reading().with_historical_bytes(vec![0x80])).is_none());
    }
}
