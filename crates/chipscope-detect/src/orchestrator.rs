//! Detection waterfall.
//!
//! The [`Detector`] walks an ordered list of steps. Each step either
//! terminates with a [`Transponder`] or falls through to the next one.
//!
//! # Steps
//!
//! 1. `MifareClassic`: SAK or capacity hint, only without ISO-DEP
//! 2. `Ntag`: Type 2 profile, GET_VERSION
//! 3. `IsoDep`: a nested waterfall
//!    - `DesfireVersion` → `DesfireAts` → `JavaCardCplc` → `JavaCardAts`
//!      → `AppletReprobe` → `UnknownIsoA`
//! 4. `Iso15693`: system info plus the sensor sub-probe
//! 5. `Iso14443B`: terminal for NfcB tags
//! 6. `Unknown`: always terminates
//!
//! # Failure policy
//!
//! A probe that fails with a protocol error or a rejected command is logged
//! and the waterfall advances. A fatal transport error (tag lost, cancelled,
//! timeout, permission) ends the scan and is returned to the caller.
//!
//! # Examples
//!
//! ```
//! use chipscope_core::{ChipIdentity, RawTagReading, TechCapability};
//! use chipscope_detect::Detector;
//! use chipscope_hardware::MockTransport;
//!
//! # tokio_test_block_on(async {
//! let reading = RawTagReading::new(vec![0x11, 0x22, 0x33, 0x44])
//!     .unwrap()
//!     .with_sak(0x08)
//!     .with_capability(TechCapability::NfcA);
//! let (transport, _handle) = MockTransport::new(reading);
//!
//! let transponder = Detector::default().scan(transport, None).await.unwrap();
//! assert_eq!(transponder.identity(), ChipIdentity::MifareClassic1k);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::fmt;

use chipscope_core::{ChipIdentity, Confidence, RawTagReading, TechCapability, Transponder};
use chipscope_hardware::{Session, Transport, TransportError};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::DetectorConfig;
use crate::detectors::{anomaly, classic, desfire, iso15693, javacard, ntag};
use crate::error::Result as ProbeResult;

/// Top-level waterfall steps, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallStep {
    MifareClassic,
    Ntag,
    IsoDep,
    Iso15693,
    Iso14443B,
    Unknown,
}

impl WaterfallStep {
    pub const ORDER: [WaterfallStep; 6] = [
        WaterfallStep::MifareClassic,
        WaterfallStep::Ntag,
        WaterfallStep::IsoDep,
        WaterfallStep::Iso15693,
        WaterfallStep::Iso14443B,
        WaterfallStep::Unknown,
    ];
}

impl fmt::Display for WaterfallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaterfallStep::MifareClassic => "MIFARE Classic",
            WaterfallStep::Ntag => "NTAG/Ultralight",
            WaterfallStep::IsoDep => "ISO-DEP",
            WaterfallStep::Iso15693 => "ISO 15693",
            WaterfallStep::Iso14443B => "ISO 14443-B",
            WaterfallStep::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Steps of the nested ISO-DEP waterfall, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsoDepStep {
    DesfireVersion,
    DesfireAts,
    JavaCardCplc,
    JavaCardAts,
    AppletReprobe,
    UnknownIsoA,
}

impl IsoDepStep {
    pub const ORDER: [IsoDepStep; 6] = [
        IsoDepStep::DesfireVersion,
        IsoDepStep::DesfireAts,
        IsoDepStep::JavaCardCplc,
        IsoDepStep::JavaCardAts,
        IsoDepStep::AppletReprobe,
        IsoDepStep::UnknownIsoA,
    ];
}

impl fmt::Display for IsoDepStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IsoDepStep::DesfireVersion => "DESFire version",
            IsoDepStep::DesfireAts => "DESFire ATS",
            IsoDepStep::JavaCardCplc => "JavaCard CPLC",
            IsoDepStep::JavaCardAts => "JavaCard ATS",
            IsoDepStep::AppletReprobe => "applet re-probe",
            IsoDepStep::UnknownIsoA => "unknown ISO 14443-A",
        };
        f.write_str(name)
    }
}

/// Progress report for each step entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "step", rename_all = "snake_case")]
pub enum DetectionStep {
    Waterfall(WaterfallStep),
    IsoDep(IsoDepStep),
}

/// Optional progress callback.
pub type Progress<'a> = Option<&'a (dyn Fn(DetectionStep) + Send + Sync)>;

fn report(progress: Progress<'_>, step: DetectionStep) {
    if let Some(callback) = progress {
        callback(step);
    }
}

/// Runs the detection waterfall against one session.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Open a session on `transport`, classify the tag and close it.
    pub async fn scan<T: Transport>(&self, transport: T, progress: Progress<'_>) -> Result<Transponder, TransportError> {
        self.scan_with_cancellation(transport, CancellationToken::new(), progress)
            .await
    }

    /// Like [`scan`](Self::scan), cancelled through `cancel`.
    ///
    /// The transport is closed whether or not detection succeeded.
    pub async fn scan_with_cancellation<T: Transport>(
        &self,
        transport: T,
        cancel: CancellationToken,
        progress: Progress<'_>,
    ) -> Result<Transponder, TransportError> {
        let mut session = Session::with_cancellation(transport, cancel);
        let result = self.detect(&mut session, progress).await;
        if let Err(e) = session.finish().await {
            warn!("Failed to close transport: {}", e);
        }
        result
    }

    /// Classify the tag presented in `session`.
    ///
    /// # Errors
    ///
    /// Returns the transport error when a probe fails fatally or the session
    /// is cancelled. Every other outcome is a [`Transponder`], possibly
    /// `Unknown` at Low confidence.
    pub async fn detect<T: Transport>(
        &self,
        session: &mut Session<T>,
        progress: Progress<'_>,
    ) -> Result<Transponder, TransportError> {
        let span = info_span!("scan", session = %session.id());
        self.run(session, progress).instrument(span).await
    }

    async fn run<T: Transport>(
        &self,
        session: &mut Session<T>,
        progress: Progress<'_>,
    ) -> Result<Transponder, TransportError> {
        debug!("Starting detection for UID {}", session.reading().uid_hex());

        for step in WaterfallStep::ORDER {
            ensure_live(session)?;
            report(progress, DetectionStep::Waterfall(step));
            debug!("Entering step {}", step);

            let outcome = self.run_step(step, session, progress).await;
            if let Some(transponder) = settle(step, outcome)? {
                return self.finish(session, transponder);
            }
            debug!("Step {} inconclusive", step);
        }

        // The Unknown step always terminates; this only guards the loop.
        let transponder = unknown(session.reading(), ChipIdentity::Unknown);
        self.finish(session, transponder)
    }

    async fn run_step<T: Transport>(
        &self,
        step: WaterfallStep,
        session: &mut Session<T>,
        progress: Progress<'_>,
    ) -> ProbeResult<Option<Transponder>> {
        let reading = session.reading().clone();
        match step {
            WaterfallStep::MifareClassic => Ok(classic::detect(&reading)),
            WaterfallStep::Ntag => ntag::detect(session, &self.config).await,
            WaterfallStep::IsoDep => {
                if !reading.has_iso_dep() {
                    return Ok(None);
                }
                self.run_iso_dep(session, progress).await
            }
            WaterfallStep::Iso15693 => iso15693::detect(session, &self.config).await,
            WaterfallStep::Iso14443B => Ok(reading
                .has(TechCapability::NfcB)
                .then(|| unknown(&reading, ChipIdentity::Iso14443bUnknown))),
            WaterfallStep::Unknown => Ok(Some(unknown(&reading, ChipIdentity::Unknown))),
        }
    }

    /// The nested ISO-DEP waterfall. Recoverable failures advance within it;
    /// fatal ones leave it.
    async fn run_iso_dep<T: Transport>(
        &self,
        session: &mut Session<T>,
        progress: Progress<'_>,
    ) -> ProbeResult<Option<Transponder>> {
        let reading = session.reading().clone();
        for step in IsoDepStep::ORDER {
            if session.is_cancelled() {
                return Err(TransportError::Cancelled.into());
            }
            report(progress, DetectionStep::IsoDep(step));
            debug!("Entering ISO-DEP step {}", step);

            let outcome = match step {
                IsoDepStep::DesfireVersion => desfire::detect_version(session, &self.config).await,
                IsoDepStep::DesfireAts => Ok(desfire::detect_ats(&reading)),
                IsoDepStep::JavaCardCplc => javacard::detect_cplc(session).await,
                IsoDepStep::JavaCardAts => Ok(javacard::detect_ats(&reading)),
                IsoDepStep::AppletReprobe => javacard::detect_applets(session).await,
                IsoDepStep::UnknownIsoA => Ok(is_type_a(&reading)
                    .then(|| unknown(&reading, ChipIdentity::Iso14443aUnknown))),
            };
            match outcome {
                Ok(Some(transponder)) => return Ok(Some(transponder)),
                Ok(None) => debug!("ISO-DEP step {} inconclusive", step),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("ISO-DEP step {} failed: {}", step, e),
            }
        }
        Ok(None)
    }

    fn finish<T: Transport>(
        &self,
        session: &Session<T>,
        mut transponder: Transponder,
    ) -> Result<Transponder, TransportError> {
        // Best-effort sub-probes swallow cancellation; honour it here.
        ensure_live(session)?;
        transponder.platform = session.platform();
        transponder.anomaly = anomaly::analyze(&transponder.reading);
        if let Some(anomaly) = &transponder.anomaly {
            info!("Anomaly: {}", anomaly.description);
        }
        info!(
            "Detected {} ({} confidence) after {} exchanges",
            transponder.label,
            transponder.confidence,
            session.exchanges()
        );
        Ok(transponder)
    }
}

fn ensure_live<T: Transport>(session: &Session<T>) -> Result<(), TransportError> {
    if session.is_cancelled() {
        warn!("Session {} cancelled", session.id());
        return Err(TransportError::Cancelled);
    }
    Ok(())
}

/// Turn a step outcome into "terminate", "advance" or a fatal error.
fn settle(
    step: WaterfallStep,
    outcome: ProbeResult<Option<Transponder>>,
) -> Result<Option<Transponder>, TransportError> {
    match outcome {
        Ok(found) => Ok(found),
        Err(e) => match e.into_fatal() {
            Ok(fatal) => {
                warn!("Step {} aborted the scan: {}", step, fatal);
                Err(fatal)
            }
            Err(e) => {
                debug!("Step {} failed: {}", step, e);
                Ok(None)
            }
        },
    }
}

fn is_type_a(reading: &RawTagReading) -> bool {
    reading.has(TechCapability::NfcA) || reading.sak.is_some() || reading.atqa.is_some()
}

fn unknown(reading: &RawTagReading, identity: ChipIdentity) -> Transponder {
    Transponder::builder(identity, Confidence::Low, reading.clone()).build()
}
