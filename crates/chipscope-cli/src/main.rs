//! chipscope: replay recorded scans through the detection waterfall.

use std::path::Path;

use anyhow::Context;
use chipscope_catalog::{Advisory, MatchResult, PRODUCTS, Matcher};
use chipscope_core::Transponder;
use chipscope_detect::{DetectionStep, Detector, DetectorConfig};
use chipscope_hardware::{AnyTransport, MockTransport, ScanFixture};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Commands};

/// Everything printed for one scan.
#[derive(Debug, Serialize)]
struct Report<'a> {
    transponder: &'a Transponder,
    matches: MatchResult<'static>,
    advisories: Vec<Advisory>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            fixture,
            config,
            pretty,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => DetectorConfig::default(),
            };
            let fixture = load_fixture(&fixture)?;
            let output = scan(fixture, config, pretty).await?;
            println!("{output}");
        }
        Commands::Catalog => {
            for product in PRODUCTS {
                println!("{:<20} {:<18} {:<16} {}", product.id, product.name, product.family, product.notes);
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&DetectorConfig::default())?);
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<DetectorConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    debug!("Loaded detector config from {}", path.display());
    Ok(config)
}

fn load_fixture(path: &Path) -> anyhow::Result<ScanFixture> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Replay a fixture and render the report as JSON.
async fn scan(fixture: ScanFixture, config: DetectorConfig, pretty: bool) -> anyhow::Result<String> {
    info!(
        "Replaying scan of UID {} ({} recorded exchanges)",
        fixture.reading.uid_hex(),
        fixture.exchanges.len()
    );
    let (transport, _handle) = MockTransport::from_fixture(fixture);
    let progress = |step: DetectionStep| debug!("Step {:?}", step);

    let transponder = Detector::new(config)
        .scan(AnyTransport::from(transport), Some(&progress))
        .await
        .context("scan aborted")?;

    let matcher = Matcher::default();
    let matches = matcher.match_transponder(&transponder);
    let advisories = matcher.advisories(&transponder, &matches);
    for advisory in &advisories {
        info!("Advisory: {}", advisory);
    }

    let report = Report {
        transponder: &transponder,
        matches,
        advisories,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NTAG216_FIXTURE: &str = include_str!("../../../fixtures/ntag216_implant.json");
    const CLASSIC_FIXTURE: &str = include_str!("../../../fixtures/classic_4k.json");

    #[tokio::test]
    async fn test_scan_ntag216_fixture() {
        let fixture: ScanFixture = serde_json::from_str(NTAG216_FIXTURE).unwrap();
        let output = scan(fixture, DetectorConfig::default(), false).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["transponder"]["identity"], "ntag216");
        assert_eq!(json["transponder"]["implant_name"], "xNT");
        assert_eq!(json["matches"]["exact_matches"][0]["id"], "xnt");
        assert_eq!(json["matches"]["conversion_recommended"], false);
    }

    #[tokio::test]
    async fn test_scan_classic_fixture_reports_advisories() {
        let fixture: ScanFixture = serde_json::from_str(CLASSIC_FIXTURE).unwrap();
        let output = scan(fixture, DetectorConfig::default(), true).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["transponder"]["identity"], "mifare_classic4k");
        assert_eq!(json["advisories"][0]["kind"], "classic_capacity_mismatch");
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&DetectorConfig::default()).unwrap();
        let config: DetectorConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, DetectorConfig::default());
    }
}
