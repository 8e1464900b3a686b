//! Single simulation run.

use anyhow::{Context, Result};
use mti_config::MtiConfig;
use mti_lods::LodsEngine;
use mti_sim::{AccuracyReport, SimulationStats, run_simulation};
use mti_types::MtiProtocol;
use serde::Serialize;

use crate::RunArgs;
use crate::style::{self, colors::SemanticStyle};

/// Everything `mti run --json` prints.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    config: &'a MtiConfig,
    missing_tags: usize,
    stats: &'a SimulationStats,
    accuracy: AccuracyReport,
    recall: f64,
    precision: f64,
    phy_efficiency: f64,
}

/// Applies the command-line flags on top of the loaded configuration.
fn apply_overrides(config: &mut MtiConfig, args: &RunArgs) {
    if let Some(variant) = args.variant {
        config.protocol = variant.protocol_config();
    }

    let sim = &mut config.simulation;
    if let Some(tags) = args.tags {
        sim.total_tags = tags;
    }
    if let Some(rate) = args.missing_rate {
        sim.missing_rate = rate;
    }
    if let Some(seed) = args.seed {
        sim.seed = seed;
    }
    if let Some(per) = args.per {
        sim.noise_enabled = true;
        sim.packet_error_rate = per;
    }
    if let Some(ber) = args.ber {
        sim.noise_enabled = true;
        sim.bit_error_rate = ber;
    }
    if let Some(margin) = args.capture {
        sim.capture_effect = true;
        sim.capture_margin_db = margin;
    }
    if let Some(drift) = args.drift {
        sim.clock_drift_rate = drift;
    }
    if let Some(bits) = args.burst {
        sim.burst_erasure_bits = bits;
    }
    if let Some(bits) = args.jitter {
        sim.jitter_offset_bits = bits;
    }
    if let Some(bits) = args.guard {
        sim.guard_interval_bits = bits;
    }
    if args.energy {
        sim.energy_tracking = true;
    }
    if let Some(max_slots) = args.max_slots {
        sim.max_slots = max_slots;
    }
}

/// Runs LODS once over a generated population and reports the outcome.
pub fn run(args: &RunArgs) -> Result<()> {
    let mut config =
        MtiConfig::load_from_dir(&args.project).context("Failed to load configuration")?;
    apply_overrides(&mut config, args);
    config.validate().context("Invalid configuration")?;

    let scenario = config.scenario();
    let tags = scenario.generate();
    let mut engine =
        LodsEngine::try_new(config.protocol.clone()).context("Invalid protocol configuration")?;

    tracing::info!(
        tags = tags.len(),
        missing = scenario.missing_count(),
        seed = config.simulation.seed,
        "starting run"
    );

    let stats = run_simulation(&mut engine, &config.simulation, &tags)
        .with_context(|| format!("{} run aborted", engine.name()))?;
    let accuracy = AccuracyReport::evaluate(&tags, engine.results());

    if args.json {
        let report = RunReport {
            config: &config,
            missing_tags: scenario.missing_count(),
            stats: &stats,
            accuracy,
            recall: accuracy.recall(),
            precision: accuracy.precision(),
            phy_efficiency: stats.phy_efficiency(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human(&config, scenario.missing_count(), &stats, &accuracy);
    Ok(())
}

fn print_human(
    config: &MtiConfig,
    missing: usize,
    stats: &SimulationStats,
    accuracy: &AccuracyReport,
) {
    let sim = &config.simulation;

    style::print_section(&format!(
        "{} over {} tags ({} missing, seed {})",
        stats.protocol.code(),
        sim.total_tags,
        missing,
        sim.seed
    ));

    let mut entries = vec![
        (
            "Total time",
            format!("{:.3} ms", stats.total_time_us / 1_000.0),
        ),
        ("Mean slot", format!("{:.1} µs", stats.mean_slot_us())),
        (
            "PHY efficiency",
            format!("{:.1}%", stats.phy_efficiency() * 100.0),
        ),
        ("Downlink bits", stats.downlink_bits.to_string()),
        ("Uplink bits", stats.uplink_bits.to_string()),
        ("Reader energy", format!("{:.6} J", stats.reader_energy_j)),
    ];
    if sim.energy_tracking {
        entries.push(("Tag energy", format!("{:.6} J", stats.tag_energy_j)));
    }
    style::print_info_table(&entries);
    println!("{}", style::slot_table(stats));

    style::print_spacer();
    style::print_section("Accuracy");
    style::print_info_table(&[
        ("True present", accuracy.true_present.to_string()),
        ("True missing", accuracy.true_missing.to_string()),
        ("False present", accuracy.false_present.to_string()),
        ("False missing", accuracy.false_missing.to_string()),
        ("Unverified", accuracy.unverified.to_string()),
        ("Recall", format!("{:.4}", accuracy.recall())),
        ("Precision", format!("{:.4}", accuracy.precision())),
    ]);

    if accuracy.is_exact() {
        style::print_success("Every tag received the correct verdict");
    } else {
        style::print_warn(&format!(
            "{} wrong and {} missing verdicts",
            accuracy.false_present + accuracy.false_missing,
            accuracy.unverified
        ));
        if !config.protocol.accept_phy_impairments && sim.has_structural_impairments() {
            style::print_hint("burst or jitter is set; try --variant phy-aware");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variant;
    use clap::Parser;
    use mti_lods::{LodsConfig, Voting};

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn args(argv: &[&str]) -> RunArgs {
        Harness::parse_from(std::iter::once("mti").chain(argv.iter().copied())).args
    }

    #[test]
    fn no_flags_keep_the_loaded_config() {
        let mut config = MtiConfig::default();
        apply_overrides(&mut config, &args(&[]));
        assert_eq!(config, MtiConfig::default());
    }

    #[test]
    fn error_rates_enable_noise() {
        let mut config = MtiConfig::default();
        apply_overrides(&mut config, &args(&["--ber", "0.001"]));
        assert!(config.simulation.noise_enabled);
        assert_eq!(config.simulation.bit_error_rate, 0.001);
        assert_eq!(config.simulation.packet_error_rate, 0.0);
    }

    #[test]
    fn population_and_channel_flags() {
        let mut config = MtiConfig::default();
        apply_overrides(
            &mut config,
            &args(&[
                "-n", "500", "-m", "0.2", "-s", "9", "--capture", "6", "--burst", "2", "--jitter",
                "1", "--guard", "0.5", "--energy", "--max-slots", "10",
            ]),
        );
        let sim = &config.simulation;
        assert_eq!(sim.total_tags, 500);
        assert_eq!(sim.missing_rate, 0.2);
        assert_eq!(sim.seed, 9);
        assert!(sim.capture_effect);
        assert_eq!(sim.capture_margin_db, 6.0);
        assert_eq!(sim.burst_erasure_bits, 2);
        assert_eq!(sim.jitter_offset_bits, 1);
        assert_eq!(sim.guard_interval_bits, 0.5);
        assert!(sim.energy_tracking);
        assert_eq!(sim.max_slots, 10);
        assert!(!sim.noise_enabled);
    }

    #[test]
    fn variant_replaces_protocol_section() {
        let mut config = MtiConfig::default();
        config.protocol.max_group_size = 7;
        apply_overrides(&mut config, &args(&["--variant", "strict"]));
        assert_eq!(config.protocol, LodsConfig::strict());
        assert_eq!(config.protocol.voting, Voting::Strict);
    }

    #[test]
    fn every_variant_is_valid() {
        for variant in [
            Variant::Adaptive,
            Variant::FixedRobust,
            Variant::PhyAware,
            Variant::GuardAware,
            Variant::Strict,
            Variant::PowerOfTwo,
        ] {
            assert!(variant.protocol_config().validate().is_ok(), "{variant:?}");
        }
    }
}
