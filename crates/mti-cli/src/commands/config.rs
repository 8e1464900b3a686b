//! Configuration management commands.

use anyhow::{Context, Result};
use mti_config::{ConfigLoader, MtiConfig};
use mti_lods::Adaptation;
use std::path::Path;

use crate::style::{self, colors::SemanticStyle};

/// Show the merged configuration.
pub fn show(project: &str, format: &str) -> Result<()> {
    let project_path = Path::new(project);
    let config =
        MtiConfig::load_from_dir(project_path).context("Failed to load configuration")?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => print!("{}", config.to_toml_string()?),
        "text" => print_text(project_path, &config),
        other => anyhow::bail!("Unknown format '{other}' (expected text, toml or json)"),
    }

    Ok(())
}

fn print_text(project_path: &Path, config: &MtiConfig) {
    let sources = ConfigLoader::new().with_project_dir(project_path).sources();
    style::print_section("Sources");
    if sources.is_empty() {
        println!("  {}", "built-in defaults only".muted());
    }
    for source in &sources {
        println!("  {}", source.display().code());
    }
    style::print_spacer();

    let sim = &config.simulation;
    style::print_section("Simulation");
    style::print_info_table(&[
        ("Tags", sim.total_tags.to_string()),
        ("Missing rate", sim.missing_rate.to_string()),
        ("Seed", sim.seed.to_string()),
        ("Noise", sim.noise_enabled.to_string()),
        ("Packet error rate", sim.packet_error_rate.to_string()),
        ("Bit error rate", sim.bit_error_rate.to_string()),
        (
            "Capture",
            if sim.capture_effect {
                format!("{} dB", sim.capture_margin_db)
            } else {
                "off".to_string()
            },
        ),
        ("Clock drift", sim.clock_drift_rate.to_string()),
        ("Burst erasure bits", sim.burst_erasure_bits.to_string()),
        ("Jitter bits", sim.jitter_offset_bits.to_string()),
        ("Guard bits", sim.guard_interval_bits.to_string()),
        ("Energy tracking", sim.energy_tracking.to_string()),
        ("Max slots", sim.max_slots.to_string()),
    ]);
    style::print_spacer();

    let lods = &config.protocol;
    let adaptation = match lods.adaptation {
        Adaptation::Adaptive => format!("adaptive ({} / {})", lods.robust_rho, lods.fast_rho),
        Adaptation::Fixed { rho } => format!("fixed ({rho})"),
    };
    style::print_section("Protocol");
    style::print_info_table(&[
        ("Redundancy", adaptation),
        ("Tolerance", lods.tolerance.to_string()),
        ("Switch after", format!("{} groups", lods.switch_after)),
        ("Voting", format!("{:?}", lods.voting)),
        ("Grouping", format!("{:?}", lods.grouping)),
        ("Max group size", lods.max_group_size.to_string()),
        ("Max reply bits", lods.max_reply_bits.to_string()),
        ("Seed space", lods.seed_space.to_string()),
        ("Concatenation", lods.report_concatenation.to_string()),
        ("PHY impairments", lods.accept_phy_impairments.to_string()),
    ]);
    style::print_spacer();

    let scenario = config.scenario();
    style::print_section("Scenario");
    style::print_info_table(&[
        ("Base EPC", scenario.base_epc.to_string()),
        (
            "RSSI",
            format!(
                "{} to {} dBm",
                scenario.rssi_range_dbm.0, scenario.rssi_range_dbm.1
            ),
        ),
        ("Population seed", scenario.seed.to_string()),
    ]);
}

/// Validate the configuration files.
pub fn validate(project: &str) -> Result<()> {
    let project_path = Path::new(project);

    println!("Validating configuration in {}...", project_path.display());

    match MtiConfig::load_from_dir(project_path) {
        Ok(_) => {
            style::print_success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            style::print_error("Configuration validation failed:");
            eprintln!("  {e:#}");
            Err(e)
        }
    }
}
