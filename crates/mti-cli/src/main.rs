//! mti command-line interface.
//!
//! Runs one missing-tag identification simulation and reports slot
//! statistics, timing, energy and verdict accuracy.
//!
//! # Quick Start
//!
//! ```bash
//! # 1000 tags, 10% missing, clean channel
//! mti run --tags 1000 --missing-rate 0.1
//!
//! # Same population over a noisy channel with burst fades
//! mti run --tags 1000 --missing-rate 0.1 --per 0.01 --ber 0.001 --burst 2
//!
//! # Inspect the merged configuration
//! mti config show --format toml
//! ```

mod commands;
mod style;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use mti_lods::LodsConfig;
use tracing_subscriber::EnvFilter;

/// mti - missing-tag identification simulator for passive RFID.
#[derive(Parser)]
#[command(name = "mti")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Run one simulation of the LODS protocol.
    Run(RunArgs),

    /// Configuration management commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the merged configuration.
    Show {
        /// Project directory holding mti.toml.
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Output format (text, toml, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate the configuration files.
    Validate {
        /// Project directory holding mti.toml.
        #[arg(short, long, default_value = ".")]
        project: String,
    },
}

/// Published protocol variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Adaptive redundancy (the default engine).
    Adaptive,
    /// Fixed robust redundancy with a 128-bit reply ceiling.
    FixedRobust,
    /// Decodes burst erasure and sampling offset.
    PhyAware,
    /// Charges guard intervals between concatenated replies.
    GuardAware,
    /// Every sub-field bit must be observed.
    Strict,
    /// Power-of-two group sizes.
    PowerOfTwo,
}

impl Variant {
    pub fn protocol_config(self) -> LodsConfig {
        match self {
            Self::Adaptive => LodsConfig::default(),
            Self::FixedRobust => LodsConfig::fixed_robust(),
            Self::PhyAware => LodsConfig::phy_aware(),
            Self::GuardAware => LodsConfig::guard_aware(),
            Self::Strict => LodsConfig::strict(),
            Self::PowerOfTwo => LodsConfig::power_of_two(),
        }
    }
}

/// Flags of `mti run`. Every flag overrides the loaded configuration.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Project directory holding mti.toml.
    #[arg(short, long, default_value = ".")]
    pub project: String,

    /// Protocol variant; replaces the [protocol] section when given.
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Size of the expected population.
    #[arg(short = 'n', long)]
    pub tags: Option<usize>,

    /// Fraction of the population that is absent.
    #[arg(short, long)]
    pub missing_rate: Option<f64>,

    /// Seed for the channel and the population.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Packet error rate; enables noise.
    #[arg(long)]
    pub per: Option<f64>,

    /// Bit error rate; enables noise.
    #[arg(long)]
    pub ber: Option<f64>,

    /// Enable the capture effect with this margin in dB.
    #[arg(long)]
    pub capture: Option<f64>,

    /// Relative clock drift between reader and tags.
    #[arg(long)]
    pub drift: Option<f64>,

    /// Burst erasure length in bits.
    #[arg(long)]
    pub burst: Option<u32>,

    /// Maximum sampling offset in bits.
    #[arg(long)]
    pub jitter: Option<u32>,

    /// Guard time between concatenated replies, in tag bit times.
    #[arg(long)]
    pub guard: Option<f64>,

    /// Account tag-side energy.
    #[arg(long)]
    pub energy: bool,

    /// Abort after this many slots.
    #[arg(long)]
    pub max_slots: Option<u64>,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Run(args) => commands::run::run(&args),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { project, format } => commands::config::show(&project, &format),
            ConfigCommands::Validate { project } => commands::config::validate(&project),
        },
    }
}
