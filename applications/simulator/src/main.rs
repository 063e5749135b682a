/// Tagplay Simulator - run the player against scripted scenarios
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tagplay_core::RawSetting;
use tagplay_sim::{eeprom, payload, Report, Script, SimConfig, Simulation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tagplay-sim")]
#[command(about = "Tag-activated audio player simulator", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./tagplay.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log control decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario script
    Run {
        /// Scenario script (TOML)
        #[arg(short, long)]
        script: PathBuf,
        /// EEPROM image, loaded before and saved after the run
        #[arg(short, long)]
        eeprom: Option<PathBuf>,
        /// Stop time, overriding the script
        #[arg(long)]
        until_ms: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the payload of a provisioned tag as hex
    EncodeTag {
        /// Folder (0 for modifier and admin tags)
        #[arg(long)]
        folder: u8,
        /// Mode code
        #[arg(long)]
        mode: u8,
        /// First parameter (track, from-track, sleep minutes)
        #[arg(long, default_value_t = 0)]
        a: u8,
        /// Second parameter (to-track)
        #[arg(long, default_value_t = 0)]
        b: u8,
    },
    /// Decode a hex tag payload to JSON
    DecodeTag {
        /// Payload bytes as hex
        hex: String,
    },
    /// Show the settings stored in an EEPROM image
    Settings {
        /// EEPROM image (blank if missing)
        #[arg(short, long)]
        eeprom: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay machine-readable
    let default_filter = if cli.verbose {
        "tagplay=debug"
    } else {
        "tagplay=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run {
            script,
            eeprom,
            until_ms,
            json,
        } => {
            let config = SimConfig::load(cli.config.as_deref())?;
            run(&config, &script, eeprom.as_deref(), until_ms, json)?;
        }
        Commands::EncodeTag { folder, mode, a, b } => {
            println!("{}", payload::encode_tag(RawSetting::new(folder, mode, a, b)));
        }
        Commands::DecodeTag { hex } => {
            let decoded = payload::decode_tag(&hex)?;
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        Commands::Settings { eeprom } => {
            let config = SimConfig::load(cli.config.as_deref())?;
            let mut image = eeprom::load(eeprom.as_deref(), config.eeprom_size)?;
            let report = payload::inspect_settings(&mut image);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn run(
    config: &SimConfig,
    script_path: &Path,
    eeprom_path: Option<&Path>,
    until_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let script = Script::load(script_path)
        .with_context(|| format!("loading script {}", script_path.display()))?;
    let image = eeprom::load(eeprom_path, config.eeprom_size)?;

    let mut simulation = Simulation::new(config, &script, image)?;
    let until = until_ms.unwrap_or_else(|| script.end_ms());
    tracing::info!(until_ms = until, events = script.events.len(), "Running scenario");
    let report = simulation.run_until(until);

    if let Some(path) = eeprom_path {
        eeprom::save(path, &simulation.eeprom())
            .with_context(|| format!("saving EEPROM image {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    for entry in &report.log {
        println!("{:>8} ms  {}", entry.at_ms, entry.command);
    }
    if report.powered_down {
        println!("{:>8} ms  power down", report.ended_at_ms);
    }
}
