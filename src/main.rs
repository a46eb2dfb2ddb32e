use anyhow::Context;
use clap::{Parser, Subcommand};
use naboo::platform::{HeadlessOptions, HeadlessPlatform, HeadlessProbe, TransitionSupport};
use naboo::script::{Script, ScriptRunner};
use naboo::transition::VendorProfile;
use naboo::NabooConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "naboo", version, about = "Play animation sequences on a headless platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a JSON sequence script and print its timeline
    Play {
        script: PathBuf,
        /// JSON file overriding engine defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Transition support of the emulated engine
        #[arg(long, default_value_t = TransitionSupport::Standard)]
        support: TransitionSupport,
        /// Never dispatch transition-end events (exercise fallback timers)
        #[arg(long)]
        no_native_events: bool,
    },
    /// Print the vendor profile detected for an emulated engine
    Probe {
        #[arg(long, default_value_t = TransitionSupport::Standard)]
        support: TransitionSupport,
    },
}

fn play(
    script: PathBuf,
    config: Option<PathBuf>,
    support: TransitionSupport,
    native_events: bool,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => NabooConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NabooConfig::default(),
    };
    let text = std::fs::read_to_string(&script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let script = Script::from_json_str(&text)?;

    let platform = HeadlessPlatform::new(HeadlessOptions {
        support,
        native_events,
    });
    let runner = ScriptRunner::new(platform, config);
    let sequence = runner.compile(&script)?;
    let trace = runner.run(&sequence)?;
    for entry in trace {
        println!("{}", entry);
    }
    Ok(())
}

fn probe(support: TransitionSupport) -> anyhow::Result<()> {
    let profile = VendorProfile::detect(&HeadlessProbe::new(support));
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Play {
            script,
            config,
            support,
            no_native_events,
        } => play(script, config, support, !no_native_events),
        Command::Probe { support } => probe(support),
    }
}
