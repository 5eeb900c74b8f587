//! Sermo command-line entry point
//!
//! Plays the part of the editor host: it loads settings, builds the speak
//! pipeline, and exposes the two triggers plus a settings editor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use sermo::messages::REQUEST_FAILED;
use sermo::settings::config::Config;
use sermo::settings::SettingKey;
use sermo::speech::backends::{HttpTransport, RodioOutput};
use sermo::speech::{
    AudioPlayer, FixedLanguage, LanguageDetector, Notifier, RequestExecutor, RetryOrchestrator,
    ServerDetects, SpeakPipeline, TtsResult,
};
use sermo::triggers::{self, TriggerOutcome};
use sermo::SharedSettings;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sermo", version, about = "Speak text through a Sermo TTS API")]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    debug: bool,

    /// Language code to send with each request (default: server detects)
    #[arg(long, global = true, value_name = "CODE")]
    language: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Speak the given text ("-" reads stdin)
    Speak {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Speak the highlighted text
    SpeakSelection,

    /// Speak one line of a file
    SpeakLine {
        /// File containing the line
        #[arg(long)]
        file: PathBuf,

        /// 1-based line number
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        line: u64,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,

    /// Print the config file location
    Path,

    /// Change a setting (url, timeout, max_retries)
    Set { key: String, value: String },
}

/// Prints notices on stderr, like a host's transient notifications
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
        info!("Sermo version {} starting (debug mode)", sermo::VERSION);
    } else {
        // Normal mode: only errors, unless RUST_LOG says otherwise
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load().context("loading configuration")?;
    debug!("Configuration loaded from {:?}", config.path());

    match cli.command {
        Command::Config { action } => {
            configure(&mut config, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Speak { text } => {
            let text = if text.len() == 1 && text[0] == "-" {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .context("reading text from stdin")?;
                input
            } else {
                text.join(" ")
            };
            let pipeline = build_pipeline(&config, cli.language)?;
            Ok(report(triggers::speak_input(&pipeline, &text)))
        }
        Command::SpeakSelection => {
            let selection = sermo::clipboard::get_selection()?;
            let pipeline = build_pipeline(&config, cli.language)?;
            Ok(report(triggers::speak_selection(&pipeline, &selection)))
        }
        Command::SpeakLine { file, line } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let index = usize::try_from(line - 1).context("line number out of range")?;
            let pipeline = build_pipeline(&config, cli.language)?;
            Ok(report(triggers::speak_line(&pipeline, &document, index)))
        }
    }
}

/// Wire the pipeline to the real network and audio backends
fn build_pipeline(config: &Config, language: Option<String>) -> anyhow::Result<SpeakPipeline> {
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);

    let detector: Arc<dyn LanguageDetector> = match language {
        Some(code) => Arc::new(FixedLanguage(code)),
        None => Arc::new(ServerDetects),
    };

    let transport = HttpTransport::new()?;
    let executor = RequestExecutor::new(Arc::new(transport)).with_language_detector(detector);
    let retry = RetryOrchestrator::new(executor, Arc::clone(&notifier));
    let player = AudioPlayer::new(Box::new(RodioOutput::new()?));

    Ok(SpeakPipeline::new(
        SharedSettings::new(config.settings().clone()),
        retry,
        player,
        notifier,
    ))
}

/// Print the trigger outcome and pick an exit code
fn report(outcome: TriggerOutcome) -> ExitCode {
    match outcome {
        TriggerOutcome::NothingToSpeak(reason) => {
            eprintln!("{}", reason);
            ExitCode::SUCCESS
        }
        TriggerOutcome::Spoken(TtsResult::Success) => ExitCode::SUCCESS,
        TriggerOutcome::Spoken(TtsResult::Failure(message)) => {
            if message.is_empty() {
                eprintln!("{}", REQUEST_FAILED);
            } else {
                eprintln!("{}", message);
            }
            ExitCode::FAILURE
        }
    }
}

fn configure(config: &mut Config, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = config.settings();
            for key in SettingKey::ALL {
                println!("{} = {}", key, settings.get(key));
            }
        }
        ConfigAction::Path => {
            println!("{}", config.path().display());
        }
        ConfigAction::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            // Invalid values are rejected; the stored value stays as it was
            config.set(key, &value)?;
            config.save()?;
            println!("{} = {}", key, config.settings().get(key));
        }
    }
    Ok(())
}
