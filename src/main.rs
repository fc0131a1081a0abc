use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sotto::console::Console;
use sotto::inference::{self, InferenceClient};
use sotto::voice::{Recorder, Synthesizer, decode_mp3, play_blocking, rms};
use sotto::{Assistant, Config, Session};

/// sotto - voice-driven assistant for locally hosted language models
#[derive(Parser)]
#[command(name = "sotto", version, about)]
struct Cli {
    /// Path to a config file (defaults to the platform config dir)
    #[arg(short, long, env = "SOTTO_CONFIG")]
    config: Option<PathBuf>,

    /// Read tasks from the console instead of the microphone
    #[arg(long)]
    text: bool,

    /// Disable voice entirely (no capture, no speech output)
    #[arg(long, env = "SOTTO_NO_VOICE")]
    no_voice: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List models installed at the inference endpoint
    Models,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test speech synthesis
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the speech output.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,sotto=info",
        1 => "info,sotto=debug",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref(), cli.no_voice)?;
    tracing::debug!(?config, "configuration loaded");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Models => cmd_models(&config).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    let mut console = Console::spawn();
    let client = InferenceClient::new(config.inference.clone());
    let model = inference::select_model(&client, &mut console).await?;

    let session = Session::new(model, config);
    let mut assistant = Assistant::new(session, client, console, cli.text)?;
    assistant.run().await?;

    Ok(())
}

/// List the models the endpoint advertises
async fn cmd_models(config: &Config) -> anyhow::Result<()> {
    let client = InferenceClient::new(config.inference.clone());
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models installed at {}", config.inference.base_url);
        return Ok(());
    }

    for (index, name) in models.iter().enumerate() {
        println!("{}. {name}", index + 1);
    }
    Ok(())
}

/// Show a level meter from the default input device
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds - speak now.\n");

    let mut recorder = Recorder::new()?;
    recorder.start()?;

    for second in 1..=duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = recorder.drain();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(40.0) as usize;
        println!(
            "[{second:2}s] rms {energy:.4}  peak {peak:.4}  [{}{}]",
            "#".repeat(meter_len),
            " ".repeat(40 - meter_len)
        );
    }

    recorder.stop();
    println!("\nIf the meter never moved, check your input device.");
    Ok(())
}

/// Play a short tone through the default output device
fn test_speaker() -> anyhow::Result<()> {
    println!("Playing a 440 Hz tone for 2 seconds...");

    let sample_rate = 24_000.0f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples: Vec<f32> = (0..(sample_rate * 2.0) as usize)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    play_blocking(samples, &AtomicBool::new(false))?;
    println!("Done. If you heard nothing, check your output device.");
    Ok(())
}

/// Synthesize and play one utterance
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");

    let synthesizer = Synthesizer::new(&config.voice);
    let mp3 = synthesizer.synthesize(text).await?;
    println!("Got {} bytes of audio.", mp3.len());

    let samples = decode_mp3(&mp3)?;
    play_blocking(samples, &AtomicBool::new(false))?;
    Ok(())
}
