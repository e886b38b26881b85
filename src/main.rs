use anyhow::{Context, Result};
use clap::Parser;
use sotto::audio::{CaptureConfig, CpalBackend};
use sotto::config::Config;
use sotto::session::{RecorderSession, SessionConfig};
use sotto::transcribe::TranscriptionClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Silence-gated voice recorder with periodic transcription dispatch
#[derive(Debug, Parser)]
#[command(name = "sotto", version, about)]
struct Cli {
    /// Configuration file (optional; defaults cover everything)
    #[arg(short, long, default_value = "config/sotto")]
    config: String,

    /// Input device name substring (default: system default device)
    #[arg(short, long)]
    device: Option<String>,

    /// Save flushed chunks to disk instead of dispatching them
    #[arg(long)]
    save_partial: bool,

    /// Play the final buffer on exit instead of saving it
    #[arg(long)]
    play_on_exit: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sotto=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load(&cli.config)?;
    if cli.device.is_some() {
        cfg.capture.device = cli.device;
    }
    if cli.save_partial {
        cfg.pipeline.save_partial = true;
    }
    if cli.play_on_exit {
        cfg.pipeline.play_on_exit = true;
    }

    let session_config = SessionConfig::from_settings(&cfg.pipeline);

    let client = if cfg.pipeline.save_partial {
        None
    } else {
        let api_key = std::env::var(&cfg.transcription.api_key_env).with_context(|| {
            format!(
                "{} is not set (required unless --save-partial is used)",
                cfg.transcription.api_key_env
            )
        })?;
        Some(TranscriptionClient::new(
            cfg.transcription.endpoint.clone(),
            cfg.transcription.model.clone(),
            api_key,
        )?)
    };

    let capture_config = CaptureConfig {
        device: cfg.capture.device.clone(),
        ..Default::default()
    };
    let backend = CpalBackend::new(&capture_config).context("Failed to open capture device")?;

    let mut session = RecorderSession::new(session_config, Box::new(backend), client);
    session.start().await?;

    info!("Recording; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;

    let stats = session.shutdown().await?;
    info!("Final session stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}
