//! Local playback of a finalized container.
//!
//! The container is written to a temporary file and handed to the first
//! available command-line player. The temp file is removed afterwards
//! whether playback succeeded or not.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SottoError};

/// Player binaries tried in order; the first one present on the system wins.
const PLAYERS: &[&str] = &["afplay", "paplay", "aplay", "ffplay"];

/// Plays a WAV container through a temporary file.
pub async fn play_container(container: &[u8]) -> Result<()> {
    let path = std::env::temp_dir().join(format!("sotto-{}.wav", Uuid::new_v4()));
    tokio::fs::write(&path, container).await?;

    let result = play_file(&path).await;

    if let Err(e) = tokio::fs::remove_file(&path).await {
        debug!("Failed to remove temp file {}: {}", path.display(), e);
    }

    result
}

async fn play_file(path: &Path) -> Result<()> {
    for player in PLAYERS {
        let mut cmd = Command::new(player);
        cmd.arg(path);
        if *player == "ffplay" {
            cmd.args(["-nodisp", "-autoexit", "-loglevel", "quiet"]);
        }

        match cmd.status().await {
            Ok(status) if status.success() => {
                info!("Played {} via {}", path.display(), player);
                return Ok(());
            }
            Ok(status) => {
                return Err(SottoError::Playback {
                    message: format!("{} exited with {}", player, status),
                });
            }
            // Player not installed, try the next one
            Err(_) => continue,
        }
    }

    Err(SottoError::Playback {
        message: "no audio player available".to_string(),
    })
}
