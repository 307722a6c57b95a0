use anyhow::Result;
use orator::api::{AnalysisService, HttpAnalysisClient};
use orator::config::{GameConfig, ServiceConfig};
use orator::game::prompts::TOPICS;
use orator::game::{Difficulty, GameKind};
use rand::seq::SliceRandom;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Game to play: `rapid_fire`, `conductor` or `triple_step`
const GAME_ENV: &str = "ORATOR_GAME";
/// Topic for duration games; a random one is picked when unset
const TOPIC_ENV: &str = "ORATOR_TOPIC";
/// Word pool for triple step
const DIFFICULTY_ENV: &str = "ORATOR_DIFFICULTY";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orator=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Orator speaking practice");

    let service_config = ServiceConfig::from_env().map_err(anyhow::Error::msg)?;
    let game_config = game_config_from_env()?;
    game_config.validate().map_err(anyhow::Error::msg)?;

    let client = HttpAnalysisClient::new(&service_config)?;
    match client.health_check().await {
        Ok(status) if status.is_healthy() => info!("Analysis service at {} is up", client.base_url()),
        Ok(status) => warn!("Analysis service reports status {:?}", status.status),
        Err(e) => warn!("Analysis service unreachable, uploads will fail: {}", e),
    }

    play(game_config, client).await
}

fn game_config_from_env() -> Result<GameConfig> {
    let kind: GameKind = match std::env::var(GAME_ENV) {
        Ok(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        Err(_) => GameKind::RapidFire,
    };

    let topic = std::env::var(TOPIC_ENV).ok().unwrap_or_else(|| {
        TOPICS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Building Confidence")
            .to_string()
    });

    let difficulty: Difficulty = match std::env::var(DIFFICULTY_ENV) {
        Ok(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        Err(_) => Difficulty::default(),
    };

    Ok(match kind {
        GameKind::RapidFire => GameConfig::rapid_fire(),
        GameKind::Conductor => GameConfig::conductor(topic),
        GameKind::TripleStep => GameConfig::triple_step(topic, difficulty),
    })
}

#[cfg(feature = "audio-io")]
async fn play(config: GameConfig, client: HttpAnalysisClient) -> Result<()> {
    use anyhow::Context;
    use orator::audio::MicrophoneDevice;
    use orator::game::{GamePhase, SessionController};

    info!("Playing {}", config.kind);
    let mut controller = SessionController::new(config, MicrophoneDevice::new(), client);
    controller
        .request_microphone()
        .await
        .context("Microphone access is required")?;

    let phase = controller.run().await?;
    match (phase, controller.results()) {
        (GamePhase::Results, Some(results)) => {
            println!("{}", serde_json::to_string_pretty(results)?);
            Ok(())
        }
        _ => {
            let message = controller
                .error_message()
                .unwrap_or("Session ended without results")
                .to_string();
            anyhow::bail!(message)
        }
    }
}

#[cfg(not(feature = "audio-io"))]
async fn play(_config: GameConfig, _client: HttpAnalysisClient) -> Result<()> {
    anyhow::bail!("Built without the `audio-io` feature; no microphone backend available")
}
