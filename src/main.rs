use anyhow::Result;
use serenity::{all::GatewayIntents, Client};
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info};

mod bot;
mod config;
mod player;
mod sources;
mod ui;

use crate::{bot::LyraBot, config::Config, sources::YtDlpResolver};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lyra=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Lyra v{}", env!("CARGO_PKG_VERSION"));

    // Modo health-check para el orquestador de contenedores.
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    let config = Config::load()?;
    info!("{}", config.summary());

    YtDlpResolver::verify_available().await?;

    let resolver = Arc::new(YtDlpResolver::new(
        config.cookies_file.clone(),
        config.max_playlist_size,
    ));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = LyraBot::new(config.clone(), resolver);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird()
        .await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("⚠️ Señal de apagado recibida, cerrando...");
            std::process::exit(0);
        }
    });

    info!("🚀 Bot iniciado");
    if let Err(why) = client.start().await {
        error!("❌ Error del cliente de Discord: {why:?}");
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    YtDlpResolver::verify_available().await?;
    println!("OK");
    Ok(())
}
