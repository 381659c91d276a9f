use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuración del bot, cargada de variables de entorno (con `.env`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    /// Canal de texto donde vive el dashboard y se pegan los links.
    pub music_channel_id: u64,

    // Audio
    pub default_volume: f32,
    pub max_queue_size: usize,
    pub max_playlist_size: usize,

    /// Segundos de gracia antes de desconectar por inactividad.
    pub idle_timeout_secs: u64,

    /// Cookies para yt-dlp (opcional; si falta se prueba `./cookies.txt`).
    pub cookies_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            music_channel_id: std::env::var("MUSIC_CHANNEL_ID")?.parse()?,

            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
            max_playlist_size: std::env::var("MAX_PLAYLIST_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            idle_timeout_secs: std::env::var("IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "180".to_string()) // 3 minutos
                .parse()?,

            cookies_file: std::env::var("COOKIES_FILE").ok().map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Chequeos de sanidad sobre los valores cargados.
    pub fn validate(&self) -> Result<()> {
        if self.default_volume < 0.0 || self.default_volume > 2.0 {
            anyhow::bail!(
                "El volumen debe estar entre 0.0 y 2.0, se recibió: {}",
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("El tamaño máximo de cola debe ser mayor a 0");
        }

        if self.max_playlist_size == 0 {
            anyhow::bail!("El tamaño máximo de playlist debe ser mayor a 0");
        }

        if self.idle_timeout_secs == 0 {
            anyhow::bail!("El timeout de inactividad debe ser mayor a 0");
        }

        Ok(())
    }

    /// Resumen sin datos sensibles, para el log de arranque.
    pub fn summary(&self) -> String {
        format!(
            "Config: canal {} | vol {}% | cola {} | playlist {} | idle {}s | cookies {}",
            self.music_channel_id,
            (self.default_volume * 100.0) as u32,
            self.max_queue_size,
            self.max_playlist_size,
            self.idle_timeout_secs,
            self.cookies_file
                .as_ref()
                .map_or("auto".to_string(), |p| p.display().to_string()),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            music_channel_id: 0,
            default_volume: 0.5,
            max_queue_size: 500,
            max_playlist_size: 100,
            idle_timeout_secs: 180, // 3 minutos
            cookies_file: None,
        }
    }
}
