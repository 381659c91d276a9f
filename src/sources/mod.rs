pub mod metadata;
pub mod ytdlp;

use async_trait::async_trait;
use serenity::model::id::UserId;

use crate::player::track::Track;

pub use metadata::MetadataEnricher;
pub use ytdlp::YtDlpResolver;

/// Errores del backend de extracción.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no se encontró nada para `{0}`")]
    NotFound(String),
    #[error("yt-dlp falló: {0}")]
    Extractor(String),
    #[error("respuesta de yt-dlp inválida: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("error ejecutando yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

/// Contrato del resolver de tracks.
///
/// Convierte una URL o término de búsqueda en una secuencia ordenada de
/// tracks: el primero llega completamente resuelto (con stream URL) para
/// arrancar de inmediato, el resto queda lazy. Con `single_entry` se pide
/// exactamente un resultado resuelto, aunque la clave expanda a más entradas
/// (requeue de loop y expansión lazy).
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(
        &self,
        query: &str,
        single_entry: bool,
        requested_by: UserId,
    ) -> Result<Vec<Track>, ResolveError>;
}
