use serenity::model::id::UserId;
use std::time::Duration;

/// Track completamente resuelto, listo para reproducir.
///
/// El `stream_url` apunta directo al audio y expira, por lo que un track
/// resuelto se consume una sola vez; los requeues del modo loop vuelven a
/// resolver `webpage_url` en lugar de reutilizar este valor.
#[derive(Debug, Clone)]
pub struct ResolvedTrack {
    pub title: String,
    pub uploader: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub stream_url: String,
    pub webpage_url: String,
    pub requested_by: UserId,
}

/// Entrada de playlist aún sin resolver.
///
/// Guarda los metadatos que entrega la extracción plana (suficientes para el
/// dashboard) más la clave con la que se resuelve bajo demanda.
#[derive(Debug, Clone)]
pub struct LazyTrack {
    pub title: String,
    pub uploader: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    /// URL canónica (o término de búsqueda) para resolver este track.
    pub query: String,
    pub requested_by: UserId,
}

/// Representación de un item reproducible: resuelto o pendiente.
#[derive(Debug, Clone)]
pub enum Track {
    Resolved(ResolvedTrack),
    Lazy(LazyTrack),
}

impl Track {
    pub fn title(&self) -> &str {
        match self {
            Track::Resolved(t) => &t.title,
            Track::Lazy(t) => &t.title,
        }
    }

    pub fn uploader(&self) -> Option<&str> {
        match self {
            Track::Resolved(t) => t.uploader.as_deref(),
            Track::Lazy(t) => t.uploader.as_deref(),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Track::Resolved(t) => t.duration,
            Track::Lazy(t) => t.duration,
        }
    }

    pub fn thumbnail(&self) -> Option<&str> {
        match self {
            Track::Resolved(t) => t.thumbnail.as_deref(),
            Track::Lazy(t) => t.thumbnail.as_deref(),
        }
    }

    pub fn requested_by(&self) -> UserId {
        match self {
            Track::Resolved(t) => t.requested_by,
            Track::Lazy(t) => t.requested_by,
        }
    }

    /// Clave canónica para re-resolver el track (requeue de loop, expansión lazy).
    pub fn resolution_key(&self) -> &str {
        match self {
            Track::Resolved(t) => &t.webpage_url,
            Track::Lazy(t) => &t.query,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Track::Lazy(_))
    }

    /// Duración en formato `h:mm:ss` o `m:ss`, igual que en el dashboard.
    pub fn formatted_duration(&self) -> String {
        format_track_duration(self.duration())
    }
}

/// Formatea una duración para mostrar; `None` se muestra como "Unknown".
pub fn format_track_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "Unknown".to_string();
    };

    let total = duration.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolved(title: &str) -> Track {
        Track::Resolved(ResolvedTrack {
            title: title.to_string(),
            uploader: Some("Artist".to_string()),
            duration: Some(Duration::from_secs(215)),
            thumbnail: None,
            stream_url: "https://cdn.example/audio".to_string(),
            webpage_url: "https://www.youtube.com/watch?v=abc".to_string(),
            requested_by: UserId::new(1),
        })
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_track_duration(None), "Unknown");
        assert_eq!(format_track_duration(Some(Duration::from_secs(5))), "0:05");
        assert_eq!(format_track_duration(Some(Duration::from_secs(215))), "3:35");
        assert_eq!(
            format_track_duration(Some(Duration::from_secs(3600 + 62))),
            "1:01:02"
        );
    }

    #[test]
    fn test_resolution_key_per_variant() {
        let track = resolved("a");
        assert_eq!(track.resolution_key(), "https://www.youtube.com/watch?v=abc");

        let lazy = Track::Lazy(LazyTrack {
            title: "b".to_string(),
            uploader: None,
            duration: None,
            thumbnail: None,
            query: "https://www.youtube.com/watch?v=def".to_string(),
            requested_by: UserId::new(2),
        });
        assert_eq!(lazy.resolution_key(), "https://www.youtube.com/watch?v=def");
        assert!(lazy.is_lazy());
        assert_eq!(lazy.formatted_duration(), "Unknown");
    }
}
