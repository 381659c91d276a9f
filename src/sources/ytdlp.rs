use async_trait::async_trait;
use serde::Deserialize;
use serenity::model::id::UserId;
use std::{path::PathBuf, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    player::track::{LazyTrack, ResolvedTrack, Track},
    sources::{metadata::MetadataEnricher, ResolveError, TrackResolver},
};

/// Resolver basado en yt-dlp.
///
/// Una request pasa por dos extracciones: primero un dump plano
/// (`--flat-playlist`) que lista las entradas sin tocar la red por cada una,
/// y después una extracción completa solo de la primera entrada para obtener
/// el stream URL. El resto de la playlist queda como tracks lazy que se
/// resuelven recién cuando les toca sonar.
pub struct YtDlpResolver {
    enricher: MetadataEnricher,
    cookies_file: Option<PathBuf>,
    max_playlist_size: usize,
}

impl YtDlpResolver {
    pub fn new(cookies_file: Option<PathBuf>, max_playlist_size: usize) -> Self {
        Self {
            enricher: MetadataEnricher::new(),
            cookies_file,
            max_playlist_size,
        }
    }

    /// Verifica que yt-dlp esté instalado y pueda ejecutarse.
    pub async fn verify_available() -> Result<(), ResolveError> {
        let output = tokio::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("✅ yt-dlp versión: {}", version.trim());
            Ok(())
        } else {
            Err(ResolveError::Extractor(
                "yt-dlp no disponible. Instala con: pip install yt-dlp".to_string(),
            ))
        }
    }

    /// Busca un archivo de cookies utilizable (configurado o `./cookies.txt`).
    fn cookies_arg(&self) -> Option<String> {
        let candidates = match &self.cookies_file {
            Some(path) => vec![path.clone()],
            None => vec![PathBuf::from("./cookies.txt")],
        };

        for path in candidates {
            if path.exists() {
                debug!("🍪 Cookies encontradas en: {}", path.display());
                return Some(path.display().to_string());
            }
        }
        None
    }

    async fn run_dump(&self, extra_args: &[&str], query: &str) -> Result<YtDlpEntry, ResolveError> {
        let mut cmd = tokio::process::Command::new("yt-dlp");
        cmd.args([
            "-J",
            "--default-search",
            "ytsearch",
            "--no-warnings",
            "--socket-timeout",
            "30",
            "--retries",
            "3",
        ]);
        cmd.args(extra_args);

        if let Some(cookies) = self.cookies_arg() {
            cmd.args(["--cookies", &cookies]);
        }

        cmd.arg(query);

        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Extractor(stderr.trim().to_string()));
        }

        parse_dump(&String::from_utf8_lossy(&output.stdout))
    }

    /// Resuelve una clave en exactamente un track reproducible, con el
    /// overlay de metadatos enriquecidos aplicado.
    async fn resolve_single(
        &self,
        query: &str,
        requested_by: UserId,
    ) -> Result<ResolvedTrack, ResolveError> {
        let dump = self
            .run_dump(&["--no-playlist", "-f", "bestaudio/best"], query)
            .await?;

        // Una búsqueda puede venir envuelta en una playlist de un elemento.
        let entry = match dump.entries {
            Some(mut entries) if !entries.is_empty() => entries.remove(0),
            Some(_) => return Err(ResolveError::NotFound(query.to_string())),
            None => dump,
        };

        let stream_url = entry
            .url
            .clone()
            .ok_or_else(|| ResolveError::Extractor(format!("sin stream URL para `{query}`")))?;

        let mut track = ResolvedTrack {
            title: entry.title.clone().unwrap_or_else(|| "Unknown".to_string()),
            uploader: entry.artist.clone().or_else(|| entry.uploader.clone()),
            duration: entry.parsed_duration(),
            thumbnail: entry.thumbnail.clone(),
            stream_url,
            webpage_url: entry
                .webpage_url
                .clone()
                .unwrap_or_else(|| query.to_string()),
            requested_by,
        };

        // Overlay best-effort: si no hay match, el track queda como vino.
        if let Some(meta) = self
            .enricher
            .enrich(&track.title, track.uploader.as_deref())
            .await
        {
            if let Some(artwork) = meta.artwork {
                track.thumbnail = Some(artwork);
            }
            if let Some(title) = meta.title {
                track.title = title;
            }
            if let Some(artist) = meta.artist {
                track.uploader = Some(artist);
            }
        }

        Ok(track)
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(
        &self,
        query: &str,
        single_entry: bool,
        requested_by: UserId,
    ) -> Result<Vec<Track>, ResolveError> {
        let dump = self.run_dump(&["--flat-playlist"], query).await?;

        let mut entries = flatten_entries(dump);
        if entries.is_empty() {
            return Err(ResolveError::NotFound(query.to_string()));
        }
        if single_entry {
            entries.truncate(1);
        } else {
            entries.truncate(self.max_playlist_size);
        }

        let mut tracks = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let Some(key) = watch_url(&entry) else {
                warn!("⚠️ Entrada sin URL utilizable, se omite: {:?}", entry.title);
                continue;
            };

            if index == 0 {
                // La primera entrada se resuelve completa para sonar ya mismo.
                let resolved = self.resolve_single(&key, requested_by).await?;
                info!("🎵 Resuelto: {} ({})", resolved.title, key);
                tracks.push(Track::Resolved(resolved));
            } else {
                tracks.push(Track::Lazy(lazy_from_entry(entry, key, requested_by)));
            }
        }

        if tracks.is_empty() {
            return Err(ResolveError::NotFound(query.to_string()));
        }
        Ok(tracks)
    }
}

/// Forma del JSON que emite `yt-dlp -J`, tanto para videos sueltos como
/// para playlists (con `entries` anidadas).
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    title: Option<String>,
    uploader: Option<String>,
    artist: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    id: Option<String>,
    entries: Option<Vec<YtDlpEntry>>,
}

impl YtDlpEntry {
    fn parsed_duration(&self) -> Option<Duration> {
        self.duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(Duration::from_secs_f64)
    }
}

fn parse_dump(json: &str) -> Result<YtDlpEntry, ResolveError> {
    Ok(serde_json::from_str(json)?)
}

/// Aplana el dump: una playlist entrega sus entradas, un video suelto se
/// entrega a sí mismo.
fn flatten_entries(dump: YtDlpEntry) -> Vec<YtDlpEntry> {
    match dump.entries {
        Some(entries) => entries,
        None => vec![dump],
    }
}

/// URL canónica de una entrada plana. En los dumps planos de YouTube `url`
/// ya es la watch URL; si solo hay id, se reconstruye.
fn watch_url(entry: &YtDlpEntry) -> Option<String> {
    if let Some(url) = &entry.webpage_url {
        return Some(url.clone());
    }
    if let Some(url) = &entry.url {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Some(url.clone());
        }
    }
    entry
        .id
        .as_ref()
        .map(|id| format!("https://www.youtube.com/watch?v={id}"))
}

fn lazy_from_entry(entry: YtDlpEntry, key: String, requested_by: UserId) -> LazyTrack {
    let duration = entry.parsed_duration();
    LazyTrack {
        title: entry.title.unwrap_or_else(|| "Unknown".to_string()),
        uploader: entry.artist.or(entry.uploader),
        duration,
        thumbnail: entry.thumbnail,
        query: key,
        requested_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_video_dump() {
        let json = r#"{
            "title": "Some Song (Official Video)",
            "uploader": "Some Artist - Topic",
            "duration": 215.1,
            "thumbnail": "https://i.ytimg.com/vi/abc/hq720.jpg",
            "webpage_url": "https://www.youtube.com/watch?v=abc",
            "url": "https://cdn.example/stream"
        }"#;

        let dump = parse_dump(json).unwrap();
        let entries = flatten_entries(dump);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Some Song (Official Video)"));
        assert_eq!(
            entries[0].parsed_duration(),
            Some(Duration::from_secs_f64(215.1))
        );
    }

    #[test]
    fn test_parse_flat_playlist_dump() {
        let json = r#"{
            "title": "My Mix",
            "entries": [
                {"id": "aaa", "title": "First", "duration": 100},
                {"id": "bbb", "title": "Second", "url": "https://www.youtube.com/watch?v=bbb"},
                {"id": "ccc", "title": "Third", "duration": null}
            ]
        }"#;

        let entries = flatten_entries(parse_dump(json).unwrap());
        assert_eq!(entries.len(), 3);
        assert_eq!(
            watch_url(&entries[0]).unwrap(),
            "https://www.youtube.com/watch?v=aaa"
        );
        assert_eq!(
            watch_url(&entries[1]).unwrap(),
            "https://www.youtube.com/watch?v=bbb"
        );
        assert!(entries[2].parsed_duration().is_none());
    }

    #[test]
    fn test_lazy_from_entry_prefers_artist() {
        let json = r#"{"id": "xyz", "title": "Song", "uploader": "Channel", "artist": "Real Artist"}"#;
        let entry = parse_dump(json).unwrap();
        let key = watch_url(&entry).unwrap();

        let lazy = lazy_from_entry(entry, key, UserId::new(1));
        assert_eq!(lazy.uploader.as_deref(), Some("Real Artist"));
        assert_eq!(lazy.query, "https://www.youtube.com/watch?v=xyz");
    }

    #[test]
    fn test_invalid_duration_is_dropped() {
        let json = r#"{"id": "x", "title": "Live", "duration": 0}"#;
        let entry = parse_dump(json).unwrap();
        assert!(entry.parsed_duration().is_none());
    }
}
