use regex::Regex;
use serde::Deserialize;
use std::{sync::OnceLock, time::Duration};
use tracing::debug;

/// Metadatos alternativos encontrados en un catálogo musical.
#[derive(Debug, Clone)]
pub struct EnrichedMetadata {
    pub artwork: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Lookup best-effort de carátula y título/artista normalizados.
///
/// Consulta iTunes Search y cae a Deezer si no hay match. Cualquier fallo
/// (red, parseo, sin resultados) devuelve `None`: el enriquecimiento nunca
/// bloquea ni hace fallar la reproducción.
pub struct MetadataEnricher {
    http: reqwest::Client,
}

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

impl MetadataEnricher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub async fn enrich(&self, title: &str, artist: Option<&str>) -> Option<EnrichedMetadata> {
        let clean_title = clean_title(title);
        if clean_title.is_empty() {
            return None;
        }

        let mut queries = vec![clean_title.clone()];
        if let Some(artist) = artist {
            let clean_artist = clean_artist(artist);
            if !clean_artist.is_empty()
                && !clean_title.to_lowercase().contains(&clean_artist.to_lowercase())
            {
                queries.push(format!("{clean_artist} {clean_title}"));
            }
        }

        // Primero la query más específica (artista + título).
        for query in queries.iter().rev() {
            if let Some(meta) = self.lookup_itunes(query, &clean_title, artist).await {
                return Some(meta);
            }
        }
        for query in queries.iter().rev() {
            if let Some(meta) = self.lookup_deezer(query, &clean_title, artist).await {
                return Some(meta);
            }
        }

        None
    }

    async fn lookup_itunes(
        &self,
        query: &str,
        clean_title: &str,
        artist: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        let url = format!(
            "https://itunes.apple.com/search?term={}&media=music&limit=1",
            urlencoding::encode(query)
        );

        let response = match self.http.get(&url).timeout(LOOKUP_TIMEOUT).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("🎨 iTunes respondió {} para `{}`", r.status(), query);
                return None;
            }
            Err(e) => {
                debug!("🎨 Error consultando iTunes: {}", e);
                return None;
            }
        };

        // iTunes a veces responde text/javascript; reqwest parsea igual.
        let parsed: ItunesResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                debug!("🎨 Respuesta iTunes inválida: {}", e);
                return None;
            }
        };

        let item = parsed.results.into_iter().next()?;
        let found_title = item.track_name.as_deref().unwrap_or_default();
        let found_artist = item.artist_name.as_deref().unwrap_or_default();

        if !artists_match(artist, found_artist) || !titles_match(clean_title, found_title) {
            return None;
        }

        Some(EnrichedMetadata {
            artwork: item
                .artwork_url
                .map(|art| art.replace("100x100", "600x600")),
            title: item.track_name,
            artist: item.artist_name,
        })
    }

    async fn lookup_deezer(
        &self,
        query: &str,
        clean_title: &str,
        artist: Option<&str>,
    ) -> Option<EnrichedMetadata> {
        let url = format!(
            "https://api.deezer.com/search?q={}&limit=1",
            urlencoding::encode(query)
        );

        let response = match self.http.get(&url).timeout(LOOKUP_TIMEOUT).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("🎨 Deezer respondió {} para `{}`", r.status(), query);
                return None;
            }
            Err(e) => {
                debug!("🎨 Error consultando Deezer: {}", e);
                return None;
            }
        };

        let parsed: DeezerResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                debug!("🎨 Respuesta Deezer inválida: {}", e);
                return None;
            }
        };

        let item = parsed.data.into_iter().next()?;
        let found_title = item.title.as_deref().unwrap_or_default();
        let found_artist = item
            .artist
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or_default();

        if !artists_match(artist, found_artist) || !titles_match(clean_title, found_title) {
            return None;
        }

        let artwork = item.album.and_then(|album| {
            album.cover_xl.or(album.cover_big).or(album.cover_medium)
        });

        Some(EnrichedMetadata {
            artwork,
            title: item.title,
            artist: item.artist.and_then(|a| a.name),
        })
    }
}

impl Default for MetadataEnricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Quita sufijos tipo "(Official Video)" o "[Lyrics HQ]" del título.
fn clean_title(title: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)[\(\[](official|video|lyrics|audio|mv|hq).*?[\)\]]")
            .expect("regex de limpieza de título")
    });
    re.replace_all(title, "").trim().to_string()
}

/// Quita decoraciones de canales de YouTube ("Topic", "VEVO", etc).
fn clean_artist(artist: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)(Topic|Official|VEVO|Channel)").expect("regex de limpieza de artista")
    });
    re.replace_all(artist, "").trim().to_string()
}

/// Chequeo laxo: alcanza con que un título contenga al otro. Evita aceptar
/// resultados completamente distintos ("Just disappear" vs "Sayonara Elegy").
fn titles_match(clean_title: &str, found_title: &str) -> bool {
    if found_title.is_empty() {
        return false;
    }
    let a = clean_title.to_lowercase();
    let b = found_title.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Si el pedido trae artista, el resultado tiene que coincidir al menos por
/// inclusión; sin artista de entrada no se filtra.
fn artists_match(input: Option<&str>, found: &str) -> bool {
    let Some(input) = input else {
        return true;
    };
    let a = input.to_lowercase();
    let b = found.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesItem>,
}

#[derive(Debug, Deserialize)]
struct ItunesItem {
    #[serde(rename = "trackName")]
    track_name: Option<String>,
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    #[serde(rename = "artworkUrl100")]
    artwork_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeezerResponse {
    #[serde(default)]
    data: Vec<DeezerItem>,
}

#[derive(Debug, Deserialize)]
struct DeezerItem {
    title: Option<String>,
    artist: Option<DeezerArtist>,
    album: Option<DeezerAlbum>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeezerAlbum {
    cover_xl: Option<String>,
    cover_big: Option<String>,
    cover_medium: Option<String>,
}
