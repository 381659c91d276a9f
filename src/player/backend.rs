use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{HttpRequest, Input},
    tracks::TrackHandle,
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::player::{engine::PlayerEvent, track::ResolvedTrack};

/// Errores de la conexión de voz y del stream de audio.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no hay conexión de voz activa")]
    NotConnected,
    #[error("no se pudo conectar al canal de voz: {0}")]
    Join(String),
    #[error("no se pudo abrir el stream: {0}")]
    StreamOpen(String),
}

/// Salida de audio de un guild.
///
/// El engine habla solo con este trait; la implementación real usa songbird
/// y la de los tests registra llamadas. La finalización de un track no se
/// devuelve acá: llega como `PlayerEvent::TrackEnded` por el canal del
/// player, etiquetada con el `play_id` que se pasó a `play`.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Conecta al canal de voz si todavía no hay conexión activa.
    async fn connect(&self, channel_id: ChannelId) -> Result<(), PlaybackError>;
    /// Empieza a streamear el track.
    async fn play(&self, track: &ResolvedTrack, play_id: u64) -> Result<(), PlaybackError>;
    async fn pause(&self) -> Result<(), PlaybackError>;
    async fn resume(&self) -> Result<(), PlaybackError>;
    async fn stop(&self) -> Result<(), PlaybackError>;
    async fn disconnect(&self) -> Result<(), PlaybackError>;
}

/// Backend real sobre songbird.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    http: reqwest::Client,
    events: UnboundedSender<PlayerEvent>,
    volume: f32,
    handle: Mutex<Option<TrackHandle>>,
}

impl SongbirdBackend {
    pub fn new(
        manager: Arc<Songbird>,
        guild_id: GuildId,
        volume: f32,
        events: UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            manager,
            guild_id,
            http: reqwest::Client::new(),
            events,
            volume,
            handle: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AudioBackend for SongbirdBackend {
    async fn connect(&self, channel_id: ChannelId) -> Result<(), PlaybackError> {
        if self.manager.get(self.guild_id).is_some() {
            return Ok(());
        }

        self.manager
            .join(self.guild_id, channel_id)
            .await
            .map_err(|e| PlaybackError::Join(e.to_string()))?;

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, self.guild_id);
        Ok(())
    }

    async fn play(&self, track: &ResolvedTrack, play_id: u64) -> Result<(), PlaybackError> {
        let call = self
            .manager
            .get(self.guild_id)
            .ok_or(PlaybackError::NotConnected)?;

        let input: Input = HttpRequest::new(self.http.clone(), track.stream_url.clone()).into();

        let mut call_lock = call.lock().await;
        let handle = call_lock.play_input(input);
        let _ = handle.set_volume(self.volume);

        // El fin del track (natural, por stop o por error del driver) se
        // reporta al task del player, nunca se muta estado desde acá.
        let notifier = TrackEndNotifier {
            play_id,
            events: self.events.clone(),
        };
        handle
            .add_event(Event::Track(TrackEvent::End), notifier.clone())
            .map_err(|e| PlaybackError::StreamOpen(e.to_string()))?;
        handle
            .add_event(Event::Track(TrackEvent::Error), notifier)
            .map_err(|e| PlaybackError::StreamOpen(e.to_string()))?;

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        if let Some(handle) = self.handle.lock().as_ref() {
            handle
                .pause()
                .map_err(|e| PlaybackError::StreamOpen(e.to_string()))?;
        }
        Ok(())
    }

    async fn resume(&self) -> Result<(), PlaybackError> {
        if let Some(handle) = self.handle.lock().as_ref() {
            handle
                .play()
                .map_err(|e| PlaybackError::StreamOpen(e.to_string()))?;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.stop();
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PlaybackError> {
        *self.handle.lock() = None;

        if self.manager.get(self.guild_id).is_none() {
            return Ok(());
        }
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|e| PlaybackError::Join(e.to_string()))?;

        info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
        Ok(())
    }
}

/// Notificador de fin de track: cruza del driver de songbird al scheduler
/// del player con un simple send.
#[derive(Clone)]
struct TrackEndNotifier {
    play_id: u64,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("🎵 Fin de track reportado (play_id {})", self.play_id);
        if self
            .events
            .send(PlayerEvent::TrackEnded {
                play_id: self.play_id,
            })
            .is_err()
        {
            warn!("⚠️ Player cerrado, fin de track descartado");
        }
        None
    }
}
