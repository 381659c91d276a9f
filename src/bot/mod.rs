use anyhow::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use serenity::{
    all::{Context, EventHandler, Interaction, Mentionable, Message, Ready},
    async_trait,
    builder::CreateMessage,
    model::id::{ChannelId, GuildId},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

pub mod dashboard;

use crate::{
    config::Config,
    player::{
        backend::SongbirdBackend,
        engine::{Player, PlayerSettings, Severity, UiEvent},
    },
    sources::TrackResolver,
    ui::buttons,
};

/// Cuánto viven las respuestas de validación ("entrá a un canal de voz").
const REPLY_TTL: Duration = Duration::from_secs(5);

/// Handler principal: intake de links en el canal de música y botones del
/// dashboard. Todo el estado de reproducción vive en los players por guild.
pub struct LyraBot {
    config: Arc<Config>,
    resolver: Arc<dyn TrackResolver>,
    players: DashMap<GuildId, Player>,
    ui_tx: UnboundedSender<UiEvent>,
    /// Receiver del dashboard, consumido una sola vez en `ready`.
    ui_rx: Mutex<Option<UnboundedReceiver<UiEvent>>>,
}

impl LyraBot {
    pub fn new(config: Config, resolver: Arc<dyn TrackResolver>) -> Self {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        Self {
            config: Arc::new(config),
            resolver,
            players: DashMap::new(),
            ui_tx,
            ui_rx: Mutex::new(Some(ui_rx)),
        }
    }

    fn music_channel(&self) -> ChannelId {
        ChannelId::new(self.config.music_channel_id)
    }

    /// Devuelve el player del guild, creándolo si es la primera vez.
    async fn player_for(&self, ctx: &Context, guild_id: GuildId) -> Result<Player> {
        if let Some(player) = self.players.get(&guild_id) {
            return Ok(player.clone());
        }

        let manager = songbird::get(ctx)
            .await
            .ok_or_else(|| anyhow::anyhow!("Songbird no está inicializado"))?;

        let (tx, rx) = Player::channel();
        let backend = Arc::new(SongbirdBackend::new(
            manager,
            guild_id,
            self.config.default_volume,
            tx.clone(),
        ));

        let player = Player::spawn(
            backend,
            self.resolver.clone(),
            self.ui_tx.clone(),
            PlayerSettings {
                max_queue_size: self.config.max_queue_size,
                idle_timeout: Duration::from_secs(self.config.idle_timeout_secs),
            },
            tx,
            rx,
        );

        info!("🎛️ Player creado para guild {guild_id}");
        self.players.insert(guild_id, player.clone());
        Ok(player)
    }

    async fn handle_request(&self, ctx: &Context, message: &Message) -> Result<()> {
        // El canal de música se mantiene limpio: el pedido se borra siempre.
        if let Err(e) = message.delete(&ctx.http).await {
            warn!("⚠️ No se pudo borrar el mensaje del usuario: {e:?}");
        }

        let Some(guild_id) = message.guild_id else {
            return Ok(());
        };

        // El autor tiene que estar en un canal de voz.
        let voice_channel = ctx.cache.guild(guild_id).and_then(|guild| {
            guild
                .voice_states
                .get(&message.author.id)
                .and_then(|vs| vs.channel_id)
        });
        let Some(voice_channel) = voice_channel else {
            self.transient_reply(
                ctx,
                format!("{}, please join a voice channel first!", message.author.mention()),
            )
            .await;
            return Ok(());
        };

        let query = message.content.trim().to_string();
        if !is_http_link(&query) {
            self.transient_reply(
                ctx,
                format!("{}, Lyra only accepts links here.", message.author.mention()),
            )
            .await;
            return Ok(());
        }

        let player = self.player_for(ctx, guild_id).await?;

        let searching = self
            .music_channel()
            .send_message(
                &ctx.http,
                CreateMessage::new().content(format!("🔎 **Searching for:** `{query}`...")),
            )
            .await
            .ok();

        let result = self.resolver.resolve(&query, false, message.author.id).await;

        if let Some(notice) = searching {
            let _ = notice.delete(&ctx.http).await;
        }

        match result {
            Ok(tracks) => {
                info!("📚 Pedido resuelto: {} track(s)", tracks.len());
                player.enqueue(voice_channel, tracks);
            }
            Err(e) => {
                warn!("⚠️ Pedido falló: {e}");
                let _ = self.ui_tx.send(UiEvent::Notify {
                    text: format!("❌ Error processing request: {e}"),
                    severity: Severity::Error,
                });
            }
        }
        Ok(())
    }

    /// Respuesta corta que se autodestruye para no ensuciar el canal.
    async fn transient_reply(&self, ctx: &Context, text: String) {
        match self
            .music_channel()
            .send_message(&ctx.http, CreateMessage::new().content(text))
            .await
        {
            Ok(message) => {
                let http = ctx.http.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(REPLY_TTL).await;
                    let _ = message.delete(&http).await;
                });
            }
            Err(e) => warn!("⚠️ Error enviando aviso: {e:?}"),
        }
    }
}

/// Solo se aceptan links http(s); texto suelto se rechaza.
fn is_http_link(text: &str) -> bool {
    match url::Url::parse(text) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[async_trait]
impl EventHandler for LyraBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("✅ {} está en línea (ID: {})", ready.user.name, ready.user.id);

        if let Some(ui_rx) = self.ui_rx.lock().take() {
            let http = ctx.http.clone();
            let channel_id = self.music_channel();
            let bot_user_id = ready.user.id;
            tokio::spawn(async move {
                dashboard::run(http, channel_id, bot_user_id, ui_rx).await;
            });
        }
    }

    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        if message.channel_id != self.music_channel() {
            return;
        }

        if let Err(e) = self.handle_request(&ctx, &message).await {
            error!("❌ Error procesando pedido: {e:?}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };
        let Some(action) = buttons::action_for(&component.data.custom_id) else {
            return;
        };
        let Some(guild_id) = component.guild_id else {
            return;
        };

        debug!(
            "🔘 Botón {} presionado por {}",
            component.data.custom_id, component.user.name
        );

        // Ack inmediato; el efecto visible llega por la edición del dashboard.
        if let Err(e) = component.defer(&ctx.http).await {
            warn!("⚠️ Error al deferir la interacción: {e:?}");
        }

        match self.player_for(&ctx, guild_id).await {
            Ok(player) => player.control(action),
            Err(e) => error!("❌ No se pudo obtener el player: {e:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_link_accepts_urls() {
        assert!(is_http_link("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_http_link("http://example.com/track"));
    }

    #[test]
    fn test_is_http_link_rejects_plain_text() {
        assert!(!is_http_link("never gonna give you up"));
        assert!(!is_http_link("ftp://example.com/file"));
        assert!(!is_http_link(""));
    }
}
