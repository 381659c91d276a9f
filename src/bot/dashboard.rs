use serenity::{
    builder::{CreateMessage, EditMessage, GetMessages},
    http::Http,
    model::id::{ChannelId, MessageId, UserId},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::{
    player::{
        engine::{PlaybackStatus, PlayerSnapshot, Severity, UiEvent},
        queue::LoopMode,
    },
    ui::{buttons, embeds},
};

/// Cuánto viven los avisos transitorios antes de borrarse.
const NOTIFICATION_TTL: Duration = Duration::from_secs(10);

/// Task del dashboard: un único mensaje persistente en el canal de música
/// que se edita con cada cambio de estado, más avisos efímeros aparte.
pub async fn run(
    http: Arc<Http>,
    channel_id: ChannelId,
    bot_user_id: UserId,
    mut ui_rx: UnboundedReceiver<UiEvent>,
) {
    let message_id = match find_or_create_dashboard(&http, channel_id, bot_user_id).await {
        Ok(id) => id,
        Err(e) => {
            error!("❌ No se pudo preparar el dashboard: {e:?}");
            return;
        }
    };
    info!("📺 Dashboard listo en canal {channel_id} (mensaje {message_id})");

    while let Some(event) = ui_rx.recv().await {
        match event {
            UiEvent::StateChanged(snapshot) => {
                let edit = EditMessage::new()
                    .embed(embeds::dashboard_embed(&snapshot))
                    .components(buttons::dashboard_buttons());
                if let Err(e) = channel_id.edit_message(&http, message_id, edit).await {
                    warn!("⚠️ Error actualizando dashboard: {e:?}");
                }
            }
            UiEvent::Notify { text, severity } => {
                send_notification(&http, channel_id, &text, severity).await;
            }
        }
    }
    debug!("🛑 Task de dashboard terminado");
}

/// Reutiliza un mensaje reciente del bot como dashboard, o crea uno nuevo
/// en estado idle.
async fn find_or_create_dashboard(
    http: &Arc<Http>,
    channel_id: ChannelId,
    bot_user_id: UserId,
) -> anyhow::Result<MessageId> {
    let recent = channel_id
        .messages(http, GetMessages::new().limit(10))
        .await?;

    if let Some(message) = recent.iter().find(|m| m.author.id == bot_user_id) {
        debug!("♻️ Reutilizando mensaje de dashboard {}", message.id);
        return Ok(message.id);
    }

    let initial = PlayerSnapshot {
        current: None,
        queue: Vec::new(),
        status: PlaybackStatus::Idle,
        loop_mode: LoopMode::Off,
    };
    let message = channel_id
        .send_message(
            http,
            CreateMessage::new()
                .embed(embeds::dashboard_embed(&initial))
                .components(buttons::dashboard_buttons()),
        )
        .await?;
    Ok(message.id)
}

async fn send_notification(http: &Arc<Http>, channel_id: ChannelId, text: &str, severity: Severity) {
    match channel_id
        .send_message(
            http,
            CreateMessage::new().embed(embeds::notification_embed(text, severity)),
        )
        .await
    {
        Ok(message) => {
            let http = http.clone();
            tokio::spawn(async move {
                tokio::time::sleep(NOTIFICATION_TTL).await;
                if let Err(e) = message.delete(&http).await {
                    debug!("No se pudo borrar el aviso: {e:?}");
                }
            });
        }
        Err(e) => warn!("⚠️ Error enviando notificación: {e:?}"),
    }
}
