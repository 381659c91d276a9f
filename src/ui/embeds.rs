use serenity::builder::{CreateEmbed, CreateEmbedFooter};
use std::time::Duration;

use crate::player::{
    engine::{PlaybackStatus, PlayerSnapshot, Severity},
    queue::LoopMode,
};

/// Paleta de colores del bot.
pub mod colors {
    use serenity::all::Colour;

    pub const MAIN: Colour = Colour::new(0x9B59B6);
    pub const ERROR: Colour = Colour::new(0xE74C3C);
    pub const WARNING: Colour = Colour::new(0xE67E22);
}

/// Cuántos tracks de la cola se listan en el dashboard.
const QUEUE_PREVIEW: usize = 10;
const TITLE_MAX: usize = 30;

/// Embed principal del dashboard, re-renderizado en cada cambio de estado.
pub fn dashboard_embed(snapshot: &PlayerSnapshot) -> CreateEmbed {
    let mut embed = CreateEmbed::default().title("Lyra Player 🎵").color(colors::MAIN);

    if let Some(current) = &snapshot.current {
        let status = match snapshot.status {
            PlaybackStatus::Paused => "Paused ⏸️",
            _ => "Now Playing ▶️",
        };

        let description = format!(
            "**{}**\n*{}*",
            current.title(),
            current.uploader().unwrap_or("Unknown")
        );
        embed = embed
            .field(status, description, false)
            .field("Duration", current.formatted_duration(), true)
            .field(
                "Requested by",
                format!("<@{}>", current.requested_by()),
                true,
            );

        if let Some(thumbnail) = current.thumbnail() {
            embed = embed.thumbnail(thumbnail);
        }
    } else {
        embed = embed
            .description("No track playing. Paste a link to start!")
            .field("Status", "Idle", false);
    }

    if !snapshot.queue.is_empty() {
        let total: Duration = snapshot.queue.iter().filter_map(|t| t.duration()).sum();

        let mut lines: Vec<String> = snapshot
            .queue
            .iter()
            .take(QUEUE_PREVIEW)
            .enumerate()
            .map(|(i, track)| {
                format!(
                    "`{}.` **{}** ({}) • <@{}>",
                    i + 1,
                    truncate_title(track.title(), TITLE_MAX),
                    track.formatted_duration(),
                    track.requested_by()
                )
            })
            .collect();

        if snapshot.queue.len() > QUEUE_PREVIEW {
            lines.push(format!(
                "\n**+ {} more tracks in queue...**",
                snapshot.queue.len() - QUEUE_PREVIEW
            ));
        }

        embed = embed.field(
            format!("Up Next (Total: {})", format_total_duration(total)),
            lines.join("\n"),
            false,
        );
    }

    if snapshot.loop_mode != LoopMode::Off {
        embed = embed.footer(CreateEmbedFooter::new(format!(
            "🔁 Loop: {}",
            snapshot.loop_mode.label()
        )));
    }

    embed
}

/// Embed de aviso transitorio (errores, desconexión por inactividad, etc).
pub fn notification_embed(text: &str, severity: Severity) -> CreateEmbed {
    let color = match severity {
        Severity::Info => colors::MAIN,
        Severity::Warning => colors::WARNING,
        Severity::Error => colors::ERROR,
    };
    CreateEmbed::default().description(text).color(color)
}

/// Recorta títulos largos para que la lista de la cola quede pareja.
fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let cut: String = title.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Duración total de la cola en formato corto ("1h 3m" o "4m 20s").
fn format_total_duration(total: Duration) -> String {
    let secs = total.as_secs();
    let (minutes, seconds) = (secs / 60, secs % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short", 30), "short");
        let long = "This is a very long track title indeed";
        let truncated = truncate_title(long, 30);
        assert_eq!(truncated.chars().count(), 30);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_title_is_char_safe() {
        let long = "ñandú ñandú ñandú ñandú ñandú ñandú";
        let truncated = truncate_title(long, 10);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 10);
    }

    #[test]
    fn test_format_total_duration() {
        assert_eq!(format_total_duration(Duration::from_secs(0)), "0m 0s");
        assert_eq!(format_total_duration(Duration::from_secs(260)), "4m 20s");
        assert_eq!(format_total_duration(Duration::from_secs(3780)), "1h 3m");
    }
}
