use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::player::engine::ControlAction;

/// IDs persistentes de los botones del dashboard.
pub mod button_ids {
    pub const RESUME_PAUSE: &str = "lyra:resume_pause";
    pub const SKIP: &str = "lyra:skip";
    pub const STOP: &str = "lyra:stop";
    pub const SHUFFLE: &str = "lyra:shuffle";
    pub const LOOP: &str = "lyra:loop";
}

/// Fila de controles que acompaña al embed del dashboard.
pub fn dashboard_buttons() -> Vec<CreateActionRow> {
    let resume_pause = CreateButton::new(button_ids::RESUME_PAUSE)
        .label("⏯️ Resume/Pause")
        .style(ButtonStyle::Primary);

    let skip = CreateButton::new(button_ids::SKIP)
        .label("⏭️ Skip")
        .style(ButtonStyle::Success);

    let stop = CreateButton::new(button_ids::STOP)
        .label("⏹️ Stop")
        .style(ButtonStyle::Danger);

    let shuffle = CreateButton::new(button_ids::SHUFFLE)
        .label("🔀 Shuffle")
        .style(ButtonStyle::Secondary);

    let loop_btn = CreateButton::new(button_ids::LOOP)
        .label("🔁 Loop")
        .style(ButtonStyle::Secondary);

    vec![CreateActionRow::Buttons(vec![
        resume_pause,
        skip,
        stop,
        shuffle,
        loop_btn,
    ])]
}

/// Traduce el custom id de un botón a la acción del player.
pub fn action_for(custom_id: &str) -> Option<ControlAction> {
    match custom_id {
        button_ids::RESUME_PAUSE => Some(ControlAction::ResumePause),
        button_ids::SKIP => Some(ControlAction::Skip),
        button_ids::STOP => Some(ControlAction::Stop),
        button_ids::SHUFFLE => Some(ControlAction::Shuffle),
        button_ids::LOOP => Some(ControlAction::CycleLoop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_for_known_ids() {
        assert_eq!(
            action_for(button_ids::RESUME_PAUSE),
            Some(ControlAction::ResumePause)
        );
        assert_eq!(action_for(button_ids::SKIP), Some(ControlAction::Skip));
        assert_eq!(action_for(button_ids::STOP), Some(ControlAction::Stop));
        assert_eq!(action_for(button_ids::SHUFFLE), Some(ControlAction::Shuffle));
        assert_eq!(action_for(button_ids::LOOP), Some(ControlAction::CycleLoop));
    }

    #[test]
    fn test_action_for_unknown_id() {
        assert_eq!(action_for("otra_cosa"), None);
    }
}
