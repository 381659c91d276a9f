pub mod backend;
pub mod engine;
pub mod queue;
pub mod track;

pub use backend::{AudioBackend, SongbirdBackend};
pub use engine::{ControlAction, Player, PlayerSettings, PlayerSnapshot, Severity, UiEvent};
pub use queue::LoopMode;
pub use track::Track;
