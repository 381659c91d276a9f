use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::player::track::Track;

/// Política de repetición al terminar un track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Off,
    Track,
    Queue,
}

impl LoopMode {
    /// Rotación usada por el botón de loop del dashboard.
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::Track,
            LoopMode::Track => LoopMode::Queue,
            LoopMode::Queue => LoopMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoopMode::Off => "Off",
            LoopMode::Track => "Track",
            LoopMode::Queue => "Queue",
        }
    }
}

/// Cola de reproducción de un guild.
///
/// El track en curso vive en el slot `current`, nunca dentro de `items`:
/// `pop_next` saca de la cola y `set_current` solo escribe el slot, así que
/// el invariante se mantiene estructuralmente.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    current: Option<Track>,
    loop_mode: LoopMode,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            current: None,
            loop_mode: LoopMode::Off,
            max_size,
        }
    }

    /// Agrega tracks al final de la cola, respetando el límite.
    /// Devuelve cuántos se aceptaron.
    pub fn enqueue(&mut self, tracks: Vec<Track>) -> usize {
        let available = self.max_size.saturating_sub(self.items.len());
        let accepted = tracks.len().min(available);

        for track in tracks.into_iter().take(accepted) {
            debug!("➕ Agregado a la cola: {}", track.title());
            self.items.push_back(track);
        }

        if accepted > 0 {
            info!("📚 {} track(s) en cola (total: {})", accepted, self.items.len());
        }
        accepted
    }

    /// Saca el siguiente track de la cola. No toca el slot `current`; el
    /// engine decide si va directo a reproducción o pasa por resolución lazy.
    pub fn pop_next(&mut self) -> Option<Track> {
        self.items.pop_front()
    }

    pub fn set_current(&mut self, track: Track) {
        self.current = Some(track);
    }

    pub fn take_current(&mut self) -> Option<Track> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Vacía la cola pendiente sin tocar el track actual.
    pub fn clear(&mut self) {
        self.items.clear();
        info!("🗑️ Cola limpiada");
    }

    /// Mezcla la cola en el lugar. Con menos de 2 items no hay nada que
    /// mezclar y devuelve `false`.
    pub fn shuffle(&mut self) -> bool {
        if self.items.len() < 2 {
            debug!("🔀 Cola con {} item(s), shuffle sin efecto", self.items.len());
            return false;
        }

        let mut items: Vec<_> = self.items.drain(..).collect();
        items.shuffle(&mut rand::thread_rng());
        self.items.extend(items);
        info!("🔀 Cola mezclada ({} tracks)", self.items.len());
        true
    }

    /// Inserta al frente (requeue de loop Track).
    pub fn push_front(&mut self, track: Track) {
        self.items.push_front(track);
    }

    /// Inserta al final (requeue de loop Queue).
    pub fn push_back(&mut self, track: Track) {
        self.items.push_back(track);
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        match mode {
            LoopMode::Off => info!("➡️ Repetición desactivada"),
            LoopMode::Track => info!("🔂 Repetir canción activado"),
            LoopMode::Queue => info!("🔁 Repetir cola activado"),
        }
    }

    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        let next = self.loop_mode.cycle();
        self.set_loop_mode(next);
        next
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copia de los items pendientes, en orden, para el dashboard.
    pub fn snapshot(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::track::ResolvedTrack;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;
    use std::{collections::HashSet, time::Duration};

    fn track(title: &str, secs: u64) -> Track {
        Track::Resolved(ResolvedTrack {
            title: title.to_string(),
            uploader: None,
            duration: Some(Duration::from_secs(secs)),
            thumbnail: None,
            stream_url: format!("https://cdn.example/{title}"),
            webpage_url: format!("https://www.youtube.com/watch?v={title}"),
            requested_by: UserId::new(7),
        })
    }

    #[test]
    fn test_enqueue_and_pop_are_fifo() {
        let mut queue = TrackQueue::new(100);
        queue.enqueue(vec![track("a", 30), track("b", 40), track("c", 50)]);

        assert_eq!(queue.pop_next().unwrap().title(), "a");
        assert_eq!(queue.pop_next().unwrap().title(), "b");
        assert_eq!(queue.pop_next().unwrap().title(), "c");
        assert!(queue.pop_next().is_none());
    }

    #[test]
    fn test_current_never_lives_in_queue() {
        let mut queue = TrackQueue::new(100);
        queue.enqueue(vec![track("a", 30), track("b", 40)]);

        let next = queue.pop_next().unwrap();
        queue.set_current(next);

        assert_eq!(queue.current().unwrap().title(), "a");
        assert_eq!(queue.len(), 1);
        assert!(queue.snapshot().iter().all(|t| t.title() != "a"));
    }

    #[test]
    fn test_enqueue_respects_max_size() {
        let mut queue = TrackQueue::new(2);
        let accepted = queue.enqueue(vec![track("a", 1), track("b", 2), track("c", 3)]);

        assert_eq!(accepted, 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_clear_keeps_current() {
        let mut queue = TrackQueue::new(100);
        queue.enqueue(vec![track("a", 30), track("b", 40)]);
        let next = queue.pop_next().unwrap();
        queue.set_current(next);

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.current().unwrap().title(), "a");
    }

    #[test]
    fn test_shuffle_reports_no_effect_under_two_items() {
        let mut queue = TrackQueue::new(100);
        assert!(!queue.shuffle());

        queue.enqueue(vec![track("a", 30)]);
        assert!(!queue.shuffle());
        assert_eq!(queue.snapshot()[0].title(), "a");
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let mut queue = TrackQueue::new(100);
        let titles = ["a", "b", "c", "d", "e", "f"];
        queue.enqueue(titles.iter().map(|t| track(t, 10)).collect());

        assert!(queue.shuffle());

        let shuffled: HashSet<String> = queue
            .snapshot()
            .iter()
            .map(|t| t.title().to_string())
            .collect();
        assert_eq!(shuffled.len(), titles.len());
        for title in titles {
            assert!(shuffled.contains(title));
        }
    }

    #[test]
    fn test_requeue_insertion_ends() {
        let mut queue = TrackQueue::new(100);
        queue.enqueue(vec![track("b", 40)]);

        queue.push_front(track("a", 30));
        queue.push_back(track("c", 50));

        let order: Vec<_> = queue.snapshot().iter().map(|t| t.title().to_string()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_loop_mode_cycle() {
        let mut queue = TrackQueue::new(100);
        assert_eq!(queue.loop_mode(), LoopMode::Off);
        assert_eq!(queue.cycle_loop_mode(), LoopMode::Track);
        assert_eq!(queue.cycle_loop_mode(), LoopMode::Queue);
        assert_eq!(queue.cycle_loop_mode(), LoopMode::Off);
    }
}
