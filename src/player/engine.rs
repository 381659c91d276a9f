use serenity::model::id::ChannelId;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::{
    player::{
        backend::AudioBackend,
        queue::{LoopMode, TrackQueue},
        track::{ResolvedTrack, Track},
    },
    sources::{ResolveError, TrackResolver},
};

/// Umbral del diagnóstico "terminó demasiado rápido" (posible bloqueo regional).
const SHORT_PLAYBACK: Duration = Duration::from_secs(10);

/// Estado del stream de audio del guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Acciones de los botones del dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    ResumePause,
    Skip,
    Stop,
    Shuffle,
    CycleLoop,
}

/// Eventos que procesa el task dueño del estado. Toda entrada externa
/// (mensajes, botones, fin de track, resoluciones, timer) llega por acá y se
/// aplica de a una, sin interleaving.
#[derive(Debug)]
pub enum PlayerEvent {
    Enqueue {
        channel_id: ChannelId,
        tracks: Vec<Track>,
    },
    Control(ControlAction),
    /// Fin del stream, etiquetado con el id que recibió `AudioBackend::play`.
    TrackEnded { play_id: u64 },
    LazyResolved {
        epoch: u64,
        result: Result<Vec<Track>, ResolveError>,
    },
    RequeueResolved {
        epoch: u64,
        front: bool,
        track: Option<Track>,
    },
    IdleCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Eventos hacia la superficie de control (dashboard).
#[derive(Debug)]
pub enum UiEvent {
    StateChanged(PlayerSnapshot),
    Notify { text: String, severity: Severity },
}

/// Foto del estado para renderizar.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    pub status: PlaybackStatus,
    pub loop_mode: LoopMode,
}

pub struct PlayerSettings {
    pub max_queue_size: usize,
    pub idle_timeout: Duration,
}

/// Handle clonable hacia el player de un guild.
#[derive(Clone)]
pub struct Player {
    tx: UnboundedSender<PlayerEvent>,
}

impl Player {
    /// Crea el par de canales del player. El sender se comparte con el
    /// backend (notificador de fin de track) antes de armar el task.
    pub fn channel() -> (UnboundedSender<PlayerEvent>, UnboundedReceiver<PlayerEvent>) {
        mpsc::unbounded_channel()
    }

    pub fn spawn(
        backend: Arc<dyn AudioBackend>,
        resolver: Arc<dyn TrackResolver>,
        ui_tx: UnboundedSender<UiEvent>,
        settings: PlayerSettings,
        tx: UnboundedSender<PlayerEvent>,
        mut rx: UnboundedReceiver<PlayerEvent>,
    ) -> Self {
        let mut core = PlayerCore::new(backend, resolver, ui_tx, settings, tx.clone());

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                core.handle(event).await;
            }
            debug!("🛑 Event loop del player terminado");
        });

        Self { tx }
    }

    pub fn enqueue(&self, channel_id: ChannelId, tracks: Vec<Track>) {
        let _ = self.tx.send(PlayerEvent::Enqueue { channel_id, tracks });
    }

    pub fn control(&self, action: ControlAction) {
        let _ = self.tx.send(PlayerEvent::Control(action));
    }
}

/// Estado del player, propiedad exclusiva del event loop.
struct PlayerCore {
    queue: TrackQueue,
    status: PlaybackStatus,
    started_at: Option<Instant>,
    /// La próxima completion fue iniciada por el usuario (skip o stop):
    /// suprime el diagnóstico de "terminó demasiado rápido".
    manual_stop: bool,
    /// Stop explícito: además de manual, no se re-encola por loop.
    suppress_loop: bool,
    /// Hay una resolución (lazy o requeue) en vuelo.
    resolving: bool,
    /// Invalida resoluciones en vuelo al incrementarse (stop/skip).
    epoch: u64,
    /// Identifica la reproducción vigente; completions con otro id son viejas.
    play_id: u64,
    idle_timeout: Duration,
    backend: Arc<dyn AudioBackend>,
    resolver: Arc<dyn TrackResolver>,
    ui_tx: UnboundedSender<UiEvent>,
    tx: UnboundedSender<PlayerEvent>,
}

impl PlayerCore {
    fn new(
        backend: Arc<dyn AudioBackend>,
        resolver: Arc<dyn TrackResolver>,
        ui_tx: UnboundedSender<UiEvent>,
        settings: PlayerSettings,
        tx: UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            queue: TrackQueue::new(settings.max_queue_size),
            status: PlaybackStatus::Idle,
            started_at: None,
            manual_stop: false,
            suppress_loop: false,
            resolving: false,
            epoch: 0,
            play_id: 0,
            idle_timeout: settings.idle_timeout,
            backend,
            resolver,
            ui_tx,
            tx,
        }
    }

    async fn handle(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Enqueue { channel_id, tracks } => {
                self.on_enqueue(channel_id, tracks).await
            }
            PlayerEvent::Control(action) => self.on_control(action).await,
            PlayerEvent::TrackEnded { play_id } => self.on_track_ended(play_id).await,
            PlayerEvent::LazyResolved { epoch, result } => {
                self.on_lazy_resolved(epoch, result).await
            }
            PlayerEvent::RequeueResolved { epoch, front, track } => {
                self.on_requeue_resolved(epoch, front, track).await
            }
            PlayerEvent::IdleCheck => self.on_idle_check().await,
        }
    }

    async fn on_enqueue(&mut self, channel_id: ChannelId, tracks: Vec<Track>) {
        if let Err(e) = self.backend.connect(channel_id).await {
            error!("❌ No se pudo conectar al canal de voz: {}", e);
            self.notify(
                format!("❌ No pude entrar al canal de voz: {e}"),
                Severity::Error,
            );
            return;
        }

        let offered = tracks.len();
        let accepted = self.queue.enqueue(tracks);
        if accepted < offered {
            self.notify(
                format!("⚠️ Cola llena: {} track(s) quedaron afuera", offered - accepted),
                Severity::Warning,
            );
        }

        if self.status == PlaybackStatus::Idle && !self.resolving {
            self.start_next().await;
        } else {
            self.emit_state();
        }
    }

    /// Avanza: saca el siguiente de la cola y lo reproduce (resolviéndolo
    /// antes si hace falta). Con la cola vacía pasa a idle y arma el timer.
    async fn start_next(&mut self) {
        match self.queue.pop_next() {
            Some(Track::Resolved(track)) => self.begin_playback(track).await,
            Some(Track::Lazy(lazy)) => {
                info!("⏳ Resolviendo entrada lazy: {}", lazy.title);
                self.resolving = true;
                self.emit_state();

                let epoch = self.epoch;
                let resolver = self.resolver.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = resolver.resolve(&lazy.query, true, lazy.requested_by).await;
                    let _ = tx.send(PlayerEvent::LazyResolved { epoch, result });
                });
            }
            None => {
                debug!("📭 Cola vacía, player en idle");
                self.status = PlaybackStatus::Idle;
                self.emit_state();
                self.arm_idle_timer();
            }
        }
    }

    async fn begin_playback(&mut self, track: ResolvedTrack) {
        self.manual_stop = false;
        self.suppress_loop = false;
        self.play_id += 1;

        info!(
            "▶️ Now Playing: {} ({}) | 👤 {}",
            track.title,
            crate::player::track::format_track_duration(track.duration),
            track.requested_by
        );

        let play_result = self.backend.play(&track, self.play_id).await;

        self.queue.set_current(Track::Resolved(track));
        self.status = PlaybackStatus::Playing;
        self.started_at = Some(Instant::now());
        self.emit_state();

        if let Err(e) = play_result {
            // El stream no abrió: se sintetiza la completion para que la
            // cola siga drenando por el mismo camino que un fin natural.
            warn!("❌ No se pudo abrir el stream: {}", e);
            let _ = self.tx.send(PlayerEvent::TrackEnded {
                play_id: self.play_id,
            });
        }
    }

    /// Punto único de finalización: fin natural, skip, stop y error de
    /// stream pasan todos por acá.
    async fn on_track_ended(&mut self, play_id: u64) {
        if play_id != self.play_id || self.queue.current().is_none() {
            debug!("🔁 Completion duplicada o tardía ignorada (play_id {})", play_id);
            return;
        }

        let elapsed = self
            .started_at
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        let manual = std::mem::take(&mut self.manual_stop);
        let suppress_loop = std::mem::take(&mut self.suppress_loop);
        self.status = PlaybackStatus::Idle;

        if elapsed < SHORT_PLAYBACK && !manual {
            warn!(
                "⚠️ Track terminó demasiado rápido ({}s). Posible error o bloqueo regional.",
                elapsed.as_secs()
            );
            self.notify(
                format!(
                    "⚠️ **Error:** el track terminó demasiado rápido ({}s). Puede estar bloqueado por región.",
                    elapsed.as_secs()
                ),
                Severity::Warning,
            );
        } else if !manual {
            debug!("✅ Track terminado");
        }

        let finished = self.queue.take_current();
        let loop_mode = self.queue.loop_mode();

        if !suppress_loop && loop_mode != LoopMode::Off {
            if let Some(finished) = finished {
                // El stream URL viejo ya expiró: el loop re-resuelve la
                // clave canónica en un descriptor fresco.
                let front = loop_mode == LoopMode::Track;
                let key = finished.resolution_key().to_string();
                let requester = finished.requested_by();

                self.resolving = true;
                self.emit_state();

                let epoch = self.epoch;
                let resolver = self.resolver.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let track = match resolver.resolve(&key, true, requester).await {
                        Ok(mut tracks) if !tracks.is_empty() => Some(tracks.remove(0)),
                        Ok(_) => None,
                        Err(e) => {
                            warn!("⚠️ Error re-encolando track en loop: {}", e);
                            None
                        }
                    };
                    let _ = tx.send(PlayerEvent::RequeueResolved { epoch, front, track });
                });
                return;
            }
        }

        self.start_next().await;
    }

    async fn on_lazy_resolved(&mut self, epoch: u64, result: Result<Vec<Track>, ResolveError>) {
        if epoch != self.epoch {
            debug!("🔁 Resolución lazy descartada (epoch viejo)");
            return;
        }
        self.resolving = false;

        match result {
            Ok(tracks) => match tracks.into_iter().next() {
                Some(Track::Resolved(track)) => self.begin_playback(track).await,
                // El contrato single_entry devuelve el primero resuelto;
                // vacío o lazy se saltea sin molestar al usuario.
                Some(Track::Lazy(_)) | None => {
                    warn!("⚠️ Resolución lazy vacía, se saltea la entrada");
                    self.start_next().await;
                }
            },
            Err(e) => {
                warn!("⚠️ Error resolviendo entrada lazy: {}", e);
                self.start_next().await;
            }
        }
    }

    async fn on_requeue_resolved(&mut self, epoch: u64, front: bool, track: Option<Track>) {
        if epoch != self.epoch {
            debug!("🔁 Requeue de loop descartado (epoch viejo)");
            return;
        }
        self.resolving = false;

        match track {
            Some(track) => {
                if front {
                    self.queue.push_front(track);
                } else {
                    self.queue.push_back(track);
                }
            }
            // Fallo de requeue: se sigue avanzando igual, mejor perder el
            // loop que frenar la cola.
            None => warn!("⚠️ Requeue de loop sin resultado, se avanza normal"),
        }

        self.start_next().await;
    }

    async fn on_control(&mut self, action: ControlAction) {
        match action {
            ControlAction::ResumePause => match self.status {
                PlaybackStatus::Playing => {
                    if let Err(e) = self.backend.pause().await {
                        warn!("⚠️ Error pausando: {}", e);
                    }
                    self.status = PlaybackStatus::Paused;
                    info!("⏸️ Reproducción pausada");
                    self.emit_state();
                }
                PlaybackStatus::Paused => {
                    if let Err(e) = self.backend.resume().await {
                        warn!("⚠️ Error reanudando: {}", e);
                    }
                    self.status = PlaybackStatus::Playing;
                    info!("▶️ Reproducción reanudada");
                    self.emit_state();
                }
                PlaybackStatus::Idle => debug!("⏯️ ResumePause sin track, ignorado"),
            },
            ControlAction::Skip => {
                if self.resolving {
                    // La entrada en resolución se descarta y se sigue.
                    self.epoch += 1;
                    self.resolving = false;
                    self.start_next().await;
                } else if self.status != PlaybackStatus::Idle {
                    self.manual_stop = true;
                    if let Err(e) = self.backend.stop().await {
                        warn!("⚠️ Error en skip: {}", e);
                    }
                    // La completion llega como TrackEnded y avanza sola.
                } else {
                    debug!("⏭️ Skip sin track, ignorado");
                }
            }
            ControlAction::Stop => {
                self.queue.clear();
                self.epoch += 1;
                let was_resolving = std::mem::take(&mut self.resolving);

                if self.status != PlaybackStatus::Idle {
                    self.manual_stop = true;
                    self.suppress_loop = true;
                    if let Err(e) = self.backend.stop().await {
                        warn!("⚠️ Error en stop: {}", e);
                    }
                    self.emit_state();
                } else if was_resolving {
                    self.start_next().await;
                } else {
                    self.emit_state();
                }
                info!("⏹️ Reproducción detenida y cola limpiada");
            }
            ControlAction::Shuffle => {
                if self.queue.shuffle() {
                    self.emit_state();
                } else {
                    self.notify(
                        "🔀 Nada para mezclar: la cola tiene menos de 2 tracks",
                        Severity::Info,
                    );
                }
            }
            ControlAction::CycleLoop => {
                let mode = self.queue.cycle_loop_mode();
                let text = match mode {
                    LoopMode::Off => "➡️ Repetición desactivada",
                    LoopMode::Track => "🔂 Repetir canción activado",
                    LoopMode::Queue => "🔁 Repetir cola activado",
                };
                self.notify(text, Severity::Info);
                self.emit_state();
            }
        }
    }

    /// El timer no se cancela: se re-valida el estado al momento de disparar.
    async fn on_idle_check(&mut self) {
        let still_idle = self.status == PlaybackStatus::Idle
            && !self.resolving
            && self.queue.is_empty()
            && self.queue.current().is_none();

        if !still_idle {
            debug!("⏲️ Timer de inactividad ignorado: hay actividad");
            return;
        }

        if let Err(e) = self.backend.disconnect().await {
            warn!("⚠️ Error desconectando por inactividad: {}", e);
        }
        info!("👋 Desconectado por inactividad");
        self.notify(
            "👋 Me fui del canal de voz por inactividad",
            Severity::Warning,
        );
        self.emit_state();
    }

    fn arm_idle_timer(&self) {
        let grace = self.idle_timeout;
        debug!("⏲️ Cola vacía: chequeo de desconexión en {}s", grace.as_secs());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = tx.send(PlayerEvent::IdleCheck);
        });
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current: self.queue.current().cloned(),
            queue: self.queue.snapshot(),
            status: self.status,
            loop_mode: self.queue.loop_mode(),
        }
    }

    fn emit_state(&self) {
        let _ = self.ui_tx.send(UiEvent::StateChanged(self.snapshot()));
    }

    fn notify(&self, text: impl Into<String>, severity: Severity) {
        let _ = self.ui_tx.send(UiEvent::Notify {
            text: text.into(),
            severity,
        });
    }
}
