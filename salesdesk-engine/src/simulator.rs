use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use rand::Rng;
use salesdesk_core::config::{CallSettings, FailurePolicy};
use salesdesk_core::notice::Notice;
use salesdesk_core::transcript::{TranscriptEntry, TranscriptLog};
use salesdesk_core::types::Speaker;
use tokio::sync::{broadcast, mpsc};

use crate::session::{
    SendError, SessionState, SessionStatus, StartOutcome, state_headline, state_label,
};
use crate::timer::ScheduledTask;
use crate::traits::{
    CallSetup, CallSetupRequest, ConnectError, MediaConnector, MediaEvent, MediaSession,
    RandomReplyPicker, ReplyPicker, TrackKind,
};

const AGENT_PARTICIPANT: &str = "agent";
pub const LISTENING_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub connect_delay: Duration,
    pub reply_delay: Duration,
    pub listening_interval: Duration,
    /// Chance the indicator is on after each listening tick. Clamped to 0..=1.
    pub listening_probability: f64,
    pub greeting: String,
    pub replies: Vec<String>,
    pub on_failure: FailurePolicy,
}

impl SimulatorConfig {
    pub fn from_settings(call: &CallSettings, greeting: impl Into<String>) -> Self {
        Self {
            connect_delay: Duration::from_millis(call.connect_delay_ms),
            reply_delay: Duration::from_millis(call.reply_delay_ms),
            // A zero period would spin the ticker.
            listening_interval: Duration::from_millis(call.listening_interval_ms.max(1)),
            listening_probability: LISTENING_PROBABILITY,
            greeting: greeting.into(),
            replies: call.replies.clone(),
            on_failure: call.on_failure,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let call = CallSettings::default();
        let greeting = call.greeting.clone();
        Self::from_settings(&call, greeting)
    }
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    // Bumped on every start/end so work from an earlier call can tell it is stale.
    generation: u64,
    transcript: TranscriptLog,
    tasks: Vec<ScheduledTask>,
    media: Option<Arc<dyn MediaSession>>,
    muted: bool,
    listening: bool,
    agent_audio_tracks: u32,
}

impl Inner {
    fn push_task(&mut self, task: ScheduledTask) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }

    fn is_current(&self, generation: u64, state: SessionState) -> bool {
        self.generation == generation && self.state == state
    }
}

struct Shared {
    cfg: SimulatorConfig,
    inner: Mutex<Inner>,
    notices: broadcast::Sender<Notice>,
    picker: Arc<dyn ReplyPicker>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_state(inner: &mut Inner, next: SessionState) {
        let prev = inner.state;
        inner.state = next;
        if prev != next {
            log::info!("session state: {prev} -> {next}");
        }
        if next != SessionState::Connected {
            inner.listening = false;
        }
    }

    fn notify(&self, notice: Notice) {
        log::debug!("notice: {} - {}", notice.title, notice.description);
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    fn mark_connected(self: &Arc<Self>, generation: u64, notice: Option<Notice>) -> bool {
        {
            let mut inner = self.lock();
            if !inner.is_current(generation, SessionState::Connecting) {
                log::debug!("stale connect for session {generation} ignored");
                return false;
            }
            Self::set_state(&mut inner, SessionState::Connected);
            inner.transcript.add_entry(Speaker::Agent, self.cfg.greeting.clone());
            let ticker = spawn_listening_ticker(self, generation);
            inner.push_task(ticker);
        }

        if let Some(notice) = notice {
            self.notify(notice);
        }
        true
    }

    fn append_reply(&self, generation: u64) {
        let mut inner = self.lock();
        if !inner.is_current(generation, SessionState::Connected) {
            return;
        }
        let Some(reply) = self
            .picker
            .pick(self.cfg.replies.len())
            .and_then(|i| self.cfg.replies.get(i))
        else {
            log::warn!("no canned replies configured; agent stays silent");
            return;
        };
        inner.transcript.add_entry(Speaker::Agent, reply.clone());
    }

    /// Returns `false` once the event stream for this session should stop.
    fn handle_media_event(self: &Arc<Self>, generation: u64, event: MediaEvent) -> bool {
        match event {
            MediaEvent::Connected => {
                log::info!("media session connected");
                self.mark_connected(
                    generation,
                    Some(Notice::info("Session Started", "Connected to AI Sales Agent")),
                );
                true
            }
            MediaEvent::Disconnected => {
                log::info!("media session disconnected");
                let tasks = {
                    let mut inner = self.lock();
                    if inner.generation != generation || inner.state == SessionState::Disconnected
                    {
                        return false;
                    }
                    Self::set_state(&mut inner, SessionState::Disconnected);
                    inner.media = None;
                    std::mem::take(&mut inner.tasks)
                };
                // Includes this pump's own handle; it stops at its next await.
                drop(tasks);
                self.notify(Notice::destructive(
                    "Session Ended",
                    "Disconnected from AI Sales Agent",
                ));
                false
            }
            MediaEvent::TrackSubscribed { kind, participant } => {
                if kind == TrackKind::Audio && participant == AGENT_PARTICIPANT {
                    let mut inner = self.lock();
                    if inner.generation == generation {
                        inner.agent_audio_tracks += 1;
                        log::info!("agent audio track attached");
                    }
                } else {
                    log::debug!("ignoring {kind:?} track from {participant}");
                }
                true
            }
        }
    }
}

fn spawn_listening_ticker(shared: &Arc<Shared>, generation: u64) -> ScheduledTask {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let period = shared.cfg.listening_interval;
    let probability = shared.cfg.listening_probability.clamp(0.0, 1.0);
    ScheduledTask::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.lock();
            if !inner.is_current(generation, SessionState::Connected) {
                return;
            }
            inner.listening = rand::thread_rng().gen_bool(probability);
        }
    })
}

fn spawn_event_pump(
    shared: &Arc<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<MediaEvent>,
) -> ScheduledTask {
    let weak = Arc::downgrade(shared);
    ScheduledTask::spawn(async move {
        while let Some(event) = events.recv().await {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if !shared.handle_media_event(generation, event) {
                return;
            }
        }
    })
}

pub struct SimulatorBuilder {
    cfg: SimulatorConfig,
    setup: Option<(Arc<dyn CallSetup>, Arc<dyn MediaConnector>)>,
    picker: Arc<dyn ReplyPicker>,
}

impl SimulatorBuilder {
    /// Route `start_call` through a backend and a media SDK instead of the timer.
    pub fn call_setup(
        mut self,
        setup: Arc<dyn CallSetup>,
        connector: Arc<dyn MediaConnector>,
    ) -> Self {
        self.setup = Some((setup, connector));
        self
    }

    pub fn reply_picker(mut self, picker: Arc<dyn ReplyPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn build(self) -> SessionSimulator {
        let (notices, _) = broadcast::channel(32);
        SessionSimulator {
            shared: Arc::new(Shared {
                cfg: self.cfg,
                inner: Mutex::new(Inner::default()),
                notices,
                picker: self.picker,
            }),
            setup: self.setup,
        }
    }
}

/// Drives one screen's voice session and owns its transcript.
///
/// Every timer, ticker and SDK listener it starts is tracked and torn down on
/// `end_call`, `shutdown` or drop.
pub struct SessionSimulator {
    shared: Arc<Shared>,
    setup: Option<(Arc<dyn CallSetup>, Arc<dyn MediaConnector>)>,
}

impl SessionSimulator {
    pub fn builder(cfg: SimulatorConfig) -> SimulatorBuilder {
        SimulatorBuilder {
            cfg,
            setup: None,
            picker: Arc::new(RandomReplyPicker),
        }
    }

    /// Timer-only simulator.
    pub fn new(cfg: SimulatorConfig) -> Self {
        Self::builder(cfg).build()
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn status(&self) -> SessionStatus {
        let inner = self.shared.lock();
        let (headline, detail) = state_headline(inner.state);
        SessionStatus {
            state: inner.state,
            label: state_label(inner.state).into(),
            headline: headline.into(),
            detail: detail.into(),
            muted: inner.muted,
            listening: inner.listening,
            agent_audio_tracks: inner.agent_audio_tracks,
            transcript_len: inner.transcript.len(),
        }
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.shared.lock().transcript.entries().to_vec()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }

    /// Flips the mute badge. Audio flow is unaffected.
    pub fn toggle_mute(&self) -> bool {
        let mut inner = self.shared.lock();
        inner.muted = !inner.muted;
        inner.muted
    }

    pub async fn start_call(
        &self,
        request: &CallSetupRequest,
    ) -> Result<StartOutcome, ConnectError> {
        let generation = {
            let mut inner = self.shared.lock();
            if inner.state != SessionState::Disconnected {
                log::info!("start_call ignored: session is {}", inner.state);
                return Ok(StartOutcome::AlreadyActive);
            }
            inner.generation = inner.generation.wrapping_add(1);
            inner.agent_audio_tracks = 0;
            Shared::set_state(&mut inner, SessionState::Connecting);
            inner.generation
        };

        let Some((setup, connector)) = self.setup.clone() else {
            self.schedule_simulated_connect(generation, None);
            return Ok(StartOutcome::Simulated);
        };

        let policy = self.shared.cfg.on_failure;
        let (attempts, backoff) = match policy {
            FailurePolicy::Retry {
                attempts,
                backoff_ms,
            } => (attempts.max(1), Duration::from_millis(backoff_ms)),
            FailurePolicy::MockSuccess | FailurePolicy::Propagate => (1, Duration::ZERO),
        };

        let mut attempt = 1;
        let err = loop {
            match self
                .open_live_session(generation, setup.as_ref(), connector.as_ref(), request)
                .await
            {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < attempts => {
                    log::warn!("call setup attempt {attempt}/{attempts} failed: {e}");
                    tokio::time::sleep(backoff).await;
                    if !self.is_connecting(generation) {
                        return Ok(StartOutcome::Cancelled);
                    }
                    attempt += 1;
                }
                Err(e) => break e,
            }
        };

        if !self.is_connecting(generation) {
            return Ok(StartOutcome::Cancelled);
        }

        match policy {
            FailurePolicy::MockSuccess => {
                log::warn!("call setup failed, continuing with a simulated agent: {err}");
                self.schedule_simulated_connect(
                    generation,
                    Some(Notice::info(
                        "Demo Mode",
                        "Connected to simulated AI Sales Agent",
                    )),
                );
                Ok(StartOutcome::Simulated)
            }
            FailurePolicy::Retry { .. } | FailurePolicy::Propagate => {
                log::error!("call setup failed: {err}");
                {
                    let mut inner = self.shared.lock();
                    if inner.is_current(generation, SessionState::Connecting) {
                        Shared::set_state(&mut inner, SessionState::Disconnected);
                    }
                }
                Err(err)
            }
        }
    }

    pub async fn end_call(&self) {
        let (was, tasks, media) = {
            let mut inner = self.shared.lock();
            let was = inner.state;
            inner.generation = inner.generation.wrapping_add(1);
            Shared::set_state(&mut inner, SessionState::Disconnected);
            (was, std::mem::take(&mut inner.tasks), inner.media.take())
        };
        drop(tasks);

        if let Some(media) = media {
            if let Err(e) = media.disconnect().await {
                log::error!("media session teardown failed: {e:#}");
            }
        }

        if was != SessionState::Disconnected {
            self.shared.notify(Notice::destructive(
                "Session Ended",
                "Disconnected from AI Sales Agent",
            ));
        }
    }

    /// Appends the user's line now and a canned agent reply after the reply delay.
    pub fn send_message(&self, text: &str) -> Result<(), SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let mut inner = self.shared.lock();
        if inner.state != SessionState::Connected {
            return Err(SendError::NotConnected);
        }
        inner.transcript.add_entry(Speaker::User, text);

        let generation = inner.generation;
        let weak = Arc::downgrade(&self.shared);
        let reply = ScheduledTask::after(self.shared.cfg.reply_delay, async move {
            if let Some(shared) = weak.upgrade() {
                shared.append_reply(generation);
            }
        });
        inner.push_task(reply);
        Ok(())
    }

    /// Teardown without waiting: cancels all pending work and releases the
    /// media session in the background.
    pub fn shutdown(&self) {
        let (tasks, media) = {
            let mut inner = self.shared.lock();
            inner.generation = inner.generation.wrapping_add(1);
            Shared::set_state(&mut inner, SessionState::Disconnected);
            (std::mem::take(&mut inner.tasks), inner.media.take())
        };
        drop(tasks);

        if let Some(media) = media {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = media.disconnect().await {
                            log::error!("media session teardown failed: {e:#}");
                        }
                    });
                }
                Err(_) => log::warn!("no runtime available; media session dropped without disconnect"),
            }
        }
    }

    fn is_connecting(&self, generation: u64) -> bool {
        self.shared
            .lock()
            .is_current(generation, SessionState::Connecting)
    }

    fn schedule_simulated_connect(&self, generation: u64, notice: Option<Notice>) {
        let weak = Arc::downgrade(&self.shared);
        let task = ScheduledTask::after(self.shared.cfg.connect_delay, async move {
            if let Some(shared) = weak.upgrade() {
                shared.mark_connected(generation, notice);
            }
        });
        self.shared.lock().push_task(task);
    }

    async fn open_live_session(
        &self,
        generation: u64,
        setup: &dyn CallSetup,
        connector: &dyn MediaConnector,
        request: &CallSetupRequest,
    ) -> Result<StartOutcome, ConnectError> {
        let grant = setup.request_session(request).await?;
        log::debug!("call setup granted: {grant:?}");

        let (tx, rx) = mpsc::unbounded_channel();
        let session: Arc<dyn MediaSession> = connector
            .connect(&grant, tx)
            .await
            .map_err(|e| ConnectError::Media(format!("{e:#}")))?
            .into();

        let superseded = {
            let mut inner = self.shared.lock();
            if inner.is_current(generation, SessionState::Connecting) {
                inner.media = Some(session.clone());
                let pump = spawn_event_pump(&self.shared, generation, rx);
                inner.push_task(pump);
                false
            } else {
                true
            }
        };

        if superseded {
            log::info!("call ended while connecting; closing media session");
            if let Err(e) = session.disconnect().await {
                log::error!("media session teardown failed: {e:#}");
            }
            return Ok(StartOutcome::Cancelled);
        }

        Ok(StartOutcome::Live)
    }
}

impl Drop for SessionSimulator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
