#![forbid(unsafe_code)]

//! Host-driven tour session.
//!
//! [`TourSession`] owns the viewport classifier, the tour state machine, the
//! settle scheduler, and the status recorder. The host controls the loop:
//!
//! 1. Push events via [`TourSession::push_event`].
//! 2. Advance time via [`TourSession::advance_time`] or a
//!    [`SessionEvent::Tick`].
//! 3. Call [`TourSession::step`] to process queued events and fire a due
//!    settle timer.
//! 4. Read [`TourSession::frame`] and [`TourSession::take_outputs`].
//!
//! # Example
//!
//! ```ignore
//! use waypoint_web::{SessionEvent, TourInput, TourSession};
//! use waypoint_tour::MemoryStatusStore;
//! use waypoint_core::viewport::ViewportSignals;
//! use core::time::Duration;
//!
//! let store = MemoryStatusStore::new();
//! let mut session = TourSession::new(config, ViewportSignals::browser(390.0, 844.0), store);
//! session.push_event(SessionEvent::SignIn { user_id: "u-1".into() });
//! session.push_event(SessionEvent::Input(TourInput::Start));
//! session.step();
//!
//! session.advance_time(Duration::from_millis(800));
//! // Push a fresh snapshot after every step change; the previous step's
//! // measurements are discarded when the step changes.
//! session.push_event(SessionEvent::Snapshot(measure_dom()));
//! session.step();
//! paint(session.frame());
//! ```

use core::time::Duration;
use std::collections::VecDeque;

use waypoint_core::clock::{DeterministicClock, SystemWallClock, WallClock};
use waypoint_core::geometry::Size;
use waypoint_core::viewport::{LayoutClass, ViewportClassifier, ViewportSignals};
use waypoint_tour::{
    DomQuery, DomSnapshot, NavigationShell, PersistOutcome, PositionRequest, SettleScheduler,
    TerminalAction, TerminalRecord, TourConfig, TourEffect, TourMachine, TourStatusRecorder,
    TourStatusStore, Transition, position, resolve, should_offer_tour,
};

use crate::{SessionOutputs, SessionResult, TourFrame};

/// Viewport assumed before the host reports one (non-browser harness).
const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

/// User intent coming from the tour controls or the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourInput {
    Start,
    Next,
    Previous,
    Skip,
    /// Close button or Escape. Ends a running tour like `Skip`; declines a
    /// pending offer otherwise.
    Dismiss,
}

/// One host-pushed event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Resize(ViewportSignals),
    OrientationChanged(ViewportSignals),
    /// Absolute monotonic time.
    Tick(Duration),
    Snapshot(DomSnapshot),
    Input(TourInput),
    SignIn { user_id: String },
    SignOut,
}

/// Result of a single [`TourSession::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub events_processed: u32,
    /// A settle timer fired and the active step was measured.
    pub settled: bool,
    /// The frame changed during this step.
    pub frame_changed: bool,
    pub active: bool,
}

/// Host-driven tour session.
pub struct TourSession {
    config: TourConfig,
    classifier: ViewportClassifier,
    machine: TourMachine,
    scheduler: SettleScheduler,
    clock: DeterministicClock,
    wall_clock: Box<dyn WallClock>,
    recorder: TourStatusRecorder,
    shell: Option<Box<dyn NavigationShell>>,
    queue: VecDeque<SessionEvent>,
    user_id: Option<String>,
    snapshot: DomSnapshot,
    frame: Option<TourFrame>,
    /// The current step's settle delay has elapsed.
    settled: bool,
    outputs: SessionOutputs,
}

impl TourSession {
    /// Create a session classified from the initial viewport signals.
    ///
    /// Terminal writes go to `store` under `config.persistence_policy`.
    #[must_use]
    pub fn new(
        config: TourConfig,
        signals: ViewportSignals,
        store: impl TourStatusStore + 'static,
    ) -> Self {
        let recorder = TourStatusRecorder::new(Box::new(store), config.persistence_policy);
        let classifier = ViewportClassifier::with_signals(config.compact_breakpoint, &signals);
        let machine = TourMachine::new(classifier.current());
        Self {
            config,
            classifier,
            machine,
            scheduler: SettleScheduler::new(),
            clock: DeterministicClock::new(),
            wall_clock: Box::new(SystemWallClock),
            recorder,
            shell: None,
            queue: VecDeque::new(),
            user_id: None,
            snapshot: DomSnapshot::default(),
            frame: None,
            settled: false,
            outputs: SessionOutputs::default(),
        }
    }

    /// Session configured from `WAYPOINT_*` environment variables.
    pub fn from_env(
        signals: ViewportSignals,
        store: impl TourStatusStore + 'static,
    ) -> SessionResult<Self> {
        let config = TourConfig::from_env()?;
        tracing::debug!(config = %config.to_jsonl(), "tour session configured");
        Ok(Self::new(config, signals, store))
    }

    /// Use a custom machine (e.g. custom catalogs). Its layout is replaced by
    /// the classifier's.
    #[must_use]
    pub fn with_machine(mut self, mut machine: TourMachine) -> Self {
        let _ = machine.set_layout(self.classifier.current());
        self.machine = machine;
        self
    }

    /// Source of the timestamps written with terminal actions.
    #[must_use]
    pub fn with_wall_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.wall_clock = Box::new(clock);
        self
    }

    /// Deliver menu requests to `shell` as well as recording them.
    #[must_use]
    pub fn with_shell(mut self, shell: impl NavigationShell + 'static) -> Self {
        self.shell = Some(Box::new(shell));
        self
    }

    /// Queue an event for the next [`step`](Self::step).
    pub fn push_event(&mut self, event: SessionEvent) {
        self.queue.push_back(event);
    }

    /// Decode a host-measured snapshot and queue it.
    pub fn apply_snapshot_json(&mut self, json: &str) -> SessionResult<()> {
        let snapshot: DomSnapshot = serde_json::from_str(json)?;
        self.push_event(SessionEvent::Snapshot(snapshot));
        Ok(())
    }

    /// Advance the deterministic clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the deterministic clock to an absolute time.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Process all queued events, then fire the settle timer if it is due.
    pub fn step(&mut self) -> StepResult {
        let frames_before = self.outputs.frames;
        let mut events_processed: u32 = 0;
        while let Some(event) = self.queue.pop_front() {
            events_processed += 1;
            self.handle_event(event);
        }

        let mut settled = false;
        if let Some(handle) = self.scheduler.poll(self.clock.now()) {
            if self.machine.is_active() && handle.step_index() == self.machine.step_index() {
                self.settled = true;
                settled = true;
                self.measure();
            } else {
                tracing::trace!(step_index = handle.step_index(), "stale settle timer ignored");
            }
        }

        StepResult {
            events_processed,
            settled,
            frame_changed: self.outputs.frames != frames_before,
            active: self.machine.is_active(),
        }
    }

    /// Replay the tour from the first step, e.g. from a help menu. The offer
    /// flag is left as it was.
    pub fn restart(&mut self) {
        let offer = self.machine.offer_pending();
        let transition = self.machine.start();
        self.machine.set_offer(offer);
        self.apply(transition);
    }

    /// Current frame, if the tour is running.
    #[must_use]
    pub fn frame(&self) -> Option<&TourFrame> {
        self.frame.as_ref()
    }

    /// Current frame as JSON (`null` when the tour is not running).
    pub fn frame_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string(&self.frame)?)
    }

    /// Take the captured outputs, leaving an empty default.
    pub fn take_outputs(&mut self) -> SessionOutputs {
        std::mem::take(&mut self.outputs)
    }

    /// Read the captured outputs without consuming them.
    #[must_use]
    pub fn outputs(&self) -> &SessionOutputs {
        &self.outputs
    }

    #[must_use]
    pub fn machine(&self) -> &TourMachine {
        &self.machine
    }

    #[must_use]
    pub fn layout(&self) -> LayoutClass {
        self.classifier.current()
    }

    #[must_use]
    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    #[must_use]
    pub fn recorder(&self) -> &TourStatusRecorder {
        &self.recorder
    }

    /// Whether the signed-in user should be offered the tour.
    #[must_use]
    pub fn is_offered(&self) -> bool {
        self.machine.offer_pending()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Due time of the pending settle timer.
    #[must_use]
    pub fn settle_due_at(&self) -> Option<Duration> {
        self.scheduler.due_at()
    }

    /// Viewport used for positioning.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.classifier.viewport().unwrap_or(DEFAULT_VIEWPORT)
    }

    // --- Private helpers ---

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Resize(signals) => self.observe_viewport(&signals, "resize"),
            SessionEvent::OrientationChanged(signals) => {
                self.observe_viewport(&signals, "orientation")
            }
            SessionEvent::Tick(now) => self.clock.set(now),
            SessionEvent::Snapshot(snapshot) => {
                self.snapshot = snapshot;
                if self.settled {
                    self.measure();
                }
            }
            SessionEvent::Input(input) => self.handle_input(input),
            SessionEvent::SignIn { user_id } => self.sign_in(user_id),
            SessionEvent::SignOut => self.sign_out(),
        }
    }

    fn handle_input(&mut self, input: TourInput) {
        let transition = match input {
            TourInput::Start => self.machine.start(),
            TourInput::Next => self.machine.next(),
            TourInput::Previous => self.machine.previous(),
            TourInput::Skip => self.machine.skip(),
            TourInput::Dismiss if self.machine.is_active() => self.machine.skip(),
            TourInput::Dismiss => {
                self.decline_offer();
                return;
            }
        };
        self.apply(transition);
    }

    fn observe_viewport(&mut self, signals: &ViewportSignals, cause: &'static str) {
        match self.classifier.observe(signals) {
            Some(change) => {
                tracing::info!(
                    cause,
                    from = change.from.as_str(),
                    to = change.to.as_str(),
                    portrait = self.viewport().is_portrait(),
                    active = self.machine.is_active(),
                    "tour layout changed"
                );
                let transition = self.machine.set_layout(change.to);
                self.apply(transition);
            }
            None if self.settled => self.measure(),
            None => {}
        }
    }

    fn sign_in(&mut self, user_id: String) {
        if self.user_id.as_deref() != Some(user_id.as_str()) && self.user_id.is_some() {
            self.sign_out();
        }
        if let Some(outcome) = self.recorder.retry_pending(&user_id) {
            tracing::info!(user_id = %user_id, outcome = ?outcome, "retried deferred tour status");
        }
        let offer = match self.recorder.load(&user_id) {
            Ok(status) => should_offer_tour(status.as_ref()),
            Err(_) => false,
        };
        tracing::debug!(user_id = %user_id, offer, "user signed in");
        self.machine.set_offer(offer);
        self.user_id = Some(user_id);
    }

    fn sign_out(&mut self) {
        let transition = self.machine.abort();
        self.apply(transition);
        self.machine.set_offer(false);
        if let Some(user_id) = self.user_id.take() {
            tracing::debug!(user_id = %user_id, "user signed out");
        }
    }

    fn decline_offer(&mut self) {
        if !self.machine.offer_pending() {
            return;
        }
        self.machine.set_offer(false);
        self.persist(TerminalAction::Skipped);
    }

    fn apply(&mut self, transition: Transition) {
        for effect in transition {
            match effect {
                TourEffect::StepChanged { to, .. } => {
                    let delay = self
                        .config
                        .settle_delay(self.machine.layout().is_compact(), to);
                    self.scheduler.schedule(to, self.clock.now(), delay);
                    self.settled = false;
                    self.snapshot = DomSnapshot::default();
                    self.frame = self.unmeasured_frame();
                    self.outputs.frames += 1;
                }
                TourEffect::Nav(request) => {
                    if let Some(shell) = self.shell.as_deref_mut() {
                        request.dispatch(shell);
                    }
                    self.outputs.nav_requests.push(request);
                }
                TourEffect::Persist(action) => self.persist(action),
                TourEffect::Finished { action, .. } => self.outputs.finished.push(action),
            }
        }
        if !self.machine.is_active() {
            self.teardown_overlay();
        }
    }

    fn teardown_overlay(&mut self) {
        self.scheduler.cancel();
        self.settled = false;
        if self.frame.take().is_some() {
            self.outputs.frames += 1;
        }
    }

    fn persist(&mut self, action: TerminalAction) {
        let record = TerminalRecord::new(action, self.wall_clock.now_millis());
        let outcome = match self.user_id.as_deref() {
            Some(user_id) => self.recorder.record(user_id, record),
            None => {
                tracing::warn!(
                    action = action.as_str(),
                    "no signed-in user; tour status not persisted"
                );
                PersistOutcome::Dropped
            }
        };
        self.outputs.persisted.push((action, outcome));
    }

    fn unmeasured_frame(&self) -> Option<TourFrame> {
        let step = self.machine.current_step()?;
        let progress = self.machine.progress()?;
        Some(TourFrame {
            step_id: step.id.clone(),
            title: step.title.clone(),
            description: step.description.clone(),
            layout: self.machine.layout(),
            step_number: progress.ordinal(),
            step_count: progress.count,
            is_first: progress.is_first(),
            is_last: progress.is_last(),
            geometry: None,
            strategy: None,
        })
    }

    /// Resolve the active step against the latest snapshot and position it.
    fn measure(&mut self) {
        let Some(step) = self.machine.current_step() else {
            return;
        };
        let layout = self.machine.layout();
        let resolution = resolve(step, layout, &self.snapshot);
        let geometry = position(
            &PositionRequest {
                layout,
                step_index: self.machine.step_index(),
                placement: step.position,
                resolution: &resolution,
                viewport: self.viewport(),
                nav_region: self.snapshot.nav_region(),
            },
            &self.config,
        );
        let strategy = resolution.target().map(|target| target.strategy);

        let mut frame = match self.frame.take() {
            Some(frame) if frame.step_id == step.id => frame,
            _ => match self.unmeasured_frame() {
                Some(frame) => frame,
                None => return,
            },
        };
        let changed = frame.geometry != Some(geometry) || frame.strategy != strategy;
        frame.geometry = Some(geometry);
        frame.strategy = strategy;
        self.frame = Some(frame);
        if changed {
            self.outputs.frames += 1;
        }
    }
}

impl core::fmt::Debug for TourSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TourSession")
            .field("layout", &self.classifier.current())
            .field("state", &self.machine.state())
            .field("user_id", &self.user_id)
            .field("settled", &self.settled)
            .field("settle_step", &self.scheduler.pending().map(|h| h.step_index()))
            .field("now", &self.clock.now())
            .field("queued", &self.queue.len())
            .finish()
    }
}
