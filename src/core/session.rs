//! Display session
//!
//! One [`DisplaySession`] owns the simulation clock, the orbit camera, every
//! satellite trace, the sun trace and the renderer. Clock ticks are broadcast
//! synchronously: traces advance first, then the sun (which moves the
//! light), then the camera and any subscribed time listeners.

use bevy::color::Color;
use bevy::log::{debug, info, warn};
use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::core::observer::{Observers, SubscriptionId};
use crate::core::orbit_camera::CameraOrbitController;
use crate::error::{LoadError, SessionError};
use crate::orbital::propagation::ElementSet;
use crate::orbital::solar::SolarEphemeris;
use crate::orbital::time::{SimulationClock, TimeChange, TimeListener};
use crate::tle::{ElementSetLoader, LoadTicket, TleSource, TleText, TraceId};
use crate::trace::{TraceBuffer, TraceConfig};
use crate::visualization::RenderAdapter;

const SUN_TRACE_COLOR: Color = Color::srgb(1.0, 0.85, 0.3);

/// A tracked satellite and the state of its element set.
#[derive(Debug)]
pub struct SatelliteTrace {
    id: TraceId,
    label: String,
    source: TleSource,
    color: Color,
    trace: Option<TraceBuffer<ElementSet>>,
    generation: u64,
    last_error: Option<LoadError>,
}

impl SatelliteTrace {
    pub fn id(&self) -> TraceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &TleSource {
        &self.source
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// None until the first element set has loaded.
    pub fn trace(&self) -> Option<&TraceBuffer<ElementSet>> {
        self.trace.as_ref()
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// Superseded by a newer request, or for an unknown trace
    Stale,
    /// The trace keeps its previous element set, if any
    Failed,
}

#[derive(Clone, Copy)]
enum TimeJump {
    Advance,
    Seek,
}

pub type FrameListener = dyn FnMut() + Send + Sync;
pub type SessionTimeListener = dyn TimeListener + Send + Sync;

pub struct DisplaySession<R> {
    renderer: R,
    clock: SimulationClock,
    camera: CameraOrbitController,
    trace_config: TraceConfig,
    satellites: Vec<SatelliteTrace>,
    sun: TraceBuffer<SolarEphemeris>,
    loader: Option<Box<dyn ElementSetLoader + Send + Sync>>,
    time_listeners: Observers<SessionTimeListener>,
    frame_listeners: Observers<FrameListener>,
    frame_pending: bool,
}

impl<R: RenderAdapter> DisplaySession<R> {
    /// Build a session at `start` (or the configured start time). The sun
    /// trace is filled immediately; the clock starts if configured to.
    pub fn new(renderer: R, config: &AppConfig, start: DateTime<Utc>) -> Result<Self, SessionError> {
        config.validate()?;
        let start = config.clock.start_time.unwrap_or(start);
        let mut session = Self {
            renderer,
            clock: SimulationClock::new(start, &config.clock)?,
            camera: CameraOrbitController::new(config.camera.clone())?,
            trace_config: config.trace,
            satellites: Vec::new(),
            sun: TraceBuffer::new("sun", SolarEphemeris, config.sun_trace, SUN_TRACE_COLOR)?,
            loader: None,
            time_listeners: Observers::default(),
            frame_listeners: Observers::default(),
            frame_pending: true,
        };

        session.sun.backfill(start, &mut session.renderer);
        session.place_light();
        session.camera.follow_time(start);
        let position = session.camera.position();
        session.renderer.set_camera_position(position);

        info!("[SESSION] created at {}", start.to_rfc3339());
        if config.clock.autostart {
            session.start_clock();
        }
        Ok(session)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn camera(&self) -> &CameraOrbitController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraOrbitController {
        &mut self.camera
    }

    pub fn sun(&self) -> &TraceBuffer<SolarEphemeris> {
        &self.sun
    }

    pub fn satellites(&self) -> &[SatelliteTrace] {
        &self.satellites
    }

    pub fn satellite(&self, id: TraceId) -> Option<&SatelliteTrace> {
        self.satellites.get(id.0)
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.clock.reference_time()
    }

    pub fn set_loader(&mut self, loader: Box<dyn ElementSetLoader + Send + Sync>) {
        self.loader = Some(loader);
    }

    pub fn subscribe_time(&mut self, listener: Box<SessionTimeListener>) -> SubscriptionId {
        self.time_listeners.subscribe(listener)
    }

    pub fn unsubscribe_time(&mut self, id: SubscriptionId) -> bool {
        self.time_listeners.unsubscribe(id)
    }

    pub fn subscribe_frame(&mut self, listener: Box<FrameListener>) -> SubscriptionId {
        self.frame_listeners.subscribe(listener)
    }

    pub fn unsubscribe_frame(&mut self, id: SubscriptionId) -> bool {
        self.frame_listeners.unsubscribe(id)
    }

    /// Track a new satellite and request its element set.
    pub fn add_satellite(
        &mut self,
        label: impl Into<String>,
        source: TleSource,
        color: Color,
    ) -> TraceId {
        let id = TraceId(self.satellites.len());
        let label = label.into();
        info!("[SESSION] tracking {} from {}", label, source);
        self.satellites.push(SatelliteTrace {
            id,
            label,
            source,
            color,
            trace: None,
            generation: 0,
            last_error: None,
        });
        if let Err(e) = self.request_load(id) {
            warn!("[LOAD] could not request element set: {}", e);
        }
        id
    }

    /// Issue a new load for `id`. Any load still in flight becomes stale.
    pub fn request_load(&mut self, id: TraceId) -> Result<LoadTicket, LoadError> {
        let sat = self
            .satellites
            .get_mut(id.0)
            .ok_or(LoadError::UnknownTrace(id.0))?;
        sat.generation += 1;
        let ticket = LoadTicket {
            trace: id,
            generation: sat.generation,
        };
        let requested = match self.loader.as_mut() {
            Some(loader) => loader.request(ticket, &sat.source),
            None => Err(LoadError::WorkerGone),
        };
        if let Err(e) = requested {
            sat.last_error = Some(e.clone());
            return Err(e);
        }
        debug!("[LOAD] {} requested (generation {})", sat.label, ticket.generation);
        Ok(ticket)
    }

    pub fn reload(&mut self, id: TraceId) -> Result<LoadTicket, LoadError> {
        if let Some(sat) = self.satellite(id) {
            info!("[LOAD] reloading {}", sat.label());
        }
        self.request_load(id)
    }

    pub fn reload_all(&mut self) -> Vec<Result<LoadTicket, LoadError>> {
        (0..self.satellites.len())
            .map(|i| self.reload(TraceId(i)))
            .collect()
    }

    /// Apply the result of a load. Only the latest ticket of a trace is
    /// honoured. A first element set fills a full window ending at the
    /// current time; a replacement recomputes the existing points in place.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<TleText, LoadError>,
    ) -> LoadOutcome {
        let now = self.clock.reference_time();
        let Some(sat) = self.satellites.get_mut(ticket.trace.0) else {
            warn!("[LOAD] response for unknown trace {}", ticket.trace.0);
            return LoadOutcome::Stale;
        };
        if ticket.generation != sat.generation {
            debug!(
                "[LOAD] {}: discarding stale response (generation {}, current {})",
                sat.label, ticket.generation, sat.generation
            );
            return LoadOutcome::Stale;
        }

        let parsed = result.and_then(|text| {
            ElementSet::from_lines(text.name, &text.line1, &text.line2).map_err(LoadError::from)
        });
        let set = match parsed {
            Ok(set) => set,
            Err(e) => {
                warn!("[LOAD] {}: {}", sat.label, e);
                sat.last_error = Some(e);
                return LoadOutcome::Failed;
            }
        };
        sat.last_error = None;
        info!(
            "[LOAD] {}: {} (NORAD {}), epoch {}",
            sat.label,
            set.name().unwrap_or("unnamed"),
            set.norad().map_or_else(|| "?".to_string(), |n| n.to_string()),
            set.epoch_utc().to_rfc3339()
        );

        match sat.trace.as_mut() {
            Some(trace) => {
                let kept = trace.set_source(set, &mut self.renderer);
                trace.advance(now, &mut self.renderer);
                info!(
                    "[LOAD] {}: element set replaced ({} points kept their previous position)",
                    sat.label, kept
                );
            }
            None => match TraceBuffer::new(sat.label.clone(), set, self.trace_config, sat.color) {
                Ok(mut trace) => {
                    let report = trace.backfill(now, &mut self.renderer);
                    info!(
                        "[LOAD] {}: element set loaded, {} points ({} failed)",
                        sat.label, report.added, report.failed
                    );
                    sat.trace = Some(trace);
                }
                Err(e) => {
                    warn!("[LOAD] {}: {}", sat.label, e);
                    return LoadOutcome::Failed;
                }
            },
        }
        self.frame_pending = true;
        LoadOutcome::Applied
    }

    pub fn start_clock(&mut self) -> bool {
        let started = self.clock.start();
        if started {
            info!("[CLOCK] running at {}x", self.clock.playback_rate());
        }
        started
    }

    pub fn stop_clock(&mut self) -> bool {
        let stopped = self.clock.stop();
        if stopped {
            info!("[CLOCK] stopped at {}", self.clock.reference_time().to_rfc3339());
        }
        stopped
    }

    pub fn toggle_clock(&mut self) -> bool {
        if self.clock.is_running() {
            self.stop_clock();
        } else {
            self.start_clock();
        }
        self.clock.is_running()
    }

    /// Feed elapsed wall-clock time and broadcast every due tick. Returns
    /// the number of broadcasts.
    pub fn tick(&mut self, wall_elapsed: std::time::Duration) -> usize {
        self.clock.accumulate(wall_elapsed);
        let mut broadcasts = 0;
        while let Some(time) = self.clock.poll() {
            self.broadcast(time, TimeJump::Advance);
            broadcasts += 1;
        }
        broadcasts
    }

    /// Real-time advance while the clock is stopped.
    pub fn advance_manual(&mut self, wall_now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let time = self.clock.advance_manual(wall_now)?;
        self.broadcast(time, TimeJump::Advance);
        Some(time)
    }

    /// Jump to an absolute simulated time.
    pub fn seek(&mut self, time: DateTime<Utc>) {
        let time = self.clock.seek(time);
        info!("[CLOCK] seek to {}", time.to_rfc3339());
        self.broadcast(time, TimeJump::Seek);
    }

    /// Mark the scene as needing a redraw on the next frame update.
    pub fn request_frame(&mut self) {
        self.frame_pending = true;
    }

    /// Per-frame work: apply camera input and issue a frame request if
    /// anything visible changed. Returns true if a frame was requested.
    pub fn update_frame(&mut self) -> bool {
        let moved = self.camera.update();
        if moved {
            let position = self.camera.position();
            self.renderer.set_camera_position(position);
        }
        if !(moved || self.frame_pending) {
            return false;
        }
        self.frame_pending = false;
        self.renderer.request_frame();
        self.frame_listeners.for_each(|listener| listener());
        true
    }

    fn place_light(&mut self) {
        if let Some(position) = self.sun.newest().map(|p| p.position()) {
            self.renderer.set_light_position(position);
        }
    }

    fn broadcast(&mut self, time: DateTime<Utc>, jump: TimeJump) {
        let Self {
            renderer,
            satellites,
            sun,
            camera,
            time_listeners,
            ..
        } = self;

        for sat in satellites.iter_mut() {
            let Some(trace) = sat.trace.as_mut() else {
                continue;
            };
            match jump {
                TimeJump::Advance => trace.advance(time, renderer),
                TimeJump::Seek => trace.seek(time, renderer),
            };
        }
        match jump {
            TimeJump::Advance => sun.advance(time, renderer),
            TimeJump::Seek => sun.seek(time, renderer),
        };
        if let Some(position) = sun.newest().map(|p| p.position()) {
            renderer.set_light_position(position);
        }

        let mut change = TimeChange::new(time, renderer);
        camera.on_time_change(&mut change);
        time_listeners.for_each(|listener| listener.on_time_change(&mut change));
        let stop = change.stop_requested();

        self.frame_pending = true;
        if stop && self.clock.stop() {
            info!("[CLOCK] stopped by time listener at {}", time.to_rfc3339());
        }
    }
}
