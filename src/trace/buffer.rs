//! Ring-buffer trace engine
//!
//! Points are kept oldest-first in a fixed array of slots addressed from
//! `head`. A slot's [`TracePoint`] is allocated the first time the slot is
//! written and overwritten in place afterwards. Renderer segments released by
//! eviction are pooled and handed to the next connected point, so a trace
//! that streams at capacity updates its primitives instead of recreating them.

use bevy::color::Color;
use bevy::log::{debug, warn};
use bevy::math::DVec3;
use chrono::{DateTime, Duration, Utc};

use super::TraceConfig;
use super::point::{TracePoint, age_factor};
use crate::error::ConfigError;
use crate::orbital::propagation::PositionSource;
use crate::visualization::{RenderAdapter, SegmentHandle};

/// What a single advance did to the window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceReport {
    pub added: usize,
    /// Added points written over an existing slot allocation
    pub reused: usize,
    pub evicted: usize,
    /// Samples skipped because propagation failed
    pub failed: usize,
}

impl AdvanceReport {
    /// True if the set of points changed
    pub fn changed(&self) -> bool {
        self.added > 0 || self.evicted > 0
    }

    fn merge(mut self, other: AdvanceReport) -> Self {
        self.added += other.added;
        self.reused += other.reused;
        self.evicted += other.evicted;
        self.failed += other.failed;
        self
    }
}

/// Bounded, time-ordered window of positions for one source.
#[derive(Debug)]
pub struct TraceBuffer<S> {
    label: String,
    source: S,
    config: TraceConfig,
    color: Color,
    slots: Vec<Option<TracePoint>>,
    head: usize,
    len: usize,
    spare: Vec<SegmentHandle>,
    reference_time: Option<DateTime<Utc>>,
}

impl<S: PositionSource> TraceBuffer<S> {
    pub fn new(
        label: impl Into<String>,
        source: S,
        config: TraceConfig,
        color: Color,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            label: label.into(),
            source,
            config,
            color,
            slots: vec![None; config.capacity],
            head: 0,
            len: 0,
            spare: Vec::new(),
            reference_time: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Latest time the buffer was advanced to
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    pub fn get(&self, i: usize) -> Option<&TracePoint> {
        if i >= self.len {
            return None;
        }
        self.slots[self.slot(i)].as_ref()
    }

    pub fn oldest(&self) -> Option<&TracePoint> {
        self.get(0)
    }

    pub fn newest(&self) -> Option<&TracePoint> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Live points, oldest first
    pub fn points(&self) -> impl Iterator<Item = &TracePoint> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    fn slot(&self, i: usize) -> usize {
        (self.head + i) % self.slots.len()
    }

    /// Extend the window up to `new_time`.
    ///
    /// An empty buffer gets a single unconnected point at `new_time`.
    /// Otherwise the period since the newest point is covered by samples
    /// spaced `max_interval_ms` apart and ending exactly at `new_time`. The
    /// period is clipped to `max_age_ms` and the sample count to `capacity`;
    /// the first sample is left unconnected when the period was clipped or
    /// its gap to the previous point exceeds `max_interval_ms`. Times at or
    /// before the newest point change no geometry. Every call then evicts
    /// over-age points and restyles the rest against `new_time`, or against
    /// the newest point if any sample of the batch failed, so a diverged
    /// source leaves the window frozen at its last good state.
    pub fn advance(
        &mut self,
        new_time: DateTime<Utc>,
        renderer: &mut dyn RenderAdapter,
    ) -> AdvanceReport {
        let mut report = AdvanceReport::default();

        match self.newest().map(TracePoint::timestamp) {
            None => {
                self.append(new_time, false, renderer, &mut report);
            }
            Some(preceding) if new_time > preceding => {
                let max_age = self.config.max_age_ms;
                let max_interval = self.config.max_interval_ms;
                let mut period = (new_time - preceding).num_milliseconds();
                let mut carry = true;
                if period > max_age {
                    debug!(
                        "{}: {} ms gap exceeds window, starting a new run",
                        self.label, period
                    );
                    period = max_age;
                    carry = false;
                }
                // period is positive here
                let count = ((period - 1) / max_interval + 1) as usize;
                let count = count.min(self.config.capacity);
                for i in (0..count).rev() {
                    let time = new_time - Duration::milliseconds(i as i64 * max_interval);
                    if self.append(time, carry, renderer, &mut report) {
                        carry = true;
                    }
                }
            }
            Some(_) => {}
        }

        let reference = match (report.failed, self.newest()) {
            (0, _) => Some(new_time),
            (_, Some(newest)) => Some(newest.timestamp.min(new_time)),
            (_, None) => self.reference_time,
        };
        self.reference_time = reference;
        if let Some(reference) = reference {
            report.evicted += self.evict_aged(reference);
        }
        self.release_spares(renderer);
        self.restyle(renderer);
        report
    }

    /// Like [`advance`](Self::advance), but an empty buffer is filled with a
    /// full `max_age_ms` window ending at `new_time`.
    pub fn backfill(
        &mut self,
        new_time: DateTime<Utc>,
        renderer: &mut dyn RenderAdapter,
    ) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        if self.is_empty() {
            let seed = new_time - Duration::milliseconds(self.config.max_age_ms);
            self.append(seed, false, renderer, &mut report);
        }
        report.merge(self.advance(new_time, renderer))
    }

    /// Move to an absolute time. Jumping back before the newest point drops
    /// the window and rebuilds it ending at `new_time`.
    pub fn seek(&mut self, new_time: DateTime<Utc>, renderer: &mut dyn RenderAdapter) -> AdvanceReport {
        let behind = self.newest().is_some_and(|p| p.timestamp > new_time);
        if behind {
            debug!("{}: rewinding to {}", self.label, new_time);
            let evicted = self.clear(renderer);
            let report = self.backfill(new_time, renderer);
            return AdvanceReport {
                evicted: report.evicted + evicted,
                ..report
            };
        }
        self.advance(new_time, renderer)
    }

    /// Swap the position source and recompute every live point in place.
    /// A point whose recomputation fails keeps its previous position.
    /// Returns the number of such failures.
    pub fn set_source(&mut self, source: S, renderer: &mut dyn RenderAdapter) -> usize {
        self.source = source;
        let mut failed = 0;
        for i in 0..self.len {
            let index = self.slot(i);
            let Some(point) = self.slots[index].as_mut() else {
                continue;
            };
            match self.source.position_at(point.timestamp) {
                Ok(position) => point.position = position,
                Err(err) => {
                    warn!("{}: keeping previous position: {}", self.label, err);
                    failed += 1;
                }
            }
        }

        let mut previous: Option<DVec3> = None;
        for i in 0..self.len {
            let index = self.slot(i);
            if let Some(point) = self.slots[index].as_ref() {
                if let (Some(handle), Some(from)) = (point.segment, previous) {
                    renderer.update_segment(handle, from, point.position);
                }
                previous = Some(point.position);
            }
        }
        failed
    }

    /// Drop every point and its segment. Returns the number of points removed.
    pub fn clear(&mut self, renderer: &mut dyn RenderAdapter) -> usize {
        let removed = self.len;
        for i in 0..self.len {
            let index = self.slot(i);
            if let Some(handle) = self.slots[index].as_mut().and_then(|p| p.segment.take()) {
                renderer.remove_segment(handle);
            }
        }
        self.release_spares(renderer);
        self.head = 0;
        self.len = 0;
        self.reference_time = None;
        removed
    }

    fn append(
        &mut self,
        time: DateTime<Utc>,
        carry: bool,
        renderer: &mut dyn RenderAdapter,
        report: &mut AdvanceReport,
    ) -> bool {
        let position = match self.source.position_at(time) {
            Ok(position) => position,
            Err(err) => {
                warn!("{}: skipping sample: {}", self.label, err);
                report.failed += 1;
                return false;
            }
        };

        if self.len == self.slots.len() {
            self.evict_front();
            report.evicted += 1;
        }

        let predecessor = self.newest().map(|p| (p.timestamp, p.position));
        let connected = carry
            && predecessor.is_some_and(|(t, _)| {
                (time - t).num_milliseconds() <= self.config.max_interval_ms
            });

        let index = self.slot(self.len);
        match self.slots[index].as_mut() {
            Some(point) => {
                point.timestamp = time;
                point.position = position;
                point.connected = connected;
                point.age_factor = 1.0;
                report.reused += 1;
            }
            None => self.slots[index] = Some(TracePoint::new(time, position, connected)),
        }
        self.len += 1;
        report.added += 1;

        if let (true, Some((_, from))) = (connected, predecessor) {
            let handle = self.acquire_segment(from, position, renderer);
            if let Some(point) = self.slots[index].as_mut() {
                point.segment = Some(handle);
            }
        }
        true
    }

    /// Remove the oldest point. Its successor becomes the new front and
    /// loses its connector.
    fn evict_front(&mut self) {
        if self.len == 0 {
            return;
        }
        if let Some(point) = self.slots[self.head].as_mut() {
            if let Some(handle) = point.segment.take() {
                self.spare.push(handle);
            }
            point.connected = false;
        }
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        if self.len > 0 {
            if let Some(point) = self.slots[self.head].as_mut() {
                point.connected = false;
                if let Some(handle) = point.segment.take() {
                    self.spare.push(handle);
                }
            }
        }
    }

    fn evict_aged(&mut self, now: DateTime<Utc>) -> usize {
        let max_age = self.config.max_age_ms;
        let mut evicted = 0;
        while self.oldest().is_some_and(|p| p.age_ms(now) > max_age) {
            self.evict_front();
            evicted += 1;
        }
        evicted
    }

    fn acquire_segment(
        &mut self,
        from: DVec3,
        to: DVec3,
        renderer: &mut dyn RenderAdapter,
    ) -> SegmentHandle {
        match self.spare.pop() {
            Some(handle) => {
                renderer.update_segment(handle, from, to);
                handle
            }
            None => renderer.create_segment(from, to),
        }
    }

    fn release_spares(&mut self, renderer: &mut dyn RenderAdapter) {
        for handle in self.spare.drain(..) {
            renderer.remove_segment(handle);
        }
    }

    fn restyle(&mut self, renderer: &mut dyn RenderAdapter) {
        let Some(reference) = self.reference_time else {
            return;
        };
        let max_age = self.config.max_age_ms;
        for i in 0..self.len {
            let index = self.slot(i);
            if let Some(point) = self.slots[index].as_mut() {
                point.age_factor = age_factor(point.age_ms(reference), max_age);
                if let Some(handle) = point.segment {
                    renderer.set_style(handle, point.age_factor, self.color);
                }
            }
        }
    }
}
