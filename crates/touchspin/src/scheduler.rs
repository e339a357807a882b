//! Press-and-hold timing: `Idle -> Armed -> Spinning -> Idle`.
//!
//! The scheduler owns no timer. The host asks for [`SpinScheduler::next_deadline`]
//! and calls back with the current instant; due ticks are handed out one at a
//! time so a stop between two ticks cancels the second synchronously.

use crate::settings::Settings;
use core_types::{Generation, SpinDirection};
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "touchspin.spin";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinPhase {
    Idle,
    /// Pressed, waiting out `stepintervaldelay`.
    Armed,
    Spinning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinSession {
    pub direction: SpinDirection,
    pub spincount: u32,
    pub started_at: Instant,
    /// Settings generation captured at start.
    pub generation: Generation,
    next_tick: Instant,
    interval: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub direction: SpinDirection,
    pub spincount: u32,
    pub generation: Generation,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A session in the same direction is already running.
    AlreadyActive,
    /// A new session started; an opposite-direction session it replaced is returned.
    Started { replaced: Option<SpinSession> },
}

#[derive(Debug, Default)]
pub struct SpinScheduler {
    session: Option<SpinSession>,
}

impl SpinScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, direction: SpinDirection, now: Instant, settings: &Settings) -> StartOutcome {
        if self.direction() == Some(direction) {
            return StartOutcome::AlreadyActive;
        }
        let replaced = self.session.take();
        self.session = Some(SpinSession {
            direction,
            spincount: 0,
            started_at: now,
            generation: settings.generation,
            next_tick: now + settings.step_interval_delay,
            interval: settings.step_interval,
        });
        log::trace!(
            target: LOG_TARGET,
            "armed {} spin, first tick in {:?}",
            direction.as_str(),
            settings.step_interval_delay
        );
        StartOutcome::Started { replaced }
    }

    /// Cancel the session. Nothing scheduled survives this call.
    pub fn stop(&mut self) -> Option<SpinSession> {
        let session = self.session.take();
        if let Some(s) = &session {
            log::trace!(target: LOG_TARGET, "stopped {} spin after {} ticks", s.direction.as_str(), s.spincount);
        }
        session
    }

    /// Take the next tick if it is due at `now`, scheduling the one after it.
    pub fn due_tick(&mut self, now: Instant) -> Option<Tick> {
        let session = self.session.as_mut()?;
        if now < session.next_tick {
            return None;
        }
        session.spincount = session.spincount.saturating_add(1);
        session.next_tick += session.interval;
        log::trace!(target: LOG_TARGET, "tick {} ({})", session.spincount, session.direction.as_str());
        Some(Tick {
            direction: session.direction,
            spincount: session.spincount,
            generation: session.generation,
        })
    }

    /// Drop missed ticks: the next one fires one interval after `now`.
    pub fn resync(&mut self, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            session.next_tick = now + session.interval;
        }
    }

    pub fn phase(&self) -> SpinPhase {
        match &self.session {
            None => SpinPhase::Idle,
            Some(s) if s.spincount == 0 => SpinPhase::Armed,
            Some(_) => SpinPhase::Spinning,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn direction(&self) -> Option<SpinDirection> {
        self.session.as_ref().map(|s| s.direction)
    }

    pub fn session(&self) -> Option<&SpinSession> {
        self.session.as_ref()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().map(|s| s.next_tick)
    }
}
