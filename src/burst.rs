//! Burst timer
//!
//! A burst is a short timed session on one item. The countdown is derived from
//! the wall clock on every tick (never by counting ticks), so a late or
//! skipped tick cannot drift the display.
//!
//! ```text
//! Idle --start--> Running --tick (0:00) / stop--> Finished
//!   \________________________\____________________\--complete / close--> (dropped)
//! ```

use crate::error::{Error, Result};
use crate::kinds::Kind;
use crate::model::{ItemValues, PracticeItem, PracticeLog, MODE_BURST};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(secs));
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BurstPhase {
    Idle,
    Running,
    Finished,
}

/// Feedback requested when the countdown runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Tone,
    Haptic,
}

#[derive(Debug, Clone)]
pub struct Burst {
    item: PracticeItem,
    duration_secs: u32,
    started_at: Option<DateTime<Utc>>,
    /// Countdown position, frozen once the burst finishes
    elapsed_secs: u32,
    phase: BurstPhase,
    runtime_bpm: Option<u32>,
}

impl Burst {
    /// Select an item. Riffs start with their target tempo as runtime BPM.
    pub fn open(item: PracticeItem, duration_secs: u32) -> Self {
        let runtime_bpm = match &item.values {
            ItemValues::Riff(v) => Some(v.target_bpm),
            _ => None,
        };
        Self {
            item,
            duration_secs,
            started_at: None,
            elapsed_secs: 0,
            phase: BurstPhase::Idle,
            runtime_bpm,
        }
    }

    pub fn item(&self) -> &PracticeItem {
        &self.item
    }

    pub fn phase(&self) -> BurstPhase {
        self.phase
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn runtime_bpm(&self) -> Option<u32> {
        self.runtime_bpm
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != BurstPhase::Idle {
            return Err(Error::Validation("Burst already started".to_string()));
        }
        log::debug!("Burst started on {}", self.item.id);
        self.started_at = Some(now);
        self.phase = BurstPhase::Running;
        Ok(())
    }

    /// Recompute the countdown. Returns the cues to play when this tick
    /// finished the burst.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Cue> {
        if self.phase != BurstPhase::Running {
            return Vec::new();
        }
        if self.live_elapsed(now) >= self.duration_secs {
            self.elapsed_secs = self.duration_secs;
            self.phase = BurstPhase::Finished;
            log::debug!("Burst on {} ran out", self.item.id);
            return vec![Cue::Tone, Cue::Haptic];
        }
        Vec::new()
    }

    /// Finish early, freezing the countdown
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != BurstPhase::Running {
            return Err(Error::Validation("Burst is not running".to_string()));
        }
        self.elapsed_secs = self.live_elapsed(now).min(self.duration_secs);
        self.phase = BurstPhase::Finished;
        Ok(())
    }

    fn live_elapsed(&self, now: DateTime<Utc>) -> u32 {
        match self.started_at {
            Some(start) => u32::try_from((now - start).num_seconds().max(0)).unwrap_or(u32::MAX),
            None => 0,
        }
    }

    /// Whole seconds practiced so far
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        match self.phase {
            BurstPhase::Idle => 0,
            BurstPhase::Running => self.live_elapsed(now).min(self.duration_secs),
            BurstPhase::Finished => self.elapsed_secs,
        }
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        self.duration_secs.saturating_sub(self.elapsed_secs(now))
    }

    /// Countdown as `m:ss`
    pub fn display(&self, now: DateTime<Utc>) -> String {
        format_countdown(self.remaining_secs(now))
    }

    /// Set the tempo the riff is being played at. Only riffs carry one.
    pub fn set_runtime_bpm(&mut self, bpm: u32) -> Result<()> {
        if self.item.kind() != Kind::Riff {
            return Err(Error::Validation(format!(
                "{} items have no runtime BPM",
                self.item.kind_label()
            )));
        }
        let (min, max) = bpm_range();
        if bpm < min || bpm > max {
            return Err(Error::Validation(format!("BPM must be between {} and {}", min, max)));
        }
        self.runtime_bpm = Some(bpm);
        Ok(())
    }

    /// Nudge the runtime BPM, clamped to the riff tempo range
    pub fn adjust_runtime_bpm(&mut self, delta: i32) {
        if let Some(bpm) = self.runtime_bpm {
            let (min, max) = bpm_range();
            let next = (i64::from(bpm) + i64::from(delta)).clamp(i64::from(min), i64::from(max));
            self.runtime_bpm = u32::try_from(next).ok();
        }
    }

    /// Minutes to log: time since start rounded to the nearest minute (at
    /// least 1), or `fallback` when the burst was never started. Counts up to
    /// `now` even after the countdown froze.
    pub fn practiced_minutes(&self, now: DateTime<Utc>, fallback: u32) -> u32 {
        if self.started_at.is_none() {
            return fallback;
        }
        (self.live_elapsed(now).saturating_add(30) / 60).max(1)
    }

    /// Consume the burst into the log it records
    pub fn into_log(self, now: DateTime<Utc>, fallback_minutes: u32) -> PracticeLog {
        let minutes = self.practiced_minutes(now, fallback_minutes);
        let mut log = PracticeLog::new(&self.item, now, MODE_BURST, minutes);
        if self.item.kind() == Kind::Riff {
            log.values.bpm = self.runtime_bpm;
        }
        log
    }
}

fn bpm_range() -> (u32, u32) {
    let field = Kind::Riff.definition().field("targetBpm");
    (
        field.and_then(|f| f.min).unwrap_or(40),
        field.and_then(|f| f.max).unwrap_or(300),
    )
}

pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
