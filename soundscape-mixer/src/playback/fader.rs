//! Fade scheduling for channel gain ramps
//!
//! Converts (start gain, target gain, duration) requests into gain values
//! sampled on the mixer's tick timeline.
//!
//! # Rules
//!
//! - At most one job per channel. Scheduling a job for a channel that
//!   already has one cancels the old job without firing its completion.
//! - A job's gain is computed from elapsed time and its curve, so tick jitter
//!   never distorts the ramp; the last sample of a job is exactly its target.
//! - Completion is only reported from [`FadeScheduler::advance`], never from
//!   [`FadeScheduler::schedule`], and exactly once per job.
//!
//! The scheduler never touches channel volume or enabled state. It only
//! reports gains for the mixer to push to the device.

use soundscape_common::events::FadeDirection;
use soundscape_common::FadeCurve;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// What the mixer does once a job reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeAction {
    /// Leave the source playing
    Hold,
    /// Pause the source and rewind it to the start
    PauseAndRewind,
}

/// One gain ramp for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct FadeJob {
    channel_id: String,
    from: f32,
    to: f32,
    started_at: Instant,
    duration: Duration,
    curve: FadeCurve,
    direction: FadeDirection,
    on_complete: FadeAction,
}

impl FadeJob {
    /// Ramp up after a channel is enabled; the source keeps playing afterwards
    pub fn fade_in(
        channel_id: &str,
        from: f32,
        to: f32,
        duration: Duration,
        curve: FadeCurve,
        now: Instant,
    ) -> Self {
        Self::new(channel_id, from, to, duration, curve, now, FadeDirection::In, FadeAction::Hold)
    }

    /// Ramp to silence after a channel is disabled, then pause and rewind
    pub fn fade_out(
        channel_id: &str,
        from: f32,
        duration: Duration,
        curve: FadeCurve,
        now: Instant,
    ) -> Self {
        Self::new(
            channel_id,
            from,
            0.0,
            duration,
            curve,
            now,
            FadeDirection::Out,
            FadeAction::PauseAndRewind,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        channel_id: &str,
        from: f32,
        to: f32,
        duration: Duration,
        curve: FadeCurve,
        now: Instant,
        direction: FadeDirection,
        on_complete: FadeAction,
    ) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            started_at: now,
            duration,
            curve,
            direction,
            on_complete,
        }
    }

    pub fn from(&self) -> f32 {
        self.from
    }

    pub fn to(&self) -> f32 {
        self.to
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    /// Ramp time left at `now`
    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    /// Normalized progress (0.0 to 1.0) at `now`
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Ramp gain at `now`; exactly `to` once the duration has elapsed
    pub fn gain_at(&self, now: Instant) -> f32 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            self.to
        } else {
            self.curve.interpolate(self.from, self.to, progress)
        }
    }

    fn is_complete(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// Completion report for a finished job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeCompletion {
    pub direction: FadeDirection,
    pub action: FadeAction,
}

/// One channel's gain for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct FadeStep {
    pub channel_id: String,
    pub gain: f32,
    /// Set on the final step of a job
    pub completed: Option<FadeCompletion>,
}

/// Per-channel fade jobs driven by the mixer tick
#[derive(Debug, Default)]
pub struct FadeScheduler {
    jobs: BTreeMap<String, FadeJob>,
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `job`, replacing any job in flight for the same channel
    ///
    /// Returns the preempted job. Its completion never fires.
    pub fn schedule(&mut self, job: FadeJob) -> Option<FadeJob> {
        self.jobs.insert(job.channel_id.clone(), job)
    }

    /// Drop the job for `channel_id` without completing it
    pub fn cancel(&mut self, channel_id: &str) -> Option<FadeJob> {
        self.jobs.remove(channel_id)
    }

    /// Job in flight for `channel_id`
    pub fn job(&self, channel_id: &str) -> Option<&FadeJob> {
        self.jobs.get(channel_id)
    }

    pub fn is_active(&self, channel_id: &str) -> bool {
        self.jobs.contains_key(channel_id)
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Drop every job
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Sample every job at `now`
    ///
    /// Finished jobs report their target gain with a completion and are
    /// removed. Steps come out in channel id order.
    pub fn advance(&mut self, now: Instant) -> Vec<FadeStep> {
        let steps: Vec<FadeStep> = self
            .jobs
            .values()
            .map(|job| FadeStep {
                channel_id: job.channel_id.clone(),
                gain: job.gain_at(now),
                completed: job.is_complete(now).then_some(FadeCompletion {
                    direction: job.direction,
                    action: job.on_complete,
                }),
            })
            .collect();

        self.jobs.retain(|_, job| !job.is_complete(now));
        steps
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(16);

    fn fade_in(now: Instant) -> FadeJob {
        FadeJob::fade_in(
            "rain",
            0.0,
            0.42,
            Duration::from_millis(1800),
            FadeCurve::Exponential,
            now,
        )
    }

    #[test]
    fn test_schedule_never_completes_synchronously() {
        let now = Instant::now();
        let mut scheduler = FadeScheduler::new();
        let job = FadeJob::fade_out("rain", 0.5, Duration::ZERO, FadeCurve::Logarithmic, now);

        assert_eq!(scheduler.schedule(job), None);
        assert!(scheduler.is_active("rain"), "zero-length job waits for a tick");

        let steps = scheduler.advance(now);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].gain, 0.0);
        assert_eq!(
            steps[0].completed,
            Some(FadeCompletion {
                direction: FadeDirection::Out,
                action: FadeAction::PauseAndRewind,
            })
        );
        assert!(!scheduler.is_active("rain"));
    }

    #[test]
    fn test_fade_in_reaches_target_exactly() {
        let start = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.schedule(fade_in(start));

        let mut now = start;
        let mut gains = Vec::new();
        let mut completions = 0;
        while scheduler.is_active("rain") {
            now += TICK;
            for step in scheduler.advance(now) {
                gains.push(step.gain);
                if step.completed.is_some() {
                    completions += 1;
                }
            }
        }

        assert_eq!(completions, 1, "completion fires exactly once");
        assert_eq!(*gains.last().unwrap(), 0.42);
        assert!(gains.windows(2).all(|w| w[0] <= w[1]), "fade-in is monotonic");
        assert!(gains.iter().all(|g| (0.0..=0.42).contains(g)), "no overshoot");
        assert!(gains.len() >= 54, "at least 30 updates per second");
    }

    #[test]
    fn test_fade_in_eases_in() {
        let start = Instant::now();
        let job = fade_in(start);
        let halfway = job.gain_at(start + Duration::from_millis(900));
        assert!(halfway < 0.21, "ease-in stays below the linear midpoint: {}", halfway);
    }

    #[test]
    fn test_fade_out_eases_out() {
        let start = Instant::now();
        let job = FadeJob::fade_out("wind", 0.6, Duration::from_secs(1), FadeCurve::Logarithmic, start);
        let halfway = job.gain_at(start + Duration::from_millis(500));
        assert!(halfway < 0.3, "ease-out drops faster than linear: {}", halfway);
        assert_eq!(job.gain_at(start + Duration::from_secs(2)), 0.0);
    }

    #[test]
    fn test_preemption_drops_old_completion() {
        let start = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.schedule(fade_in(start));

        let mid = start + Duration::from_millis(900);
        let current = scheduler.advance(mid)[0].gain;

        let replaced = scheduler.schedule(FadeJob::fade_out(
            "rain",
            current,
            Duration::from_secs(1),
            FadeCurve::Logarithmic,
            mid,
        ));
        assert_eq!(replaced.map(|j| j.direction()), Some(FadeDirection::In));
        assert_eq!(scheduler.active_count(), 1);

        // First sample of the new job continues from the old instantaneous gain
        let next = scheduler.advance(mid + TICK);
        assert!(next[0].gain <= current);
        assert!(current - next[0].gain < 0.05, "no audible jump");

        let done = scheduler.advance(mid + Duration::from_secs(1));
        assert_eq!(done[0].completed.map(|c| c.direction), Some(FadeDirection::Out));
    }

    #[test]
    fn test_jobs_are_independent_per_channel() {
        let start = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.schedule(FadeJob::fade_out("rain", 0.3, Duration::from_secs(1), FadeCurve::Logarithmic, start));
        scheduler.schedule(FadeJob::fade_out("wind", 0.9, Duration::from_secs(1), FadeCurve::Logarithmic, start));

        let steps = scheduler.advance(start + Duration::from_secs(1));
        let ids: Vec<&str> = steps.iter().map(|s| s.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["rain", "wind"]);
        assert!(steps.iter().all(|s| s.gain == 0.0 && s.completed.is_some()));
    }

    #[test]
    fn test_remaining_counts_down() {
        let start = Instant::now();
        let job = fade_in(start);
        assert_eq!(job.remaining(start), Duration::from_millis(1800));
        assert_eq!(
            job.remaining(start + Duration::from_millis(500)),
            Duration::from_millis(1300)
        );
        assert_eq!(job.remaining(start + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_cancel_is_silent() {
        let start = Instant::now();
        let mut scheduler = FadeScheduler::new();
        scheduler.schedule(fade_in(start));
        assert!(scheduler.cancel("rain").is_some());
        assert!(scheduler.advance(start + Duration::from_secs(5)).is_empty());
    }
}
