use std::time::Duration;

use crate::scheduler::{RunId, Scheduler};
use crate::side_channel::{SideChannel, SideChannelFailure, SideChannelOperation};
use crate::time::{duration_to_ticks, ticks_to_duration};
use crate::timeline::{Segment, SegmentId, Timeline};
use tracing::{debug, info, warn};

/// Commands accepted by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Starts a new run from segment 0, discarding any run in flight.
    Start,
    ToggleMute,
    /// Host teardown: no further advances occur for the current run.
    Cancel,
    /// Issued by the scheduler when a segment expires.
    ///
    /// A `run_id` other than the live one is dropped silently.
    Advance { run_id: RunId },
}

/// Events emitted by the sequencer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged(Snapshot),
    SideChannelFailed(SideChannelFailure),
}

/// Playback phase of the sequencer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Read-only playback snapshot consumed by presenters.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub run_id: RunId,
    /// Cursor position; `None` while idle.
    pub current_index: Option<usize>,
    /// Active segment; `None` unless running.
    pub current_segment_id: Option<SegmentId>,
    /// Coarse progress in `[0, 1]` as of the start of the active segment.
    pub progress: f64,
    pub muted: bool,
    /// The last `begin_playback` was refused; hosts may show an unmute affordance.
    pub playback_blocked: bool,
}

impl Snapshot {
    /// Label for the start control.
    pub fn start_label(&self) -> &'static str {
        match self.phase {
            Phase::Running => "Restart",
            Phase::Idle | Phase::Finished => "Play",
        }
    }
}

/// Construction-time settings for a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerSettings {
    pub start_muted: bool,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self { start_muted: true }
    }
}

#[derive(Debug)]
struct PlaybackState {
    phase: Phase,
    current_index: usize,
    run_id: RunId,
    muted: bool,
    playback_blocked: bool,
    segment_started_at: Duration,
    pending_deadline: Option<Duration>,
}

/// Segment-granular timeline controller.
///
/// All mutation happens through `&mut self`; the host dispatches scheduler
/// expiries and user intents from a single execution context.
#[derive(Debug)]
pub struct Sequencer<S, T> {
    timeline: Timeline,
    side_channel: S,
    scheduler: T,
    state: PlaybackState,
}

impl<S, T> Sequencer<S, T>
where
    S: SideChannel,
    T: Scheduler,
{
    /// Creates an idle sequencer with default settings.
    ///
    /// # Example
    /// ```
    /// use sequencer::{ManualClock, Phase, Sequencer, SilentSideChannel, Timeline, TimerQueue};
    ///
    /// let timeline = Timeline::from_seconds([("a", 5.0), ("b", 10.0)]).expect("valid");
    /// let sequencer = Sequencer::new(
    ///     timeline,
    ///     SilentSideChannel,
    ///     TimerQueue::new(ManualClock::new()),
    /// );
    /// assert_eq!(sequencer.phase(), Phase::Idle);
    /// assert_eq!(sequencer.progress(), 0.0);
    /// ```
    pub fn new(timeline: Timeline, side_channel: S, scheduler: T) -> Self {
        Self::with_settings(
            timeline,
            side_channel,
            scheduler,
            SequencerSettings::default(),
        )
    }

    pub fn with_settings(
        timeline: Timeline,
        side_channel: S,
        scheduler: T,
        settings: SequencerSettings,
    ) -> Self {
        Self {
            timeline,
            side_channel,
            scheduler,
            state: PlaybackState {
                phase: Phase::Idle,
                current_index: 0,
                run_id: 0,
                muted: settings.start_muted,
                playback_blocked: false,
                segment_started_at: Duration::ZERO,
                pending_deadline: None,
            },
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::Start => self.start(),
            Command::ToggleMute => self.toggle_mute(),
            Command::Cancel => self.cancel(),
            Command::Advance { run_id } => self.advance(run_id),
        }
    }

    /// Begins a fresh run from segment 0.
    ///
    /// Calling this while running restarts; the previous run's pending
    /// advance is canceled and ignored if it still fires.
    pub fn start(&mut self) -> Vec<Event> {
        let previous_run_id = self.state.run_id;
        let restarted = self.state.phase == Phase::Running;
        self.scheduler.cancel(previous_run_id);

        self.state.run_id = previous_run_id + 1;
        self.state.phase = Phase::Running;
        self.state.current_index = 0;

        let now = self.scheduler.now();
        self.schedule_segment(now);

        info!(
            run_id = self.state.run_id,
            restarted,
            segment_count = self.timeline.len(),
            total_duration_tl = self.timeline.total_duration_tl(),
            "run started"
        );

        let mut failures = Vec::new();
        // The channel must hold the sequencer's mute state before playback begins.
        if let Err(error) = self.side_channel.set_muted(self.state.muted) {
            warn!(
                run_id = self.state.run_id,
                muted = self.state.muted,
                %error,
                "set muted refused"
            );
            failures.push(SideChannelFailure::from_error(
                SideChannelOperation::SetMuted,
                &error,
            ));
        }
        match self.side_channel.begin_playback() {
            Ok(()) => self.state.playback_blocked = false,
            Err(error) => {
                warn!(run_id = self.state.run_id, %error, "begin playback refused");
                self.state.playback_blocked = true;
                failures.push(SideChannelFailure::from_error(
                    SideChannelOperation::BeginPlayback,
                    &error,
                ));
            }
        }

        let mut events = vec![Event::StateChanged(self.snapshot())];
        events.extend(failures.into_iter().map(Event::SideChannelFailed));
        events
    }

    /// Invalidates the live run's pending advance without changing the phase.
    pub fn cancel(&mut self) -> Vec<Event> {
        if self.state.pending_deadline.take().is_none() {
            return Vec::new();
        }
        self.scheduler.cancel(self.state.run_id);

        info!(
            run_id = self.state.run_id,
            index = self.state.current_index,
            "run canceled"
        );
        vec![Event::StateChanged(self.snapshot())]
    }

    /// Moves the cursor past the active segment for `run_id`.
    ///
    /// Stale callbacks from superseded or canceled runs are no-ops.
    pub fn advance(&mut self, run_id: RunId) -> Vec<Event> {
        let live = run_id == self.state.run_id && self.state.phase == Phase::Running;
        let Some(expired_at) = self.state.pending_deadline.filter(|_| live) else {
            debug!(
                run_id,
                live_run_id = self.state.run_id,
                "stale advance dropped"
            );
            return Vec::new();
        };
        self.state.pending_deadline = None;
        self.scheduler.cancel(run_id);

        if self.state.current_index + 1 < self.timeline.len() {
            self.state.current_index += 1;
            self.schedule_segment(expired_at);
            debug!(
                run_id,
                index = self.state.current_index,
                segment_id = self.current_segment().id(),
                "advanced"
            );
        } else {
            self.state.phase = Phase::Finished;
            info!(run_id, "run finished");
        }

        vec![Event::StateChanged(self.snapshot())]
    }

    /// Flips the mute state and forwards it to the side channel.
    pub fn toggle_mute(&mut self) -> Vec<Event> {
        self.state.muted = !self.state.muted;
        debug!(muted = self.state.muted, "mute toggled");

        let mut events = vec![Event::StateChanged(self.snapshot())];
        if let Err(error) = self.side_channel.set_muted(self.state.muted) {
            warn!(muted = self.state.muted, %error, "set muted refused");
            events.push(Event::SideChannelFailed(SideChannelFailure::from_error(
                SideChannelOperation::SetMuted,
                &error,
            )));
        }
        events
    }

    /// Applies every scheduler expiry that is due now.
    ///
    /// A host that fell behind may find the follow-up advance already due;
    /// those are drained in the same call.
    pub fn fire_due(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            let due = self.scheduler.take_due();
            if due.is_empty() {
                return events;
            }
            for run_id in due {
                events.extend(self.advance(run_id));
            }
        }
    }

    /// Earliest pending advance on the scheduler's clock.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn run_id(&self) -> RunId {
        self.state.run_id
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    /// Progress in `[0, 1]` as of the start of the active segment.
    pub fn progress(&self) -> f64 {
        match self.state.phase {
            Phase::Idle => 0.0,
            Phase::Finished => 1.0,
            Phase::Running => self.fraction_of_total(self.current_offset_tl()),
        }
    }

    /// Progress interpolated within the active segment using the scheduler clock.
    ///
    /// Elapsed time is clamped to the segment duration, so the value never
    /// passes the next segment's start offset before the advance fires.
    pub fn interpolated_progress(&self) -> f64 {
        if self.state.phase != Phase::Running {
            return self.progress();
        }
        if self.state.pending_deadline.is_none() {
            return self.progress();
        }

        let elapsed = self
            .scheduler
            .now()
            .saturating_sub(self.state.segment_started_at);
        let within_tl = duration_to_ticks(elapsed).clamp(0, self.current_segment().duration_tl());
        self.fraction_of_total(self.current_offset_tl() + within_tl)
    }

    /// Id of the active segment while running.
    pub fn current_segment_id(&self) -> Option<&str> {
        match self.state.phase {
            Phase::Running => Some(self.current_segment().id()),
            Phase::Idle | Phase::Finished => None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase,
            run_id: self.state.run_id,
            current_index: match self.state.phase {
                Phase::Idle => None,
                Phase::Running | Phase::Finished => Some(self.state.current_index),
            },
            current_segment_id: self.current_segment_id().map(str::to_string),
            progress: self.progress(),
            muted: self.state.muted,
            playback_blocked: self.state.playback_blocked,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    fn schedule_segment(&mut self, started_at: Duration) {
        let deadline =
            started_at.saturating_add(ticks_to_duration(self.current_segment().duration_tl()));
        self.scheduler.schedule_at(deadline, self.state.run_id);
        self.state.segment_started_at = started_at;
        self.state.pending_deadline = Some(deadline);
    }

    fn current_segment(&self) -> &Segment {
        &self.timeline.segments()[self.state.current_index]
    }

    fn current_offset_tl(&self) -> i64 {
        // The cursor never passes the last segment, so the lookup cannot fail.
        self.timeline
            .cumulative_offset_tl(self.state.current_index)
            .unwrap_or_default()
    }

    fn fraction_of_total(&self, offset_tl: i64) -> f64 {
        let total_tl = self.timeline.total_duration_tl();
        (offset_tl as f64 / total_tl as f64).clamp(0.0, 1.0)
    }
}
