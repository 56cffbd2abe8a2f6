use sequencer::{SideChannel, SideChannelError};
use tracing::info;

/// Side channel that logs the audio instructions it receives.
///
/// With `refuse_playback` set, `begin_playback` fails while muted is off,
/// the way hosts refuse audible autoplay. The channel starts muted until the
/// sequencer applies its own mute state.
#[derive(Debug, Clone)]
pub struct LoggingSideChannel {
    muted: bool,
    refuse_playback: bool,
}

impl LoggingSideChannel {
    pub fn new(refuse_playback: bool) -> Self {
        Self {
            muted: true,
            refuse_playback,
        }
    }
}

impl SideChannel for LoggingSideChannel {
    fn begin_playback(&mut self) -> Result<(), SideChannelError> {
        if self.refuse_playback && !self.muted {
            return Err(SideChannelError::new("audible autoplay refused by host"));
        }
        info!(muted = self.muted, "side channel rewound and playing");
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), SideChannelError> {
        self.muted = muted;
        info!(muted, "side channel mute updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sequencer::{
        Event, ManualClock, Sequencer, SequencerSettings, SideChannel, SideChannelOperation,
        Timeline, TimerQueue,
    };

    use super::LoggingSideChannel;

    #[test]
    fn refusing_channel_allows_muted_playback_only() {
        let mut channel = LoggingSideChannel::new(true);
        channel.begin_playback().expect("muted playback is allowed");

        channel.set_muted(false).expect("mute change");
        assert!(channel.begin_playback().is_err());
    }

    #[test]
    fn permissive_channel_plays_unmuted() {
        let mut channel = LoggingSideChannel::new(false);
        channel.set_muted(false).expect("mute change");

        assert!(channel.begin_playback().is_ok());
    }

    #[test]
    fn unmuted_sequencer_start_is_refused_by_refusing_channel() {
        let timeline = Timeline::from_seconds([("a", 5.0)]).expect("valid timeline");
        let mut sequencer = Sequencer::with_settings(
            timeline,
            LoggingSideChannel::new(true),
            TimerQueue::new(ManualClock::new()),
            SequencerSettings { start_muted: false },
        );

        let events = sequencer.start();

        assert!(matches!(
            events.last(),
            Some(Event::SideChannelFailed(failure))
                if failure.operation == SideChannelOperation::BeginPlayback
        ));
        assert!(sequencer.snapshot().playback_blocked);
    }
}
