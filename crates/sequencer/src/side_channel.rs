use crate::error::SideChannelError;

/// Audio-like collaborator kept in sync with playback.
///
/// Both operations are best-effort: the sequencer reports failures but never
/// rolls its own state back because of them.
pub trait SideChannel {
    /// Rewinds the channel to its beginning and starts playing.
    fn begin_playback(&mut self) -> Result<(), SideChannelError>;

    /// Applies the desired mute state.
    fn set_muted(&mut self, muted: bool) -> Result<(), SideChannelError>;
}

/// Side channel operation that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideChannelOperation {
    BeginPlayback,
    SetMuted,
}

/// Non-fatal failure payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideChannelFailure {
    pub operation: SideChannelOperation,
    pub message: String,
}

impl SideChannelFailure {
    pub fn from_error(operation: SideChannelOperation, error: &SideChannelError) -> Self {
        Self {
            operation,
            message: error.message.clone(),
        }
    }
}

/// Side channel that accepts every instruction and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSideChannel;

impl SideChannel for SilentSideChannel {
    fn begin_playback(&mut self) -> Result<(), SideChannelError> {
        Ok(())
    }

    fn set_muted(&mut self, _muted: bool) -> Result<(), SideChannelError> {
        Ok(())
    }
}

impl<T> SideChannel for Box<T>
where
    T: SideChannel + ?Sized,
{
    fn begin_playback(&mut self) -> Result<(), SideChannelError> {
        (**self).begin_playback()
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), SideChannelError> {
        (**self).set_muted(muted)
    }
}
