use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use sequencer::{Command, Event, Scheduler, Sequencer, SideChannel};
use tracing::debug;

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Sender used by the host to dispatch commands to the sequencer thread.
pub type SequencerCommandSender = mpsc::SyncSender<Command>;

/// Receiver used by the host to read events emitted by the sequencer thread.
pub type SequencerEventReceiver = mpsc::Receiver<Event>;

/// Spawns the worker thread that owns `sequencer`.
///
/// The worker is the only context that mutates playback state. It waits for
/// commands until the next scheduled deadline and fires due advances on
/// timeout. Dropping every command sender, or the event receiver, tears the
/// sequencer down with a cancel.
pub fn spawn_sequencer_bridge<S, T>(
    mut sequencer: Sequencer<S, T>,
) -> (SequencerCommandSender, SequencerEventReceiver)
where
    S: SideChannel + Send + 'static,
    T: Scheduler + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(EVENT_CHANNEL_CAPACITY);

    thread::spawn(move || {
        loop {
            let received = match sequencer.next_deadline() {
                Some(deadline) => {
                    let wait = deadline.saturating_sub(sequencer.scheduler().now());
                    command_rx.recv_timeout(wait)
                }
                None => command_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            let events = match received {
                Ok(command) => dispatch_command(&mut sequencer, command),
                Err(RecvTimeoutError::Timeout) => sequencer.fire_due(),
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel closed; tearing down sequencer");
                    sequencer.cancel();
                    return;
                }
            };

            for event in events {
                if event_tx.send(event).is_err() {
                    debug!("event channel closed; tearing down sequencer");
                    sequencer.cancel();
                    return;
                }
            }
        }
    });

    (command_tx, event_rx)
}

/// Applies `command`, then any advance that came due while it was queued.
fn dispatch_command<S, T>(sequencer: &mut Sequencer<S, T>, command: Command) -> Vec<Event>
where
    S: SideChannel,
    T: Scheduler,
{
    let mut events = sequencer.handle_command(command);
    let now = sequencer.scheduler().now();
    if sequencer
        .next_deadline()
        .is_some_and(|deadline| deadline <= now)
    {
        events.extend(sequencer.fire_due());
    }
    events
}
