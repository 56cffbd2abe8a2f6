mod bridge;
mod input;
mod presenter;
mod side_channel;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use sequencer::{Command, Event, Phase, ProgramConfig, Sequencer, TimerQueue};
use tracing::{error, warn};

use crate::bridge::spawn_sequencer_bridge;
use crate::input::{Intent, parse_intent};
use crate::presenter::{render_banner, render_status};
use crate::side_channel::LoggingSideChannel;

/// Plays a timed scene program in the terminal.
#[derive(Debug, Parser)]
#[command(name = "scene-player", version)]
struct Args {
    /// JSON program file; the built-in program is used when omitted
    #[arg(long, value_name = "PATH")]
    program: Option<PathBuf>,

    /// Start with the side channel unmuted
    #[arg(long)]
    unmuted: bool,

    /// Start playing immediately
    #[arg(long)]
    autostart: bool,

    /// Exit once the program finishes instead of when input closes
    #[arg(long)]
    exit_on_finish: bool,

    /// Refuse audible playback, like a host autoplay policy
    #[arg(long)]
    refuse_playback: bool,
}

#[derive(Debug)]
enum HostMessage {
    Input(Intent),
    InputClosed,
    Sequencer(Event),
    SequencerStopped,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "startup failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_writer(io::stderr).try_init();
}

fn run(args: Args) -> sequencer::Result<()> {
    let mut config = match &args.program {
        Some(path) => ProgramConfig::load(path)?,
        None => ProgramConfig::default(),
    };
    if args.unmuted {
        config.start_muted = false;
    }
    let timeline = config.timeline()?;
    let settings = config.settings();
    println!("{}", render_banner(&timeline));

    let presenter_timeline = timeline.clone();
    let side_channel = LoggingSideChannel::new(args.refuse_playback);
    let sequencer = Sequencer::with_settings(
        timeline,
        side_channel,
        TimerQueue::with_system_clock(),
        settings,
    );
    let (command_tx, event_rx) = spawn_sequencer_bridge(sequencer);

    let (host_tx, host_rx) = mpsc::channel::<HostMessage>();
    spawn_input_reader(host_tx.clone());
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            if host_tx.send(HostMessage::Sequencer(event)).is_err() {
                return;
            }
        }
        let _ = host_tx.send(HostMessage::SequencerStopped);
    });

    if args.autostart && command_tx.send(Command::Start).is_err() {
        warn!("sequencer stopped before autostart");
    }

    // A sent start counts as running before its first snapshot arrives.
    let mut phase = if args.autostart {
        Phase::Running
    } else {
        Phase::Idle
    };
    while let Ok(message) = host_rx.recv() {
        match message {
            HostMessage::Input(intent) => {
                let Some(command) = intent.command() else {
                    break;
                };
                if command_tx.send(command).is_err() {
                    break;
                }
                if command == Command::Start {
                    phase = Phase::Running;
                }
            }
            HostMessage::InputClosed => {
                if exits_on_input_closed(args.exit_on_finish, phase) {
                    break;
                }
            }
            HostMessage::Sequencer(Event::StateChanged(snapshot)) => {
                phase = snapshot.phase;
                println!("{}", render_status(&snapshot, &presenter_timeline));
                if args.exit_on_finish && snapshot.phase == Phase::Finished {
                    break;
                }
            }
            HostMessage::Sequencer(Event::SideChannelFailed(failure)) => {
                warn!(
                    operation = ?failure.operation,
                    message = %failure.message,
                    "side channel failure"
                );
            }
            HostMessage::SequencerStopped => break,
        }
    }

    // Dropping the last sender cancels the run on the worker thread.
    drop(command_tx);
    Ok(())
}

/// With `--exit-on-finish` the host outlives its input only while a run can
/// still finish; an idle host with no input would never see one.
fn exits_on_input_closed(exit_on_finish: bool, phase: Phase) -> bool {
    !exit_on_finish || phase == Phase::Idle
}

fn spawn_input_reader(host_tx: mpsc::Sender<HostMessage>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_intent(&line) {
                Some(intent) => {
                    if host_tx.send(HostMessage::Input(intent)).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!(input = %line.trim(), "unknown command"),
            }
        }
        let _ = host_tx.send(HostMessage::InputClosed);
    });
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use sequencer::Phase;

    use super::{Args, exits_on_input_closed};

    #[test]
    fn args_default_to_builtin_muted_program() {
        let args = Args::try_parse_from(["scene-player"]).expect("parse args");

        assert!(args.program.is_none());
        assert!(!args.unmuted);
        assert!(!args.autostart);
    }

    #[test]
    fn args_accept_program_path_and_flags() {
        let args = Args::try_parse_from([
            "scene-player",
            "--program",
            "promo.json",
            "--unmuted",
            "--autostart",
            "--exit-on-finish",
            "--refuse-playback",
        ])
        .expect("parse args");

        assert_eq!(
            args.program.as_deref(),
            Some(std::path::Path::new("promo.json"))
        );
        assert!(args.unmuted && args.autostart && args.exit_on_finish && args.refuse_playback);
    }

    #[test]
    fn closed_input_ends_the_host_unless_a_run_can_still_finish() {
        assert!(exits_on_input_closed(false, Phase::Running));
        assert!(exits_on_input_closed(true, Phase::Idle));
        assert!(!exits_on_input_closed(true, Phase::Running));
        assert!(exits_on_input_closed(false, Phase::Idle));
    }
}
