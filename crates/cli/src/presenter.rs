use sequencer::{Phase, Snapshot, Timeline};

const PROGRESS_BAR_CELLS: usize = 20;

/// Renders one status line for a playback snapshot.
pub fn render_status(snapshot: &Snapshot, timeline: &Timeline) -> String {
    let filled = filled_cells(snapshot.progress);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_CELLS - filled)
    );

    let scene = match (snapshot.phase, snapshot.current_segment_id.as_deref()) {
        (Phase::Running, Some(id)) => {
            let position = snapshot.current_index.map_or(0, |index| index + 1);
            format!("{id} ({position}/{})", timeline.len())
        }
        (Phase::Finished, _) => "finished".to_string(),
        _ => "idle".to_string(),
    };

    let mut line = format!(
        "[{}] {scene} [{bar}] {:>3}% {}",
        snapshot.start_label(),
        (snapshot.progress * 100.0).round() as u32,
        if snapshot.muted { "muted" } else { "sound on" },
    );
    if snapshot.playback_blocked {
        line.push_str(" (audio blocked by host)");
    }
    line
}

/// Banner printed once at startup.
pub fn render_banner(timeline: &Timeline) -> String {
    format!(
        "Program length: ~{}s in {} scenes. Commands: p = play/restart, m = mute, q = quit",
        timeline.total_duration_seconds().round() as u64,
        timeline.len()
    )
}

fn filled_cells(progress: f64) -> usize {
    let clamped = progress.clamp(0.0, 1.0);
    ((clamped * PROGRESS_BAR_CELLS as f64).floor() as usize).min(PROGRESS_BAR_CELLS)
}
