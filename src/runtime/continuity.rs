//! Transition checks between the Setup and Clip beats.

use crate::drafting::Beat;

fn find<'a>(beats: &'a [Beat], title: &str) -> Option<&'a Beat> {
    beats
        .iter()
        .find(|beat| beat.title.trim().eq_ignore_ascii_case(title))
}

/// Guidance for the Setup to Clip handoff.
///
/// Empty when either beat is missing, or when the handoff is ready and the
/// operator has approved it.
pub fn continuity_notes(beats: &[Beat]) -> Vec<String> {
    let (Some(setup), Some(clip)) = (find(beats, "Setup"), find(beats, "Clip")) else {
        return Vec::new();
    };
    let setup_text = setup.current_text().trim();
    let clip_text = clip.current_text().trim();
    let mut notes = Vec::new();

    if setup_text.is_empty() {
        notes.push("Setup text is empty; establish context before rolling clip.");
    }
    if clip_text.is_empty() && clip.clip.is_none() {
        notes.push("Clip beat has no footage or narration; confirm source.");
    }
    if let Some(selection) = &clip.clip {
        if !setup_text
            .to_lowercase()
            .contains(&selection.clip_id.to_lowercase())
        {
            notes.push(
                "Setup should reference the upcoming clip (id or subject) to prime the transition.",
            );
        }
    }
    let last = setup_text.split_whitespace().last();
    let first = clip_text.split_whitespace().next();
    if let (Some(last), Some(first)) = (last, first) {
        if last.to_lowercase() == first.to_lowercase() {
            notes.push("Setup and Clip share connective phrasing; transition should feel seamless.");
        }
    }
    if clip.clip.is_none() {
        notes.push("Clip segment has no selected footage; choose a source clip and in/out.");
    }
    if !clip.transition_approved {
        notes.push("Operator gate pending: approve the Clip transition when ready.");
    }

    notes.into_iter().map(str::to_string).collect()
}
