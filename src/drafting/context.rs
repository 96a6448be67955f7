//! Continuity context between consecutive beats.

use super::model::Beat;

/// Set each beat's `context` to what the previous beat hands forward.
///
/// A beat hands forward its selected version's text, or its summary when
/// nothing is selected. The first beat gets no context.
pub fn propagate_context(beats: &mut [Beat]) {
    let mut previous: Option<String> = None;
    for beat in beats.iter_mut() {
        beat.context = previous.take();
        beat.refresh_summary();
        previous = beat
            .selected_version()
            .map(|version| version.text.clone())
            .or_else(|| beat.summary.clone())
            .filter(|text| !text.is_empty());
    }
}
