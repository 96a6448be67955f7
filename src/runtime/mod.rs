//! Segment runtime planning.
//!
//! Archetypes lay a segment out as named beats. Each beat's runtime is its
//! narration read at 2.5 words per second plus the length of any attached
//! clip; beats whose running total passes the budget (fifteen minutes by
//! default) are flagged. Continuity notes check the Setup to Clip handoff
//! and the operator's approval of it.

mod archetypes;
mod budget;
mod continuity;

pub use archetypes::{archetype, archetypes, Archetype, BeatSlot};
pub use budget::{
    runtime_summary, spoken_secs, BeatRuntime, ClipSelection, RuntimeSummary,
    FIFTEEN_MINUTES_SECS, WORDS_PER_SECOND,
};
pub use continuity::continuity_notes;
