//! Segment archetypes: named, ordered beat layouts with suggested timings.

use serde::Serialize;

use crate::drafting::Beat;
use crate::error::{WorkspaceError, WorkspaceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatSlot {
    pub name: &'static str,
    pub suggested_duration_secs: u32,
    pub guidance: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub name: &'static str,
    pub description: &'static str,
    pub slots: &'static [BeatSlot],
}

impl Archetype {
    /// Sum of the suggested slot durations.
    pub fn suggested_total_secs(&self) -> u32 {
        self.slots.iter().map(|slot| slot.suggested_duration_secs).sum()
    }

    /// Fresh beats, one per slot. Ids are the lower-cased slot names.
    pub fn beats(&self) -> Vec<Beat> {
        self.slots
            .iter()
            .map(|slot| Beat::new(slot.name.to_lowercase(), slot.name, ""))
            .collect()
    }

    pub fn slot(&self, name: &str) -> Option<&BeatSlot> {
        self.slots
            .iter()
            .find(|slot| slot.name.eq_ignore_ascii_case(name))
    }
}

const HEROIC_INSIGHT: Archetype = Archetype {
    name: "Heroic Insight",
    description: "Opens with context, uses a compelling clip, and lands a takeaway.",
    slots: &[
        BeatSlot {
            name: "Setup",
            suggested_duration_secs: 120,
            guidance: "Set location, stakes, and who is on camera.",
        },
        BeatSlot {
            name: "Clip",
            suggested_duration_secs: 420,
            guidance: "The main footage or interview driving the story.",
        },
        BeatSlot {
            name: "Reflection",
            suggested_duration_secs: 180,
            guidance: "Narrated reflection or call to action to close the segment.",
        },
    ],
};

const CONFLICT_RESOLUTION: Archetype = Archetype {
    name: "Conflict & Resolution",
    description: "Contrasts a problem clip with a visual solution, with a bridge between.",
    slots: &[
        BeatSlot {
            name: "Setup",
            suggested_duration_secs: 90,
            guidance: "State the problem, tease the footage that proves it.",
        },
        BeatSlot {
            name: "Clip",
            suggested_duration_secs: 360,
            guidance: "Primary clip that visualizes the conflict.",
        },
        BeatSlot {
            name: "Bridge",
            suggested_duration_secs: 90,
            guidance: "Voiceover that links into the resolution visuals.",
        },
        BeatSlot {
            name: "Resolution",
            suggested_duration_secs: 240,
            guidance: "Show the fix; reinforce key lines with visuals and ambient audio.",
        },
    ],
};

const MICRO_DOC: Archetype = Archetype {
    name: "Micro Doc",
    description: "Lean docu-style piece with intro, primary beat, and outro tag.",
    slots: &[
        BeatSlot {
            name: "Setup",
            suggested_duration_secs: 75,
            guidance: "Identity, stakes, and why the viewer should care.",
        },
        BeatSlot {
            name: "Clip",
            suggested_duration_secs: 330,
            guidance: "Core vérité clip; include b-roll notes for texture.",
        },
        BeatSlot {
            name: "Tag",
            suggested_duration_secs: 90,
            guidance: "Sponsor tag or CTA; includes graphic/text overlay cues.",
        },
    ],
};

static ARCHETYPES: [Archetype; 3] = [HEROIC_INSIGHT, CONFLICT_RESOLUTION, MICRO_DOC];

/// Every built-in archetype, in display order.
pub fn archetypes() -> &'static [Archetype] {
    &ARCHETYPES
}

/// Look an archetype up by name, ignoring ASCII case.
pub fn archetype(name: &str) -> WorkspaceResult<&'static Archetype> {
    ARCHETYPES
        .iter()
        .find(|archetype| archetype.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| WorkspaceError::not_found("archetype", name))
}
