//! Pure rendering of controller state into a display model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sync::SyncFailureRecord;
use crate::cost::{format_usd, CostLedger, CostTotals, TokenEntry};
use crate::drafting::{generate_variants, Beat, Variant, Version};
use crate::gate::{DecisionSet, PhaseGate, PhaseId, PhaseReport};
use crate::queue::Task;
use crate::runtime::{continuity_notes, runtime_summary, ClipSelection, RuntimeSummary};
use crate::store::WorkspaceState;
use crate::toolkit::{ComedicAngle, Tool};

/// Borrowed inputs for [`render`].
pub struct RenderInput<'a> {
    pub state: &'a WorkspaceState,
    pub gate: &'a PhaseGate,
    pub decisions: &'a DecisionSet,
    pub tasks: &'a [Task],
    pub busy: bool,
    pub ledger: &'a CostLedger,
    pub sync_failures: &'a [SyncFailureRecord],
    /// Tool named in variants of beats that name none
    pub fallback_tool: Option<&'a str>,
    pub runtime_budget_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub beats: Vec<BeatView>,
    pub phase: PhaseView,
    pub decisions: DecisionSet,
    pub queue: QueueView,
    pub costs: CostView,
    pub sync_failures: Vec<SyncFailureRecord>,
    pub toolkit: ToolkitView,
    pub angles: Vec<ComedicAngle>,
    pub runtime: RuntimeSummary,
    pub continuity: Vec<String>,
    pub archetype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatView {
    pub id: String,
    pub title: String,
    pub baseline: String,
    pub current_text: String,
    pub summary: Option<String>,
    pub context: Option<String>,
    pub selected_version_id: Option<String>,
    pub donor_options: Vec<DonorView>,
    /// Newest first
    pub versions: Vec<VersionView>,
    pub persona: String,
    pub tool: Option<String>,
    pub clip: Option<ClipSelection>,
    pub transition_approved: bool,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonorView {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionView {
    pub id: String,
    pub text: String,
    pub source: String,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub index: usize,
    pub current: PhaseId,
    pub steps: Vec<PhaseReport>,
    pub can_go_back: bool,
    pub can_advance: bool,
    /// The "next" control: the gate holds and there is somewhere to go
    pub next_enabled: bool,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueView {
    pub busy: bool,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolkitView {
    pub selected: Option<String>,
    pub selection: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostView {
    pub entries: Vec<TokenEntry>,
    pub totals: CostTotals,
    pub formatted_total: String,
}

fn version_view(version: &Version, selected: Option<&str>) -> VersionView {
    VersionView {
        id: version.id.clone(),
        text: version.text.clone(),
        source: version.source_option.label().to_string(),
        instruction: version.instruction.clone(),
        created_at: version.created_at,
        is_selected: selected == Some(version.id.as_str()),
    }
}

fn beat_view(beat: &Beat, fallback_tool: Option<&str>) -> BeatView {
    let selected = beat.selected_version_id();
    BeatView {
        id: beat.id.clone(),
        title: beat.title.clone(),
        baseline: beat.baseline.clone(),
        current_text: beat.current_text().to_string(),
        summary: beat.summary.clone(),
        context: beat.context.clone(),
        selected_version_id: selected.map(str::to_string),
        donor_options: beat
            .donor_options
            .iter()
            .map(|donor| DonorView {
                id: donor.id.clone(),
                name: donor.name.clone(),
            })
            .collect(),
        // History is append-only, so reverse insertion order is newest first.
        versions: beat
            .versions()
            .iter()
            .rev()
            .map(|version| version_view(version, selected))
            .collect(),
        persona: beat.persona().to_string(),
        tool: beat.tool.clone(),
        clip: beat.clip.clone(),
        transition_approved: beat.transition_approved,
        variants: generate_variants(beat, fallback_tool),
    }
}

fn phase_view(gate: &PhaseGate, decisions: &DecisionSet) -> PhaseView {
    let can_advance = gate.can_advance(decisions);
    let is_complete = gate.is_complete();
    PhaseView {
        index: gate.index(),
        current: gate.current().id,
        steps: gate.progress(decisions),
        can_go_back: gate.index() > 0,
        can_advance,
        next_enabled: can_advance && !is_complete,
        is_complete,
    }
}

/// Build the display model. Reads only; never mutates.
pub fn render(input: &RenderInput<'_>) -> WorkspaceView {
    let totals = input.ledger.totals();
    let beats = &input.state.beats;
    WorkspaceView {
        beats: beats
            .iter()
            .map(|beat| beat_view(beat, input.fallback_tool))
            .collect(),
        phase: phase_view(input.gate, input.decisions),
        decisions: input.decisions.clone(),
        queue: QueueView {
            busy: input.busy,
            tasks: input.tasks.to_vec(),
        },
        costs: CostView {
            entries: input.ledger.entries().to_vec(),
            totals,
            formatted_total: format_usd(totals.total_cost),
        },
        sync_failures: input.sync_failures.to_vec(),
        toolkit: ToolkitView {
            selected: input.decisions.toolkit.clone(),
            selection: input.state.toolkit_selection.clone(),
        },
        angles: input.state.angles.clone(),
        runtime: runtime_summary(beats, input.runtime_budget_secs),
        continuity: continuity_notes(beats),
        archetype: input.state.archetype.clone(),
    }
}
