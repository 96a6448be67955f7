//! The single owner of workspace state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sync::{StateWriter, SyncFailureLog, SyncFailureRecord};
use super::view::{render, RenderInput, WorkspaceView};
use crate::config::WorkspaceConfig;
use crate::cost::{CostLedger, TokenCounter, TokenEntry, TokenEstimator, TokenPricing};
use crate::drafting::{
    build_prompt, generate_draft, generate_variants, override_with_operator_text,
    propagate_context, DraftGenerator, JobRequest, PlaceholderGenerator, Variant, Version,
};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::gate::{DecisionSet, PhaseGate};
use crate::queue::{SharedTaskQueue, Task};
use crate::runtime::{
    archetype, continuity_notes, runtime_summary, ClipSelection, RuntimeSummary,
    FIFTEEN_MINUTES_SECS,
};
use crate::store::{StateStore, WorkspaceState};
use crate::toolkit::{
    generate_angles, select_tools, AngleRequest, ComedicAngle, SelectionRequest, Tool, Toolkit,
};

/// Snapshot of the task queue taken after applying due transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub tasks: Vec<Task>,
    pub busy: bool,
}

/// Wires operator actions to state mutations.
///
/// Every mutation happens synchronously on `&mut self`. Mutations of the
/// persisted document are followed by a whole-document save, handed to a
/// background [`StateWriter`]; a failed save is recorded as a sync failure
/// and the in-memory change stands.
pub struct WorkspaceController {
    state: WorkspaceState,
    decisions: DecisionSet,
    gate: PhaseGate,
    queue: SharedTaskQueue,
    ledger: CostLedger,
    counter: Box<dyn TokenCounter>,
    toolkit: Arc<Toolkit>,
    runtime_budget_secs: f64,
    store: Arc<dyn StateStore>,
    writer: StateWriter,
    generator: Arc<dyn DraftGenerator>,
    sync_failures: SyncFailureLog,
}

impl WorkspaceController {
    /// Create a controller with an empty state, the placeholder generator and
    /// default pricing. Call [`reload`](Self::reload) to read the store.
    ///
    /// Must be called inside a tokio runtime; the state writer is spawned
    /// onto it.
    pub fn new(store: Arc<dyn StateStore>, queue: SharedTaskQueue) -> Self {
        let sync_failures = SyncFailureLog::default();
        let writer = StateWriter::spawn(Arc::clone(&store), sync_failures.clone());
        Self {
            state: WorkspaceState::default(),
            decisions: DecisionSet::new(),
            gate: PhaseGate::default(),
            queue,
            ledger: CostLedger::new(TokenPricing::default()),
            counter: Box::new(TokenEstimator::default()),
            toolkit: Arc::new(Toolkit::load()),
            runtime_budget_secs: FIFTEEN_MINUTES_SECS,
            store,
            writer,
            generator: Arc::new(PlaceholderGenerator),
            sync_failures,
        }
    }

    /// Create a controller configured from `config` and load stored state.
    pub fn open(
        config: &WorkspaceConfig,
        store: Arc<dyn StateStore>,
        queue: SharedTaskQueue,
    ) -> WorkspaceResult<Self> {
        let mut controller = Self::new(store, queue)
            .with_pricing(config.pricing.clone())
            .with_counter(Box::new(TokenEstimator::new(config.estimation)));
        controller.runtime_budget_secs = config.runtime_budget_secs;
        controller.reload()?;
        Ok(controller)
    }

    pub fn with_generator(mut self, generator: Arc<dyn DraftGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Replace pricing. Starts a fresh ledger.
    pub fn with_pricing(mut self, pricing: TokenPricing) -> Self {
        self.ledger = CostLedger::new(pricing);
        self
    }

    /// Replace in-memory state with whatever the store holds.
    pub fn reload(&mut self) -> WorkspaceResult<()> {
        let mut state = self.store.load()?;
        propagate_context(&mut state.beats);
        tracing::info!(beats = state.beats.len(), "Workspace state loaded");
        self.state = state;
        Ok(())
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn decisions(&self) -> &DecisionSet {
        &self.decisions
    }

    pub fn gate(&self) -> &PhaseGate {
        &self.gate
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Recent sync failures, oldest first.
    pub fn sync_failures(&self) -> Vec<SyncFailureRecord> {
        self.sync_failures.snapshot()
    }

    /// Wait until every save queued so far has reached the store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Queue a whole-document save. Failures are recorded, not returned.
    fn persist(&self) {
        if !self.writer.save(self.state.clone()) {
            self.sync_failures
                .record("persist failed: state writer stopped");
        }
    }

    fn after_beats_changed(&mut self) {
        propagate_context(&mut self.state.beats);
        self.persist();
    }

    // Beats and versions

    /// Replace all beats with those built from a job submission.
    pub fn submit_job(&mut self, job: JobRequest) -> WorkspaceResult<&WorkspaceState> {
        let beats = job.into_beats()?;
        tracing::info!(beats = beats.len(), "Job submitted");
        self.state.beats = beats;
        self.after_beats_changed();
        Ok(&self.state)
    }

    /// Replace the state with a validated document.
    ///
    /// A rejected document leaves the current state untouched.
    pub fn replace_state(&mut self, document: &Value) -> WorkspaceResult<&WorkspaceState> {
        let state = WorkspaceState::from_document(document)?;
        self.state = state;
        self.persist();
        Ok(&self.state)
    }

    /// The prompt a draft would be generated from, without generating it.
    pub fn preview_prompt(
        &self,
        beat_id: &str,
        donor_id: Option<&str>,
        instruction: &str,
    ) -> WorkspaceResult<String> {
        let beat = self
            .state
            .beat(beat_id)
            .ok_or_else(|| WorkspaceError::not_found("beat", beat_id))?;
        let donor = match donor_id {
            Some(id) => Some(
                beat.donor(id)
                    .ok_or_else(|| WorkspaceError::not_found("donor option", id))?,
            ),
            None => None,
        };
        Ok(build_prompt(beat, donor, instruction))
    }

    /// Generate a new draft for a beat, then append and select it.
    pub async fn draft(
        &mut self,
        beat_id: &str,
        donor_id: Option<&str>,
        instruction: &str,
    ) -> WorkspaceResult<Version> {
        let result = {
            let beat = self
                .state
                .beat(beat_id)
                .ok_or_else(|| WorkspaceError::not_found("beat", beat_id))?;
            let donor = match donor_id {
                Some(id) => Some(
                    beat.donor(id)
                        .ok_or_else(|| WorkspaceError::not_found("donor option", id))?,
                ),
                None => None,
            };
            generate_draft(self.generator.as_ref(), beat, donor, instruction).await
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.sync_failures.record(err.to_string());
                return Err(err);
            }
        };

        if let Err(err) = self.ledger.record_exchange(
            outcome.usage,
            self.counter.as_ref(),
            &outcome.version.prompt,
            &outcome.version.text,
        ) {
            tracing::warn!(beat_id, error = %err, "Token usage not recorded");
        }
        let version = self
            .state
            .beat_mut(beat_id)?
            .commit_version(outcome.version)
            .clone();
        tracing::info!(beat_id, version_id = %version.id, source = %version.source_option, "Draft created");
        self.after_beats_changed();
        Ok(version)
    }

    /// Select (or roll back to) a version of a beat.
    pub fn select_version(&mut self, beat_id: &str, version_id: &str) -> WorkspaceResult<Version> {
        let version = self
            .state
            .beat_mut(beat_id)?
            .select_version(version_id)?
            .clone();
        tracing::info!(beat_id, version_id, "Version selected");
        self.after_beats_changed();
        Ok(version)
    }

    /// Reject all generated versions in favour of operator-written text.
    pub fn override_beat(&mut self, beat_id: &str, operator_text: &str) -> WorkspaceResult<Version> {
        let beat = self.state.beat_mut(beat_id)?;
        let version = override_with_operator_text(beat, operator_text)?.clone();
        tracing::info!(beat_id, version_id = %version.id, "Operator override recorded");
        self.after_beats_changed();
        Ok(version)
    }

    // Variants

    /// Name of the selected toolkit tool, used by beats that name no tool.
    fn fallback_tool(&self) -> Option<&str> {
        self.decisions
            .toolkit
            .as_deref()
            .and_then(|id| self.toolkit.tool(id))
            .map(|tool| tool.name.as_str())
    }

    pub fn variants(&self, beat_id: &str) -> WorkspaceResult<Vec<Variant>> {
        let beat = self
            .state
            .beat(beat_id)
            .ok_or_else(|| WorkspaceError::not_found("beat", beat_id))?;
        Ok(generate_variants(beat, self.fallback_tool()))
    }

    /// Commit one of a beat's variants as a new selected version and approve
    /// it for the variant phase.
    pub fn adopt_variant(&mut self, beat_id: &str, variant_id: &str) -> WorkspaceResult<Version> {
        let variant = self
            .variants(beat_id)?
            .into_iter()
            .find(|variant| variant.id == variant_id)
            .ok_or_else(|| WorkspaceError::not_found("variant", variant_id))?;
        let version = self
            .state
            .beat_mut(beat_id)?
            .commit_version(variant.into_version())
            .clone();
        self.decisions
            .approve_variant(format!("{}:{}", beat_id, variant_id));
        tracing::info!(beat_id, variant_id, version_id = %version.id, "Variant adopted");
        self.after_beats_changed();
        Ok(version)
    }

    // Toolkit and angles

    /// Rank catalog tools for `request`, with the selected filters added to
    /// its tags, and keep the result as the working selection.
    pub fn select_tools(&mut self, mut request: SelectionRequest) -> Vec<Tool> {
        for filter in &self.decisions.filters {
            if !request.tags.iter().any(|tag| tag.eq_ignore_ascii_case(filter)) {
                request.tags.push(filter.clone());
            }
        }
        let tools = select_tools(&self.toolkit, &request);
        tracing::info!(tools = tools.len(), contrarian = request.contrarian, "Toolkit selection updated");
        self.state.toolkit_selection = tools.clone();
        self.persist();
        tools
    }

    /// Generate angles from the working tool selection, selecting tools by
    /// the current filters first if there is none yet. Replaces any earlier
    /// angles.
    pub fn generate_angles(&mut self, request: AngleRequest) -> WorkspaceResult<Vec<ComedicAngle>> {
        if request.count == 0 {
            return Err(WorkspaceError::Validation(
                "angle count must be at least 1".to_string(),
            ));
        }
        if self.state.toolkit_selection.is_empty() {
            self.select_tools(SelectionRequest::default());
        }
        self.enqueue("Generate angles")?;

        let angles = generate_angles(&request, &self.state.toolkit_selection);
        tracing::info!(angles = angles.len(), role = %request.role, "Angles generated");
        self.state.angles = angles.clone();
        self.persist();
        Ok(angles)
    }

    pub fn angles(&self) -> &[ComedicAngle] {
        &self.state.angles
    }

    /// Mark an angle as chosen and approve it for the variant phase.
    pub fn choose_angle(&mut self, angle_id: &str) -> WorkspaceResult<ComedicAngle> {
        let angle = self.state.angle_mut(angle_id)?;
        angle.choose();
        let angle = angle.clone();
        self.decisions.approve_variant(angle.id.clone());
        tracing::info!(angle_id, "Angle chosen");
        self.persist();
        Ok(angle)
    }

    /// Replace an angle's pitch with operator text and approve it.
    pub fn override_angle(&mut self, angle_id: &str, text: &str) -> WorkspaceResult<ComedicAngle> {
        let angle = self.state.angle_mut(angle_id)?;
        angle.override_with(text)?;
        let angle = angle.clone();
        self.decisions.approve_variant(angle.id.clone());
        tracing::info!(angle_id, "Angle overridden");
        self.persist();
        Ok(angle)
    }

    // Decisions and phases

    /// Toggle a catalog tag as a filter. Returns whether it is now selected.
    pub fn toggle_filter(&mut self, filter_id: &str) -> WorkspaceResult<bool> {
        let filter_id = filter_id.trim();
        if filter_id.is_empty() {
            return Err(WorkspaceError::Validation(
                "filter id must not be empty".to_string(),
            ));
        }
        if !self.toolkit.has_tag(filter_id) {
            return Err(WorkspaceError::not_found("filter", filter_id));
        }
        Ok(self.decisions.toggle_filter(filter_id))
    }

    /// Select a catalog tool by id or name. A blank id clears the selection.
    pub fn select_toolkit(&mut self, tool_id: &str) -> WorkspaceResult<Option<Tool>> {
        let tool_id = tool_id.trim();
        if tool_id.is_empty() {
            self.decisions.select_toolkit("");
            return Ok(None);
        }
        let tool = self
            .toolkit
            .tool(tool_id)
            .cloned()
            .ok_or_else(|| WorkspaceError::not_found("tool", tool_id))?;
        self.decisions.select_toolkit(tool.id.clone());
        Ok(Some(tool))
    }

    pub fn approve_variant(&mut self, variant_id: &str) {
        self.decisions.approve_variant(variant_id);
    }

    pub fn confirm_rollback(&mut self, confirmed: bool) {
        self.decisions.confirm_rollback(confirmed);
    }

    pub fn can_advance(&self) -> bool {
        self.gate.can_advance(&self.decisions)
    }

    pub fn move_phase(&mut self, delta: i64) -> WorkspaceResult<usize> {
        let index = self.gate.move_by(delta, &self.decisions)?;
        if self.gate.is_complete() {
            tracing::info!(phase = %self.gate.current().id, "Final phase reached");
        }
        Ok(index)
    }

    // Runtime

    /// Replace the beats with a fresh layout from a named archetype.
    pub fn apply_archetype(&mut self, name: &str) -> WorkspaceResult<&WorkspaceState> {
        let archetype = archetype(name)?;
        tracing::info!(archetype = archetype.name, slots = archetype.slots.len(), "Archetype applied");
        self.state.beats = archetype.beats();
        self.state.archetype = Some(archetype.name.to_string());
        self.after_beats_changed();
        Ok(&self.state)
    }

    pub fn set_clip(&mut self, beat_id: &str, clip: ClipSelection) -> WorkspaceResult<ClipSelection> {
        let clip = self.state.beat_mut(beat_id)?.set_clip(clip)?.clone();
        self.persist();
        Ok(clip)
    }

    pub fn approve_transition(&mut self, beat_id: &str) -> WorkspaceResult<()> {
        self.state.beat_mut(beat_id)?.approve_transition();
        tracing::info!(beat_id, "Transition approved");
        self.persist();
        Ok(())
    }

    pub fn runtime_summary(&self) -> RuntimeSummary {
        runtime_summary(&self.state.beats, self.runtime_budget_secs)
    }

    pub fn continuity_notes(&self) -> Vec<String> {
        continuity_notes(&self.state.beats)
    }

    // Queue and costs

    pub fn enqueue(&mut self, label: &str) -> WorkspaceResult<String> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| WorkspaceError::SyncFailure("task queue lock poisoned".to_string()))?;
        Ok(queue.enqueue(label))
    }

    pub fn queue_snapshot(&self) -> WorkspaceResult<QueueSnapshot> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| WorkspaceError::SyncFailure("task queue lock poisoned".to_string()))?;
        queue.poll();
        Ok(QueueSnapshot {
            tasks: queue.tasks().to_vec(),
            busy: queue.is_busy(),
        })
    }

    pub fn record_call(&mut self, input_tokens: u64, output_tokens: u64) -> WorkspaceResult<TokenEntry> {
        Ok(self.ledger.record_call(input_tokens, output_tokens)?.clone())
    }

    // Rendering

    pub fn view(&self) -> WorkspaceResult<WorkspaceView> {
        let queue = self.queue_snapshot()?;
        let sync_failures = self.sync_failures.snapshot();
        Ok(render(&RenderInput {
            state: &self.state,
            gate: &self.gate,
            decisions: &self.decisions,
            tasks: &queue.tasks,
            busy: queue.busy,
            ledger: &self.ledger,
            sync_failures: &sync_failures,
            fallback_tool: self.fallback_tool(),
            runtime_budget_secs: self.runtime_budget_secs,
        }))
    }
}
