//! End-to-end operator workflows through the library API

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use draftdesk::drafting::{BeatInput, DonorOption, DraftGenerator, DraftRequest, GeneratedDraft, JobRequest};
use draftdesk::gate::PhaseId;
use draftdesk::queue::{ManualClock, QueueConfig, TaskQueue};
use draftdesk::runtime::ClipSelection;
use draftdesk::store::{FileStateStore, StateStore};
use draftdesk::toolkit::{AngleRequest, AngleStatus, SelectionRequest};
use draftdesk::{WorkspaceConfig, WorkspaceController, WorkspaceError, WorkspaceResult};

struct OfflineGenerator;

#[async_trait]
impl DraftGenerator for OfflineGenerator {
    async fn generate(&self, _request: &DraftRequest) -> WorkspaceResult<GeneratedDraft> {
        Err(WorkspaceError::Io(std::io::Error::other("connection refused")))
    }
}

fn open(temp_dir: &TempDir) -> WorkspaceController {
    let config = WorkspaceConfig::new().with_state_path(temp_dir.path().join("state.json"));
    let queue = TaskQueue::new(QueueConfig::default(), Arc::new(ManualClock::new())).into_shared();
    let store = Arc::new(FileStateStore::new(config.state_path.clone()));
    WorkspaceController::open(&config, store, queue).expect("open workspace")
}

fn job() -> JobRequest {
    JobRequest {
        beats: vec![
            BeatInput::new("Intro text")
                .with_id("b1")
                .with_title("Opening")
                .with_donor(DonorOption::new("d1", "Noir", "Rain on neon.")),
            BeatInput::new("Second beat").with_id("b2"),
            BeatInput::new("Third beat"),
        ],
    }
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let temp_dir = TempDir::new().expect("temp dir");

    let (first_id, second_id) = {
        let mut controller = open(&temp_dir);
        controller.submit_job(job()).expect("submit");
        let first = controller.draft("b1", None, "").await.expect("first draft");
        let second = controller
            .draft("b1", Some("d1"), "More rain")
            .await
            .expect("second draft");
        controller.select_version("b1", &first.id).expect("rollback");
        controller.flush().await;
        assert!(controller.sync_failures().is_empty());
        (first.id, second.id)
    };

    let controller = open(&temp_dir);
    let beat = controller.state().beat("b1").expect("beat b1");
    assert_eq!(beat.versions().len(), 2);
    assert_eq!(beat.selected_version_id(), Some(first_id.as_str()));
    assert!(beat.version(&second_id).expect("second").prompt.contains("More rain"));

    let third = controller.state().beat("beat_3").expect("defaulted id");
    assert_eq!(third.title, "Beat 3");
    assert_eq!(third.context.as_deref(), Some("Second beat"));
}

#[tokio::test]
async fn test_generator_failure_is_recorded_and_changes_nothing() {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut controller = open(&temp_dir).with_generator(Arc::new(OfflineGenerator));
    controller.submit_job(job()).expect("submit");
    controller.flush().await;

    let err = controller.draft("b1", None, "").await.unwrap_err();
    assert!(matches!(err, WorkspaceError::SyncFailure(_)));
    assert_eq!(controller.sync_failures().len(), 1);
    assert!(controller.state().beat("b1").unwrap().versions().is_empty());
    assert!(controller.ledger().entries().is_empty());

    let stored = FileStateStore::new(temp_dir.path().join("state.json"))
        .load()
        .expect("load");
    assert!(stored.beat("b1").unwrap().versions().is_empty());
}

#[tokio::test]
async fn test_full_phase_walk() {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut controller = open(&temp_dir);

    controller.toggle_filter("timing").unwrap();
    assert_eq!(controller.move_phase(1).unwrap(), 1);
    controller.select_toolkit("timing-003").unwrap();
    assert_eq!(controller.move_phase(1).unwrap(), 2);

    assert!(matches!(
        controller.move_phase(1),
        Err(WorkspaceError::GateNotSatisfied {
            phase: PhaseId::Variant
        })
    ));
    assert_eq!(controller.gate().index(), 2);

    let angles = controller.generate_angles(AngleRequest::default()).unwrap();
    controller.choose_angle(&angles[0].id).unwrap();
    assert_eq!(controller.move_phase(1).unwrap(), 3);
    assert!(controller.gate().is_complete());

    // Stepping back never clears decisions.
    assert_eq!(controller.move_phase(-3).unwrap(), 0);
    assert_eq!(controller.move_phase(3).unwrap(), 3);
}

#[tokio::test]
async fn test_segment_planning_survives_reopen() {
    let temp_dir = TempDir::new().expect("temp dir");

    let angle_id = {
        let mut controller = open(&temp_dir);
        controller.apply_archetype("Micro Doc").expect("archetype");
        controller
            .override_beat("setup", "Meet the lighthouse keeper of Pier 9")
            .expect("setup text");
        controller
            .set_clip("clip", ClipSelection::new("Pier 9", 12.0, 312.0).expect("clip"))
            .expect("attach clip");
        controller.approve_transition("clip").expect("approve");

        let tools = controller.select_tools(SelectionRequest::new().with_tags(["deadpan"]).with_limit(2));
        assert_eq!(tools[0].category, "Deadpan");
        let angles = controller
            .generate_angles(AngleRequest {
                role: "Host".to_string(),
                count: 2,
                ..AngleRequest::default()
            })
            .expect("angles");
        controller.choose_angle(&angles[1].id).expect("choose");
        controller.adopt_variant("tag", "v1").expect("adopt");
        controller.flush().await;
        assert!(controller.sync_failures().is_empty());
        angles[1].id.clone()
    };

    let controller = open(&temp_dir);
    let state = controller.state();
    assert_eq!(state.archetype.as_deref(), Some("Micro Doc"));
    assert_eq!(state.toolkit_selection.len(), 5);
    assert_eq!(state.angles.len(), 2);
    let chosen = state.angles.iter().find(|angle| angle.id == angle_id).expect("angle");
    assert_eq!(chosen.status, AngleStatus::Selected);

    let clip = state.beat("clip").expect("clip beat");
    assert_eq!(clip.clip.as_ref().map(|c| c.duration_secs()), Some(300.0));
    assert!(clip.transition_approved);
    assert!(state.beat("tag").unwrap().current_text().starts_with("[Safe Anchor]"));

    let summary = controller.runtime_summary();
    assert!(summary.over_budget_beats().is_empty());
    assert!(controller.continuity_notes().is_empty());
}
