//! Runtime estimates against a segment budget.

use serde::{Deserialize, Serialize};

use crate::drafting::Beat;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Default segment budget.
pub const FIFTEEN_MINUTES_SECS: f64 = 15.0 * 60.0;

/// Narration pace used for spoken runtime.
pub const WORDS_PER_SECOND: f64 = 2.5;

/// Footage attached to a beat, as in and out points in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSelection {
    pub clip_id: String,
    pub in_point: f64,
    pub out_point: f64,
}

impl ClipSelection {
    pub fn new(clip_id: impl Into<String>, in_point: f64, out_point: f64) -> WorkspaceResult<Self> {
        let clip = Self {
            clip_id: clip_id.into().trim().to_string(),
            in_point,
            out_point,
        };
        clip.validate()?;
        Ok(clip)
    }

    pub fn validate(&self) -> WorkspaceResult<()> {
        if self.clip_id.trim().is_empty() {
            return Err(WorkspaceError::Validation("clip id must not be empty".to_string()));
        }
        if !self.in_point.is_finite() || !self.out_point.is_finite() || self.in_point < 0.0 {
            return Err(WorkspaceError::Validation(format!(
                "clip '{}' has invalid in/out points",
                self.clip_id
            )));
        }
        if self.out_point <= self.in_point {
            return Err(WorkspaceError::Validation(format!(
                "clip '{}' out point must be greater than in point",
                self.clip_id
            )));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        (self.out_point - self.in_point).max(0.0)
    }
}

/// Seconds needed to read `text` aloud.
pub fn spoken_secs(text: &str) -> f64 {
    text.split_whitespace().count() as f64 / WORDS_PER_SECOND
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatRuntime {
    pub beat_id: String,
    pub title: String,
    pub spoken_secs: f64,
    pub clip_secs: f64,
    pub total_secs: f64,
    /// Running total up to and including this beat
    pub cumulative_secs: f64,
    /// The running total has passed the budget
    pub over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSummary {
    pub budget_secs: f64,
    pub total_secs: f64,
    pub beats: Vec<BeatRuntime>,
}

impl RuntimeSummary {
    /// Ids of the beats that end past the budget, in order.
    pub fn over_budget_beats(&self) -> Vec<&str> {
        self.beats
            .iter()
            .filter(|beat| beat.over_budget)
            .map(|beat| beat.beat_id.as_str())
            .collect()
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_secs / 60.0
    }
}

/// Spoken plus clip runtime of each beat, accumulated in beat order.
pub fn runtime_summary(beats: &[Beat], budget_secs: f64) -> RuntimeSummary {
    let mut cumulative = 0.0;
    let beats = beats
        .iter()
        .map(|beat| {
            let spoken = spoken_secs(beat.current_text());
            let clip = beat.clip.as_ref().map(ClipSelection::duration_secs).unwrap_or(0.0);
            let total = spoken + clip;
            cumulative += total;
            BeatRuntime {
                beat_id: beat.id.clone(),
                title: beat.title.clone(),
                spoken_secs: spoken,
                clip_secs: clip,
                total_secs: total,
                cumulative_secs: cumulative,
                over_budget: cumulative > budget_secs,
            }
        })
        .collect();

    RuntimeSummary {
        budget_secs,
        total_secs: cumulative,
        beats,
    }
}
