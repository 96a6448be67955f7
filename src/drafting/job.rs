//! Job submission: turning operator input into beats.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::context::propagate_context;
use super::model::{Beat, DonorOption};
use crate::error::{WorkspaceError, WorkspaceResult};

/// One beat as submitted with a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "baseline")]
    pub text: String,
    #[serde(default, alias = "rejectedOptions")]
    pub donor_options: Vec<DonorOption>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
}

impl BeatInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_donor(mut self, donor: DonorOption) -> Self {
        self.donor_options.push(donor);
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }
}

/// A batch of beats submitted together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub beats: Vec<BeatInput>,
}

impl JobRequest {
    /// Build beats with fresh histories and chained context.
    ///
    /// Missing ids become `beat_{n}` and missing titles `Beat {n}`
    /// (1-based). Duplicate ids are rejected.
    pub fn into_beats(self) -> WorkspaceResult<Vec<Beat>> {
        let mut seen = HashSet::new();
        let mut beats = Vec::with_capacity(self.beats.len());

        for (index, input) in self.beats.into_iter().enumerate() {
            let position = index + 1;
            let id = input
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("beat_{}", position));
            if !seen.insert(id.clone()) {
                return Err(WorkspaceError::Validation(format!(
                    "duplicate beat id '{}'",
                    id
                )));
            }
            let title = input
                .title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| format!("Beat {}", position));

            let mut beat = Beat::new(id, title, input.text);
            beat.donor_options = input.donor_options;
            beat.persona = input.persona.filter(|persona| !persona.trim().is_empty());
            beat.tool = input.tool.filter(|tool| !tool.trim().is_empty());
            beats.push(beat);
        }

        propagate_context(&mut beats);
        Ok(beats)
    }
}
