//! Beats, donor options and versions.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::variants::{VariantKind, DEFAULT_PERSONA};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::runtime::ClipSelection;

const SUMMARY_MAX_CHARS: usize = 120;

/// Where a version's style came from.
///
/// Serialized as a plain label: a donor's name, one of the reserved labels
/// `baseline` and `operator`, or `variant:<kind>` for an adopted variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceOption {
    Baseline,
    Donor(String),
    Operator,
    Variant(VariantKind),
}

impl SourceOption {
    pub fn label(&self) -> &str {
        match self {
            SourceOption::Baseline => "baseline",
            SourceOption::Donor(name) => name,
            SourceOption::Operator => "operator",
            SourceOption::Variant(kind) => kind.source_label(),
        }
    }
}

impl From<String> for SourceOption {
    fn from(label: String) -> Self {
        match label.as_str() {
            "baseline" => SourceOption::Baseline,
            "operator" => SourceOption::Operator,
            _ => match VariantKind::from_source_label(&label) {
                Some(kind) => SourceOption::Variant(kind),
                None => SourceOption::Donor(label),
            },
        }
    }
}

impl From<SourceOption> for String {
    fn from(source: SourceOption) -> Self {
        source.label().to_string()
    }
}

impl fmt::Display for SourceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A style reference attached to a beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorOption {
    pub id: String,
    pub name: String,
    #[serde(alias = "sample")]
    pub text: String,
}

impl DonorOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            text: text.into(),
        }
    }
}

/// One generated draft of a beat. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub text: String,
    pub source_option: SourceOption,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
}

impl Version {
    /// Create a version with a fresh id and the current timestamp.
    pub fn new(
        text: impl Into<String>,
        source_option: SourceOption,
        instruction: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            source_option,
            instruction: instruction.into(),
            created_at: Utc::now(),
            prompt: prompt.into(),
        }
    }
}

/// A narrative unit with its version history.
///
/// `versions` is append-only and `selected_version_id` always names one of
/// them; both are private so the pair can only change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "text")]
    pub baseline: String,
    #[serde(default, alias = "rejectedOptions")]
    pub donor_options: Vec<DonorOption>,
    #[serde(default)]
    versions: Vec<Version>,
    #[serde(default)]
    selected_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Comedic tool name this beat leans on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipSelection>,
    /// Operator sign-off on the transition into this beat
    #[serde(default)]
    pub transition_approved: bool,
}

impl Beat {
    pub fn new(id: impl Into<String>, title: impl Into<String>, baseline: impl Into<String>) -> Self {
        let mut beat = Self {
            id: id.into(),
            title: title.into(),
            baseline: baseline.into(),
            donor_options: Vec::new(),
            versions: Vec::new(),
            selected_version_id: None,
            summary: None,
            context: None,
            persona: None,
            tool: None,
            clip: None,
            transition_approved: false,
        };
        beat.refresh_summary();
        beat
    }

    pub fn with_donor(mut self, donor: DonorOption) -> Self {
        self.donor_options.push(donor);
        self
    }

    pub fn persona(&self) -> &str {
        self.persona
            .as_deref()
            .filter(|persona| !persona.trim().is_empty())
            .unwrap_or(DEFAULT_PERSONA)
    }

    /// Attach footage. The clip is validated before it replaces the old one.
    pub fn set_clip(&mut self, clip: ClipSelection) -> WorkspaceResult<&ClipSelection> {
        clip.validate()?;
        tracing::debug!(beat_id = %self.id, clip_id = %clip.clip_id, "Clip attached");
        Ok(self.clip.insert(clip))
    }

    pub fn approve_transition(&mut self) {
        self.transition_approved = true;
    }

    pub fn donor(&self, donor_id: &str) -> Option<&DonorOption> {
        self.donor_options.iter().find(|donor| donor.id == donor_id)
    }

    /// Versions in insertion order.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version(&self, version_id: &str) -> Option<&Version> {
        self.versions.iter().find(|version| version.id == version_id)
    }

    pub fn selected_version_id(&self) -> Option<&str> {
        self.selected_version_id.as_deref()
    }

    pub fn selected_version(&self) -> Option<&Version> {
        self.selected_version_id
            .as_deref()
            .and_then(|id| self.version(id))
    }

    /// Selected version's text, else the baseline.
    pub fn current_text(&self) -> &str {
        self.selected_version()
            .map(|version| version.text.as_str())
            .unwrap_or(&self.baseline)
    }

    /// Append a version and select it in one step.
    pub fn commit_version(&mut self, version: Version) -> &Version {
        tracing::debug!(beat_id = %self.id, version_id = %version.id, source = %version.source_option, "Version committed");
        self.selected_version_id = Some(version.id.clone());
        self.versions.push(version);
        self.refresh_summary();
        &self.versions[self.versions.len() - 1]
    }

    /// Select any existing version. Selecting an older one is a rollback.
    pub fn select_version(&mut self, version_id: &str) -> WorkspaceResult<&Version> {
        let index = self
            .versions
            .iter()
            .position(|version| version.id == version_id)
            .ok_or_else(|| WorkspaceError::not_found("version", version_id))?;

        tracing::debug!(beat_id = %self.id, version_id, "Version selected");
        self.selected_version_id = Some(version_id.to_string());
        self.refresh_summary();
        Ok(&self.versions[index])
    }

    pub fn refresh_summary(&mut self) {
        self.summary = Some(summarize(self.current_text()));
    }

    /// Check the history invariants on a beat loaded from outside.
    pub fn validate(&self) -> WorkspaceResult<()> {
        if self.id.trim().is_empty() {
            return Err(WorkspaceError::Validation("beat id must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for version in &self.versions {
            if !seen.insert(version.id.as_str()) {
                return Err(WorkspaceError::Validation(format!(
                    "beat '{}' has duplicate version id '{}'",
                    self.id, version.id
                )));
            }
        }
        if let Some(clip) = &self.clip {
            clip.validate()?;
        }
        if let Some(selected) = self.selected_version_id.as_deref() {
            if self.version(selected).is_none() {
                return Err(WorkspaceError::Validation(format!(
                    "beat '{}' selects unknown version '{}'",
                    self.id, selected
                )));
            }
        }
        Ok(())
    }
}

/// Collapse whitespace and cap at 120 characters with a trailing ellipsis.
pub fn summarize(text: &str) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() > SUMMARY_MAX_CHARS {
        let mut truncated: String = clean.chars().take(SUMMARY_MAX_CHARS).collect();
        truncated.push('…');
        truncated
    } else {
        clean
    }
}
