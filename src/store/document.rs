use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::drafting::{propagate_context, Beat};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::toolkit::{ComedicAngle, Tool};

/// The persisted workspace: an ordered list of beats, plus the toolkit
/// picks and comedic angles the operator has worked up for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    pub beats: Vec<Beat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toolkit_selection: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub angles: Vec<ComedicAngle>,
    /// Name of the archetype the beats were laid out from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
}

impl WorkspaceState {
    pub fn new(beats: Vec<Beat>) -> Self {
        Self {
            beats,
            ..Self::default()
        }
    }

    pub fn angle_mut(&mut self, angle_id: &str) -> WorkspaceResult<&mut ComedicAngle> {
        self.angles
            .iter_mut()
            .find(|angle| angle.id == angle_id)
            .ok_or_else(|| WorkspaceError::not_found("angle", angle_id))
    }

    /// Validate and decode a whole state document.
    ///
    /// Rejects documents whose `beats` is missing or not an array, beats
    /// that fail to decode or whose history is inconsistent, duplicate beat
    /// ids, and malformed toolkit or angle entries.
    pub fn from_document(document: &Value) -> WorkspaceResult<Self> {
        let beats = document
            .get("beats")
            .ok_or_else(|| WorkspaceError::Validation("missing 'beats'".to_string()))?;
        let items = beats
            .as_array()
            .ok_or_else(|| WorkspaceError::Validation("'beats' must be an array".to_string()))?;

        let mut decoded = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let beat: Beat = serde_json::from_value(item.clone()).map_err(|err| {
                WorkspaceError::Validation(format!("beat {} is malformed: {}", index, err))
            })?;
            beat.validate()?;
            if decoded.iter().any(|existing: &Beat| existing.id == beat.id) {
                return Err(WorkspaceError::Validation(format!(
                    "duplicate beat id '{}'",
                    beat.id
                )));
            }
            decoded.push(beat);
        }

        let toolkit_selection: Vec<Tool> = optional_field(document, "toolkitSelection")?;
        let angles: Vec<ComedicAngle> = optional_field(document, "angles")?;
        for (index, angle) in angles.iter().enumerate() {
            if angles[..index].iter().any(|earlier| earlier.id == angle.id) {
                return Err(WorkspaceError::Validation(format!(
                    "duplicate angle id '{}'",
                    angle.id
                )));
            }
        }
        let archetype: Option<String> = optional_field(document, "archetype")?;

        let mut state = Self {
            beats: decoded,
            toolkit_selection,
            angles,
            archetype,
        };
        propagate_context(&mut state.beats);
        Ok(state)
    }

    pub fn beat(&self, beat_id: &str) -> Option<&Beat> {
        self.beats.iter().find(|beat| beat.id == beat_id)
    }

    pub fn beat_mut(&mut self, beat_id: &str) -> WorkspaceResult<&mut Beat> {
        self.beats
            .iter_mut()
            .find(|beat| beat.id == beat_id)
            .ok_or_else(|| WorkspaceError::not_found("beat", beat_id))
    }
}

fn optional_field<T>(document: &Value, key: &str) -> WorkspaceResult<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match document.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| WorkspaceError::Validation(format!("'{}' is malformed: {}", key, err))),
    }
}
