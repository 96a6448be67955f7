//! Ready-made variants of a beat.
//!
//! Every beat offers the same three takes, derived from its current text,
//! continuity context, persona and tool. Adopting one records it as a normal
//! version.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{Beat, SourceOption, Version};

/// Persona used when a beat names none.
pub const DEFAULT_PERSONA: &str = "Anchor";

const NO_CONTEXT: &str = "(no prior context)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    SafeAnchor,
    ToolHeavy,
    Wildcard,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [
        VariantKind::SafeAnchor,
        VariantKind::ToolHeavy,
        VariantKind::Wildcard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::SafeAnchor => "safe_anchor",
            VariantKind::ToolHeavy => "tool_heavy",
            VariantKind::Wildcard => "wildcard",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            VariantKind::SafeAnchor => "Safe Anchor",
            VariantKind::ToolHeavy => "Tool Heavy",
            VariantKind::Wildcard => "Wildcard",
        }
    }

    /// Label recorded as a version's source.
    pub fn source_label(&self) -> &'static str {
        match self {
            VariantKind::SafeAnchor => "variant:safe_anchor",
            VariantKind::ToolHeavy => "variant:tool_heavy",
            VariantKind::Wildcard => "variant:wildcard",
        }
    }

    pub fn from_source_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.source_label() == label)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ready-made take on a beat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// `v1` to `v3`, stable per kind
    pub id: String,
    pub kind: VariantKind,
    pub system_prompt: String,
    pub text: String,
}

impl Variant {
    /// Record this variant as a version of its beat.
    pub fn into_version(self) -> Version {
        let instruction = format!("Variant: {}", self.kind.title());
        Version::new(
            self.text,
            SourceOption::Variant(self.kind),
            instruction,
            self.system_prompt,
        )
    }
}

/// The three variants of `beat`. `fallback_tool` stands in when the beat
/// names no tool of its own.
pub fn generate_variants(beat: &Beat, fallback_tool: Option<&str>) -> Vec<Variant> {
    let context = beat
        .context
        .as_deref()
        .filter(|context| !context.trim().is_empty())
        .unwrap_or(NO_CONTEXT);
    let persona = beat.persona();
    let tool = beat.tool.as_deref().or(fallback_tool);

    VariantKind::ALL
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let system_prompt = match kind {
                VariantKind::SafeAnchor => format!(
                    "Safe/Anchor system prompt using persona '{}' with context: {}",
                    persona, context
                ),
                VariantKind::ToolHeavy => format!(
                    "Tool-forward prompt for {} with context: {}",
                    tool.unwrap_or("unspecified tool"),
                    context
                ),
                VariantKind::Wildcard => format!(
                    "Wildcard exploratory prompt with persona '{}' and context: {}",
                    persona, context
                ),
            };
            Variant {
                id: format!("v{}", index + 1),
                kind: *kind,
                system_prompt,
                text: format!(
                    "[{}] Persona: {}. Tool: {}. Context: {}. Draft: {}",
                    kind.title(),
                    persona,
                    tool.unwrap_or("general tooling"),
                    context,
                    beat.current_text()
                ),
            }
        })
        .collect()
}
