//! Comedic angles built from selected tools.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::Tool;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Role used when the request names none.
pub const DEFAULT_ROLE: &str = "Creator";

/// Angles generated per request unless asked otherwise.
pub const DEFAULT_ANGLE_COUNT: usize = 3;

const EDGY_TAGS: [&str; 4] = ["satire", "parody", "hyperbole", "breaking-the-fourth-wall"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleStatus {
    #[default]
    Suggested,
    Selected,
    Overridden,
}

impl fmt::Display for AngleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AngleStatus::Suggested => "suggested",
            AngleStatus::Selected => "selected",
            AngleStatus::Overridden => "overridden",
        };
        f.write_str(label)
    }
}

/// A pitch for how a role could use one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComedicAngle {
    pub id: String,
    pub prompt: String,
    pub angle: String,
    pub tool: Tool,
    /// In `[0, 1]`, three decimal places
    pub risk_score: f64,
    #[serde(default)]
    pub status: AngleStatus,
}

impl ComedicAngle {
    pub fn choose(&mut self) {
        self.status = AngleStatus::Selected;
    }

    /// Replace the pitch with operator text.
    pub fn override_with(&mut self, text: &str) -> WorkspaceResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkspaceError::Validation(
                "angle text must not be empty".to_string(),
            ));
        }
        self.angle = text.to_string();
        self.status = AngleStatus::Overridden;
        Ok(())
    }
}

/// Parameters for [`generate_angles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleRequest {
    pub role: String,
    pub context: String,
    pub contrarian: bool,
    pub count: usize,
}

impl Default for AngleRequest {
    fn default() -> Self {
        Self {
            role: DEFAULT_ROLE.to_string(),
            context: String::new(),
            contrarian: false,
            count: DEFAULT_ANGLE_COUNT,
        }
    }
}

impl AngleRequest {
    fn role(&self) -> &str {
        let role = self.role.trim();
        if role.is_empty() {
            DEFAULT_ROLE
        } else {
            role
        }
    }
}

/// Base 0.4, plus 0.25 for an edgy tool, plus 0.002 per context character
/// up to 0.5; capped at 1.
pub fn risk_score(tool: &Tool, context: &str) -> f64 {
    let edgy = if EDGY_TAGS.iter().any(|tag| tool.has_tag(tag)) {
        0.25
    } else {
        0.0
    };
    let length = (context.chars().count() as f64 / 500.0).min(0.5);
    let score = (0.4 + edgy + length).min(1.0);
    (score * 1000.0).round() / 1000.0
}

fn angle_prompt(role: &str, context: &str, tool: &Tool) -> String {
    format!(
        "Role: {}\nContext: {}\nTool: {}\nCore principle: {}\nExample: {}",
        role,
        context,
        tool.name,
        tool.core_principle,
        tool.examples.first().map(String::as_str).unwrap_or_default()
    )
}

/// Build `request.count` angles, cycling through `tools`.
///
/// Returns nothing when `tools` is empty.
pub fn generate_angles(request: &AngleRequest, tools: &[Tool]) -> Vec<ComedicAngle> {
    let role = request.role();
    let twist = if request.contrarian {
        " contrarian left-turn"
    } else {
        ""
    };

    tools
        .iter()
        .cycle()
        .take(request.count)
        .map(|tool| ComedicAngle {
            id: Uuid::new_v4().to_string(),
            prompt: angle_prompt(role, &request.context, tool),
            angle: format!(
                "Have {} lean on {} to solve the problem with a{} twist: {}",
                role,
                tool.name,
                twist,
                tool.principle_body()
            ),
            tool: tool.clone(),
            risk_score: risk_score(tool, &request.context),
            status: AngleStatus::Suggested,
        })
        .collect()
}
