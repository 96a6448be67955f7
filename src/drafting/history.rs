//! Draft creation and the text-generation seam.

use async_trait::async_trait;

use super::model::{Beat, DonorOption, SourceOption, Version};
use super::prompt::{build_prompt, normalize_instruction, NO_INSTRUCTION};
use crate::cost::TokenCount;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Instruction recorded on operator overrides.
pub const OPERATOR_OVERRIDE_INSTRUCTION: &str = "Operator override";

/// Everything a generator may look at for one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    /// The exact prompt that will be recorded on the version
    pub prompt: String,
    pub current_text: String,
    pub donor_name: Option<String>,
    pub instruction: String,
}

impl DraftRequest {
    pub fn new(beat: &Beat, donor: Option<&DonorOption>, instruction: &str) -> Self {
        Self {
            prompt: build_prompt(beat, donor, instruction),
            current_text: beat.current_text().to_string(),
            donor_name: donor.map(|donor| donor.name.clone()),
            instruction: normalize_instruction(instruction),
        }
    }
}

/// Text returned by a generator, with usage when the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDraft {
    pub text: String,
    pub usage: Option<TokenCount>,
}

/// External text-generation capability.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn generate(&self, request: &DraftRequest) -> WorkspaceResult<GeneratedDraft>;
}

/// Deterministic stand-in generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

#[async_trait]
impl DraftGenerator for PlaceholderGenerator {
    async fn generate(&self, request: &DraftRequest) -> WorkspaceResult<GeneratedDraft> {
        Ok(GeneratedDraft {
            text: synthesize_placeholder(request),
            usage: None,
        })
    }
}

/// Placeholder draft text derived only from the request.
pub fn synthesize_placeholder(request: &DraftRequest) -> String {
    let style = match &request.donor_name {
        Some(name) => format!("in the style of {}", name),
        None => "baseline tone".to_string(),
    };
    let note = if request.instruction == NO_INSTRUCTION {
        "no instruction".to_string()
    } else {
        format!("instruction: {}", request.instruction)
    };
    format!("{} ({}; {})", request.current_text.trim(), style, note)
}

fn source_for(donor: Option<&DonorOption>) -> SourceOption {
    donor
        .map(|donor| SourceOption::Donor(donor.name.clone()))
        .unwrap_or(SourceOption::Baseline)
}

/// Create a new version with placeholder text. The beat is not modified;
/// pass the result to [`Beat::commit_version`].
pub fn create_draft(beat: &Beat, donor: Option<&DonorOption>, instruction: &str) -> Version {
    let request = DraftRequest::new(beat, donor, instruction);
    let text = synthesize_placeholder(&request);
    Version::new(text, source_for(donor), request.instruction, request.prompt)
}

/// A generated version plus the usage the generator reported.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub version: Version,
    pub usage: Option<TokenCount>,
}

/// Create a new version through `generator`, recording the exact prompt sent.
///
/// Generator failures surface as [`WorkspaceError::SyncFailure`].
pub async fn generate_draft(
    generator: &dyn DraftGenerator,
    beat: &Beat,
    donor: Option<&DonorOption>,
    instruction: &str,
) -> WorkspaceResult<DraftOutcome> {
    let request = DraftRequest::new(beat, donor, instruction);
    let generated = generator.generate(&request).await.map_err(|err| match err {
        err @ WorkspaceError::SyncFailure(_) => err,
        other => WorkspaceError::SyncFailure(format!("generation failed: {}", other)),
    })?;

    let DraftRequest {
        prompt,
        instruction,
        ..
    } = request;
    Ok(DraftOutcome {
        version: Version::new(generated.text, source_for(donor), instruction, prompt),
        usage: generated.usage,
    })
}

/// Record operator-written text as a new selected version.
pub fn override_with_operator_text<'a>(
    beat: &'a mut Beat,
    operator_text: &str,
) -> WorkspaceResult<&'a Version> {
    let text = operator_text.trim();
    if text.is_empty() {
        return Err(WorkspaceError::Validation(
            "operator text must not be empty".to_string(),
        ));
    }
    let prompt = build_prompt(beat, None, OPERATOR_OVERRIDE_INSTRUCTION);
    let version = Version::new(
        text,
        SourceOption::Operator,
        OPERATOR_OVERRIDE_INSTRUCTION,
        prompt,
    );
    Ok(beat.commit_version(version))
}
