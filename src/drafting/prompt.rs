//! Prompt composition.

use super::model::{Beat, DonorOption};

/// Fixed directive opening every prompt.
pub const SYSTEM_DIRECTIVE: &str = "You are revising a single beat of a longer narrative. \
Keep names, facts and continuity intact. Return only the revised beat text.";

/// Donor section when no donor is chosen.
pub const BASELINE_TONE_ONLY: &str = "Use baseline tone only.";

/// Instruction marker when the operator gave none.
pub const NO_INSTRUCTION: &str = "None provided.";

/// Trimmed instruction, or [`NO_INSTRUCTION`] when blank.
pub fn normalize_instruction(instruction: &str) -> String {
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        NO_INSTRUCTION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the generation prompt for a beat.
///
/// Sections, in order: directive, current draft (selected version or
/// baseline), baseline, donor style, instruction. The baseline is always
/// present so drift from it stays visible. Pure: identical inputs give
/// identical output.
pub fn build_prompt(beat: &Beat, donor: Option<&DonorOption>, instruction: &str) -> String {
    let donor_section = match donor {
        Some(donor) => format!("Donor style ({}):\n{}", donor.name, donor.text),
        None => format!("Donor style:\n{}", BASELINE_TONE_ONLY),
    };

    format!(
        "{}\n\nCurrent draft:\n{}\n\nBaseline:\n{}\n\n{}\n\nInstruction:\n{}",
        SYSTEM_DIRECTIVE,
        beat.current_text(),
        beat.baseline,
        donor_section,
        normalize_instruction(instruction)
    )
}
