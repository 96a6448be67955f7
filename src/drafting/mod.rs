//! Version history and selection engine.
//!
//! A [`Beat`] owns its donor options and an append-only list of
//! [`Version`]s with one selected. New drafts are built from
//! [`build_prompt`], recorded with the exact prompt used, and committed with
//! [`Beat::commit_version`], which appends and selects in a single step.
//! Rollback is [`Beat::select_version`] on an older id. The three
//! ready-made [`Variant`]s of a beat are adopted the same way.

mod context;
mod history;
mod job;
mod model;
mod prompt;
mod variants;

pub use context::propagate_context;
pub use history::{
    create_draft, generate_draft, override_with_operator_text, synthesize_placeholder,
    DraftGenerator, DraftOutcome, DraftRequest, GeneratedDraft, PlaceholderGenerator,
    OPERATOR_OVERRIDE_INSTRUCTION,
};
pub use job::{BeatInput, JobRequest};
pub use model::{summarize, Beat, DonorOption, SourceOption, Version};
pub use prompt::{
    build_prompt, normalize_instruction, BASELINE_TONE_ONLY, NO_INSTRUCTION, SYSTEM_DIRECTIVE,
};
pub use variants::{generate_variants, Variant, VariantKind, DEFAULT_PERSONA};
