//! Comedic toolkit.
//!
//! - **Toolkit**: the built-in catalog of 329 tools across 22 categories,
//!   indexed by category and by tag
//! - **select_tools**: ranks tools against requested tags and a visual
//!   texture, with a contrarian mode and a category-mix fallback
//! - **generate_angles**: turns selected tools into comedic angles the
//!   operator can choose or override
//!
//! Catalog tags double as the filter ids of the workflow's first phase, and
//! a catalog tool is what the toolkit phase selects.

mod angles;
mod catalog;
mod selection;

pub use angles::{
    generate_angles, risk_score, AngleRequest, AngleStatus, ComedicAngle, DEFAULT_ANGLE_COUNT,
    DEFAULT_ROLE,
};
pub use catalog::{category_slug, Tool, Toolkit, CATALOG_SIZE, CATEGORY_NAMES};
pub use selection::{score_tool, select_tools, SelectionRequest};
