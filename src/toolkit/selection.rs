//! Tool selection by tag and visual texture.

use std::collections::{BTreeSet, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::catalog::{Tool, Toolkit};

/// Parameters for [`select_tools`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    pub tags: Vec<String>,
    /// Free text, split on commas and whitespace
    pub visual_texture: String,
    /// Draw from the middle of the ranking instead of the top
    pub contrarian: bool,
    pub limit: usize,
    /// Minimum selection size, reached by adding one tool from each unused category
    pub fallback_mix: usize,
    /// Seed for the contrarian shuffle; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            visual_texture: String::new(),
            contrarian: false,
            limit: 8,
            fallback_mix: 5,
            seed: None,
        }
    }
}

impl SelectionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visual_texture(mut self, texture: impl Into<String>) -> Self {
        self.visual_texture = texture.into();
        self
    }

    pub fn contrarian(mut self, seed: Option<u64>) -> Self {
        self.contrarian = true;
        self.seed = seed;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

fn lowered<'a>(words: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    words
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Score in half points: two per requested tag, one per texture word, and
/// one for a visual tool.
fn half_points(tool: &Tool, tags: &BTreeSet<String>, texture: &BTreeSet<String>) -> u32 {
    let tag_hits = tags.iter().filter(|tag| tool.has_tag(tag)).count() as u32;
    let texture_hits = texture.iter().filter(|word| tool.has_tag(word)).count() as u32;
    let visual = u32::from(tool.has_tag("visual"));
    tag_hits * 4 + texture_hits * 2 + visual
}

/// Relevance of `tool` to the request.
pub fn score_tool(tool: &Tool, request: &SelectionRequest) -> f64 {
    let tags = lowered(request.tags.iter().map(String::as_str));
    let texture = lowered(request.visual_texture.split(|c: char| c == ',' || c.is_whitespace()));
    f64::from(half_points(tool, &tags, &texture)) / 2.0
}

/// Pick tools for a request.
///
/// Tools are ranked by score, ties kept in catalog order. A normal request
/// takes the top `limit` scoring above zero; a contrarian one shuffles the
/// `2 * limit` tools starting at the middle of the ranking and takes `limit`
/// of those. Either way the result is topped up to `fallback_mix` with the
/// first tool of each category not yet represented.
pub fn select_tools(toolkit: &Toolkit, request: &SelectionRequest) -> Vec<Tool> {
    let tags = lowered(request.tags.iter().map(String::as_str));
    let texture = lowered(request.visual_texture.split(|c: char| c == ',' || c.is_whitespace()));

    let mut ranked: Vec<(&Tool, u32)> = toolkit
        .tools()
        .iter()
        .map(|tool| (tool, half_points(tool, &tags, &texture)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut selected: Vec<Tool> = if request.contrarian {
        let start = ranked.len() / 2;
        let end = (start + request.limit * 2).min(ranked.len());
        let mut pool: Vec<&Tool> = ranked[start..end].iter().map(|(tool, _)| *tool).collect();
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        pool.shuffle(&mut rng);
        pool.into_iter().take(request.limit).cloned().collect()
    } else {
        ranked
            .iter()
            .filter(|(_, score)| *score > 0)
            .take(request.limit)
            .map(|(tool, _)| (*tool).clone())
            .collect()
    };

    let mut used: HashSet<String> = selected.iter().map(|tool| tool.category.clone()).collect();
    for category in toolkit.categories() {
        if selected.len() >= request.fallback_mix {
            break;
        }
        if used.contains(category) {
            continue;
        }
        if let Some(first) = toolkit.by_category(category).first() {
            selected.push((*first).clone());
            used.insert(category.to_string());
        }
    }

    tracing::debug!(
        requested = ?request.tags,
        contrarian = request.contrarian,
        selected = selected.len(),
        "Tools selected"
    );
    selected
}
