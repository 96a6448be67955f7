//! The built-in tool catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tool categories, in catalog order.
pub const CATEGORY_NAMES: [&str; 22] = [
    "Storyboarding",
    "Visual Contrast",
    "Timing",
    "Wordplay",
    "Absurdity",
    "Metaphor",
    "Character",
    "Physical Comedy",
    "Irony",
    "Satire",
    "Parody",
    "Hyperbole",
    "Deadpan",
    "Improvisation",
    "Misdirection",
    "Callbacks",
    "Breaking the Fourth Wall",
    "Meta",
    "Props",
    "Music",
    "Silence",
    "Lighting",
];

/// Number of tools in the catalog.
pub const CATALOG_SIZE: usize = 329;

/// Variants per category name; with 22 categories every name stays unique
/// below 330 tools.
const VARIANTS_PER_CATEGORY: usize = 15;

const EXAMPLE_MOVES: [&str; 4] = [
    "Translate the concept into a storyboard panel that exaggerates the visual gag.",
    "Lean into the most literal interpretation for comedic contrast.",
    "Layer a second reveal that undercuts the first punchline.",
    "Let the silence linger just long enough to become the joke.",
];

const CORE_PRINCIPLES: [&str; 3] = [
    "Push the idea until the audience anticipates the turn, then bend it once more.",
    "Treat visuals like verbs: every frame should act on the joke.",
    "Reward rewatching with small, nested payoffs.",
];

/// A single comedic technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Stable slug, e.g. `satire-004`
    pub id: String,
    pub name: String,
    pub category: String,
    pub core_principle: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
}

impl Tool {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The principle without its `"<Category> discipline #n:"` prefix.
    pub fn principle_body(&self) -> &str {
        self.core_principle
            .split_once(':')
            .map(|(_, body)| body.trim())
            .unwrap_or(self.core_principle.trim())
    }
}

/// Lower-case, hyphenated form of a category name.
pub fn category_slug(category: &str) -> String {
    category.to_lowercase().replace(' ', "-")
}

fn build_tool(index: usize) -> Tool {
    let category = CATEGORY_NAMES[index % CATEGORY_NAMES.len()];
    let variant = index % VARIANTS_PER_CATEGORY + 1;
    let slug = category_slug(category);
    Tool {
        id: format!("{}-{:03}", slug, variant),
        name: format!("{} Tool {:03}", category, variant),
        category: category.to_string(),
        core_principle: format!(
            "{} discipline #{}: {}",
            category,
            index % 7 + 1,
            CORE_PRINCIPLES[index % CORE_PRINCIPLES.len()]
        ),
        tags: vec![
            slug,
            "phase1".to_string(),
            "visual".to_string(),
            format!("variant-{}", index % 5 + 1),
        ],
        examples: vec![format!(
            "{} example {:03}: {}",
            category,
            variant,
            EXAMPLE_MOVES[index % EXAMPLE_MOVES.len()]
        )],
    }
}

/// The catalog with category and tag indexes.
#[derive(Debug, Clone)]
pub struct Toolkit {
    tools: Vec<Tool>,
    by_category: BTreeMap<String, Vec<usize>>,
    by_tag: BTreeMap<String, Vec<usize>>,
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::load()
    }
}

impl Toolkit {
    /// Build the full catalog.
    pub fn load() -> Self {
        Self::from_tools((0..CATALOG_SIZE).map(build_tool).collect())
    }

    pub fn from_tools(tools: Vec<Tool>) -> Self {
        let mut by_category: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_tag: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, tool) in tools.iter().enumerate() {
            by_category
                .entry(tool.category.clone())
                .or_default()
                .push(index);
            for tag in &tool.tags {
                by_tag.entry(tag.clone()).or_default().push(index);
            }
        }
        tracing::debug!(tools = tools.len(), tags = by_tag.len(), "Toolkit loaded");
        Self {
            tools,
            by_category,
            by_tag,
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Categories in catalog order, skipping any with no tools.
    pub fn categories(&self) -> Vec<&str> {
        CATEGORY_NAMES
            .iter()
            .copied()
            .filter(|category| self.by_category.contains_key(*category))
            .collect()
    }

    /// Look a tool up by id or display name.
    pub fn tool(&self, id_or_name: &str) -> Option<&Tool> {
        self.tools
            .iter()
            .find(|tool| tool.id == id_or_name || tool.name == id_or_name)
    }

    pub fn by_category(&self, category: &str) -> Vec<&Tool> {
        self.lookup(&self.by_category, category)
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&Tool> {
        self.lookup(&self.by_tag, tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    fn lookup(&self, index: &BTreeMap<String, Vec<usize>>, key: &str) -> Vec<&Tool> {
        index
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.tools[i]).collect())
            .unwrap_or_default()
    }
}
