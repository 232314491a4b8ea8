//! Model selection for a requested task mode
//!
//! Deterministically picks a primary model id plus up to two fallbacks from
//! a catalog snapshot. Selection is a pure function of the snapshot, the mode
//! and the operator's pinned overrides.

use crate::models::catalog::CatalogSnapshot;
use crate::models::descriptor::{ModelDescriptor, REASONING_PARAMETER};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Primary model when the catalog offers no reasoning-capable model
pub const DEFAULT_REASONING_MODEL: &str = "openai/o1";
/// Primary model when the catalog is empty
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-4o-mini";
/// Maximum number of fallback ids in a selection
pub const MAX_FALLBACKS: usize = 2;

static REASONING_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"reasoning|thinking|\bo1\b|\br1\b").expect("reasoning token pattern is valid")
});

/// Requested task mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Default,
    /// Extended step-by-step inference with maximal effort
    Reasoning,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Reasoning => "reasoning",
        }
    }

    /// Model used when the candidate pool is empty
    pub fn fallback_model(&self) -> &'static str {
        match self {
            Self::Default => DEFAULT_CHAT_MODEL,
            Self::Reasoning => DEFAULT_REASONING_MODEL,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "reasoning" => Ok(Self::Reasoning),
            other => Err(format!(
                "unknown mode '{}', expected 'default' or 'reasoning'",
                other
            )),
        }
    }
}

/// Operator-supplied model ids forced to be primary when present in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedModels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl PinnedModels {
    pub fn new(reasoning: Option<String>, default: Option<String>) -> Self {
        Self { reasoning, default }
    }

    /// The pinned id for `mode`; blank values count as unset
    pub fn pinned_for(&self, mode: Mode) -> Option<&str> {
        let pinned = match mode {
            Mode::Reasoning => self.reasoning.as_deref(),
            Mode::Default => self.default.as_deref(),
        };
        pinned.map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Outcome of model selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    primary: String,
    fallbacks: Vec<String>,
}

impl Selection {
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Ordered alternates, at most `MAX_FALLBACKS`
    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    /// The full chain: primary first, then fallbacks in order
    pub fn models(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
            .collect()
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.primary, self.fallbacks)
    }
}

/// Whether a descriptor can serve reasoning mode
///
/// An explicit `reasoning` capability wins; otherwise the lowercased id and
/// name are searched for `reasoning`, `thinking`, or the whole words `o1`/`r1`.
pub fn is_reasoning_capable(descriptor: &ModelDescriptor) -> bool {
    if descriptor.supports_parameter(REASONING_PARAMETER) {
        return true;
    }
    let haystack = format!(
        "{} {}",
        descriptor.id(),
        descriptor.name().unwrap_or_default()
    )
    .to_lowercase();
    REASONING_TOKENS.is_match(&haystack)
}

/// Selects primary and fallback models for a mode
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pinned: PinnedModels,
}

impl ModelSelector {
    pub fn new(pinned: PinnedModels) -> Self {
        Self { pinned }
    }

    pub fn pinned(&self) -> &PinnedModels {
        &self.pinned
    }

    /// Pick a primary model and up to two fallbacks
    ///
    /// - Pinned and present: the pinned id is primary; fallbacks are the first
    ///   two pool entries other than the pinned id.
    /// - Otherwise: the first pool entry is primary (or the mode's hardcoded
    ///   default when the pool is empty); fallbacks are the next two pool
    ///   entries whose id differs from the primary.
    ///
    /// The pool is the reasoning-capable subset of the catalog in reasoning
    /// mode, the whole catalog otherwise, always in catalog order.
    pub fn pick(&self, catalog: &CatalogSnapshot, mode: Mode) -> Selection {
        let pool: Vec<&ModelDescriptor> = match mode {
            Mode::Reasoning => catalog.iter().filter(|d| is_reasoning_capable(d)).collect(),
            Mode::Default => catalog.iter().collect(),
        };

        if let Some(pinned) = self.pinned.pinned_for(mode) {
            if catalog.contains(pinned) {
                let selection = Selection {
                    primary: pinned.to_string(),
                    fallbacks: take_fallbacks(pool.iter().copied(), pinned),
                };
                tracing::debug!(
                    mode = %mode,
                    primary = %selection.primary,
                    fallbacks = ?selection.fallbacks,
                    "Selected pinned model"
                );
                return selection;
            }
            tracing::warn!(
                mode = %mode,
                pinned = %pinned,
                catalog_size = catalog.len(),
                "Pinned model not in catalog, selecting from pool"
            );
        }

        let selection = match pool.split_first() {
            Some((first, rest)) => Selection {
                primary: first.id().to_string(),
                fallbacks: take_fallbacks(rest.iter().copied(), first.id()),
            },
            None => Selection {
                primary: mode.fallback_model().to_string(),
                fallbacks: Vec::new(),
            },
        };

        tracing::debug!(
            mode = %mode,
            pool_size = pool.len(),
            primary = %selection.primary,
            fallbacks = ?selection.fallbacks,
            "Selected model from catalog"
        );
        selection
    }
}

fn take_fallbacks<'a>(
    candidates: impl Iterator<Item = &'a ModelDescriptor>,
    primary: &str,
) -> Vec<String> {
    candidates
        .filter(|d| d.id() != primary)
        .take(MAX_FALLBACKS)
        .map(|d| d.id().to_string())
        .collect()
}
