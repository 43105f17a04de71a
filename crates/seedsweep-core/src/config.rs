//! Run configuration types.

use std::collections::BTreeSet;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Tags that protect a torrent from classification unless configured otherwise.
pub const DEFAULT_EXCLUDE_TAGS: &[&str] = &["pinned", "keep"];

/// Tag applied to removable torrents unless configured otherwise.
pub const DEFAULT_TAG_REMOVABLE: &str = "cross-seed-only";

/// Which torrents are considered for classification.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct FilterConfig {
    /// Torrents carrying any of these tags are skipped.
    #[builder(default = "default_exclude_tags()")]
    #[serde(default = "default_exclude_tags")]
    pub exclude_tags: BTreeSet<String>,

    /// Torrents in any of these categories are skipped.
    #[builder(default)]
    #[serde(default)]
    pub exclude_categories: BTreeSet<String>,

    /// When non-empty, only torrents in these categories are considered.
    #[builder(default)]
    #[serde(default)]
    pub include_categories: BTreeSet<String>,

    /// Torrents added fewer than this many days ago are skipped (0 = off).
    #[builder(default = "0")]
    #[serde(default)]
    pub min_age_days: u32,
}

fn default_exclude_tags() -> BTreeSet<String> {
    DEFAULT_EXCLUDE_TAGS.iter().map(|t| t.to_string()).collect()
}

impl FilterConfig {
    /// Create a new filter config builder.
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }

    /// A filter that lets every torrent through.
    pub fn permissive() -> Self {
        Self {
            exclude_tags: BTreeSet::new(),
            exclude_categories: BTreeSet::new(),
            include_categories: BTreeSet::new(),
            min_age_days: 0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_tags: default_exclude_tags(),
            exclude_categories: BTreeSet::new(),
            include_categories: BTreeSet::new(),
            min_age_days: 0,
        }
    }
}

/// Configuration for one cleanup run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CleanupConfig {
    /// Torrent filter applied before classification.
    #[builder(default)]
    #[serde(default)]
    pub filter: FilterConfig,

    /// Tag added to removable torrents.
    #[builder(default = "DEFAULT_TAG_REMOVABLE.to_string()")]
    #[serde(default = "default_tag_removable")]
    pub tag_removable: String,

    /// Report only, never tag.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub dry_run: bool,

    /// Number of threads for stat calls (0 = auto-detect, 1 = sequential).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_tag_removable() -> String {
    DEFAULT_TAG_REMOVABLE.to_string()
}

fn default_true() -> bool {
    true
}

impl CleanupConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref tag) = self.tag_removable {
            if tag.trim().is_empty() {
                return Err("Removal tag cannot be empty".to_string());
            }
            if tag.contains(',') {
                return Err(format!("Removal tag cannot contain a comma: {tag}"));
            }
        }
        Ok(())
    }
}

impl CleanupConfig {
    /// Create a new cleanup config builder.
    pub fn builder() -> CleanupConfigBuilder {
        CleanupConfigBuilder::default()
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            tag_removable: default_tag_removable(),
            dry_run: true,
            threads: 0,
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
