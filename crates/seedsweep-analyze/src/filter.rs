//! Torrent inclusion and exclusion rules.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use seedsweep_core::{FilterConfig, Torrent};

/// Why a torrent was left out of classification.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The torrent carries a protected tag.
    #[error("tagged '{tag}'")]
    ExcludedTag { tag: String },

    /// The torrent's category is excluded.
    #[error("category '{category}' is excluded")]
    ExcludedCategory { category: String },

    /// Include categories are configured and the torrent's category is not one of them.
    #[error("category '{category}' is not included")]
    CategoryNotIncluded { category: String },

    /// The torrent was added too recently.
    #[error("added {age_days} day(s) ago")]
    TooYoung { age_days: i64 },
}

/// Applies a [`FilterConfig`] to torrents.
///
/// All rules must pass for a torrent to be classified; their order does
/// not change the outcome, only which reason is reported first.
#[derive(Debug, Clone, Default)]
pub struct TorrentFilter {
    config: FilterConfig,
}

impl TorrentFilter {
    /// Create a filter from its configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Check a torrent against every rule.
    pub fn check(&self, torrent: &Torrent, now: DateTime<Utc>) -> Result<(), ExclusionReason> {
        if let Some(tag) = torrent
            .tags
            .iter()
            .find(|tag| self.config.exclude_tags.contains(*tag))
        {
            return Err(ExclusionReason::ExcludedTag { tag: tag.clone() });
        }

        if self.config.exclude_categories.contains(&torrent.category) {
            return Err(ExclusionReason::ExcludedCategory {
                category: torrent.category.clone(),
            });
        }

        if !self.config.include_categories.is_empty()
            && !self.config.include_categories.contains(&torrent.category)
        {
            return Err(ExclusionReason::CategoryNotIncluded {
                category: torrent.category.clone(),
            });
        }

        if self.config.min_age_days > 0
            && let Some(added_on) = torrent.added_on
        {
            let age = now.signed_duration_since(added_on);
            if age < TimeDelta::days(i64::from(self.config.min_age_days)) {
                return Err(ExclusionReason::TooYoung {
                    age_days: age.num_days(),
                });
            }
        }

        Ok(())
    }

    /// Check whether a torrent passes every rule.
    pub fn accepts(&self, torrent: &Torrent, now: DateTime<Utc>) -> bool {
        self.check(torrent, now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedsweep_core::split_list;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn torrent(tags: &str, category: &str) -> Torrent {
        Torrent::new("t", "t", "/d")
            .with_tags(tags)
            .with_category(category)
    }

    #[test]
    fn test_default_filter_protects_keep() {
        let filter = TorrentFilter::default();
        assert_eq!(
            filter.check(&torrent("keep", "tv"), now()),
            Err(ExclusionReason::ExcludedTag {
                tag: "keep".to_string()
            })
        );
        assert!(filter.accepts(&torrent("other", "tv"), now()));
        assert!(filter.accepts(&torrent("", ""), now()));
    }

    #[test]
    fn test_exclude_category() {
        let filter = TorrentFilter::new(
            FilterConfig::builder()
                .exclude_categories(split_list("music"))
                .build()
                .unwrap(),
        );
        assert!(!filter.accepts(&torrent("", "music"), now()));
        assert!(filter.accepts(&torrent("", "tv"), now()));
    }

    #[test]
    fn test_include_category() {
        let filter = TorrentFilter::new(
            FilterConfig::builder()
                .include_categories(split_list("tv,movies"))
                .build()
                .unwrap(),
        );
        assert!(filter.accepts(&torrent("", "movies"), now()));
        assert!(matches!(
            filter.check(&torrent("", ""), now()),
            Err(ExclusionReason::CategoryNotIncluded { .. })
        ));
    }

    #[test]
    fn test_both_category_sets_apply() {
        let filter = TorrentFilter::new(
            FilterConfig::builder()
                .include_categories(split_list("tv,movies"))
                .exclude_categories(split_list("movies"))
                .build()
                .unwrap(),
        );
        assert!(!filter.accepts(&torrent("", "movies"), now()));
        assert!(filter.accepts(&torrent("", "tv"), now()));
    }

    #[test]
    fn test_min_age() {
        let filter = TorrentFilter::new(FilterConfig::builder().min_age_days(7u32).build().unwrap());

        let young = torrent("", "").with_added_on(now() - TimeDelta::days(2));
        let old = torrent("", "").with_added_on(now() - TimeDelta::days(8));
        let unknown = torrent("", "");

        assert_eq!(
            filter.check(&young, now()),
            Err(ExclusionReason::TooYoung { age_days: 2 })
        );
        assert!(filter.accepts(&old, now()));
        assert!(filter.accepts(&unknown, now()));
    }

    #[test]
    fn test_reason_display() {
        let reason = ExclusionReason::ExcludedTag {
            tag: "pinned".to_string(),
        };
        assert_eq!(reason.to_string(), "tagged 'pinned'");
    }
}
