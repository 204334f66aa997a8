//! Grouping of retrieved chunks into display-ready source entries.
//!
//! Retrieval returns one record per chunk, so a single video or article
//! usually shows up several times. [`aggregate`] folds those chunks into one
//! [`ResourceGroup`] per `(title, short description)` pair, collecting the
//! moments each deep link points at.

mod render;
mod sanitize;
mod timestamp;

pub use render::{render_markdown, render_group_markdown};
pub use sanitize::sanitize_description;
pub use timestamp::{format_time_of_day, parse_timestamp, SENTINEL_TIME, TIMESTAMP_FORMAT};

use crate::error::{MortError, Result};
use crate::retrieval::RetrievedDocument;
use chrono::NaiveTime;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Identity used to merge chunks into one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub title: String,
    pub short_description: String,
}

impl GroupKey {
    fn of(doc: &RetrievedDocument) -> Self {
        Self {
            title: doc.title.clone(),
            short_description: doc.short_description.clone(),
        }
    }

    /// Keys with a blank half carry nothing worth showing.
    fn is_displayable(&self) -> bool {
        !self.title.trim().is_empty() && !self.short_description.trim().is_empty()
    }
}

/// All moments referenced through one deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildMoments {
    pub url: String,
    /// Distinct times of day, ordered chronologically.
    pub times: BTreeSet<NaiveTime>,
}

impl ChildMoments {
    /// Times as `HH:MM:SS` strings, ascending.
    pub fn formatted_times(&self) -> Vec<String> {
        self.times.iter().map(format_time_of_day).collect()
    }

    /// Link label: the sorted times joined with commas.
    pub fn label(&self) -> String {
        self.formatted_times().join(", ")
    }
}

/// One source resource with every moment that was retrieved from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub title: String,
    pub short_description: String,
    /// Parent link of the first chunk seen for this resource.
    pub parent_url: String,
    /// Deep links in first-seen order.
    pub child_moments: Vec<ChildMoments>,
}

impl ResourceGroup {
    fn new(key: GroupKey, parent_url: String) -> Self {
        Self {
            title: key.title,
            short_description: key.short_description,
            parent_url,
            child_moments: Vec::new(),
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey {
            title: self.title.clone(),
            short_description: self.short_description.clone(),
        }
    }

    /// Title as shown to users, without surrounding whitespace.
    pub fn display_title(&self) -> &str {
        self.title.trim()
    }

    /// Description cleaned up for display.
    pub fn description(&self) -> String {
        sanitize_description(&self.short_description)
    }

    /// Times recorded for a deep link, if the link belongs to this group.
    pub fn moments_for(&self, child_url: &str) -> Option<&BTreeSet<NaiveTime>> {
        self.child_moments
            .iter()
            .find(|m| m.url == child_url)
            .map(|m| &m.times)
    }

    fn add_moment(&mut self, child_url: &str, time: NaiveTime) {
        match self.child_moments.iter_mut().find(|m| m.url == child_url) {
            Some(moments) => {
                moments.times.insert(time);
            }
            None => self.child_moments.push(ChildMoments {
                url: child_url.to_string(),
                times: BTreeSet::from([time]),
            }),
        }
    }
}

/// Group retrieved chunks by `(title, short description)`.
///
/// Groups come out in the order their key first appears. The first chunk of a
/// group decides its parent link. Unparsable timestamps count as `00:00:00`.
/// Groups with a blank title or description are dropped.
pub fn aggregate(documents: &[RetrievedDocument]) -> Vec<ResourceGroup> {
    let mut groups: Vec<ResourceGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut dropped = 0usize;

    for doc in documents {
        let key = GroupKey::of(doc);
        if !key.is_displayable() {
            dropped += 1;
            continue;
        }

        let time = parse_timestamp(&doc.timestamp);

        let slot = *index.entry(key).or_insert_with_key(|key| {
            groups.push(ResourceGroup::new(key.clone(), doc.parent_url.clone()));
            groups.len() - 1
        });

        groups[slot].add_moment(&doc.child_url, time);
    }

    debug!(
        "Aggregated {} documents into {} groups ({} without title or description)",
        documents.len(),
        groups.len(),
        dropped
    );

    groups
}

/// [`aggregate`] for callers whose document list may be missing altogether.
///
/// A missing list is a caller bug and fails with `InvalidInput`; an empty
/// list is fine and yields no groups.
pub fn try_aggregate(documents: Option<&[RetrievedDocument]>) -> Result<Vec<ResourceGroup>> {
    documents
        .map(aggregate)
        .ok_or_else(|| MortError::InvalidInput("no document list supplied".to_string()))
}
