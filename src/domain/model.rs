use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A normalized, lower-cased hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Wraps an already normalized token. Use `core::normalize` for raw feed lines.
    pub(crate) fn from_normalized(value: String) -> Self {
        Domain(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent domains from the closest to the registrable suffix, e.g.
    /// `a.b.example.com` yields `b.example.com`, `example.com`.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        let value = self.0.as_str();
        value
            .match_indices('.')
            .map(move |(idx, _)| &value[idx + 1..])
            .filter(|rest| rest.contains('.'))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unordered set of unique domains. Ordering only exists once materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSet {
    domains: HashSet<Domain>,
}

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: Domain) -> bool {
        self.domains.insert(domain)
    }

    pub fn remove(&mut self, domain: &Domain) -> bool {
        self.domains.remove(domain)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.domains.contains(domain)
    }

    pub fn contains_str(&self, domain: &str) -> bool {
        self.domains.contains(&Domain(domain.to_string()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter()
    }

    /// Materializes the set in ascending lexicographic order.
    pub fn into_sorted_vec(self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.domains.into_iter().collect();
        domains.sort_unstable();
        domains
    }
}

impl FromIterator<Domain> for DomainSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        DomainSet {
            domains: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DomainSet {
    type Item = Domain;
    type IntoIter = std::collections::hash_set::IntoIter<Domain>;

    fn into_iter(self) -> Self::IntoIter {
        self.domains.into_iter()
    }
}

/// Normalized output of both feeds.
#[derive(Debug, Clone, Default)]
pub struct FeedDomains {
    pub block: DomainSet,
    pub allow: DomainSet,
}

/// A domain list resource as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: usize,
}

/// A gateway policy and the list ids it enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePolicy {
    pub id: String,
    pub name: String,
    pub list_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Created,
    Updated,
    /// More than one policy matched; nothing was changed.
    Anomaly { matching: usize },
    /// Target was empty so there was nothing to reference.
    SkippedEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote entry count already equals the target size.
    Skipped { remote_count: usize },
    Synced {
        deleted_policies: usize,
        deleted_lists: usize,
        created_lists: usize,
        policy: PolicyAction,
    },
    /// Dry run: what a sync would have done.
    Planned {
        target_count: usize,
        remote_count: usize,
        stale_lists: usize,
        new_lists: usize,
    },
    Exported { path: String, count: usize },
    TornDown {
        deleted_policies: usize,
        deleted_lists: usize,
    },
}
