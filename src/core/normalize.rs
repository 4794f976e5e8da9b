//! Reduces raw feed lines (hosts files, adblock filters, plain domain lists)
//! to canonical domains.

use crate::domain::model::{Domain, DomainSet};
use regex::Regex;
use std::sync::LazyLock;
use url::Host;

/// Leading hosts-file address column or adblock anchor.
static LEADING_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9.]+|[0-9a-fA-F:.]+)\s+|^(\|\||@@\|\||\*\.|\*)")
        .expect("static pattern compiles")
});

const MAX_LABEL_LEN: usize = 63;

fn is_label(label: &str) -> bool {
    (1..=MAX_LABEL_LEN).contains(&label.len())
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn is_tld(label: &str) -> bool {
    (2..=6).contains(&label.len()) && label.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_hostname(token: &str) -> bool {
    let mut labels: Vec<&str> = token.split('.').collect();
    let Some(tld) = labels.pop() else {
        return false;
    };
    !labels.is_empty() && is_tld(tld) && labels.iter().all(|label| is_label(label))
}

/// Extracts the domain from one feed line, or `None` for comments, blanks,
/// IP literals and anything else that is not a hostname.
pub fn normalize_line(line: &str) -> Option<Domain> {
    if line.is_empty() || line.starts_with(['#', '!', '/']) {
        return None;
    }

    let line = line.trim();
    let token = line.split('#').next()?.split('^').next()?.replace('\r', "");
    let token = LEADING_NOISE.replace(&token, "");
    let token = token.trim();

    if !is_hostname(token) {
        return None;
    }

    match Host::parse(&token.to_ascii_lowercase()) {
        Ok(Host::Domain(ascii)) => Some(Domain::from_normalized(ascii)),
        _ => None,
    }
}

/// Builds the domain set for one feed. Invalid lines are skipped silently.
pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> DomainSet {
    let set: DomainSet = lines
        .iter()
        .filter_map(|line| normalize_line(line.as_ref()))
        .collect();
    tracing::debug!("Normalized {} lines into {} domains", lines.len(), set.len());
    set
}

/// Drops every domain that has a parent domain in the same set. The gateway
/// matches parents of the queried name, so those entries are redundant.
pub fn collapse_subdomains(set: DomainSet) -> DomainSet {
    let before = set.len();
    let collapsed: DomainSet = set
        .iter()
        .filter(|domain| !domain.parents().any(|parent| set.contains_str(parent)))
        .cloned()
        .collect();
    tracing::debug!(
        "Collapsed {} subdomains ({} -> {})",
        before - collapsed.len(),
        before,
        collapsed.len()
    );
    collapsed
}
