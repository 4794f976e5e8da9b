use crate::domain::model::{Domain, DomainSet, RemoteList};

/// Maximum entries the gateway accepts in one list resource.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// `block \ allow`, sorted ascending. This is the authoritative target state.
pub fn reconcile(mut block: DomainSet, allow: &DomainSet) -> Vec<Domain> {
    for domain in allow.iter() {
        block.remove(domain);
    }
    block.into_sorted_vec()
}

/// Contiguous chunks of at most `chunk_size` domains, in order.
pub fn chunk_domains(domains: &[Domain], chunk_size: usize) -> Vec<&[Domain]> {
    domains.chunks(chunk_size.max(1)).collect()
}

/// `ceil(total / chunk_size)`.
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    total.div_ceil(chunk_size.max(1))
}

/// Name of the `index`-th (1-based) list resource.
pub fn list_name(prefix: &str, index: usize) -> String {
    format!("{} {}", prefix, index)
}

pub fn remote_entry_count(remote_lists: &[RemoteList]) -> usize {
    remote_lists.iter().map(|list| list.count).sum()
}

/// Size-only comparison: equal totals mean "nothing to do". Two different
/// sets of the same size are treated as unchanged.
pub fn should_skip(target: &[Domain], remote_lists: &[RemoteList]) -> bool {
    remote_entry_count(remote_lists) == target.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_lines;

    fn set(items: &[&str]) -> DomainSet {
        normalize_lines(items)
    }

    fn strings(domains: &[Domain]) -> Vec<String> {
        domains.iter().map(|d| d.to_string()).collect()
    }

    fn generated(n: usize) -> Vec<Domain> {
        let lines: Vec<String> = (0..n).map(|i| format!("host{:05}.example.com", i)).collect();
        normalize_lines(&lines).into_sorted_vec()
    }

    fn remote(count: usize) -> RemoteList {
        RemoteList {
            id: format!("id-{}", count),
            name: "[AdBlock-DNS Block List] 1".to_string(),
            count,
        }
    }

    #[test]
    fn test_reconcile_removes_allowed_and_sorts() {
        let block = set(&["c.com", "a.com", "b.com", "a.com"]);
        let allow = set(&["b.com", "z.com"]);
        let result = reconcile(block, &allow);
        assert_eq!(strings(&result), vec!["a.com", "c.com"]);
        assert!(result.iter().all(|d| !allow.contains(d)));
    }

    #[test]
    fn test_reconcile_with_empty_allow_is_sorted_dedup() {
        let block = set(&["b.com", "a.com", "b.com"]);
        assert_eq!(strings(&reconcile(block, &DomainSet::new())), vec!["a.com", "b.com"]);
    }

    #[test]
    fn test_reconcile_against_itself_is_empty() {
        let block = set(&["a.com", "b.com"]);
        let allow = block.clone();
        assert!(reconcile(block, &allow).is_empty());
    }

    #[test]
    fn test_reconcile_scenario_block_and_allow_feed() {
        let block = set(&["a.com", "b.com", "a.com"]);
        let allow = set(&["b.com"]);
        let target = reconcile(block, &allow);
        assert_eq!(strings(&target), vec!["a.com"]);
        let chunks = chunk_domains(&target, DEFAULT_CHUNK_SIZE);
        assert_eq!(chunks.len(), 1);
        assert_eq!(list_name("[AdBlock-DNS Block List]", 1), "[AdBlock-DNS Block List] 1");
    }

    #[test]
    fn test_chunking_2500_domains() {
        let domains = generated(2500);
        let chunks = chunk_domains(&domains, DEFAULT_CHUNK_SIZE);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(chunk_count(2500, DEFAULT_CHUNK_SIZE), 3);
        assert_eq!(list_name("p", chunks.len()), "p 3");

        let rejoined: Vec<Domain> = chunks.concat();
        assert_eq!(rejoined, domains);
    }

    #[test]
    fn test_chunk_count_boundaries() {
        for n in [0usize, 1, 999, 1000, 1001, 2000, 2001] {
            let domains = generated(n);
            let chunks = chunk_domains(&domains, DEFAULT_CHUNK_SIZE);
            assert_eq!(chunks.len(), chunk_count(n, DEFAULT_CHUNK_SIZE), "n = {}", n);
            if let Some((_, full)) = chunks.split_last() {
                assert!(full.iter().all(|c| c.len() == DEFAULT_CHUNK_SIZE));
            }
        }
    }

    #[test]
    fn test_should_skip_when_counts_match() {
        let target = generated(3);
        assert!(should_skip(&target, &[remote(2), remote(1)]));
        assert!(!should_skip(&target, &[remote(2)]));
        assert!(should_skip(&[], &[]));
        assert!(!should_skip(&target, &[]));
    }
}
