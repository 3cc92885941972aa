//! Rank table construction.
//!
//! The catalog's native sort runs worst-to-best, so the order is inverted
//! before rank assignment: rank 1 is the most preferred variant and ranks
//! grow toward the least preferred. The livestream-only itag 616 is pinned
//! to rank 0 after the walk and is treated by the decision engine as worse
//! than everything else, never as best.

use crate::catalog::FormatCatalog;
use std::collections::HashMap;

/// Livestream-only variant pinned to the bottom of the preference order.
/// An upstream-catalog quirk, kept exactly as observed.
pub const SENTINEL_ITAG: &str = "616";

/// Immutable mapping from itag to preference rank, built once per run
#[derive(Debug, Clone, Default)]
pub struct RankTable {
    ranks: HashMap<String, u32>,
}

impl RankTable {
    /// Build the rank table from a catalog
    ///
    /// Deterministic for a fixed catalog: the descriptor list is
    /// stable-sorted with the catalog's comparator and walked in that
    /// explicit order. An empty catalog yields an empty table, leaving every
    /// lookup unresolved.
    pub fn build(catalog: &impl FormatCatalog) -> Self {
        let mut descriptors = catalog.descriptors();
        if descriptors.is_empty() {
            return Self::default();
        }

        // Ranking must not depend on any per-item network-observable field,
        // so catalog entries without a source location get a placeholder.
        for fmt in &mut descriptors {
            if fmt.url.is_none() {
                fmt.url = Some(format!("https://dummy/{}", fmt.itag));
            }
        }

        // Native order is worst-to-best; invert so rank 1 lands on the best.
        descriptors.sort_by(|a, b| catalog.compare(a, b));
        descriptors.reverse();

        let mut ranks = HashMap::new();
        let mut next_rank = 1u32;
        for fmt in &descriptors {
            if fmt.itag == SENTINEL_ITAG {
                continue;
            }
            ranks.insert(fmt.itag.clone(), next_rank);
            next_rank += 1;
        }

        ranks.insert(SENTINEL_ITAG.to_string(), 0);

        Self { ranks }
    }

    /// Look up the rank of an itag; `None` means the itag is unknown and the
    /// comparison is unresolvable
    pub fn rank(&self, itag: &str) -> Option<u32> {
        self.ranks.get(itag).copied()
    }

    /// Number of ranked itags, sentinel included
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Whether the table is empty (catalog unavailable or empty)
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuiltinCatalog, FormatDescriptor};
    use std::cmp::Ordering;

    /// Small synthetic catalog ordered purely by height, worst first
    struct SyntheticCatalog {
        formats: Vec<FormatDescriptor>,
    }

    impl SyntheticCatalog {
        fn new(itags: &[(&str, u32)]) -> Self {
            let formats = itags
                .iter()
                .map(|(itag, height)| FormatDescriptor::video_only(itag, "mp4", *height, "h264"))
                .collect();
            Self { formats }
        }
    }

    impl FormatCatalog for SyntheticCatalog {
        fn descriptors(&self) -> Vec<FormatDescriptor> {
            self.formats.clone()
        }

        fn compare(&self, a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
            a.height.cmp(&b.height).then_with(|| a.itag.cmp(&b.itag))
        }
    }

    #[test]
    fn test_best_gets_rank_one() {
        let catalog = SyntheticCatalog::new(&[("160", 144), ("137", 1080), ("135", 480)]);
        let table = RankTable::build(&catalog);

        assert_eq!(table.rank("137"), Some(1));
        assert_eq!(table.rank("135"), Some(2));
        assert_eq!(table.rank("160"), Some(3));
    }

    #[test]
    fn test_sentinel_pinned_to_zero_regardless_of_native_position() {
        // 616 would sort best by height, but it must never be ranked best
        let catalog = SyntheticCatalog::new(&[("137", 1080), ("616", 4320), ("135", 480)]);
        let table = RankTable::build(&catalog);

        assert_eq!(table.rank(SENTINEL_ITAG), Some(0));
        assert_eq!(table.rank("137"), Some(1));
        assert_eq!(table.rank("135"), Some(2));
    }

    #[test]
    fn test_sentinel_pinned_even_when_absent_from_catalog() {
        let catalog = SyntheticCatalog::new(&[("137", 1080)]);
        let table = RankTable::build(&catalog);
        assert_eq!(table.rank(SENTINEL_ITAG), Some(0));
    }

    #[test]
    fn test_ranks_are_dense_over_non_sentinel_itags() {
        let catalog = BuiltinCatalog;
        let table = RankTable::build(&catalog);
        let count = catalog.descriptors().len();

        let mut seen: Vec<u32> = catalog
            .descriptors()
            .iter()
            .map(|f| table.rank(&f.itag).expect("every catalog itag is ranked"))
            .collect();
        seen.sort_unstable();
        let expected: Vec<u32> = (1..=count as u32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = BuiltinCatalog;
        let first = RankTable::build(&catalog);
        let second = RankTable::build(&catalog);

        for fmt in catalog.descriptors() {
            assert_eq!(first.rank(&fmt.itag), second.rank(&fmt.itag));
        }
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_empty_catalog_yields_empty_table() {
        let catalog = SyntheticCatalog { formats: Vec::new() };
        let table = RankTable::build(&catalog);

        assert!(table.is_empty());
        assert_eq!(table.rank("137"), None);
        assert_eq!(table.rank(SENTINEL_ITAG), None);
    }

    #[test]
    fn test_unknown_itag_is_unresolved() {
        let table = RankTable::build(&BuiltinCatalog);
        assert_eq!(table.rank("9999"), None);
    }
}
