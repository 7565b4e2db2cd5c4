//! Reciprocal Rank Fusion for combining a dense and a lexical candidate list.
//!
//! `score(id) = sum over sources s containing id of 1 / (k + rank_s(id))`,
//! with `rank_s` 1-based. Unweighted: both sources contribute equally,
//! unlike a BM25-and-semantic blend that needs tuned weights. Ties in the
//! fused score break by ascending cosine distance, then by id,
//! lexicographically.

use crate::domain::types::SearchHit;
use std::collections::HashMap;

/// RRF constant. Larger values flatten the influence of rank differences.
pub const DEFAULT_K: f32 = 60.0;

/// A ranked candidate from one search leg. Carries the chunk id and cosine
/// distance the public [`SearchHit`] doesn't, since both are needed only
/// for RRF's tie-break rule. Lexical-only candidates have no dense leg, so
/// their distance is `f32::INFINITY` — the worst possible, so a tied dense
/// candidate always wins the tie-break.
pub struct RankedCandidate {
    pub id: String,
    pub distance: f32,
    pub hit: SearchHit,
}

/// Fuse two ranked candidate lists keyed by chunk id and return the top
/// `limit` hits by fused score, descending.
///
/// Each input list is assumed already sorted best-first; only relative
/// order within each list matters; the `score` field on the inputs is
/// replaced by the RRF score.
pub fn fuse(
    dense: &[RankedCandidate],
    lexical: &[RankedCandidate],
    k: f32,
    limit: usize,
) -> Vec<SearchHit> {
    let mut fused: HashMap<&str, (f32, f32, &RankedCandidate)> = HashMap::new();

    for (rank, candidate) in dense.iter().enumerate() {
        accumulate(&mut fused, candidate, rank, k);
    }
    for (rank, candidate) in lexical.iter().enumerate() {
        accumulate(&mut fused, candidate, rank, k);
    }

    let mut results: Vec<(f32, f32, &str, SearchHit)> = fused
        .into_iter()
        .map(|(id, (score, distance, candidate))| {
            let mut hit = candidate.hit.clone();
            hit.score = score;
            (score, distance, id, hit)
        })
        .collect();

    results.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.2.cmp(b.2))
    });
    results.truncate(limit);
    results.into_iter().map(|(_, _, _, hit)| hit).collect()
}

fn accumulate<'a>(
    fused: &mut HashMap<&'a str, (f32, f32, &'a RankedCandidate)>,
    candidate: &'a RankedCandidate,
    rank: usize,
    k: f32,
) {
    let contribution = 1.0 / (k + (rank + 1) as f32);
    fused
        .entry(candidate.id.as_str())
        .and_modify(|(score, distance, _)| {
            *score += contribution;
            *distance = distance.min(candidate.distance);
        })
        .or_insert_with(|| (contribution, candidate.distance, candidate));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Language;

    fn candidate(id: &str, path: &str, line: u32, distance: f32) -> RankedCandidate {
        RankedCandidate {
            id: id.to_string(),
            distance,
            hit: SearchHit {
                content: "x".into(),
                relative_path: path.into(),
                start_line: line,
                end_line: line,
                language: Language::Rust,
                score: 0.0,
            },
        }
    }

    #[test]
    fn ranked_in_both_lists_outranks_single_source() {
        let dense = vec![candidate("a", "a.rs", 1, 0.1), candidate("b", "b.rs", 1, 0.2)];
        let lexical = vec![candidate("a", "a.rs", 1, f32::INFINITY), candidate("c", "c.rs", 1, f32::INFINITY)];

        let fused = fuse(&dense, &lexical, DEFAULT_K, 10);
        assert_eq!(fused[0].relative_path, "a.rs");
    }

    #[test]
    fn respects_limit() {
        let dense: Vec<_> = (0..20).map(|i| candidate(&i.to_string(), "x.rs", i, 0.1)).collect();
        let fused = fuse(&dense, &[], DEFAULT_K, 5);
        assert_eq!(fused.len(), 5);
    }

    #[test]
    fn uses_one_based_rank() {
        let dense = vec![candidate("only", "x.rs", 1, 0.1)];
        let fused = fuse(&dense, &[], DEFAULT_K, 1);
        assert!((fused[0].score - 1.0 / (DEFAULT_K + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn ties_break_by_ascending_distance_then_id() {
        let dense = vec![candidate("z", "z.rs", 1, 0.5), candidate("a", "a.rs", 1, 0.2)];
        let lexical = vec![candidate("z", "z.rs", 1, f32::INFINITY), candidate("a", "a.rs", 1, f32::INFINITY)];

        let fused = fuse(&dense, &lexical, DEFAULT_K, 2);
        assert_eq!(fused[0].relative_path, "a.rs");
    }
}
