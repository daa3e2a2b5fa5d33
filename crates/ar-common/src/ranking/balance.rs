use std::collections::{BTreeSet, HashSet};

use super::scoring::ScoredCandidate;
use crate::TestType;

/// Which primary buckets the query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMode {
    Both,
    KnowledgeOnly,
    PersonalityOnly,
    Neither,
}

impl BalanceMode {
    pub fn from_required(required: &BTreeSet<TestType>) -> Self {
        match (
            required.contains(&TestType::Knowledge),
            required.contains(&TestType::Personality),
        ) {
            (true, true) => BalanceMode::Both,
            (true, false) => BalanceMode::KnowledgeOnly,
            (false, true) => BalanceMode::PersonalityOnly,
            (false, false) => BalanceMode::Neither,
        }
    }
}

/// Descending by final score. `sort_by` is stable, so equal scores keep
/// their pool order; `total_cmp` keeps the order total even for NaN.
pub(crate) fn sort_by_score_desc(items: &mut [ScoredCandidate<'_>]) {
    items.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));
}

/// Ordered bucket that keeps the first occurrence of each identifier.
#[derive(Default)]
struct Bucket<'s, 'a> {
    items: Vec<&'s ScoredCandidate<'a>>,
    seen: HashSet<&'a str>,
}

impl<'s, 'a> Bucket<'s, 'a> {
    fn push(&mut self, item: &'s ScoredCandidate<'a>) {
        if self.seen.insert(item.candidate.identifier.as_str()) {
            self.items.push(item);
        }
    }
}

/// Appends `item` unless its identifier is already in `out`.
fn push_unique<'s, 'a>(
    out: &mut Vec<&'s ScoredCandidate<'a>>,
    seen: &mut HashSet<&'a str>,
    item: &'s ScoredCandidate<'a>,
) {
    if seen.insert(item.candidate.identifier.as_str()) {
        out.push(item);
    }
}

/// Category-balanced top-`n` selection.
///
/// 1. stable sort by final score
/// 2. knowledge / personality / other buckets (K+P candidates sit in both
///    primary buckets)
/// 3. round-robin K/P, a single bucket, or `n/2 + n/2` depending on mode
/// 4. dedup by identifier
/// 5. backfill from `other`
/// 6. stable re-sort and truncate
///
/// With only one of K/P required, candidates carrying just the other
/// primary tag are never selected, and the `Neither` path returns at most
/// `2 * (n / 2)` primary entries before backfill.
///
/// The `Both` interleave skips identifiers already taken and keeps going, so
/// a K+P item `kp` ahead of `k` and `p` at `n = 2` yields `[kp, k]`.
pub fn balance<'a>(
    mut scored: Vec<ScoredCandidate<'a>>,
    required: &BTreeSet<TestType>,
    n: usize,
) -> Vec<ScoredCandidate<'a>> {
    if n == 0 {
        return Vec::new();
    }

    sort_by_score_desc(&mut scored);

    let mut knowledge = Bucket::default();
    let mut personality = Bucket::default();
    let mut other = Bucket::default();

    for item in &scored {
        let is_k = item.candidate.has_test_type(TestType::Knowledge);
        let is_p = item.candidate.has_test_type(TestType::Personality);
        if is_k {
            knowledge.push(item);
        }
        if is_p {
            personality.push(item);
        }
        if !is_k && !is_p {
            other.push(item);
        }
    }

    let mut selected: Vec<&ScoredCandidate<'a>> = Vec::with_capacity(n);
    let mut seen: HashSet<&'a str> = HashSet::new();

    match BalanceMode::from_required(required) {
        BalanceMode::Both => {
            let rounds = knowledge.items.len().max(personality.items.len());
            'interleave: for i in 0..rounds {
                for bucket in [&knowledge, &personality] {
                    if selected.len() >= n {
                        break 'interleave;
                    }
                    if let Some(item) = bucket.items.get(i) {
                        push_unique(&mut selected, &mut seen, item);
                    }
                }
            }
        }
        BalanceMode::KnowledgeOnly => {
            for item in knowledge.items.iter().take(n) {
                push_unique(&mut selected, &mut seen, item);
            }
        }
        BalanceMode::PersonalityOnly => {
            for item in personality.items.iter().take(n) {
                push_unique(&mut selected, &mut seen, item);
            }
        }
        BalanceMode::Neither => {
            let half = n / 2;
            for item in knowledge
                .items
                .iter()
                .take(half)
                .chain(personality.items.iter().take(half))
            {
                push_unique(&mut selected, &mut seen, item);
            }
        }
    }

    for item in &other.items {
        if selected.len() >= n {
            break;
        }
        push_unique(&mut selected, &mut seen, item);
    }

    let mut result: Vec<ScoredCandidate<'a>> = selected.into_iter().cloned().collect();
    sort_by_score_desc(&mut result);
    result.truncate(n);

    debug_assert!(
        {
            let mut ids = HashSet::new();
            result.iter().all(|item| ids.insert(item.identifier()))
        },
        "balanced selection contains a duplicate identifier"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candidate;
    use proptest::prelude::*;
    use crate::ranking::scoring::ScoreBreakdown;

    fn candidate(id: &str, tags: &[TestType]) -> Candidate {
        Candidate {
            identifier: id.into(),
            name: id.into(),
            test_types: tags.iter().copied().collect(),
            ..Candidate::default()
        }
    }

    fn scored(candidate: &Candidate, score: f64) -> ScoredCandidate<'_> {
        ScoredCandidate {
            candidate,
            scores: ScoreBreakdown {
                semantic_score: score,
                keyword_score: 0.0,
                metadata_score: 0.0,
                final_score: score,
            },
        }
    }

    fn ids(result: &[ScoredCandidate<'_>]) -> Vec<String> {
        result.iter().map(|s| s.identifier().to_string()).collect()
    }

    fn kp() -> BTreeSet<TestType> {
        BTreeSet::from([TestType::Knowledge, TestType::Personality])
    }

    const K: TestType = TestType::Knowledge;
    const P: TestType = TestType::Personality;
    const A: TestType = TestType::Ability;

    #[test]
    fn mode_follows_required_categories() {
        assert_eq!(BalanceMode::from_required(&kp()), BalanceMode::Both);
        assert_eq!(
            BalanceMode::from_required(&BTreeSet::from([K, A])),
            BalanceMode::KnowledgeOnly
        );
        assert_eq!(
            BalanceMode::from_required(&BTreeSet::from([P])),
            BalanceMode::PersonalityOnly
        );
        assert_eq!(
            BalanceMode::from_required(&BTreeSet::from([A])),
            BalanceMode::Neither
        );
    }

    #[test]
    fn both_mode_interleaves_before_backfill() {
        let pool = [
            candidate("k1", &[K]),
            candidate("k2", &[K]),
            candidate("k3", &[K]),
            candidate("k4", &[K]),
            candidate("p1", &[P]),
            candidate("p2", &[P]),
        ];
        let scores = [0.9, 0.85, 0.8, 0.75, 0.3, 0.2];
        let input = pool.iter().zip(scores).map(|(c, s)| scored(c, s)).collect();

        let result = balance(input, &kp(), 4);
        assert_eq!(ids(&result), vec!["k1", "k2", "p1", "p2"]);
    }

    #[test]
    fn both_mode_skips_candidates_already_taken_from_other_bucket() {
        let pool = [
            candidate("kp", &[K, P]),
            candidate("k", &[K]),
            candidate("p", &[P]),
        ];
        let input = vec![scored(&pool[0], 0.9), scored(&pool[1], 0.5), scored(&pool[2], 0.4)];

        let result = balance(input, &kp(), 2);
        assert_eq!(ids(&result), vec!["kp", "k"]);

        let result = balance(
            vec![scored(&pool[0], 0.9), scored(&pool[1], 0.5), scored(&pool[2], 0.4)],
            &kp(),
            3,
        );
        assert_eq!(ids(&result), vec!["kp", "k", "p"]);
    }

    #[test]
    fn single_mode_backfills_from_other_only() {
        let pool = [
            candidate("k", &[K]),
            candidate("p", &[P]),
            candidate("a1", &[A]),
            candidate("a2", &[]),
        ];
        let input = vec![
            scored(&pool[0], 0.4),
            scored(&pool[1], 0.9),
            scored(&pool[2], 0.5),
            scored(&pool[3], 0.3),
        ];

        let result = balance(input, &BTreeSet::from([K]), 3);
        assert_eq!(ids(&result), vec!["a1", "k", "a2"]);
    }

    #[test]
    fn neither_mode_undercounts_for_odd_n() {
        let pool = [
            candidate("k1", &[K]),
            candidate("k2", &[K]),
            candidate("p1", &[P]),
            candidate("p2", &[P]),
        ];
        let input = pool
            .iter()
            .zip([0.9, 0.8, 0.7, 0.6])
            .map(|(c, s)| scored(c, s))
            .collect();

        let result = balance(input, &BTreeSet::from([A]), 3);
        assert_eq!(ids(&result), vec!["k1", "p1"]);
    }

    #[test]
    fn ties_keep_pool_order() {
        let pool = [
            candidate("first", &[K]),
            candidate("second", &[K]),
            candidate("third", &[K]),
        ];
        let input = pool.iter().map(|c| scored(c, 0.5)).collect();

        let result = balance(input, &BTreeSet::from([K]), 3);
        assert_eq!(ids(&result), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_identifiers_in_pool_collapse_to_first() {
        let pool = [
            candidate("dup", &[K]),
            candidate("dup", &[K]),
            candidate("x", &[]),
        ];
        let input = vec![scored(&pool[0], 0.8), scored(&pool[1], 0.7), scored(&pool[2], 0.1)];

        let result = balance(input, &kp(), 3);
        assert_eq!(ids(&result), vec!["dup", "x"]);
        assert_eq!(result[0].final_score(), 0.8);
    }

    #[test]
    fn zero_n_is_empty() {
        let pool = [candidate("k", &[K])];
        assert!(balance(vec![scored(&pool[0], 1.0)], &kp(), 0).is_empty());
    }

    fn tag_strategy() -> impl Strategy<Value = Vec<TestType>> {
        proptest::collection::vec(
            prop_oneof![Just(K), Just(P), Just(A), Just(TestType::Simulations)],
            0..3,
        )
    }

    fn pool_strategy() -> impl Strategy<Value = Vec<(u8, Vec<TestType>, u8)>> {
        // (identifier bucket, tags, score in tenths); small id range forces duplicates
        proptest::collection::vec((0u8..12, tag_strategy(), 0u8..=10), 0..24)
    }

    fn build_pool(raw: &[(u8, Vec<TestType>, u8)]) -> Vec<Candidate> {
        raw.iter()
            .map(|(id, tags, _)| candidate(&format!("c{id}"), tags))
            .collect()
    }

    fn build_scored<'a>(
        pool: &'a [Candidate],
        raw: &[(u8, Vec<TestType>, u8)],
    ) -> Vec<ScoredCandidate<'a>> {
        pool.iter()
            .zip(raw)
            .map(|(c, (_, _, score))| scored(c, f64::from(*score) / 10.0))
            .collect()
    }

    proptest! {
        #[test]
        fn output_is_unique_sorted_and_deterministic(
            raw in pool_strategy(),
            n in 0usize..12,
            required in proptest::collection::btree_set(
                prop_oneof![Just(K), Just(P), Just(A)],
                1..3,
            ),
        ) {
            let pool = build_pool(&raw);
            let first = balance(build_scored(&pool, &raw), &required, n);
            let second = balance(build_scored(&pool, &raw), &required, n);
            prop_assert_eq!(ids(&first), ids(&second));

            prop_assert!(first.len() <= n);
            let unique: HashSet<&str> = first.iter().map(|s| s.identifier()).collect();
            prop_assert_eq!(unique.len(), first.len());
            for pair in first.windows(2) {
                prop_assert!(pair[0].final_score() >= pair[1].final_score());
            }
        }

        #[test]
        fn both_mode_fills_to_distinct_count(raw in pool_strategy(), n in 0usize..12) {
            let pool = build_pool(&raw);
            let distinct: HashSet<&str> =
                pool.iter().map(|c| c.identifier.as_str()).collect();
            let result = balance(build_scored(&pool, &raw), &kp(), n);
            prop_assert_eq!(result.len(), n.min(distinct.len()));
        }

        #[test]
        fn both_mode_covers_each_primary_bucket(raw in pool_strategy(), n in 2usize..12) {
            let pool: Vec<Candidate> = raw
                .iter()
                .enumerate()
                .map(|(i, (_, tags, _))| candidate(&format!("c{i}"), tags))
                .collect();
            let result = balance(build_scored(&pool, &raw), &kp(), n);
            for tag in [K, P] {
                if pool.iter().any(|c| c.has_test_type(tag)) {
                    prop_assert!(result.iter().any(|s| s.candidate.has_test_type(tag)));
                }
            }
        }
    }
}
