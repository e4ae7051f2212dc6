//! Deduplication and ranking of per-provider result lists.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::media::{DedupKey, MediaResult};

/// Successful results from one provider, tagged with its registration data.
#[derive(Debug, Clone)]
pub(crate) struct ProviderBatch {
    pub priority: u32,
    pub sequence: u64,
    pub results: Vec<MediaResult>,
}

/// Where a result came from: (priority, registration sequence, position).
type Provenance = (u32, u64, usize);

#[derive(Debug)]
struct Ranked {
    result: MediaResult,
    provenance: Provenance,
}

/// Merge provider batches into one ranked list.
///
/// Results sharing a [`DedupKey`] collapse to the one with the smallest
/// provenance; loser metadata is discarded. The output only depends on batch
/// contents, never on batch order.
pub(crate) fn merge(batches: Vec<ProviderBatch>, query: &str) -> Vec<MediaResult> {
    let mut winners: HashMap<DedupKey, Ranked> = HashMap::new();

    for batch in batches {
        for (position, result) in batch.results.into_iter().enumerate() {
            let candidate = Ranked {
                provenance: (batch.priority, batch.sequence, position),
                result,
            };
            match winners.get_mut(&candidate.result.dedup_key()) {
                Some(existing) if candidate.provenance < existing.provenance => {
                    *existing = candidate;
                }
                Some(_) => {}
                None => {
                    winners.insert(candidate.result.dedup_key(), candidate);
                }
            }
        }
    }

    let use_score = !query.trim().is_empty();
    let mut ranked: Vec<Ranked> = winners.into_values().collect();
    ranked.sort_by(|a, b| compare(a, b, use_score));
    ranked.into_iter().map(|r| r.result).collect()
}

fn compare(a: &Ranked, b: &Ranked, use_score: bool) -> Ordering {
    let by_score = if use_score {
        match (a.result.score, b.result.score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    } else {
        Ordering::Equal
    };

    let by_year = match (a.result.year_number(), b.result.year_number()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_score
        .then(by_year)
        .then_with(|| {
            a.result
                .title
                .to_lowercase()
                .cmp(&b.result.title.to_lowercase())
        })
        .then_with(|| a.result.title.cmp(&b.result.title))
        .then(a.provenance.cmp(&b.provenance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaType;
    use std::collections::HashSet;

    fn item(provider: &str, title: &str, media_type: MediaType, year: Option<&str>) -> MediaResult {
        let mut r = MediaResult::new(provider, title, title, media_type);
        if let Some(y) = year {
            r = r.with_year(y);
        }
        r
    }

    fn batch(priority: u32, sequence: u64, results: Vec<MediaResult>) -> ProviderBatch {
        ProviderBatch {
            priority,
            sequence,
            results,
        }
    }

    fn titles(results: &[MediaResult]) -> Vec<&str> {
        results.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_lowest_priority_wins_duplicate() {
        let a = batch(
            2,
            0,
            vec![item("a", "Dune", MediaType::Book, None).with_metadata("from", "a")],
        );
        let b = batch(1, 1, vec![item("b", "dune ", MediaType::Book, None)]);

        let merged = merge(vec![a, b], "dune");
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].provider_id, "b");
        // Loser metadata is not carried over
        assert!(merged[0].metadata.is_empty());
    }

    #[test]
    fn test_equal_priority_falls_back_to_registration_order() {
        let first = batch(5, 0, vec![item("first", "Dune", MediaType::Book, None)]);
        let second = batch(5, 1, vec![item("second", "Dune", MediaType::Book, None)]);

        let merged = merge(vec![second, first], "");
        assert_eq!(merged[0].provider_id, "first");
    }

    #[test]
    fn test_same_title_different_type_kept() {
        let merged = merge(
            vec![batch(
                1,
                0,
                vec![
                    item("a", "Dune", MediaType::Book, Some("1965")),
                    item("a", "Dune", MediaType::Movie, Some("2021")),
                ],
            )],
            "",
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_no_duplicate_keys_in_output() {
        let merged = merge(
            vec![
                batch(
                    1,
                    0,
                    vec![
                        item("a", "X", MediaType::Movie, None),
                        item("a", "x", MediaType::Movie, None),
                    ],
                ),
                batch(
                    1,
                    1,
                    vec![
                        item("b", " X ", MediaType::Movie, None),
                        item("b", "Y", MediaType::Show, None),
                    ],
                ),
            ],
            "",
        );
        let keys: HashSet<_> = merged.iter().map(|r| r.dedup_key()).collect();
        assert_eq!(keys.len(), merged.len());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_rank_by_year_then_title() {
        let merged = merge(
            vec![batch(
                1,
                0,
                vec![
                    item("a", "b title", MediaType::Movie, Some("2000")),
                    item("a", "Unknown Year", MediaType::Movie, None),
                    item("a", "Newest", MediaType::Movie, Some("2020")),
                    item("a", "A title", MediaType::Movie, Some("2000")),
                    item("a", "Circa", MediaType::Movie, Some("circa 1990")),
                ],
            )],
            "",
        );
        assert_eq!(
            titles(&merged),
            vec!["Newest", "A title", "b title", "Circa", "Unknown Year"]
        );
    }

    #[test]
    fn test_score_ranks_first_for_non_empty_query() {
        let results = vec![
            item("a", "Old", MediaType::Movie, Some("1980")),
            item("a", "Scored Low", MediaType::Movie, Some("1990")).with_score(0.2),
            item("a", "Scored High", MediaType::Movie, Some("1970")).with_score(0.9),
            item("a", "New", MediaType::Movie, Some("2020")),
        ];

        let merged = merge(vec![batch(1, 0, results.clone())], "query");
        assert_eq!(titles(&merged), vec!["Scored High", "Scored Low", "New", "Old"]);

        // Browse ignores scores
        let merged = merge(vec![batch(1, 0, results)], "");
        assert_eq!(titles(&merged), vec!["New", "Scored Low", "Old", "Scored High"]);
    }

    #[test]
    fn test_batch_order_does_not_change_output() {
        let batches = vec![
            batch(
                3,
                0,
                vec![
                    item("a", "Dune", MediaType::Book, Some("1965")),
                    item("a", "Alien", MediaType::Movie, Some("1979")),
                ],
            ),
            batch(
                1,
                1,
                vec![
                    item("b", "Dune", MediaType::Book, Some("1965")),
                    item("b", "Heat", MediaType::Movie, Some("1995")),
                ],
            ),
            batch(
                2,
                2,
                vec![
                    item("c", "Alien", MediaType::Movie, Some("1979")),
                    item("c", "Arrival", MediaType::Movie, Some("2016")),
                ],
            ),
        ];

        let expected = merge(batches.clone(), "");
        let mut reversed = batches.clone();
        reversed.reverse();
        assert_eq!(merge(reversed, ""), expected);

        let rotated = vec![batches[1].clone(), batches[2].clone(), batches[0].clone()];
        assert_eq!(merge(rotated, ""), expected);

        let providers: Vec<_> = expected.iter().map(|r| r.provider_id.as_str()).collect();
        assert_eq!(titles(&expected), vec!["Arrival", "Heat", "Alien", "Dune"]);
        assert_eq!(providers, vec!["c", "b", "c", "b"]);
    }

    #[test]
    fn test_empty_batches() {
        assert!(merge(Vec::new(), "x").is_empty());
        assert!(merge(vec![batch(1, 0, Vec::new())], "x").is_empty());
    }
}
