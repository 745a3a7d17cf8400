//! Reciprocal Rank Fusion: `score += weight / (k + rank)`, summed per item
//! across every leg that contributed it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shadowdb_core::constants::RRF_K;
use shadowdb_core::search::RankedHit;

/// A hit after fusion, before the recency boost and threshold filter are
/// applied.
#[derive(Debug, Clone)]
pub struct FusedHit {
    pub id: i64,
    pub content: String,
    pub title: Option<String>,
    pub category: String,
    pub created_at: Option<DateTime<Utc>>,
    pub score: f64,
}

/// One search leg's contribution: its hits and the weight applied to them.
pub struct Leg<'a> {
    pub hits: &'a [RankedHit],
    pub weight: f64,
}

impl<'a> Leg<'a> {
    pub fn new(hits: &'a [RankedHit], weight: f64) -> Self {
        Self { hits, weight }
    }
}

/// Fuse any number of ranked legs. Metadata for a given id is taken from
/// whichever leg first supplies it — legs earlier in `legs` win ties,
/// matching the order they're passed in.
pub fn fuse(legs: &[Leg<'_>]) -> Vec<FusedHit> {
    let mut scores: HashMap<i64, f64> = HashMap::new();
    let mut first_seen: HashMap<i64, &RankedHit> = HashMap::new();
    let mut order: Vec<i64> = Vec::new();

    for leg in legs {
        for hit in leg.hits {
            let contribution = leg.weight / (RRF_K + hit.rank as f64);
            let entry = scores.entry(hit.id).or_insert(0.0);
            *entry += contribution;

            if let std::collections::hash_map::Entry::Vacant(e) = first_seen.entry(hit.id) {
                e.insert(hit);
                order.push(hit.id);
            }
        }
    }

    order
        .into_iter()
        .map(|id| {
            let hit = first_seen[&id];
            FusedHit {
                id,
                content: hit.content.clone(),
                title: hit.title.clone(),
                category: hit.category.clone(),
                created_at: hit.created_at,
                score: scores[&id],
            }
        })
        .collect()
}

/// Recency boost: rank all hits with a known `created_at` newest-first,
/// 1-based, then add `recency_weight / (k + rr)` to their fused score.
/// Hits with no timestamp are left untouched.
pub fn apply_recency_boost(hits: &mut [FusedHit], recency_weight: f64) {
    let mut dated: Vec<usize> = hits
        .iter()
        .enumerate()
        .filter_map(|(i, h)| h.created_at.map(|_| i))
        .collect();

    dated.sort_by(|&a, &b| hits[b].created_at.cmp(&hits[a].created_at));

    for (rr, idx) in dated.into_iter().enumerate() {
        let rank = rr + 1;
        hits[idx].score += recency_weight / (RRF_K + rank as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: i64, rank: usize) -> RankedHit {
        RankedHit {
            id,
            content: format!("content-{id}"),
            title: None,
            category: "general".to_string(),
            created_at: None,
            rank,
            raw_score: 0.0,
        }
    }

    #[test]
    fn fuses_per_spec_worked_example() {
        let vector = vec![hit(1, 1), hit(2, 2)]; // A, B
        let text = vec![hit(2, 1), hit(3, 2)]; // B, C
        let fuzzy = vec![hit(3, 1)]; // C

        let legs = [
            Leg::new(&vector, 0.7),
            Leg::new(&text, 0.3),
            Leg::new(&fuzzy, 0.2),
        ];
        let mut fused = fuse(&legs);
        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

        let ids: Vec<i64> = fused.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let a_score = fused.iter().find(|h| h.id == 1).unwrap().score;
        assert!((a_score - 0.7 / 61.0).abs() < 1e-9);

        let b_score = fused.iter().find(|h| h.id == 2).unwrap().score;
        assert!((b_score - (0.7 / 62.0 + 0.3 / 61.0)).abs() < 1e-9);

        let c_score = fused.iter().find(|h| h.id == 3).unwrap().score;
        assert!((c_score - (0.3 / 62.0 + 0.2 / 61.0)).abs() < 1e-9);
    }

    #[test]
    fn single_vector_hit_at_rank_one_raises_score_by_exact_weight_over_61() {
        let vector = vec![hit(1, 1)];
        let legs = [Leg::new(&vector, 0.7)];
        let fused = fuse(&legs);
        assert!((fused[0].score - 0.7 / 61.0).abs() < 1e-9);
    }

    #[test]
    fn recency_boost_favors_newest() {
        let mut hits = vec![
            FusedHit {
                id: 1,
                content: String::new(),
                title: None,
                category: "general".to_string(),
                created_at: Some(Utc::now() - chrono::Duration::days(10)),
                score: 0.0,
            },
            FusedHit {
                id: 2,
                content: String::new(),
                title: None,
                category: "general".to_string(),
                created_at: Some(Utc::now()),
                score: 0.0,
            },
        ];
        apply_recency_boost(&mut hits, 0.15);
        assert!(hits[1].score > hits[0].score);
    }
}
