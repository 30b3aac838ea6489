use serde::{Deserialize, Serialize};

/// How tied scores translate into leaderboard positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingScheme {
    /// Ties share a rank and the next distinct score takes the following
    /// integer: 1, 1, 2.
    #[default]
    Dense,
    /// Ties share a rank and the following ranks skip the tied positions:
    /// 1, 1, 3.
    Competition,
}

/// Compute the rank of every score, highest score first.
///
/// The returned vector is index-aligned with `scores`; input order does not
/// need to be sorted. Ranks start at 1.
pub fn assign_ranks(scores: &[i32], scheme: RankingScheme) -> Vec<i32> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]));

    let mut ranks = vec![0; scores.len()];
    let mut rank = 0;
    let mut previous: Option<i32> = None;

    for (position, &idx) in order.iter().enumerate() {
        let score = scores[idx];
        if previous != Some(score) {
            rank = match scheme {
                RankingScheme::Dense => rank + 1,
                RankingScheme::Competition => position as i32 + 1,
            };
            previous = Some(score);
        }
        ranks[idx] = rank;
    }

    ranks
}
