//! Search for the smallest group of like-minded voters that can change the winner
//! of an election by all submitting the same insincere ranking.
//!
//! The coalition is always taken from a single ballot type. Its members must all
//! strictly prefer the new winner to the sincere winner, and they all submit a
//! ranking without ties that puts the new winner first and the sincere winner last.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::*;
use crate::{run_tabulation, tabulate};

/// True if `a` is in a strictly better tie group than `b` in this ranking.
///
/// An unranked candidate is worse than any ranked one. Two unranked candidates, or
/// two candidates of the same group, are not preferred to each other.
pub fn prefers(ranking: &Ranking, a: &CandidateId, b: &CandidateId) -> bool {
    match (ranking.position(a), ranking.position(b)) {
        (Some(pa), Some(pb)) => pa < pb,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Builds the ranking submitted by a coalition.
///
/// The original ranking is flattened (ties resolved in listing order) and completed
/// with the unranked candidates in increasing identifier order. Then the target is
/// moved to the top and the incumbent to the bottom.
pub fn build_strategic_ranking(
    ranking: &Ranking,
    target: CandidateId,
    incumbent: CandidateId,
    candidates: &[CandidateId],
) -> Ranking {
    let mut flat: Vec<CandidateId> = ranking.flatten();

    let mut canonical: Vec<CandidateId> = candidates.to_vec();
    canonical.sort();
    for cid in canonical {
        if !flat.contains(&cid) {
            flat.push(cid);
        }
    }

    flat.retain(|cid| *cid != target);
    flat.insert(0, target);
    flat.retain(|cid| *cid != incumbent);
    flat.push(incumbent);

    Ranking::strict(&flat)
}

/// Moves `k` voters of the ballot type at `type_index` to the strategic ranking.
///
/// The strategic ballots are appended as a new ballot type. The source ballot type
/// disappears when all its voters are moved.
///
/// Panics if `k` is zero or larger than the weight of the ballot type.
pub fn apply_coalition(
    ballots: &[Ballot],
    type_index: usize,
    k: u64,
    strategic: &Ranking,
) -> Vec<Ballot> {
    assert!(
        k >= 1 && k <= ballots[type_index].count,
        "Coalition of size {} for a ballot type of weight {}",
        k,
        ballots[type_index].count
    );
    let mut res: Vec<Ballot> = Vec::with_capacity(ballots.len() + 1);
    for (idx, b) in ballots.iter().enumerate() {
        if idx == type_index {
            if b.count > k {
                res.push(Ballot {
                    count: b.count - k,
                    ranking: b.ranking.clone(),
                });
            }
        } else {
            res.push(b.clone());
        }
    }
    res.push(Ballot {
        count: k,
        ranking: strategic.clone(),
    });
    res
}

/// Finds the smallest coalition that makes another candidate the only winner.
///
/// Returns `None` if the sincere election does not have a unique winner, or if no
/// coalition can change the outcome. Among coalitions of the same size, the first
/// one found wins: targets by increasing identifier, then ballot types in input order.
pub fn find_smallest_coalition(
    candidates: &[CandidateId],
    ballots: &[Ballot],
) -> Result<Option<ManipulationResult>, VotingErrors> {
    find_smallest_coalition_with(candidates, ballots, SearchMode::Sequential)
}

/// Same as [`find_smallest_coalition`], with a choice of search driver.
pub fn find_smallest_coalition_with(
    candidates: &[CandidateId],
    ballots: &[Ballot],
    mode: SearchMode,
) -> Result<Option<ManipulationResult>, VotingErrors> {
    let baseline = tabulate(candidates, ballots)?;
    let original_winner = match baseline.winners.as_slice() {
        [w] => *w,
        ws => {
            warn!(
                "find_smallest_coalition: the election has {} winners {:?}, the manipulation search needs a single winner",
                ws.len(),
                ws
            );
            return Ok(None);
        }
    };

    let mut targets: Vec<CandidateId> = candidates
        .iter()
        .filter(|cid| **cid != original_winner)
        .cloned()
        .collect();
    targets.sort();

    // The order of this list is the tie-break between coalitions of the same size.
    let combinations: Vec<(CandidateId, usize)> = targets
        .iter()
        .flat_map(|t| (0..ballots.len()).map(move |idx| (*t, idx)))
        .collect();
    info!(
        "find_smallest_coalition: winner {}, {} combinations to examine ({:?})",
        original_winner,
        combinations.len(),
        mode
    );

    let best = match mode {
        SearchMode::Sequential => {
            let mut best: Option<ManipulationResult> = None;
            for (target, type_index) in combinations {
                if let Some(r) =
                    search_combination(candidates, ballots, original_winner, target, type_index)
                {
                    let improves = match &best {
                        Some(b) => r.coalition_size < b.coalition_size,
                        None => true,
                    };
                    if improves {
                        best = Some(r);
                    }
                }
            }
            best
        }
        SearchMode::Parallel => combinations
            .par_iter()
            .enumerate()
            .filter_map(|(pos, (target, type_index))| {
                search_combination(candidates, ballots, original_winner, *target, *type_index)
                    .map(|r| (r.coalition_size, pos, r))
            })
            .min_by_key(|(k, pos, _)| (*k, *pos))
            .map(|(_, _, r)| r),
    };

    match &best {
        Some(r) => info!(
            "find_smallest_coalition: {} voters of ballot type {} can elect {}",
            r.coalition_size, r.type_index, r.target
        ),
        None => info!("find_smallest_coalition: no manipulating coalition"),
    }
    Ok(best)
}

// Tries all the coalition sizes for one target and one ballot type, smallest first.
fn search_combination(
    candidates: &[CandidateId],
    ballots: &[Ballot],
    original_winner: CandidateId,
    target: CandidateId,
    type_index: usize,
) -> Option<ManipulationResult> {
    let source = &ballots[type_index];
    if !prefers(&source.ranking, &target, &original_winner) {
        return None;
    }
    let strategic = build_strategic_ranking(&source.ranking, target, original_winner, candidates);
    debug!(
        "search_combination: target {} type {} strategic ranking {:?}",
        target,
        type_index,
        strategic.to_ids()
    );

    for k in 1..=source.count {
        let manipulated = apply_coalition(ballots, type_index, k, &strategic);
        let res = run_tabulation(candidates, &manipulated, false);
        if res.winners == [target] {
            debug!(
                "search_combination: target {} type {} succeeds with {} voters",
                target, type_index, k
            );
            return Some(ManipulationResult {
                original_winner,
                coalition_size: k,
                target,
                type_index,
                sincere_ranking: source.ranking.clone(),
                strategic_ranking: strategic,
                elimination_order: res.elimination_order,
            });
        }
    }
    None
}
