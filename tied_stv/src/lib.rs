mod config;
pub mod builder;
pub mod manipulation;
pub mod manual;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::manipulation::{
    apply_coalition, build_strategic_ranking, find_smallest_coalition,
    find_smallest_coalition_with, prefers,
};

// **** Private structures ****

type RoundId = u32;

// The scores of one round, along with the weight of the exhausted ballots.
#[derive(PartialEq, Debug, Clone)]
struct RoundTally {
    scores: HashMap<CandidateId, f64>,
    exhausted: f64,
}

fn compute_tally(remaining: &HashSet<CandidateId>, ballots: &[Ballot]) -> RoundTally {
    // Initialize the tally with the remaining candidates to capture all the candidates who do
    // not even have a vote.
    let mut scores: HashMap<CandidateId, f64> =
        remaining.iter().map(|cid| (*cid, 0.0)).collect();
    let mut exhausted = 0.0;
    for b in ballots.iter() {
        // The first group that still has a running candidate takes the whole weight.
        let top_group: Option<Vec<CandidateId>> = b.ranking.groups.iter().find_map(|g| {
            let running: Vec<CandidateId> = g
                .members()
                .iter()
                .filter(|cid| remaining.contains(*cid))
                .cloned()
                .collect();
            if running.is_empty() {
                None
            } else {
                Some(running)
            }
        });
        match top_group {
            Some(running) => {
                let share = b.count as f64 / running.len() as f64;
                for cid in running {
                    *scores.entry(cid).or_insert(0.0) += share;
                }
            }
            None => {
                exhausted += b.count as f64;
            }
        }
    }
    RoundTally { scores, exhausted }
}

/// Computes the score of each remaining candidate for one round.
///
/// Each ballot type gives its weight to the first of its tie groups that still
/// contains a remaining candidate, split evenly between the remaining members of
/// that group. Ballots without any remaining candidate are exhausted and give
/// nothing. Every remaining candidate has an entry, possibly zero.
pub fn score(remaining: &HashSet<CandidateId>, ballots: &[Ballot]) -> HashMap<CandidateId, f64> {
    compute_tally(remaining, ballots).scores
}

/// Checks that the ballots only rank declared candidates and have a positive weight.
pub fn validate(candidates: &[CandidateId], ballots: &[Ballot]) -> Result<(), VotingErrors> {
    let mut declared: HashSet<CandidateId> = HashSet::new();
    for cid in candidates {
        if !declared.insert(*cid) {
            return Err(VotingErrors::DuplicateDeclaredCandidate(*cid));
        }
    }
    for (idx, b) in ballots.iter().enumerate() {
        if b.count == 0 {
            return Err(VotingErrors::ZeroWeightBallot { ballot: idx });
        }
        let mut seen: HashSet<CandidateId> = HashSet::new();
        for g in b.ranking.groups.iter() {
            if g.is_empty() {
                return Err(VotingErrors::EmptyTieGroup { ballot: idx });
            }
            for cid in g.members() {
                if !declared.contains(cid) {
                    return Err(VotingErrors::UndeclaredCandidate {
                        ballot: idx,
                        candidate: *cid,
                    });
                }
                if !seen.insert(*cid) {
                    return Err(VotingErrors::DuplicateRankedCandidate {
                        ballot: idx,
                        candidate: *cid,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Runs the elimination rule until no candidate is left.
///
/// Arguments:
/// * `candidates` the candidates of this election
/// * `ballots` the ballot types. Rankings may contain ties and may not rank all the candidates.
///
/// In every round, all the candidates with the lowest score (up to `SCORE_TOLERANCE`)
/// are removed together. The winners are the candidates removed in the last round.
pub fn tabulate(
    candidates: &[CandidateId],
    ballots: &[Ballot],
) -> Result<TabulationResult, VotingErrors> {
    info!(
        "tabulate: processing {:?} ballot types, {:?} candidates",
        ballots.len(),
        candidates.len()
    );
    validate(candidates, ballots)?;
    let res = run_tabulation(candidates, ballots, true);
    info!(
        "tabulate: winners: {:?} elimination order: {:?}",
        res.winners, res.elimination_order
    );
    Ok(res)
}

// The input is expected to be valid at this point.
// The round statistics are only collected when asked, the manipulation search does not need them.
pub(crate) fn run_tabulation(
    candidates: &[CandidateId],
    ballots: &[Ballot],
    collect_stats: bool,
) -> TabulationResult {
    let mut remaining: HashSet<CandidateId> = candidates.iter().cloned().collect();
    let mut elimination_order: Vec<Vec<CandidateId>> = Vec::new();
    let mut round_stats: Vec<RoundStats> = Vec::new();

    while !remaining.is_empty() {
        let round_id: RoundId = (elimination_order.len() + 1) as u32;
        let tally = compute_tally(&remaining, ballots);
        debug!(
            "run_tabulation: round {:?} tally: {:?} exhausted: {:?}",
            round_id, tally.scores, tally.exhausted
        );

        let min_score: f64 = remaining
            .iter()
            .map(|cid| tally.scores.get(cid).cloned().unwrap_or(0.0))
            .fold(f64::INFINITY, f64::min);

        let mut losers: Vec<CandidateId> = remaining
            .iter()
            .filter(|cid| {
                let s = tally.scores.get(*cid).cloned().unwrap_or(0.0);
                (s - min_score).abs() < SCORE_TOLERANCE
            })
            .cloned()
            .collect();
        losers.sort();
        // Invariant: the number of candidates decreases at every round.
        assert!(!losers.is_empty(), "No candidate eliminated");
        debug!("run_tabulation: round {:?} eliminated: {:?}", round_id, losers);

        for cid in losers.iter() {
            remaining.remove(cid);
        }

        if collect_stats {
            let mut scores: Vec<(CandidateId, f64)> =
                tally.scores.iter().map(|(cid, s)| (*cid, *s)).collect();
            scores.sort_by_key(|(cid, _)| *cid);
            round_stats.push(RoundStats {
                round: round_id,
                scores,
                exhausted: tally.exhausted,
                eliminated: losers.clone(),
            });
        }
        elimination_order.push(losers);
    }

    TabulationResult {
        winners: elimination_order.last().cloned().unwrap_or_default(),
        elimination_order,
        round_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cids(ids: &[u32]) -> Vec<CandidateId> {
        ids.iter().map(|x| CandidateId(*x)).collect()
    }

    fn ballot(count: u64, groups: &[Vec<u32>]) -> Ballot {
        Ballot {
            count,
            ranking: Ranking::from_ids(groups),
        }
    }

    fn three_way() -> Vec<Ballot> {
        vec![
            ballot(3, &[vec![1], vec![2], vec![3]]),
            ballot(2, &[vec![2], vec![1], vec![3]]),
            ballot(1, &[vec![3], vec![1], vec![2]]),
        ]
    }

    #[test]
    fn tie_group_splits_weight() {
        let remaining: HashSet<CandidateId> = cids(&[1, 2]).into_iter().collect();
        let s = score(&remaining, &[ballot(10, &[vec![1, 2]])]);
        assert_eq!(s.get(&CandidateId(1)), Some(&5.0));
        assert_eq!(s.get(&CandidateId(2)), Some(&5.0));
    }

    #[test]
    fn tie_group_only_splits_between_remaining() {
        let remaining: HashSet<CandidateId> = cids(&[2, 3]).into_iter().collect();
        let s = score(&remaining, &[ballot(9, &[vec![1, 2], vec![3]])]);
        assert_eq!(s.get(&CandidateId(2)), Some(&9.0));
        assert_eq!(s.get(&CandidateId(3)), Some(&0.0));
        assert_eq!(s.get(&CandidateId(1)), None);
    }

    #[test]
    fn exhausted_ballot_gives_nothing() {
        let remaining: HashSet<CandidateId> = cids(&[3]).into_iter().collect();
        let ballots = vec![ballot(4, &[vec![1], vec![2]]), ballot(2, &[vec![3]])];
        let tally = compute_tally(&remaining, &ballots);
        assert_eq!(tally.scores.get(&CandidateId(3)), Some(&2.0));
        assert_eq!(tally.exhausted, 4.0);
    }

    #[test]
    fn worked_example() {
        init();
        let res = tabulate(&cids(&[1, 2, 3]), &three_way()).unwrap();
        assert_eq!(res.elimination_order, vec![cids(&[3]), cids(&[2]), cids(&[1])]);
        assert_eq!(res.winners, cids(&[1]));
        assert_eq!(res.round_stats.len(), 3);
        assert_eq!(
            res.round_stats[0].scores,
            vec![
                (CandidateId(1), 3.0),
                (CandidateId(2), 2.0),
                (CandidateId(3), 1.0)
            ]
        );
        assert_eq!(
            res.round_stats[1].scores,
            vec![(CandidateId(1), 4.0), (CandidateId(2), 2.0)]
        );
    }

    #[test]
    fn empty_election() {
        let res = tabulate(&[], &[]).unwrap();
        assert!(res.winners.is_empty());
        assert!(res.elimination_order.is_empty());
        assert!(res.round_stats.is_empty());
    }

    #[test]
    fn single_candidate_wins_immediately() {
        let res = tabulate(&cids(&[7]), &[ballot(5, &[vec![7]]), ballot(2, &[])]).unwrap();
        assert_eq!(res.winners, cids(&[7]));
        assert_eq!(res.elimination_order, vec![cids(&[7])]);
        assert_eq!(res.round_stats[0].scores, vec![(CandidateId(7), 5.0)]);
        assert_eq!(res.round_stats[0].exhausted, 2.0);
    }

    #[test]
    fn complete_tie_makes_joint_winners() {
        let ballots = vec![ballot(2, &[vec![1]]), ballot(2, &[vec![2]]), ballot(2, &[vec![3]])];
        let res = tabulate(&cids(&[1, 2, 3]), &ballots).unwrap();
        assert_eq!(res.elimination_order, vec![cids(&[1, 2, 3])]);
        assert_eq!(res.winners, cids(&[1, 2, 3]));
    }

    #[test]
    fn co_lowest_are_removed_together() {
        let ballots = vec![
            ballot(5, &[vec![1]]),
            ballot(2, &[vec![2], vec![1]]),
            ballot(2, &[vec![3], vec![4]]),
        ];
        let res = tabulate(&cids(&[1, 2, 3, 4]), &ballots).unwrap();
        // 4 has no vote, then 2 and 3 tie, then 1 is alone.
        assert_eq!(
            res.elimination_order,
            vec![cids(&[4]), cids(&[2, 3]), cids(&[1])]
        );
        assert_eq!(res.winners, cids(&[1]));
    }

    #[test]
    fn tolerance_absorbs_share_rounding() {
        // Ten shares of 0.1 add up to slightly less than 1.0.
        let group: Vec<u32> = (1..=10).collect();
        let mut ballots: Vec<Ballot> = (0..10).map(|_| ballot(1, &[group.clone()])).collect();
        ballots.push(ballot(1, &[vec![11]]));
        let candidates: Vec<CandidateId> = (1..=11).map(CandidateId).collect();
        let res = tabulate(&candidates, &ballots).unwrap();
        assert_eq!(res.elimination_order, vec![candidates.clone()]);
        assert_eq!(res.winners, candidates);
    }

    #[test]
    fn elimination_order_covers_all_candidates() {
        let ballots = vec![
            ballot(4, &[vec![2, 5], vec![1]]),
            ballot(3, &[vec![3], vec![4], vec![2]]),
            ballot(1, &[vec![6]]),
            ballot(2, &[vec![1], vec![3, 6]]),
        ];
        let candidates = cids(&[1, 2, 3, 4, 5, 6]);
        let res = tabulate(&candidates, &ballots).unwrap();
        let mut seen: Vec<CandidateId> = res.elimination_order.concat();
        seen.sort();
        assert_eq!(seen, candidates);
        assert!(res.elimination_order.len() <= candidates.len());
        assert!(res.elimination_order.iter().all(|g| !g.is_empty()));
        assert_eq!(Some(&res.winners), res.elimination_order.last());
    }

    #[test]
    fn scores_are_conserved() {
        let ballots = vec![
            ballot(4, &[vec![2, 5], vec![1]]),
            ballot(3, &[vec![3], vec![4], vec![2]]),
            ballot(1, &[vec![6]]),
            ballot(2, &[vec![1], vec![3, 6]]),
        ];
        let total: f64 = ballots.iter().map(|b| b.count as f64).sum();
        let res = tabulate(&cids(&[1, 2, 3, 4, 5, 6]), &ballots).unwrap();
        for rs in res.round_stats.iter() {
            let s: f64 = rs.scores.iter().map(|(_, x)| *x).sum();
            assert!((s + rs.exhausted - total).abs() < 1e-9, "round {:?}", rs);
        }
    }

    #[test]
    fn rejects_malformed_ballots() {
        let candidates = cids(&[1, 2]);
        assert_eq!(
            tabulate(&candidates, &[ballot(0, &[vec![1]])]),
            Err(VotingErrors::ZeroWeightBallot { ballot: 0 })
        );
        assert_eq!(
            tabulate(&candidates, &[ballot(1, &[vec![1]]), ballot(1, &[vec![3]])]),
            Err(VotingErrors::UndeclaredCandidate {
                ballot: 1,
                candidate: CandidateId(3)
            })
        );
        assert_eq!(
            tabulate(&candidates, &[ballot(1, &[vec![1], vec![2, 1]])]),
            Err(VotingErrors::DuplicateRankedCandidate {
                ballot: 0,
                candidate: CandidateId(1)
            })
        );
        assert_eq!(
            tabulate(&candidates, &[ballot(1, &[vec![]])]),
            Err(VotingErrors::EmptyTieGroup { ballot: 0 })
        );
        assert_eq!(
            tabulate(&cids(&[1, 1]), &[]),
            Err(VotingErrors::DuplicateDeclaredCandidate(CandidateId(1)))
        );
    }
}
