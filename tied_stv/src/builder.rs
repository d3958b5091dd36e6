pub use crate::config::*;

use std::collections::BTreeSet;

/// A builder for assembling an election from raw identifiers.
///
/// Every ballot is checked when it is added, so that the resulting election can be
/// tabulated directly.
///
/// ```
/// use tied_stv::builder::Builder;
/// # use tied_stv::VotingErrors;
///
/// let mut builder = Builder::new().candidates(&[1, 2, 3])?;
///
/// builder.add_ballot(3, &[vec![1], vec![2, 3]])?;
/// builder.add_ballot(2, &[vec![3]])?;
/// let election = builder.build()?;
/// let result = tied_stv::tabulate(&election.candidates, &election.ballots)?;
/// assert_eq!(result.winners, vec![tied_stv::CandidateId(1)]);
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Option<Vec<CandidateId>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _candidates: None,
            _ballots: Vec::new(),
        }
    }

    /// Declares the candidates. If never called, the candidates are the ones found in the ballots.
    pub fn candidates(self, ids: &[u32]) -> Result<Builder, VotingErrors> {
        let mut seen: BTreeSet<u32> = BTreeSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(VotingErrors::DuplicateDeclaredCandidate(CandidateId(*id)));
            }
        }
        Ok(Builder {
            _candidates: Some(seen.into_iter().map(CandidateId).collect()),
            _ballots: Vec::new(),
        })
    }

    /// Adds a ballot type.
    ///
    /// count: the number of voters casting this ranking. It must be positive.
    /// groups: the tie groups, the most preferred first.
    pub fn add_ballot(&mut self, count: u64, groups: &[Vec<u32>]) -> Result<(), VotingErrors> {
        self.add_ballot_2(&Ballot {
            count,
            ranking: Ranking::from_ids(groups),
        })
    }

    pub fn add_ballot_2(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        let ballot_idx = self._ballots.len();
        if ballot.count == 0 {
            return Err(VotingErrors::ZeroWeightBallot { ballot: ballot_idx });
        }
        let mut seen: BTreeSet<CandidateId> = BTreeSet::new();
        for g in ballot.ranking.groups.iter() {
            if g.is_empty() {
                return Err(VotingErrors::EmptyTieGroup { ballot: ballot_idx });
            }
            for cid in g.members() {
                if let Some(declared) = self._candidates.as_deref() {
                    if !declared.contains(cid) {
                        return Err(VotingErrors::UndeclaredCandidate {
                            ballot: ballot_idx,
                            candidate: *cid,
                        });
                    }
                }
                if !seen.insert(*cid) {
                    return Err(VotingErrors::DuplicateRankedCandidate {
                        ballot: ballot_idx,
                        candidate: *cid,
                    });
                }
            }
        }
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn build(self) -> Result<Election, VotingErrors> {
        let candidates: Vec<CandidateId> = match self._candidates {
            Some(cands) => cands,
            None => {
                let inferred: BTreeSet<CandidateId> = self
                    ._ballots
                    .iter()
                    .flat_map(|b| b.ranking.flatten())
                    .collect();
                inferred.into_iter().collect()
            }
        };
        crate::validate(&candidates, &self._ballots)?;
        Ok(Election {
            candidates,
            ballots: self._ballots,
        })
    }
}
