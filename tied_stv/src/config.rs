// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// Two scores closer than this are considered equal when looking for the
/// lowest scorers of a round.
///
/// Shares of split ballots accumulate floating-point error, this absorbs it.
pub const SCORE_TOLERANCE: f64 = 1e-9;

/// The identifier of a candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of candidates ranked equally at one preference level.
///
/// The members keep the order in which they were listed by the voter. This order
/// carries no preference, but it is used when a ranking gets flattened.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TieGroup {
    members: Vec<CandidateId>,
    lookup: HashSet<CandidateId>,
}

impl TieGroup {
    /// Builds a group. Repeated members are only kept at their first occurrence.
    pub fn new(members: &[CandidateId]) -> TieGroup {
        let mut lookup: HashSet<CandidateId> = HashSet::new();
        let mut ordered: Vec<CandidateId> = Vec::new();
        for cid in members {
            if lookup.insert(*cid) {
                ordered.push(*cid);
            }
        }
        TieGroup {
            members: ordered,
            lookup,
        }
    }

    pub fn singleton(cid: CandidateId) -> TieGroup {
        TieGroup::new(&[cid])
    }

    pub fn contains(&self, cid: &CandidateId) -> bool {
        self.lookup.contains(cid)
    }

    pub fn members(&self) -> &[CandidateId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The preferences of a voter: a sequence of tie groups, the first one being the
/// most preferred.
///
/// Candidates do not need to all be ranked.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ranking {
    pub groups: Vec<TieGroup>,
}

impl Ranking {
    /// A ranking without ties: one candidate per group, in the given order.
    pub fn strict(order: &[CandidateId]) -> Ranking {
        Ranking {
            groups: order.iter().map(|cid| TieGroup::singleton(*cid)).collect(),
        }
    }

    /// Convenience constructor from raw identifiers, one inner list per group.
    pub fn from_ids(groups: &[Vec<u32>]) -> Ranking {
        Ranking {
            groups: groups
                .iter()
                .map(|g| {
                    let cids: Vec<CandidateId> = g.iter().map(|x| CandidateId(*x)).collect();
                    TieGroup::new(&cids)
                })
                .collect(),
        }
    }

    pub fn to_ids(&self) -> Vec<Vec<u32>> {
        self.groups
            .iter()
            .map(|g| g.members().iter().map(|cid| cid.0).collect())
            .collect()
    }

    /// The index of the group containing this candidate, if ranked.
    pub fn position(&self, cid: &CandidateId) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(cid))
    }

    /// All the ranked candidates: groups in order, members in listing order.
    /// A candidate is only reported once.
    pub fn flatten(&self) -> Vec<CandidateId> {
        let mut seen: HashSet<CandidateId> = HashSet::new();
        let mut res: Vec<CandidateId> = Vec::new();
        for g in self.groups.iter() {
            for cid in g.members() {
                if seen.insert(*cid) {
                    res.push(*cid);
                }
            }
        }
        res
    }
}

/// A ballot type: all the voters who cast exactly the same ranking.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub count: u64,
    pub ranking: Ranking,
}

/// The full input of an election.
///
/// The candidates are sorted by identifier and unique.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub candidates: Vec<CandidateId>,
    pub ballots: Vec<Ballot>,
}

// ******** Output data structures *********

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The score of each candidate still running at the start of the round,
    /// by increasing identifier.
    pub scores: Vec<(CandidateId, f64)>,
    /// The weight of the ballots that did not rank any running candidate.
    pub exhausted: f64,
    pub eliminated: Vec<CandidateId>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TabulationResult {
    /// The candidates removed together in the last round.
    pub winners: Vec<CandidateId>,
    /// The groups of candidates removed in each round, in removal order.
    pub elimination_order: Vec<Vec<CandidateId>>,
    pub round_stats: Vec<RoundStats>,
}

/// The smallest coalition found by the manipulation search.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ManipulationResult {
    /// The unique winner when all voters are sincere.
    pub original_winner: CandidateId,
    /// Number of voters switching to the strategic ranking.
    pub coalition_size: u64,
    /// The candidate that wins alone after the switch.
    pub target: CandidateId,
    /// Index of the ballot type the coalition is taken from.
    pub type_index: usize,
    /// The sincere ranking of that ballot type.
    pub sincere_ranking: Ranking,
    /// The ranking submitted by all the members of the coalition.
    pub strategic_ranking: Ranking,
    /// The elimination order after the switch.
    pub elimination_order: Vec<Vec<CandidateId>>,
}

/// How the manipulation search visits the combinations.
///
/// Both modes return the same result.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum SearchMode {
    #[default]
    Sequential,
    /// Each pair of target and ballot type is examined on the rayon thread pool.
    Parallel,
}

/// Errors for input that breaks the invariants of an election.
///
/// The ballot index refers to the position of the ballot type in the input.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    ZeroWeightBallot {
        ballot: usize,
    },
    UndeclaredCandidate {
        ballot: usize,
        candidate: CandidateId,
    },
    EmptyTieGroup {
        ballot: usize,
    },
    DuplicateRankedCandidate {
        ballot: usize,
        candidate: CandidateId,
    },
    DuplicateDeclaredCandidate(CandidateId),
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::ZeroWeightBallot { ballot } => {
                write!(f, "ballot type {} has a zero weight", ballot)
            }
            VotingErrors::UndeclaredCandidate { ballot, candidate } => write!(
                f,
                "ballot type {} ranks candidate {} which is not declared",
                ballot, candidate
            ),
            VotingErrors::EmptyTieGroup { ballot } => {
                write!(f, "ballot type {} contains an empty tie group", ballot)
            }
            VotingErrors::DuplicateRankedCandidate { ballot, candidate } => write!(
                f,
                "ballot type {} ranks candidate {} more than once",
                ballot, candidate
            ),
            VotingErrors::DuplicateDeclaredCandidate(cid) => {
                write!(f, "candidate {} is declared more than once", cid)
            }
        }
    }
}
