// ********* Input data structures ***********

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;

/// A preference value on a ballot. Higher means more preferred
/// (1 = worst, 10 = best for a ten-point ballot). A candidate that is not
/// ranked on a ballot counts as 0.
pub type Rank = u32;

/// A single vote: each candidate mapped to its preference rank.
///
/// A ballot does not need to rank every candidate.
pub type Ballot<C> = HashMap<C, Rank>;

// ******** Output data structures *********

/// The candidates that no one beats in a given round. It contains more than
/// one element only when the top of the round is tied.
pub type WinnerSet<C> = BTreeSet<C>;

/// The finish order, one tie-set per place.
///
/// `[{B}, {A, C}, {D}]` means B first, A and C tied for second, D third.
pub type FinishOrder<C> = Vec<WinnerSet<C>>;

/// A pairwise victory that survived the tie filter, with its tally.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairStats<C> {
    pub winner: C,
    pub loser: C,
    /// Number of ballots preferring the winner to the loser.
    pub strength: u64,
    /// Number of ballots preferring the loser to the winner.
    pub opposition: u64,
}

/// Statistics for one round of the finish order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats<C> {
    pub round: u32,
    pub winners: WinnerSet<C>,
    /// The (winner, loser) edges locked in while resolving this round, in
    /// the order they were accepted.
    pub locked: Vec<(C, C)>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedPairsResult<C> {
    pub winners: WinnerSet<C>,
    pub finish_order: FinishOrder<C>,
    /// All the non-tied pairs, in the order they are offered for lock-in.
    pub ranked_pairs: Vec<PairStats<C>>,
    pub round_stats: Vec<RoundStats<C>>,
}

/// Errors that prevent the algorithm from running.
///
/// They are all problems with the data provided by the caller and are
/// reported before any tally is computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    NoCandidates,
    NoVotes,
    DuplicateCandidates,
    /// A ballot given to a builder with declared candidates names someone
    /// who was not declared.
    UndeclaredCandidate(String),
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::NoCandidates => write!(f, "No candidates"),
            VotingErrors::NoVotes => write!(f, "No votes"),
            VotingErrors::DuplicateCandidates => write!(f, "Repeated candidates"),
            VotingErrors::UndeclaredCandidate(name) => {
                write!(f, "Ballot ranks an undeclared candidate: {}", name)
            }
        }
    }
}
