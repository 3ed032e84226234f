use std::collections::BTreeSet;

pub use crate::config::*;
use crate::CandidateKey;

/// A builder for adding votes.
///
/// Ballots can be given either as ranks or as an ordered list of choices.
///
/// ```
/// pub use ranked_pairs::builder::Builder;
/// # use ranked_pairs::VotingErrors;
/// # use std::collections::BTreeSet;
///
/// let mut builder = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_vote_ordered(&["Anna".to_string(), "Clara".to_string()])?;
/// builder.add_vote_ordered(&["Bob".to_string()])?;
/// builder.add_vote_ordered(&["Clara".to_string(), "Anna".to_string()])?;
/// builder.add_vote_ordered(&["Anna".to_string(), "Bob".to_string()])?;
///
/// assert_eq!(builder.run()?, BTreeSet::from(["Anna".to_string()]));
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder<C> {
    pub(crate) _candidates: Option<Vec<C>>,
    pub(crate) _votes: Vec<Ballot<C>>,
}

impl<C: CandidateKey> Default for Builder<C> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<C: CandidateKey> Builder<C> {
    pub fn new() -> Builder<C> {
        Builder {
            _candidates: None,
            _votes: Vec::new(),
        }
    }

    /// Declares the candidates. Ballots that name someone else will be rejected.
    ///
    /// The votes added so far are dropped.
    pub fn candidates(self, cands: &[C]) -> Result<Builder<C>, VotingErrors> {
        Ok(Builder {
            _candidates: Some(cands.to_vec()),
            _votes: Vec::new(),
        })
    }

    /// Adds a vote, given as the rank of each candidate (higher is better).
    pub fn add_vote(&mut self, ranks: &[(C, Rank)]) -> Result<(), VotingErrors> {
        self.add_vote_weighted(ranks, 1)
    }

    /// Adds a vote, given as the ordered list of choices, most preferred first.
    ///
    /// With `n` choices, the first one gets the rank `n` and the last one the
    /// rank 1. If a candidate is repeated, only its first position counts.
    pub fn add_vote_ordered(&mut self, choices: &[C]) -> Result<(), VotingErrors> {
        self.add_vote_ordered_weighted(choices, 1)
    }

    /// Adds the same ordered vote `count` times.
    pub fn add_vote_ordered_weighted(&mut self, choices: &[C], count: u64) -> Result<(), VotingErrors> {
        let n = choices.len() as Rank;
        let mut seen: BTreeSet<&C> = BTreeSet::new();
        let mut ranks: Vec<(C, Rank)> = Vec::new();
        for (idx, c) in choices.iter().enumerate() {
            if seen.insert(c) {
                ranks.push((c.clone(), n - idx as Rank));
            }
        }
        self.add_vote_weighted(&ranks, count)
    }

    /// Adds the same vote `count` times.
    pub fn add_vote_weighted(&mut self, ranks: &[(C, Rank)], count: u64) -> Result<(), VotingErrors> {
        if let Some(valid_candidates) = self._candidates.as_deref() {
            if let Some((c, _)) = ranks.iter().find(|(c, _)| !valid_candidates.contains(c)) {
                return Err(VotingErrors::UndeclaredCandidate(format!("{:?}", c)));
            }
        }
        let vote: Ballot<C> = ranks.iter().cloned().collect();
        for _ in 0..count {
            self._votes.push(vote.clone());
        }
        Ok(())
    }

    /// The declared candidates, or everyone named on a ballot so far (sorted).
    pub fn get_candidates(&self) -> Vec<C> {
        match &self._candidates {
            Some(cands) => cands.clone(),
            None => {
                let all: BTreeSet<C> = self
                    ._votes
                    .iter()
                    .flat_map(|v| v.keys().cloned())
                    .collect();
                all.into_iter().collect()
            }
        }
    }

    pub fn votes(&self) -> &[Ballot<C>] {
        &self._votes
    }

    pub fn run(&self) -> Result<WinnerSet<C>, VotingErrors> {
        crate::run(&self.get_candidates(), &self._votes)
    }

    pub fn full_order(&self) -> Result<FinishOrder<C>, VotingErrors> {
        crate::full_order(&self.get_candidates(), &self._votes)
    }

    pub fn run_stats(&self) -> Result<RankedPairsResult<C>, VotingErrors> {
        crate::run_ranked_pairs_stats(&self.get_candidates(), &self._votes)
    }
}
