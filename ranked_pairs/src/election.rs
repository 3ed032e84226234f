use log::debug;

use std::collections::BTreeSet;

use crate::{clean_votes, Ballot, CandidateKey, FinishOrder, VotingErrors, VotingMethod, WinnerSet};

/// Holds the votes of an election and remembers the last results.
///
/// The candidates are the union of everyone ranked on any ballot. A candidate
/// that nobody ranked is therefore not part of the election.
///
/// ```
/// use std::collections::{BTreeSet, HashMap};
/// use ranked_pairs::election::Election;
/// use ranked_pairs::RankedPairs;
/// # use ranked_pairs::VotingErrors;
///
/// let mut election = Election::with_votes(
///     RankedPairs,
///     vec![HashMap::from([("Anna", 2), ("Bob", 1)])],
/// );
/// assert_eq!(election.candidates(), &["Anna", "Bob"]);
/// assert_eq!(election.winner()?, &BTreeSet::from(["Anna"]));
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone)]
pub struct Election<C, M> {
    method: M,
    candidates: Vec<C>,
    votes: Vec<Ballot<C>>,
    winner: Option<WinnerSet<C>>,
    full_order: Option<FinishOrder<C>>,
}

impl<C: CandidateKey, M: VotingMethod<C>> Election<C, M> {
    /// An election without any vote yet.
    pub fn new(method: M) -> Election<C, M> {
        Election::with_votes(method, Vec::new())
    }

    pub fn with_votes(method: M, votes: Vec<Ballot<C>>) -> Election<C, M> {
        let mut election = Election {
            method,
            candidates: Vec::new(),
            votes: Vec::new(),
            winner: None,
            full_order: None,
        };
        election.set_votes(votes);
        election
    }

    /// Replaces all the votes. The candidates are derived again and the
    /// cached results are dropped.
    pub fn set_votes(&mut self, votes: Vec<Ballot<C>>) {
        let candidates: BTreeSet<C> = votes.iter().flat_map(|v| v.keys().cloned()).collect();
        self.candidates = candidates.into_iter().collect();
        self.votes = clean_votes(&self.candidates, &votes);
        self.winner = None;
        self.full_order = None;
        debug!(
            "set_votes: {:?} votes, candidates: {:?}",
            self.votes.len(),
            self.candidates
        );
    }

    /// The candidates, in sorted order.
    pub fn candidates(&self) -> &[C] {
        &self.candidates
    }

    /// The cleaned votes: every ballot ranks every candidate.
    pub fn votes(&self) -> &[Ballot<C>] {
        &self.votes
    }

    pub fn method(&self) -> &M {
        &self.method
    }

    pub fn winner(&mut self) -> Result<&WinnerSet<C>, VotingErrors> {
        let res = match self.winner.take() {
            Some(w) => w,
            None => self.method.run(&self.candidates, &self.votes)?,
        };
        Ok(self.winner.insert(res))
    }

    pub fn full_order(&mut self) -> Result<&FinishOrder<C>, VotingErrors> {
        let res = match self.full_order.take() {
            Some(o) => o,
            None => self.method.full_order(&self.candidates, &self.votes)?,
        };
        Ok(self.full_order.insert(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RankedPairs, Rank};
    use std::cell::Cell;

    fn ballot(ranks: &[(&'static str, Rank)]) -> Ballot<&'static str> {
        ranks.iter().cloned().collect()
    }

    // Counts the calls, to check the caching.
    struct CountingMethod {
        calls: Cell<u32>,
    }

    impl VotingMethod<&'static str> for CountingMethod {
        fn run(
            &self,
            candidates: &[&'static str],
            votes: &[Ballot<&'static str>],
        ) -> Result<WinnerSet<&'static str>, VotingErrors> {
            self.calls.set(self.calls.get() + 1);
            RankedPairs.run(candidates, votes)
        }

        fn full_order(
            &self,
            candidates: &[&'static str],
            votes: &[Ballot<&'static str>],
        ) -> Result<FinishOrder<&'static str>, VotingErrors> {
            self.calls.set(self.calls.get() + 1);
            RankedPairs.full_order(candidates, votes)
        }
    }

    #[test]
    fn candidates_are_derived_and_votes_cleaned() {
        let election = Election::with_votes(
            RankedPairs,
            vec![ballot(&[("B", 2), ("A", 1)]), ballot(&[("C", 4)])],
        );
        assert_eq!(election.candidates(), &["A", "B", "C"]);
        assert_eq!(
            election.votes(),
            &[
                ballot(&[("A", 1), ("B", 2), ("C", 0)]),
                ballot(&[("A", 0), ("B", 0), ("C", 4)]),
            ]
        );
    }

    #[test]
    fn results_are_cached_until_votes_change() {
        let mut election = Election::with_votes(
            CountingMethod {
                calls: Cell::new(0),
            },
            vec![ballot(&[("A", 2), ("B", 1)])],
        );
        assert_eq!(election.winner().unwrap(), &BTreeSet::from(["A"]));
        assert_eq!(election.winner().unwrap(), &BTreeSet::from(["A"]));
        assert_eq!(election.method().calls.get(), 1);

        election.full_order().unwrap();
        election.full_order().unwrap();
        assert_eq!(election.method().calls.get(), 2);

        election.set_votes(vec![ballot(&[("A", 1), ("B", 2)])]);
        assert_eq!(election.winner().unwrap(), &BTreeSet::from(["B"]));
        assert_eq!(
            election.full_order().unwrap(),
            &vec![BTreeSet::from(["B"]), BTreeSet::from(["A"])]
        );
        assert_eq!(election.method().calls.get(), 4);
    }

    #[test]
    fn empty_election_fails() {
        let mut election: Election<&'static str, RankedPairs> = Election::new(RankedPairs);
        assert!(election.candidates().is_empty());
        assert_eq!(election.winner(), Err(VotingErrors::NoCandidates));
        assert_eq!(
            election.full_order().unwrap_err(),
            VotingErrors::NoCandidates
        );
    }

    #[test]
    fn errors_are_not_cached() {
        let mut election: Election<&'static str, CountingMethod> = Election::new(CountingMethod {
            calls: Cell::new(0),
        });
        assert!(election.winner().is_err());
        assert!(election.winner().is_err());
        assert_eq!(election.method().calls.get(), 2);
    }
}
