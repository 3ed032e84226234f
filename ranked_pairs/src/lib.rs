/*!
Ranked Pairs tabulation.

Given the candidates of an election and the ballots of the voters, [run]
returns the winner (or the tied winners) and [full_order] returns the whole
finish order.

Ballots map each candidate to a preference rank where higher is better.
Candidates missing from a ballot are ranked 0, below every ranked candidate.

```
use std::collections::{BTreeSet, HashMap};
# use ranked_pairs::VotingErrors;

let votes = vec![
    HashMap::from([("Anna", 3), ("Bob", 2), ("Clara", 1)]),
    HashMap::from([("Bob", 3), ("Anna", 2)]),
    HashMap::from([("Anna", 2), ("Clara", 1)]),
];
let winners = ranked_pairs::run(&["Anna", "Bob", "Clara"], &votes)?;
assert_eq!(winners, BTreeSet::from(["Anna"]));
# Ok::<(), VotingErrors>(())
```
*/
mod config;

pub mod builder;
pub mod election;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::Reverse,
    collections::{BTreeSet, HashSet},
    fmt::Debug,
    hash::Hash,
    ops::AddAssign,
};

pub use crate::config::*;

/// What a candidate identifier must support: equality and hashing for the
/// ballot maps, and a total order so that results are reproducible.
pub trait CandidateKey: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> CandidateKey for T {}

/// A voting method computing single-round winners and a full finish order.
///
/// Both operations validate their input the same way and fail with
/// [VotingErrors::NoCandidates], [VotingErrors::NoVotes] or
/// [VotingErrors::DuplicateCandidates] before doing any work.
pub trait VotingMethod<C: CandidateKey> {
    fn run(&self, candidates: &[C], votes: &[Ballot<C>]) -> Result<WinnerSet<C>, VotingErrors>;

    fn full_order(
        &self,
        candidates: &[C],
        votes: &[Ballot<C>],
    ) -> Result<FinishOrder<C>, VotingErrors>;
}

/// The Ranked Pairs method.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct RankedPairs;

impl<C: CandidateKey> VotingMethod<C> for RankedPairs {
    fn run(&self, candidates: &[C], votes: &[Ballot<C>]) -> Result<WinnerSet<C>, VotingErrors> {
        run(candidates, votes)
    }

    fn full_order(
        &self,
        candidates: &[C],
        votes: &[Ballot<C>],
    ) -> Result<FinishOrder<C>, VotingErrors> {
        full_order(candidates, votes)
    }
}

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// The candidates of an election with their internal ids.
// Ids follow the order of the candidates, which also drives the tie-breaks.
#[derive(Debug, Clone)]
struct Roster<C> {
    names: Vec<C>,
}

impl<C: CandidateKey> Roster<C> {
    fn new(candidates: &[C]) -> Roster<C> {
        let mut names = candidates.to_vec();
        names.sort();
        Roster { names }
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn ids(&self) -> impl Iterator<Item = CandidateId> {
        (0..self.names.len() as u32).map(CandidateId)
    }

    fn name(&self, cid: CandidateId) -> &C {
        &self.names[cid.0 as usize]
    }

    fn names_of(&self, cids: &BTreeSet<CandidateId>) -> WinnerSet<C> {
        cids.iter().map(|cid| self.name(*cid).clone()).collect()
    }
}

/// For every ordered pair (i, j), the number of ballots ranking i strictly above j.
#[derive(Eq, PartialEq, Debug, Clone)]
struct PairwiseTally {
    num_candidates: usize,
    // Row-major: counts[i * num_candidates + j]
    counts: Vec<VoteCount>,
}

impl PairwiseTally {
    fn strength(&self, i: CandidateId, j: CandidateId) -> VoteCount {
        self.counts[i.0 as usize * self.num_candidates + j.0 as usize]
    }
}

// A pairwise victory: `strength` ballots prefer the winner, `opposition`
// ballots prefer the loser. Invariant: strength > opposition.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
struct RankedPair {
    winner: CandidateId,
    loser: CandidateId,
    strength: VoteCount,
    opposition: VoteCount,
}

// Outcome of the lock-in procedure over some set of still active candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
struct LockIn {
    winners: BTreeSet<CandidateId>,
    locked: Vec<(CandidateId, CandidateId)>,
}

/// Fills in a rank of 0 for every candidate that a ballot does not mention.
///
/// The ballots are copied: the caller's data is left unchanged.
pub fn clean_votes<C: CandidateKey>(candidates: &[C], votes: &[Ballot<C>]) -> Vec<Ballot<C>> {
    votes
        .iter()
        .map(|vote| {
            let mut cleaned = vote.clone();
            for c in candidates.iter() {
                cleaned.entry(c.clone()).or_insert(0);
            }
            cleaned
        })
        .collect()
}

/// Runs Ranked Pairs and returns the candidates that nobody beats.
///
/// Arguments:
/// * `candidates` the *unique* candidates of the election
/// * `votes` the ballots. Repeated ballots are allowed.
///
/// The set contains a single candidate, unless the top of the election is tied.
///
/// The cost is linear in the number of votes and quadratic in the number of
/// candidates.
pub fn run<C: CandidateKey>(
    candidates: &[C],
    votes: &[Ballot<C>],
) -> Result<WinnerSet<C>, VotingErrors> {
    let (roster, pairs) = rank_candidates(candidates, votes)?;
    let active: BTreeSet<CandidateId> = roster.ids().collect();
    let lock_in = resolve_winners(&active, &pairs);
    let winners = roster.names_of(&lock_in.winners);
    info!("run: winners: {:?}", winners);
    Ok(winners)
}

/// Runs Ranked Pairs repeatedly to compute the finish order.
///
/// The winners of a round are removed before computing the next round. A
/// result of `[{2}, {1, 3}, {4}]` means that 2 is first, 1 and 3 are tied for
/// second and 4 is third.
///
/// See [run] for the arguments.
pub fn full_order<C: CandidateKey>(
    candidates: &[C],
    votes: &[Ballot<C>],
) -> Result<FinishOrder<C>, VotingErrors> {
    let (roster, pairs) = rank_candidates(candidates, votes)?;
    let order: FinishOrder<C> = compute_finish_order(&roster, &pairs)
        .iter()
        .map(|lock_in| roster.names_of(&lock_in.winners))
        .collect();
    info!("full_order: {:?}", order);
    Ok(order)
}

/// Same as [full_order], but also returns the ranked pairs and the edges locked
/// in during each round.
pub fn run_ranked_pairs_stats<C: CandidateKey>(
    candidates: &[C],
    votes: &[Ballot<C>],
) -> Result<RankedPairsResult<C>, VotingErrors> {
    let (roster, pairs) = rank_candidates(candidates, votes)?;
    let rounds = compute_finish_order(&roster, &pairs);

    let ranked_pairs: Vec<PairStats<C>> = pairs
        .iter()
        .map(|p| PairStats {
            winner: roster.name(p.winner).clone(),
            loser: roster.name(p.loser).clone(),
            strength: p.strength.0,
            opposition: p.opposition.0,
        })
        .collect();

    let mut round_stats: Vec<RoundStats<C>> = Vec::new();
    for (idx, lock_in) in rounds.iter().enumerate() {
        let round: RoundId = idx as u32 + 1;
        round_stats.push(RoundStats {
            round,
            winners: roster.names_of(&lock_in.winners),
            locked: lock_in
                .locked
                .iter()
                .map(|(i, j)| (roster.name(*i).clone(), roster.name(*j).clone()))
                .collect(),
        });
    }
    let finish_order: FinishOrder<C> = round_stats.iter().map(|rs| rs.winners.clone()).collect();
    // Invariant: there is always at least one round since the candidates are checked.
    let winners = finish_order.first().cloned().unwrap_or_default();

    Ok(RankedPairsResult {
        winners,
        finish_order,
        ranked_pairs,
        round_stats,
    })
}

fn check_input<C: CandidateKey>(candidates: &[C], votes: &[Ballot<C>]) -> Result<(), VotingErrors> {
    if candidates.is_empty() {
        return Err(VotingErrors::NoCandidates);
    }
    if votes.is_empty() {
        return Err(VotingErrors::NoVotes);
    }
    let unique: HashSet<&C> = candidates.iter().collect();
    if unique.len() != candidates.len() {
        return Err(VotingErrors::DuplicateCandidates);
    }
    Ok(())
}

// Validates the input, then tallies and ranks the pairs once.
// The ranked pairs are shared by all the rounds of a full order.
fn rank_candidates<C: CandidateKey>(
    candidates: &[C],
    votes: &[Ballot<C>],
) -> Result<(Roster<C>, Vec<RankedPair>), VotingErrors> {
    check_input(candidates, votes)?;
    info!(
        "Processing {:?} votes, {:?} candidates",
        votes.len(),
        candidates.len()
    );

    let roster = Roster::new(candidates);
    for cid in roster.ids() {
        info!("Candidate: {}: {:?}", cid.0, roster.name(cid));
    }

    let tally = compute_pairwise_tally(&roster, votes);
    debug!("rank_candidates: tally: {:?}", tally);

    let pairs = rank_pairs(&tally);
    debug!("rank_candidates: ranked pairs: {:?}", pairs);
    Ok((roster, pairs))
}

fn compute_pairwise_tally<C: CandidateKey>(
    roster: &Roster<C>,
    votes: &[Ballot<C>],
) -> PairwiseTally {
    let n = roster.len();
    let mut counts: Vec<VoteCount> = vec![VoteCount::EMPTY; n * n];
    let cleaned = clean_votes(&roster.names, votes);
    for vote in cleaned.iter() {
        // The ranks of this ballot, indexed by candidate id.
        let ranks: Vec<Rank> = roster
            .names
            .iter()
            .map(|c| vote.get(c).copied().unwrap_or(0))
            .collect();
        for i in 0..n {
            for j in 0..n {
                if ranks[i] > ranks[j] {
                    counts[i * n + j] += VoteCount(1);
                }
            }
        }
    }
    PairwiseTally {
        num_candidates: n,
        counts,
    }
}

// Keeps the pairs with a strict majority and sorts them from the most to the
// least decisive: strength descending, then opposition ascending. Fully equal
// pairs follow the candidate order.
fn rank_pairs(tally: &PairwiseTally) -> Vec<RankedPair> {
    let n = tally.num_candidates as u32;
    let mut pairs: Vec<RankedPair> = Vec::new();
    for i in (0..n).map(CandidateId) {
        for j in (0..n).map(CandidateId) {
            if i == j {
                continue;
            }
            let strength = tally.strength(i, j);
            let opposition = tally.strength(j, i);
            // Ties are not edges, in either direction.
            if strength > opposition {
                pairs.push(RankedPair {
                    winner: i,
                    loser: j,
                    strength,
                    opposition,
                });
            }
        }
    }
    pairs.sort_by_key(|p| (Reverse(p.strength), p.opposition, p.winner, p.loser));
    pairs
}

// Locks in the pairs in order and returns the active candidates that never
// received a locked edge.
//
// The graph is never built. An edge is skipped when its source already lost a
// locked pair: such an edge cannot change which candidates end up without an
// incoming edge in this round.
fn resolve_winners(active: &BTreeSet<CandidateId>, pairs: &[RankedPair]) -> LockIn {
    let mut locked_children: HashSet<CandidateId> = HashSet::new();
    let mut locked_edges: HashSet<(CandidateId, CandidateId)> = HashSet::new();
    let mut locked: Vec<(CandidateId, CandidateId)> = Vec::new();

    for p in pairs.iter() {
        let (i, j) = (p.winner, p.loser);
        if active.contains(&i)
            && active.contains(&j)
            && !locked_children.contains(&i)
            && !locked_edges.contains(&(j, i))
        {
            debug!(
                "resolve_winners: locking {:?} -> {:?} ({:?} against {:?})",
                i, j, p.strength, p.opposition
            );
            locked_children.insert(j);
            locked_edges.insert((i, j));
            locked.push((i, j));
        }
    }

    let winners: BTreeSet<CandidateId> = active
        .iter()
        .filter(|cid| !locked_children.contains(cid))
        .cloned()
        .collect();
    LockIn { winners, locked }
}

fn compute_finish_order<C: CandidateKey>(roster: &Roster<C>, pairs: &[RankedPair]) -> Vec<LockIn> {
    let mut active: BTreeSet<CandidateId> = roster.ids().collect();
    let mut rounds: Vec<LockIn> = Vec::new();
    while !active.is_empty() {
        let round_id: RoundId = rounds.len() as u32 + 1;
        let lock_in = resolve_winners(&active, pairs);
        // Invariant: the source of the last locked edge (or any candidate if
        // nothing was locked) is never a locked child.
        assert!(
            !lock_in.winners.is_empty(),
            "No winner found among the active candidates: {:?}",
            active
        );
        info!(
            "Round {:?}: winners: {:?}",
            round_id,
            lock_in
                .winners
                .iter()
                .map(|cid| roster.name(*cid))
                .collect::<Vec<&C>>()
        );
        for cid in lock_in.winners.iter() {
            active.remove(cid);
        }
        rounds.push(lock_in);
    }
    rounds
}
