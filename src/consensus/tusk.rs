//! Tusk commit rule: one leader every two rounds.
//!
//! Odd rounds certify, even rounds propose. When the first certificate of an
//! odd round `round` arrives, the voting round is `r = round − 1` and the
//! candidate leader sits two rounds below it. The leader commits once the
//! certificates of round `leader_round + 1` reference it with at least an
//! f+1 stake; committing it also retroactively commits every earlier
//! uncommitted leader it is linked to, earliest first, each followed by its
//! not-yet-ordered causal history in ascending round order.

use std::collections::HashSet;

use crate::config::Committee;
use crate::crypto::Digest;

use super::certificate::Certificate;
use super::engine::{leader_authority, supporting_stake, CommitEngine};
use super::state::{ConsensusState, Dag};
use super::Round;

/// The default commit rule.
#[derive(Clone, Debug, Default)]
pub struct TuskEngine;

impl CommitEngine for TuskEngine {
    fn process_round(
        &mut self,
        round: Round,
        state: &ConsensusState,
        committee: &Committee,
    ) -> Vec<Certificate> {
        // Act only on certified (odd) rounds with a full wave below them.
        if round < 4 || (round - 1) % 2 != 0 {
            return Vec::new();
        }
        let leader_round = round - 3;
        if leader_round <= state.last_committed_round {
            return Vec::new();
        }

        let Some((leader_digest, leader)) = elect_leader(leader_round, state, committee) else {
            return Vec::new();
        };

        let support = supporting_stake(&leader_digest, leader_round + 1, state, committee);
        if support < committee.validity_threshold() {
            tracing::debug!(
                round = leader_round,
                support,
                needed = committee.validity_threshold(),
                "leader lacks support"
            );
            return Vec::new();
        }

        // Earliest leader first, then each leader's uncommitted causal past.
        let mut leaders = order_leaders(leader, state, committee);
        leaders.reverse();

        let mut emitted = HashSet::new();
        let mut sequence = Vec::new();
        for leader in &leaders {
            sequence.extend(order_dag(leader, state, &mut emitted));
        }

        tracing::info!(
            leader_round,
            leaders = leaders.len(),
            committed = sequence.len(),
            "Tusk commit"
        );
        sequence
    }
}

/// Look up the round's elected leader certificate in the DAG.
///
/// The election is over the sorted committee key set, so every honest node
/// elects the same authority no matter which certificates it has received
/// so far; an absent leader certificate simply means no commit yet.
fn elect_leader(
    round: Round,
    state: &ConsensusState,
    committee: &Committee,
) -> Option<(Digest, Certificate)> {
    let leader_key = leader_authority(round, committee)?;
    state.dag.get(round, &leader_key).cloned()
}

/// Walk the leader chain backwards two rounds at a time, keeping each
/// earlier elected leader that is linked to the chain.
fn order_leaders(
    leader: Certificate,
    state: &ConsensusState,
    committee: &Committee,
) -> Vec<Certificate> {
    let mut to_commit = vec![leader.clone()];
    let mut current = leader;

    let mut round = current.round() - 2;
    while round > state.last_committed_round {
        if let Some((_, prev)) = elect_leader(round, state, committee) {
            if linked(&current, &prev, &state.dag) {
                to_commit.push(prev.clone());
                current = prev;
            }
        }
        if round < 2 {
            break;
        }
        round -= 2;
    }
    to_commit
}

/// Whether `prev` is reachable from `leader` along parent edges.
///
/// Breadth-first from `leader`: at each step the frontier becomes the
/// certificates one round down that some frontier certificate lists as a
/// parent. Certificates are matched by digest inside the round map.
fn linked(leader: &Certificate, prev: &Certificate, dag: &Dag) -> bool {
    let prev_digest = prev.digest();
    let mut frontier: Vec<(Digest, &Certificate)> = vec![(leader.digest(), leader)];

    for round in ((prev.round() + 1)..=leader.round()).rev() {
        let Some(entries) = dag.round(round - 1) else {
            return false;
        };
        let parents: HashSet<Digest> = frontier
            .iter()
            .flat_map(|(_, certificate)| certificate.header.parents.iter().copied())
            .collect();
        frontier = entries
            .values()
            .filter(|(digest, _)| parents.contains(digest))
            .map(|(digest, certificate)| (*digest, certificate))
            .collect();
        if frontier.is_empty() {
            return false;
        }
    }
    frontier.iter().any(|(digest, _)| *digest == prev_digest)
}

/// Depth-first flatten of the leader's not-yet-ordered causal past, sorted
/// by ascending round (stable, so ties keep the deterministic DFS order).
///
/// `emitted` spans the whole leader chain of one `process_round` call:
/// a certificate reachable from several leaders is emitted exactly once.
/// Certificates at or below an author's committed watermark are skipped.
fn order_dag(
    leader: &Certificate,
    state: &ConsensusState,
    emitted: &mut HashSet<Digest>,
) -> Vec<Certificate> {
    let mut ordered = Vec::new();
    if !emitted.insert(leader.digest()) {
        return ordered;
    }
    let mut buffer = vec![leader.clone()];

    while let Some(certificate) = buffer.pop() {
        let entries = match certificate.round() {
            0 => None, // genesis has no parents
            round => state.dag.round(round - 1),
        };
        if let Some(entries) = entries {
            for parent_digest in &certificate.header.parents {
                let Some((digest, parent)) =
                    entries.values().find(|(digest, _)| digest == parent_digest)
                else {
                    // Parent already garbage-collected: its subtree was
                    // ordered long ago.
                    continue;
                };
                let already_committed = state
                    .last_committed
                    .get(&parent.origin())
                    .is_some_and(|&committed| committed >= parent.round());
                if !already_committed && emitted.insert(*digest) {
                    buffer.push(parent.clone());
                }
            }
        }
        ordered.push(certificate);
    }

    ordered.sort_by_key(|certificate| certificate.round());
    ordered
}
