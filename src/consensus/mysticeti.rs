//! Mysticeti commit rule: propose, vote, certify over three rounds.
//!
//! The leader of round `L` (round-robin over the committee) is certified by
//! the certificates of round `L + 1` that reference it as a parent. When a
//! certificate of round `L + 2` arrives, the rule checks whether the leader
//! two rounds below has collected an f+1 certifying stake and, if so,
//! commits that single certificate.

use crate::config::Committee;

use super::certificate::Certificate;
use super::engine::{leader_authority, supporting_stake, CommitEngine};
use super::state::ConsensusState;
use super::Round;

/// Low-latency single-leader commit rule.
#[derive(Clone, Debug, Default)]
pub struct MysticetiEngine;

impl CommitEngine for MysticetiEngine {
    fn process_round(
        &mut self,
        round: Round,
        state: &ConsensusState,
        committee: &Committee,
    ) -> Vec<Certificate> {
        if round < 3 {
            return Vec::new();
        }
        let leader_round = round - 2;
        if leader_round <= state.last_committed_round {
            return Vec::new();
        }

        let Some(leader_key) = leader_authority(leader_round, committee) else {
            return Vec::new();
        };
        let Some((leader_digest, leader)) = state.dag.get(leader_round, &leader_key) else {
            return Vec::new();
        };

        let votes = supporting_stake(leader_digest, leader_round + 1, state, committee);
        if votes < committee.validity_threshold() {
            tracing::debug!(
                round = leader_round,
                votes,
                needed = committee.validity_threshold(),
                "leader not certified"
            );
            return Vec::new();
        }

        tracing::info!(round = leader_round, votes, "Mysticeti commit");
        vec![leader.clone()]
    }
}
