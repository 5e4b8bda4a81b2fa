//! Shoal++ commit rule: reputation-weighted anchors every round.
//!
//! A single-certificate rule keyed on the latest round: the anchor of
//! `round − 1` commits as soon as the certificates of `round` reference it
//! with an f+1 stake. Anchor selection is a weighted round-robin over the
//! authorities present at the anchor round, weighted by `reputation + 1`,
//! so authorities whose certificates keep landing in the committed sequence
//! are picked more often. The round number itself drives the rotation,
//! which keeps every node's choice identical without a shared coin.

use std::collections::HashMap;

use crate::config::Committee;
use crate::crypto::{Digest, PublicKey};

use super::certificate::Certificate;
use super::engine::{supporting_stake, CommitEngine};
use super::state::ConsensusState;
use super::Round;

/// Cap on reputation map entries before a decay pass halves every score.
const REPUTATION_CAPACITY: usize = 100;

/// Latency-oriented commit rule with leader reputation.
#[derive(Clone, Debug, Default)]
pub struct ShoalEngine {
    reputation: HashMap<PublicKey, u64>,
}

impl ShoalEngine {
    /// Current reputation scores (observability and tests).
    pub fn reputation(&self) -> &HashMap<PublicKey, u64> {
        &self.reputation
    }

    /// Pick the anchor of `round` among the authorities present there.
    ///
    /// Sort the present keys ascending, give each a weight of
    /// `reputation + 1`, and walk the prefix sums until they exceed
    /// `round mod total_weight`.
    fn select_anchor(
        &self,
        round: Round,
        state: &ConsensusState,
    ) -> Option<(Digest, Certificate)> {
        let entries = state.dag.round(round)?;
        if entries.is_empty() {
            return None;
        }
        let mut candidates: Vec<PublicKey> = entries.keys().copied().collect();
        candidates.sort_unstable();

        let total_weight: u64 = candidates
            .iter()
            .map(|key| self.reputation.get(key).copied().unwrap_or(0) + 1)
            .sum();

        let choice = round % total_weight;
        let mut running = 0u64;
        for key in &candidates {
            running += self.reputation.get(key).copied().unwrap_or(0) + 1;
            if running > choice {
                return entries.get(key).cloned();
            }
        }
        None
    }

    /// Reward committed origins; halve everything once the map outgrows its
    /// capacity so scores stay bounded.
    fn update_reputation(&mut self, committed: &[Certificate]) {
        for certificate in committed {
            *self.reputation.entry(certificate.origin()).or_insert(0) += 1;
        }
        if self.reputation.len() > REPUTATION_CAPACITY {
            for score in self.reputation.values_mut() {
                *score /= 2;
            }
        }
    }
}

impl CommitEngine for ShoalEngine {
    fn process_round(
        &mut self,
        round: Round,
        state: &ConsensusState,
        committee: &Committee,
    ) -> Vec<Certificate> {
        if round == 0 {
            return Vec::new();
        }
        let anchor_round = round - 1;
        if anchor_round <= state.last_committed_round {
            return Vec::new();
        }

        let Some((anchor_digest, anchor)) = self.select_anchor(anchor_round, state) else {
            return Vec::new();
        };

        let support = supporting_stake(&anchor_digest, round, state, committee);
        if support < committee.validity_threshold() {
            tracing::debug!(
                round = anchor_round,
                support,
                needed = committee.validity_threshold(),
                "anchor lacks support"
            );
            return Vec::new();
        }

        tracing::info!(
            round = anchor_round,
            origin = %anchor.origin(),
            support,
            "Shoal++ commit"
        );
        let sequence = vec![anchor];
        self.update_reputation(&sequence);
        sequence
    }
}
