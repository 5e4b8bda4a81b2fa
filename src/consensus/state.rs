//! DAG state: the per-round certificate map and the commit watermarks.
//!
//! Rounds live in a sorted map so garbage collection prunes a contiguous
//! low-round prefix. Within a round each authority owns at most one slot;
//! the first certificate to claim a `(round, author)` slot wins and later
//! (equivocating or duplicate) arrivals are ignored.

use std::collections::{BTreeMap, HashMap};

use crate::crypto::{Digest, PublicKey};

use super::certificate::Certificate;
use super::Round;

/// Certificates of one round, keyed by their author.
pub type RoundEntries = HashMap<PublicKey, (Digest, Certificate)>;

/// The per-round certificate DAG.
#[derive(Clone, Debug, Default)]
pub struct Dag {
    rounds: BTreeMap<Round, RoundEntries>,
    /// Lowest round still retained; inserts below it are obsolete.
    first_round: Round,
}

impl Dag {
    /// Insert a certificate into its `(round, author)` slot.
    ///
    /// First writer wins: a slot already holding a certificate is never
    /// overwritten. Inserts into garbage-collected rounds are ignored.
    pub fn insert(&mut self, certificate: Certificate) {
        let round = certificate.round();
        if round < self.first_round {
            tracing::debug!(round, origin = %certificate.origin(), "ignoring certificate below GC watermark");
            return;
        }
        self.rounds
            .entry(round)
            .or_default()
            .entry(certificate.origin())
            .or_insert_with(|| (certificate.digest(), certificate));
    }

    /// Look up an authority's certificate at a round.
    pub fn get(&self, round: Round, author: &PublicKey) -> Option<&(Digest, Certificate)> {
        self.rounds.get(&round)?.get(author)
    }

    /// All entries of one round, if any.
    pub fn round(&self, round: Round) -> Option<&RoundEntries> {
        self.rounds.get(&round)
    }

    /// Rounds currently retained, in ascending order.
    pub fn rounds(&self) -> impl Iterator<Item = Round> + '_ {
        self.rounds.keys().copied()
    }

    /// Drop every round strictly below `cutoff` and raise the watermark.
    /// Idempotent; `split_off` keeps the retained suffix untouched.
    pub fn prune(&mut self, cutoff: Round) {
        if cutoff <= self.first_round {
            return;
        }
        self.rounds = self.rounds.split_off(&cutoff);
        self.first_round = cutoff;
    }

    /// Total number of certificates across all retained rounds.
    pub fn len(&self) -> usize {
        self.rounds.values().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Commit-tracking state owned by the consensus driver.
#[derive(Clone, Debug)]
pub struct ConsensusState {
    /// Highest committed round across all authorities.
    pub last_committed_round: Round,
    /// Highest committed round per authority. Never decreases.
    pub last_committed: HashMap<PublicKey, Round>,
    pub dag: Dag,
}

impl ConsensusState {
    /// Seed the state from the genesis certificates: they are pinned into
    /// round 0 of the DAG and every authority starts committed at round 0.
    pub fn new(genesis: Vec<Certificate>) -> Self {
        let mut dag = Dag::default();
        let mut last_committed = HashMap::with_capacity(genesis.len());
        for certificate in genesis {
            last_committed.insert(certificate.origin(), certificate.round());
            dag.insert(certificate);
        }
        ConsensusState {
            last_committed_round: 0,
            last_committed,
            dag,
        }
    }

    /// Fold one committed certificate into the watermarks, then prune every
    /// round deeper than `gc_depth` below the global committed round.
    pub fn update(&mut self, certificate: &Certificate, gc_depth: Round) {
        let entry = self.last_committed.entry(certificate.origin()).or_insert(0);
        *entry = (*entry).max(certificate.round());

        self.last_committed_round = self.last_committed.values().copied().max().unwrap_or(0);

        // Keep rounds r with r + gc_depth >= last_committed_round.
        self.dag
            .prune(self.last_committed_round.saturating_sub(gc_depth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::certificate::Header;

    fn make_certificate(author: u8, round: Round) -> Certificate {
        Certificate::new(
            Header::new(
                PublicKey([author; 32]),
                round,
                vec![Digest([round as u8; 32])],
                Default::default(),
            ),
            vec![],
        )
    }

    fn genesis(n: u8) -> Vec<Certificate> {
        (0..n)
            .map(|i| {
                Certificate::new(
                    Header::new(PublicKey([i; 32]), 0, vec![], Default::default()),
                    vec![],
                )
            })
            .collect()
    }

    #[test]
    fn genesis_seeds_round_zero() {
        let state = ConsensusState::new(genesis(4));
        assert_eq!(state.last_committed_round, 0);
        assert_eq!(state.dag.round(0).unwrap().len(), 4);
        for i in 0..4u8 {
            assert_eq!(state.last_committed[&PublicKey([i; 32])], 0);
        }
    }

    #[test]
    fn insert_is_first_writer_wins() {
        let mut dag = Dag::default();
        let original = make_certificate(1, 3);
        let original_digest = original.digest();
        dag.insert(original);

        // Equivocating certificate: same (author, round), different header.
        let mut equivocation = make_certificate(1, 3);
        equivocation.header.parents = vec![Digest([99u8; 32])];
        assert_ne!(equivocation.digest(), original_digest);
        dag.insert(equivocation);

        let (digest, _) = dag.get(3, &PublicKey([1u8; 32])).unwrap();
        assert_eq!(*digest, original_digest);
        assert_eq!(dag.round(3).unwrap().len(), 1);
    }

    #[test]
    fn update_tracks_per_author_maximum() {
        let mut state = ConsensusState::new(genesis(4));
        state.update(&make_certificate(0, 5), 50);
        assert_eq!(state.last_committed[&PublicKey([0u8; 32])], 5);
        assert_eq!(state.last_committed_round, 5);

        // An older commit for the same author must not roll the mark back.
        state.update(&make_certificate(0, 2), 50);
        assert_eq!(state.last_committed[&PublicKey([0u8; 32])], 5);
        assert_eq!(state.last_committed_round, 5);
    }

    #[test]
    fn update_prunes_deep_rounds() {
        let mut state = ConsensusState::new(genesis(4));
        for round in 1..=60 {
            state.dag.insert(make_certificate(0, round));
        }
        state.update(&make_certificate(0, 60), 10);

        // Rounds r with r + 10 < 60 are gone.
        assert!(state.dag.round(49).is_none());
        assert!(state.dag.round(50).is_some());
        assert!(state.dag.round(60).is_some());
        for round in state.dag.rounds() {
            assert!(round + 10 >= state.last_committed_round);
        }
    }

    #[test]
    fn insert_into_pruned_round_is_ignored() {
        let mut state = ConsensusState::new(genesis(4));
        state.dag.insert(make_certificate(0, 60));
        state.update(&make_certificate(0, 60), 10);
        assert!(state.dag.round(5).is_none());

        // An obsolete certificate arriving after GC must not resurrect its round.
        state.dag.insert(make_certificate(2, 5));
        assert!(state.dag.round(5).is_none());
    }

    #[test]
    fn prune_is_idempotent() {
        let mut dag = Dag::default();
        for round in 0..10 {
            dag.insert(make_certificate(0, round));
        }
        dag.prune(4);
        let len = dag.len();
        dag.prune(4);
        dag.prune(2);
        assert_eq!(dag.len(), len);
        assert_eq!(dag.rounds().next(), Some(4));
    }
}
