//! The commit-rule plug point.
//!
//! The driver is generic over a [`CommitEngine`]: after inserting an inbound
//! certificate it hands the engine the round that just grew, and the engine
//! answers with the certificates that arrival newly commits, in total order.
//! Three rules ship: [`Tusk`](super::tusk::TuskEngine) (the default,
//! one leader every two rounds), [`Shoal++`](super::shoal::ShoalEngine)
//! (reputation-weighted anchors every round), and
//! [`Mysticeti`](super::mysticeti::MysticetiEngine) (propose/vote/certify
//! over three rounds).

use std::fmt;
use std::str::FromStr;

use crate::config::Committee;

use super::certificate::Certificate;
use super::mysticeti::MysticetiEngine;
use super::shoal::ShoalEngine;
use super::state::ConsensusState;
use super::tusk::TuskEngine;
use super::Round;

/// A commit rule over the certificate DAG.
pub trait CommitEngine: Send {
    /// Decide what the arrival of a certificate at `round` commits.
    ///
    /// Returns the newly committed certificates in total order, or an empty
    /// list when this arrival triggers nothing. The result must be a
    /// deterministic function of `(round, state, committee)` and the
    /// engine's own history; the engine reads the DAG and the watermarks
    /// but never mutates them; applying the commits is the driver's job.
    fn process_round(
        &mut self,
        round: Round,
        state: &ConsensusState,
        committee: &Committee,
    ) -> Vec<Certificate>;
}

/// Which commit rule to run. Selected at startup, fixed for the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineKind {
    #[default]
    Tusk,
    ShoalPlusPlus,
    Mysticeti,
}

impl EngineKind {
    /// Instantiate the selected engine.
    pub fn build(self) -> Box<dyn CommitEngine> {
        match self {
            EngineKind::Tusk => Box::new(TuskEngine::default()),
            EngineKind::ShoalPlusPlus => Box::new(ShoalEngine::default()),
            EngineKind::Mysticeti => Box::new(MysticetiEngine::default()),
        }
    }
}

/// Unknown engine name on the command line.
#[derive(Debug, thiserror::Error)]
#[error("unknown engine {0:?} (expected \"tusk\", \"shoal++\", or \"mysticeti\")")]
pub struct ParseEngineError(String);

impl FromStr for EngineKind {
    type Err = ParseEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tusk" => Ok(EngineKind::Tusk),
            "shoal++" => Ok(EngineKind::ShoalPlusPlus),
            "mysticeti" => Ok(EngineKind::Mysticeti),
            other => Err(ParseEngineError(other.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Tusk => write!(f, "tusk"),
            EngineKind::ShoalPlusPlus => write!(f, "shoal++"),
            EngineKind::Mysticeti => write!(f, "mysticeti"),
        }
    }
}

/// The authority elected to lead `round`: the sorted committee key set
/// indexed by `round mod n`. `None` only for an empty committee.
pub(crate) fn leader_authority(
    round: Round,
    committee: &Committee,
) -> Option<crate::crypto::PublicKey> {
    let keys = committee.keys();
    if keys.is_empty() {
        return None;
    }
    Some(keys[(round % keys.len() as u64) as usize])
}

/// Total stake of the certificates at `round` that list `digest` among
/// their parents. This is the support a leader one round below collects.
pub(crate) fn supporting_stake(
    digest: &crate::crypto::Digest,
    round: Round,
    state: &ConsensusState,
    committee: &Committee,
) -> crate::config::Stake {
    let Some(entries) = state.dag.round(round) else {
        return 0;
    };
    entries
        .values()
        .filter(|(_, certificate)| certificate.header.parents.contains(digest))
        .map(|(_, certificate)| committee.stake(&certificate.origin()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_engine_names() {
        assert_eq!("tusk".parse::<EngineKind>().unwrap(), EngineKind::Tusk);
        assert_eq!(
            "shoal++".parse::<EngineKind>().unwrap(),
            EngineKind::ShoalPlusPlus
        );
        assert_eq!(
            "mysticeti".parse::<EngineKind>().unwrap(),
            EngineKind::Mysticeti
        );
        assert!("paxos".parse::<EngineKind>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for kind in [
            EngineKind::Tusk,
            EngineKind::ShoalPlusPlus,
            EngineKind::Mysticeti,
        ] {
            assert_eq!(kind.to_string().parse::<EngineKind>().unwrap(), kind);
        }
    }
}
