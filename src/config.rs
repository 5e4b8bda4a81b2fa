//! Committee configuration: the static set of authorities for an epoch.
//!
//! Stake weights drive the two BFT thresholds used by every commit rule:
//! the quorum threshold (`2f+1`, certificate formation) and the validity
//! threshold (`f+1`, at least one honest authority). The committee is loaded
//! once before the driver starts and never changes during a run.
//!
//! Authorities live in a `BTreeMap` keyed by public key, so every iteration
//! over the committee is in ascending key order, the deterministic order
//! the commit rules rely on for leader election.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::crypto::PublicKey;

/// Voting power of an authority.
pub type Stake = u32;

/// One authority: its stake and the addresses its peers dial.
#[derive(Clone, Debug, Deserialize)]
pub struct Authority {
    pub stake: Stake,
    pub primary_address: String,
    pub worker_address: String,
}

/// The static authority set for an epoch.
#[derive(Clone, Debug, Default)]
pub struct Committee {
    pub authorities: BTreeMap<PublicKey, Authority>,
}

/// On-disk committee file: authority tables keyed by hex public key.
#[derive(Deserialize)]
struct CommitteeFile {
    #[serde(default)]
    authorities: BTreeMap<String, Authority>,
}

/// Committee loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read committee file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse committee file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid authority key {0:?}: {1}")]
    InvalidKey(String, hex::FromHexError),
    #[error("committee file defines no authorities")]
    Empty,
}

impl Committee {
    pub fn new(authorities: BTreeMap<PublicKey, Authority>) -> Self {
        Committee { authorities }
    }

    /// Load a committee from a TOML file:
    ///
    /// ```toml
    /// [authorities.<hex public key>]
    /// stake = 100
    /// primary_address = "127.0.0.1:4000"
    /// worker_address = "127.0.0.1:4100"
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let file: CommitteeFile = toml::from_str(&contents)?;

        let mut authorities = BTreeMap::new();
        for (key, authority) in file.authorities {
            let public_key = PublicKey::from_hex(&key)
                .map_err(|e| ConfigError::InvalidKey(key.clone(), e))?;
            authorities.insert(public_key, authority);
        }
        if authorities.is_empty() {
            return Err(ConfigError::Empty);
        }

        tracing::info!(
            authorities = authorities.len(),
            path = %path.display(),
            "Loaded committee"
        );
        Ok(Committee { authorities })
    }

    /// Number of authorities.
    pub fn size(&self) -> usize {
        self.authorities.len()
    }

    /// Sum of all stake.
    pub fn total_stake(&self) -> Stake {
        self.authorities.values().map(|a| a.stake).sum()
    }

    /// Stake required to certify: `⌊2·total/3⌋ + 1` ("2f+1").
    pub fn quorum_threshold(&self) -> Stake {
        self.total_stake() * 2 / 3 + 1
    }

    /// Stake guaranteeing at least one honest authority:
    /// `⌊(total − 1)/3⌋ + 1` ("f+1").
    pub fn validity_threshold(&self) -> Stake {
        (self.total_stake() - 1) / 3 + 1
    }

    /// Stake of an authority; 0 for keys outside the committee.
    pub fn stake(&self, name: &PublicKey) -> Stake {
        self.authorities.get(name).map_or(0, |a| a.stake)
    }

    /// Authority keys in ascending byte order.
    pub fn keys(&self) -> Vec<PublicKey> {
        self.authorities.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_committee(stakes: &[Stake]) -> Committee {
        let authorities = stakes
            .iter()
            .enumerate()
            .map(|(i, &stake)| {
                (
                    PublicKey([i as u8; 32]),
                    Authority {
                        stake,
                        primary_address: format!("127.0.0.1:{}", 4000 + i),
                        worker_address: format!("127.0.0.1:{}", 4100 + i),
                    },
                )
            })
            .collect();
        Committee::new(authorities)
    }

    #[test]
    fn thresholds_four_equal_authorities() {
        let committee = make_committee(&[100, 100, 100, 100]);
        assert_eq!(committee.total_stake(), 400);
        assert_eq!(committee.quorum_threshold(), 267);
        assert_eq!(committee.validity_threshold(), 134);
    }

    #[test]
    fn unknown_key_has_zero_stake() {
        let committee = make_committee(&[100, 100, 100, 100]);
        assert_eq!(committee.stake(&PublicKey([0u8; 32])), 100);
        assert_eq!(committee.stake(&PublicKey([99u8; 32])), 0);
    }

    #[test]
    fn keys_are_sorted_ascending() {
        let committee = make_committee(&[1, 1, 1, 1, 1]);
        let keys = committee.keys();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn load_committee_file() {
        let key_a = PublicKey([7u8; 32]);
        let key_b = PublicKey([9u8; 32]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[authorities.{}]
stake = 100
primary_address = "127.0.0.1:4000"
worker_address = "127.0.0.1:4100"

[authorities.{}]
stake = 200
primary_address = "127.0.0.1:4001"
worker_address = "127.0.0.1:4101"
"#,
            key_a.to_hex(),
            key_b.to_hex()
        )
        .unwrap();

        let committee = Committee::load(file.path()).unwrap();
        assert_eq!(committee.size(), 2);
        assert_eq!(committee.stake(&key_a), 100);
        assert_eq!(committee.stake(&key_b), 200);
        assert_eq!(committee.total_stake(), 300);
    }

    #[test]
    fn load_rejects_bad_hex_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[authorities.nothex]
stake = 100
primary_address = "a"
worker_address = "b"
"#
        )
        .unwrap();
        assert!(matches!(
            Committee::load(file.path()),
            Err(ConfigError::InvalidKey(_, _))
        ));
    }

    #[test]
    fn load_rejects_empty_committee() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "").unwrap();
        assert!(matches!(Committee::load(file.path()), Err(ConfigError::Empty)));
    }
}
