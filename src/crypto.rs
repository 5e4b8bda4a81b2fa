//! Cryptographic primitives: opaque digests, Ed25519 keys and signatures.
//!
//! The consensus core treats all of these as value types with bytewise
//! equality and ordering. Hashing uses BLAKE3; signing uses Ed25519.
//! Signature verification of inbound certificates is a collaborator's
//! responsibility; the core never verifies, it only orders.

use std::fmt;

use ed25519_dalek::Signer;
use serde::{Deserialize, Serialize};

/// Length of a digest in bytes.
pub const DIGEST_LENGTH: usize = 32;
/// Length of a public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Length of a signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// A 32-byte cryptographic digest.
///
/// Equality and ordering are bytewise, so digests can key sorted maps and
/// break ties deterministically.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Digest(pub [u8; DIGEST_LENGTH]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

/// A 32-byte Ed25519 public key identifying an authority.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a public key from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(PublicKey(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// The all-zero signature, used for genesis and for test fixtures.
    pub fn empty() -> Self {
        Signature([0u8; SIGNATURE_LENGTH])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(self.0.as_slice(), s)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(d)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "invalid Ed25519 signature: expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            )));
        }
        let mut buf = [0u8; SIGNATURE_LENGTH];
        buf.copy_from_slice(&bytes);
        Ok(Signature(buf))
    }
}

/// Compute the BLAKE3 digest of a byte string.
pub fn hash(data: &[u8]) -> Digest {
    Digest(*blake3::hash(data).as_bytes())
}

/// An Ed25519 signing keypair.
///
/// Used by collaborators (header production, vote collection) and by the
/// test and simulation harnesses; the consensus core itself never signs.
#[derive(Clone)]
pub struct Keypair {
    pub public: PublicKey,
    secret: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Generate a new random keypair from the OS entropy source.
    pub fn generate() -> Self {
        let secret = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        let public = PublicKey(secret.verifying_key().to_bytes());
        Keypair { public, secret }
    }

    /// Sign a message, producing a detached signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.secret.sign(message).to_bytes())
    }
}

/// Verify a detached Ed25519 signature.
///
/// Returns `false` for malformed keys as well as invalid signatures; callers
/// treat both the same way.
pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    key.verify_strict(message, &sig).is_ok()
}
