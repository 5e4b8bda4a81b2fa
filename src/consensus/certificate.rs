//! Headers and certificates: the vertices of the consensus DAG.
//!
//! A header is an authority's proposal for one round; a certificate is a
//! header plus a quorum of votes. The identity of a certificate is the
//! BLAKE3 digest of its *serialized header*; votes never influence the
//! digest, so differently-voted copies of the same header are one vertex.
//!
//! ## Wire format
//!
//! Canonical serialization is little-endian and bit-exact (the digest
//! depends on it):
//!
//! ```text
//! header       := author(32) round(u64) parents payload
//! parents      := count(u64) digest(32)*
//! payload      := count(u64) (digest(32) worker_id(u64))*
//! certificate  := header votes
//! votes        := count(u64) (public_key(32) signature(64))*
//! ```

use std::collections::BTreeMap;

use crate::crypto::{
    self, Digest, PublicKey, Signature, DIGEST_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};

use super::Round;

/// Identifier of the worker that holds a payload batch.
pub type WorkerId = u32;

/// An authority's proposal for one round.
///
/// Non-genesis headers reference a set of round `r − 1` certificate digests
/// as parents; the payload maps batch digests to the worker holding them.
/// Parent-round enforcement is the primary's job; the core trusts it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub author: PublicKey,
    pub round: Round,
    pub parents: Vec<Digest>,
    pub payload: BTreeMap<Digest, WorkerId>,
}

impl Header {
    pub fn new(
        author: PublicKey,
        round: Round,
        parents: Vec<Digest>,
        payload: BTreeMap<Digest, WorkerId>,
    ) -> Self {
        Header {
            author,
            round,
            parents,
            payload,
        }
    }

    /// Canonical byte encoding. The certificate digest hashes exactly these
    /// bytes, so the encoding must never change shape.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            PUBLIC_KEY_LENGTH
                + 8
                + 8
                + self.parents.len() * DIGEST_LENGTH
                + 8
                + self.payload.len() * (DIGEST_LENGTH + 8),
        );
        buf.extend_from_slice(&self.author.0);
        buf.extend_from_slice(&self.round.to_le_bytes());
        buf.extend_from_slice(&(self.parents.len() as u64).to_le_bytes());
        for parent in &self.parents {
            buf.extend_from_slice(&parent.0);
        }
        buf.extend_from_slice(&(self.payload.len() as u64).to_le_bytes());
        for (digest, worker_id) in &self.payload {
            buf.extend_from_slice(&digest.0);
            buf.extend_from_slice(&(*worker_id as u64).to_le_bytes());
        }
        buf
    }
}

/// A header with a quorum of votes.
///
/// Vote signatures are assumed pre-verified by the collaborator that
/// assembled the certificate; the core only orders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Certificate {
    pub header: Header,
    pub votes: Vec<(PublicKey, Signature)>,
}

/// Certificate decoding errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("declared {field} count {count} exceeds remaining input")]
    OversizedCount { field: &'static str, count: u64 },
    #[error("worker id {0} does not fit in 32 bits")]
    WorkerIdOverflow(u64),
    #[error("{0} trailing bytes after certificate")]
    TrailingBytes(usize),
}

impl Certificate {
    pub fn new(header: Header, votes: Vec<(PublicKey, Signature)>) -> Self {
        Certificate { header, votes }
    }

    /// The certificate's identity: `hash(header.serialize())`.
    pub fn digest(&self) -> Digest {
        crypto::hash(&self.header.serialize())
    }

    /// The authority that produced the header.
    pub fn origin(&self) -> PublicKey {
        self.header.author
    }

    pub fn round(&self) -> Round {
        self.header.round
    }

    /// Canonical byte encoding: the header followed by the vote list.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.header.serialize();
        buf.extend_from_slice(&(self.votes.len() as u64).to_le_bytes());
        for (public_key, signature) in &self.votes {
            buf.extend_from_slice(&public_key.0);
            buf.extend_from_slice(&signature.0);
        }
        buf
    }

    /// Decode a certificate from its canonical encoding.
    ///
    /// Every count is bounds-checked against the remaining input before any
    /// allocation, so arbitrary bytes can never cause a panic or an
    /// oversized allocation. The whole input must be consumed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, CertificateError> {
        let mut reader = Reader { bytes, pos: 0 };

        let author = PublicKey(reader.take_array::<PUBLIC_KEY_LENGTH>()?);
        let round = reader.take_u64()?;

        let parent_count = reader.take_count("parents", DIGEST_LENGTH)?;
        let mut parents = Vec::with_capacity(parent_count);
        for _ in 0..parent_count {
            parents.push(Digest(reader.take_array::<DIGEST_LENGTH>()?));
        }

        let payload_count = reader.take_count("payload", DIGEST_LENGTH + 8)?;
        let mut payload = BTreeMap::new();
        for _ in 0..payload_count {
            let digest = Digest(reader.take_array::<DIGEST_LENGTH>()?);
            let worker_id = reader.take_u64()?;
            let worker_id = WorkerId::try_from(worker_id)
                .map_err(|_| CertificateError::WorkerIdOverflow(worker_id))?;
            payload.insert(digest, worker_id);
        }

        let vote_count = reader.take_count("votes", PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH)?;
        let mut votes = Vec::with_capacity(vote_count);
        for _ in 0..vote_count {
            let public_key = PublicKey(reader.take_array::<PUBLIC_KEY_LENGTH>()?);
            let signature = Signature(reader.take_array::<SIGNATURE_LENGTH>()?);
            votes.push((public_key, signature));
        }

        let remaining = reader.bytes.len() - reader.pos;
        if remaining != 0 {
            return Err(CertificateError::TrailingBytes(remaining));
        }

        Ok(Certificate {
            header: Header {
                author,
                round,
                parents,
                payload,
            },
            votes,
        })
    }
}

/// Cursor over the input bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CertificateError> {
        let end = self
            .pos
            .checked_add(N)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CertificateError::UnexpectedEof(self.pos))?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    fn take_u64(&mut self) -> Result<u64, CertificateError> {
        Ok(u64::from_le_bytes(self.take_array::<8>()?))
    }

    /// Read an element count and check that `count * element_size` bytes can
    /// still be present in the input.
    fn take_count(
        &mut self,
        field: &'static str,
        element_size: usize,
    ) -> Result<usize, CertificateError> {
        let count = self.take_u64()?;
        let remaining = (self.bytes.len() - self.pos) as u64;
        if count > remaining / element_size as u64 {
            return Err(CertificateError::OversizedCount { field, count });
        }
        Ok(count as usize)
    }
}
