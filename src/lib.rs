//! # Cetus
//!
//! The ordering core of a DAG-based Byzantine fault tolerant replication
//! layer:
//! - **Certificate DAG** — at most one certificate per `(author, round)`,
//!   partitioned by round, garbage-collected below a bounded depth
//! - **Pluggable commit rules** — Tusk, Shoal++, and Mysticeti engines that
//!   deterministically elect leaders and linearize their causal history
//! - **Serial driver** — a single worker thread folds inbound certificates
//!   into the DAG and fans committed certificates out to the primary and
//!   the application
//! - **Blocking channels** — condition-variable handoff connecting the
//!   driver to its producers and consumers
//!
//! The core assumes its collaborators (transport, signature verification,
//! storage, header production) have done their jobs: every inbound
//! certificate is pre-verified, and its parents are already in the DAG or
//! fetchable by a collaborator.

pub mod channel;
pub mod config;
pub mod consensus;
pub mod crypto;
