//! # DAG consensus core
//!
//! Authorities continuously produce signed headers referencing a quorum of
//! prior-round headers; once a header collects enough votes it becomes a
//! [`Certificate`](certificate::Certificate). Certificates form a per-round
//! DAG, and a pluggable commit rule decides when a past-round *leader* is
//! committed, totally ordering the leader together with its not-yet-ordered
//! causal history.
//!
//! ## Pipeline
//!
//! ```text
//! rx_primary ──▶ driver ──▶ engine.process_round(round, state, committee)
//!                  │                      │
//!                  │            committed sequence (possibly empty)
//!                  ▼                      ▼
//!             dag.insert        tx_primary + tx_output, state.update
//! ```
//!
//! ## Safety and liveness
//!
//! - **Agreement**: every commit decision is a deterministic function of the
//!   DAG contents, the committee, and the committed watermarks, so honest
//!   nodes that observe the same certificates emit the same sequence.
//! - **Safety under asynchrony**: a leader commits only with at least an
//!   f+1 stake of supporting certificates, so two honest nodes can never
//!   commit conflicting leaders for the same round.
//! - **Liveness**: with fewer than n/3 Byzantine authorities, every window
//!   of rounds eventually contains a supported leader.
//!
//! The commit rules never block and never touch the outside world; all I/O
//! lives in the [`core`](self::core) driver.

pub mod certificate;
pub mod core;
pub mod engine;
pub mod mysticeti;
pub mod shoal;
pub mod state;
pub mod tusk;

/// Monotone round counter partitioning the DAG. Round 0 is genesis.
pub type Round = u64;
