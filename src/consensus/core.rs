//! The consensus driver: a single worker thread folding inbound
//! certificates into the DAG and fanning out commits.
//!
//! The worker exclusively owns the [`ConsensusState`] and the commit
//! engine, so the hot loop takes no locks. Each inbound certificate is
//! inserted, the engine is consulted, and every newly committed certificate
//! is pushed to the primary feedback stream and the application output
//! stream (in that order, per certificate) before the state is updated.
//! Both output streams therefore observe the same global commit order.
//!
//! Shutdown is cooperative: closing the input channel lets the loop drain
//! and exit, after which the worker closes both output streams. Dropping
//! the [`Consensus`] handle closes the input itself and joins the worker.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use crate::channel::Channel;
use crate::config::Committee;

use super::certificate::{Certificate, Header};
use super::engine::CommitEngine;
use super::state::ConsensusState;
use super::Round;

/// Handle to the consensus worker thread.
pub struct Consensus {
    rx_primary: Arc<Channel<Certificate>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Consensus {
    /// Spawn the worker.
    ///
    /// * `rx_primary` — inbound certificates (network or load generator).
    /// * `tx_primary` — committed certificates fed back to the primary.
    /// * `tx_output` — committed certificates delivered to the application.
    pub fn spawn(
        committee: Committee,
        gc_depth: Round,
        engine: Box<dyn CommitEngine>,
        rx_primary: Arc<Channel<Certificate>>,
        tx_primary: Arc<Channel<Certificate>>,
        tx_output: Arc<Channel<Certificate>>,
    ) -> std::io::Result<Self> {
        let rx = rx_primary.clone();
        let worker = thread::Builder::new()
            .name("consensus".into())
            .spawn(move || Self::run(committee, gc_depth, engine, rx, tx_primary, tx_output))?;
        Ok(Consensus {
            rx_primary,
            worker: Some(worker),
        })
    }

    fn run(
        committee: Committee,
        gc_depth: Round,
        mut engine: Box<dyn CommitEngine>,
        rx_primary: Arc<Channel<Certificate>>,
        tx_primary: Arc<Channel<Certificate>>,
        tx_output: Arc<Channel<Certificate>>,
    ) {
        let mut state = ConsensusState::new(Self::genesis(&committee));

        while let Some(certificate) = rx_primary.receive() {
            let round = certificate.round();
            tracing::debug!(round, origin = %certificate.origin(), "processing certificate");

            state.dag.insert(certificate);
            let sequence = engine.process_round(round, &state, &committee);

            for certificate in sequence {
                tx_primary.send(certificate.clone());
                tx_output.send(certificate.clone());
                state.update(&certificate, gc_depth);
            }
        }

        // Input closed and drained: signal end-of-stream downstream.
        tx_primary.close();
        tx_output.close();
        tracing::info!(
            last_committed_round = state.last_committed_round,
            "consensus worker stopped"
        );
    }

    /// The genesis certificates: one empty certificate per authority at
    /// round 0. Every node derives the identical set from the committee.
    pub fn genesis(committee: &Committee) -> Vec<Certificate> {
        committee
            .authorities
            .keys()
            .map(|author| {
                Certificate::new(
                    Header::new(*author, 0, Vec::new(), BTreeMap::new()),
                    Vec::new(),
                )
            })
            .collect()
    }

    /// Close the input stream and wait for the worker to drain and exit.
    pub fn shutdown(&mut self) {
        self.rx_primary.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Consensus {
    fn drop(&mut self) {
        self.shutdown();
    }
}
