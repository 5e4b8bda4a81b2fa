//! Cetus consensus simulator.
//!
//! A standalone load generator that spins up the consensus driver with a
//! synthetic committee, feeds it a fully-connected certificate DAG, and
//! reports what each commit rule delivers. Useful for eyeballing engine
//! behavior and throughput without any networking.
//!
//! Usage: cargo run --bin simulator -- --engine shoal++ --rounds 200

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use colored::Colorize;

use cetus::channel::Channel;
use cetus::config::{Authority, Committee, Stake};
use cetus::consensus::certificate::{Certificate, Header};
use cetus::consensus::core::Consensus;
use cetus::consensus::engine::EngineKind;
use cetus::consensus::Round;
use cetus::crypto::{Digest, Keypair};

/// Drive the consensus core with a synthetic certificate load.
#[derive(Parser, Debug)]
#[command(name = "simulator", version, about = "Cetus consensus simulator")]
struct Cli {
    /// Commit rule: tusk, shoal++, or mysticeti.
    #[arg(long, default_value = "tusk")]
    engine: EngineKind,

    /// Number of authorities in the committee.
    #[arg(long, default_value_t = 4)]
    authorities: usize,

    /// Stake per authority.
    #[arg(long, default_value_t = 100)]
    stake: Stake,

    /// Number of DAG rounds to feed.
    #[arg(long, default_value_t = 100)]
    rounds: Round,

    /// Garbage collection depth.
    #[arg(long, default_value_t = 50)]
    gc_depth: Round,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    println!("{}", "── Cetus consensus simulator ──".bright_cyan().bold());
    println!(
        "engine {} · {} authorities · {} rounds · gc depth {}",
        cli.engine.to_string().bright_yellow(),
        cli.authorities,
        cli.rounds,
        cli.gc_depth
    );

    // Synthetic committee with freshly generated Ed25519 identities.
    let keypairs: Vec<Keypair> = (0..cli.authorities).map(|_| Keypair::generate()).collect();
    let committee = Committee::new(
        keypairs
            .iter()
            .enumerate()
            .map(|(i, keypair)| {
                (
                    keypair.public,
                    Authority {
                        stake: cli.stake,
                        primary_address: format!("127.0.0.1:{}", 4000 + i),
                        worker_address: format!("127.0.0.1:{}", 4100 + i),
                    },
                )
            })
            .collect(),
    );

    let rx_primary = Arc::new(Channel::new());
    let tx_primary = Arc::new(Channel::new());
    let tx_output = Arc::new(Channel::new());

    let mut consensus = Consensus::spawn(
        committee.clone(),
        cli.gc_depth,
        cli.engine.build(),
        rx_primary.clone(),
        tx_primary.clone(),
        tx_output.clone(),
    )
    .expect("failed to spawn consensus worker");

    // Drain the primary feedback stream; the primary would use it to clean
    // up its own per-round buffers.
    let feedback = thread::spawn({
        let tx_primary = tx_primary.clone();
        move || {
            let mut count = 0usize;
            while tx_primary.receive().is_some() {
                count += 1;
            }
            count
        }
    });

    // The "application": record the committed sequence.
    let application = thread::spawn({
        let tx_output = tx_output.clone();
        move || {
            let mut rounds = Vec::new();
            while let Some(certificate) = tx_output.receive() {
                rounds.push(certificate.round());
            }
            rounds
        }
    });

    // Feed a fully-connected DAG: every certificate parents all
    // certificates of the previous round and carries a quorum of votes.
    let mut parents: Vec<Digest> = Consensus::genesis(&committee)
        .iter()
        .map(|certificate| certificate.digest())
        .collect();
    let mut fed = 0usize;
    for round in 1..=cli.rounds {
        let mut next_parents = Vec::with_capacity(keypairs.len());
        for keypair in &keypairs {
            let header = Header::new(keypair.public, round, parents.clone(), BTreeMap::new());
            let header_bytes = header.serialize();
            let votes = keypairs
                .iter()
                .map(|voter| (voter.public, voter.sign(&header_bytes)))
                .collect();
            let certificate = Certificate::new(header, votes);
            next_parents.push(certificate.digest());
            rx_primary.send(certificate);
            fed += 1;
        }
        parents = next_parents;
    }

    rx_primary.close();
    consensus.shutdown();

    let feedback_count = feedback.join().expect("feedback consumer panicked");
    let committed = application.join().expect("application consumer panicked");

    let monotonic = committed.windows(2).all(|pair| pair[0] <= pair[1]);
    let highest = committed.last().copied().unwrap_or(0);

    println!();
    println!("fed certificates        {}", fed.to_string().bright_white());
    println!(
        "committed certificates  {}",
        committed.len().to_string().bright_white()
    );
    println!("feedback copies         {feedback_count}");
    println!("highest committed round {highest}");
    let verdict = if monotonic && feedback_count == committed.len() {
        "streams consistent, commit rounds monotonic".green()
    } else {
        "INCONSISTENT OUTPUT".red().bold()
    };
    println!("{verdict}");
}
