pub mod deadline;
pub mod tour;
pub mod two_opt;

pub use deadline::Deadline;
pub use tour::SeedRule;

use std::sync::atomic::{AtomicBool, Ordering};

use brigade_matrix::matrices::TravelMatrices;
use rayon::prelude::*;
use tracing::debug;

use crate::problem::cluster::Cluster;
use crate::problem::ticket::{Ticket, TicketIdx};

/// Tours for every cluster, in cluster order.
pub struct SolveOutcome {
    pub tours: Vec<Vec<TicketIdx>>,
    /// The deadline fired before every cluster was fully solved.
    pub partial: bool,
}

/// Solves every cluster tour concurrently on a bounded worker pool.
///
/// Each worker gets an immutable snapshot of its cluster and writes into
/// its own slot, so output order never depends on completion order. A
/// cluster the deadline caught before construction falls back to its
/// members in prioritized order; one caught mid-refinement keeps the tour
/// built so far.
pub fn solve_clusters(
    clusters: &[Cluster],
    tickets: &[Ticket],
    scores: &[f64],
    matrices: &TravelMatrices,
    seed_rule: SeedRule,
    priority_rank: &[usize],
    deadline: Option<&Deadline>,
) -> Result<SolveOutcome, rayon::ThreadPoolBuildError> {
    if clusters.is_empty() {
        return Ok(SolveOutcome {
            tours: Vec::new(),
            partial: false,
        });
    }

    let workers = clusters.len().min(
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    );
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    let partial = AtomicBool::new(false);

    let tours: Vec<Vec<TicketIdx>> = pool.install(|| {
        clusters
            .par_iter()
            .map(|cluster| {
                if deadline.map(Deadline::expired).unwrap_or(false) {
                    partial.store(true, Ordering::Relaxed);
                    return fallback_tour(cluster, priority_rank);
                }

                let seed = tour::seed_ticket(cluster, tickets, scores, seed_rule);
                let mut order =
                    tour::nearest_neighbor_tour(cluster.members(), seed, matrices, tickets, scores);

                if !two_opt::refine(&mut order, matrices, deadline) {
                    partial.store(true, Ordering::Relaxed);
                }

                order
            })
            .collect()
    });

    let partial = partial.load(Ordering::Relaxed);
    if partial {
        debug!(clusters = clusters.len(), "deadline reached during cluster solving");
    }

    Ok(SolveOutcome { tours, partial })
}

/// Members in global prioritized order; the unoptimized stand-in for a
/// cluster the deadline caught first.
fn fallback_tour(cluster: &Cluster, priority_rank: &[usize]) -> Vec<TicketIdx> {
    let mut order = cluster.members().to_vec();
    order.sort_by_key(|idx| priority_rank[idx.get()]);
    order
}
