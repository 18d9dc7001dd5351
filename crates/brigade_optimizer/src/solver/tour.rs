use brigade_matrix::matrices::TravelMatrices;
use brigade_matrix::provider::{DistanceProvider, GreatCircle};

use crate::problem::cluster::Cluster;
use crate::problem::ticket::{Ticket, TicketIdx};

/// How the first visit of a cluster tour is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedRule {
    /// Most urgent ticket first (default).
    MaxUrgency,
    /// Ticket closest to the cluster centroid (the `geographic` strategy).
    NearestCentroid,
}

pub fn seed_ticket(
    cluster: &Cluster,
    tickets: &[Ticket],
    scores: &[f64],
    rule: SeedRule,
) -> TicketIdx {
    let members = cluster.members();

    match rule {
        SeedRule::MaxUrgency => members
            .iter()
            .copied()
            .max_by(|&a, &b| {
                scores[a.get()]
                    .total_cmp(&scores[b.get()])
                    // Prefer the smaller id on equal urgency: max_by keeps
                    // the later of equal elements, so order b before a.
                    .then_with(|| tickets[b].id().cmp(tickets[a].id()))
            })
            .expect("cluster is never empty"),
        SeedRule::NearestCentroid => {
            let centroid = cluster.centroid();
            members
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    let da = GreatCircle.distance_km(centroid, tickets[a].point());
                    let db = GreatCircle.distance_km(centroid, tickets[b].point());
                    da.total_cmp(&db)
                        .then_with(|| tickets[a].id().cmp(tickets[b].id()))
                })
                .expect("cluster is never empty")
        }
    }
}

/// Greedy nearest-neighbor extension from the seed, by travel minutes.
///
/// Ties go to the more urgent ticket, then the smaller id, so collocated
/// tickets come out in priority order and the result is reproducible.
pub fn nearest_neighbor_tour(
    members: &[TicketIdx],
    seed: TicketIdx,
    matrices: &TravelMatrices,
    tickets: &[Ticket],
    scores: &[f64],
) -> Vec<TicketIdx> {
    let mut order = Vec::with_capacity(members.len());
    order.push(seed);

    let mut remaining: Vec<TicketIdx> = members.iter().copied().filter(|&m| m != seed).collect();

    while !remaining.is_empty() {
        let tail = *order.last().expect("tour starts seeded");

        let (position, _) = remaining
            .iter()
            .enumerate()
            .min_by(|&(_, &a), &(_, &b)| {
                matrices
                    .minutes(tail.get(), a.get())
                    .total_cmp(&matrices.minutes(tail.get(), b.get()))
                    .then_with(|| scores[b.get()].total_cmp(&scores[a.get()]))
                    .then_with(|| tickets[a].id().cmp(tickets[b].id()))
            })
            .expect("remaining is non-empty");

        order.push(remaining.swap_remove(position));
    }

    order
}

/// Open-path travel minutes of a tour.
pub fn tour_minutes(order: &[TicketIdx], matrices: &TravelMatrices) -> f64 {
    order
        .windows(2)
        .map(|pair| matrices.minutes(pair[0].get(), pair[1].get()))
        .sum()
}
