pub mod dbscan;
pub mod projection;

use geo_types::Point;

use crate::problem::cluster::Cluster;
use crate::problem::ticket::{Ticket, TicketIdx};
use dbscan::{dbscan, DbscanParams, Label};
use projection::LocalProjection;

/// Partitions a crew's candidates into geographic clusters.
///
/// Noise points still have to be visited, so they come back as singleton
/// clusters after the dense ones. Output order is deterministic: clusters
/// in discovery order, then singletons in candidate order.
pub fn build_clusters(
    tickets: &[Ticket],
    members: &[TicketIdx],
    scores: &[f64],
    params: DbscanParams,
) -> Vec<Cluster> {
    if members.is_empty() {
        return Vec::new();
    }

    let points: Vec<Point> = members.iter().map(|&idx| tickets[idx].point()).collect();
    let projection = LocalProjection::centered_on(&points);
    let projected: Vec<(f64, f64)> = points.iter().map(|&p| projection.project(p)).collect();

    let labels = dbscan(&projected, params);

    let cluster_count = labels
        .iter()
        .filter_map(|label| match label {
            Label::Cluster(id) => Some(id + 1),
            Label::Noise => None,
        })
        .max()
        .unwrap_or(0);

    let mut grouped: Vec<Vec<TicketIdx>> = vec![Vec::new(); cluster_count];
    let mut singletons: Vec<TicketIdx> = Vec::new();

    for (position, &member) in members.iter().enumerate() {
        match labels[position] {
            Label::Cluster(id) => grouped[id].push(member),
            Label::Noise => singletons.push(member),
        }
    }

    let mut clusters: Vec<Cluster> = grouped
        .into_iter()
        .map(|group| {
            let centroid = centroid_of(&group, tickets, &projection);
            Cluster::new(group, centroid, tickets, scores)
        })
        .collect();

    clusters.extend(singletons.into_iter().map(|member| {
        let centroid = tickets[member].point();
        Cluster::new(vec![member], centroid, tickets, scores)
    }));

    clusters
}

/// The `urgency_first` strategy skips clustering: every candidate lands in
/// one cluster, in the order given.
pub fn single_cluster(tickets: &[Ticket], members: &[TicketIdx], scores: &[f64]) -> Vec<Cluster> {
    if members.is_empty() {
        return Vec::new();
    }

    let points: Vec<Point> = members.iter().map(|&idx| tickets[idx].point()).collect();
    let projection = LocalProjection::centered_on(&points);
    let centroid = centroid_of(members, tickets, &projection);

    vec![Cluster::new(members.to_vec(), centroid, tickets, scores)]
}

/// Mean of the projected member coordinates, unprojected for storage.
fn centroid_of(members: &[TicketIdx], tickets: &[Ticket], projection: &LocalProjection) -> Point {
    let n = members.len() as f64;
    let (east_sum, north_sum) = members
        .iter()
        .map(|&idx| projection.project(tickets[idx].point()))
        .fold((0.0, 0.0), |(xs, ys), (x, y)| (xs + x, ys + y));

    projection.unproject(east_sum / n, north_sum / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ticket::Priority;
    use crate::scoring::urgency::score_all;

    fn near(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn fixture() -> (Vec<Ticket>, Vec<TicketIdx>, Vec<f64>) {
        let tickets = vec![
            Ticket::builder("t0").coordinates(0.0, 0.0).build(),
            Ticket::builder("t1")
                .coordinates(0.001, 0.0)
                .priority(Priority::Emergency)
                .build(),
            Ticket::builder("t2").coordinates(10.0, 10.0).build(),
        ];
        let scores = score_all(&tickets);
        let members = (0..tickets.len()).map(TicketIdx::new).collect();
        (tickets, members, scores)
    }

    #[test]
    fn test_dense_pair_plus_singleton() {
        let (tickets, members, scores) = fixture();
        let clusters = build_clusters(&tickets, &members, &scores, DbscanParams::default());

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].len(), 1);

        // The dense pair carries the emergency.
        assert_eq!(clusters[0].aggregate_priority(), Priority::Emergency);
        assert_eq!(clusters[1].aggregate_priority(), Priority::Medium);

        // Centroid of the pair sits between the two points.
        let centroid = clusters[0].centroid();
        assert!(near(centroid.x(), 0.0));
        assert!(centroid.y() > 0.0 && centroid.y() < 0.001);
    }

    #[test]
    fn test_empty_and_single_inputs() {
        let (tickets, _, scores) = fixture();

        assert!(build_clusters(&tickets, &[], &scores, DbscanParams::default()).is_empty());

        let lone = [TicketIdx::new(2)];
        let clusters = build_clusters(&tickets, &lone, &scores, DbscanParams::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members(), lone);
    }

    #[test]
    fn test_single_cluster_keeps_order() {
        let (tickets, members, scores) = fixture();
        let clusters = single_cluster(&tickets, &members, &scores);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members(), members.as_slice());
        assert_eq!(clusters[0].total_service_minutes(), 90);
    }
}
