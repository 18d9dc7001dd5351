pub mod mst;

use brigade_matrix::matrices::TravelMatrices;
use brigade_matrix::oracle::DistanceOracle;
use fxhash::{FxHashMap, FxHashSet};

use crate::error::EngineError;
use crate::problem::cluster::{Cluster, ClusterIdx};
use crate::problem::ticket::{Ticket, TicketId, TicketIdx};
use crate::solver::Deadline;
use mst::minimum_spanning_tree;

/// Concatenates cluster tours into one visit sequence.
///
/// A minimum spanning tree over the cluster centroids keeps successive
/// clusters spatially coherent; rooting the traversal at the cluster that
/// holds the globally most urgent ticket puts emergencies near the front
/// even when they sit off-center. `deadline` is `None` for runs already
/// marked partial; stitching then finishes unconditionally.
pub fn stitch(
    clusters: &[Cluster],
    tours: Vec<Vec<TicketIdx>>,
    tickets: &[Ticket],
    scores: &[f64],
    id_index: &FxHashMap<TicketId, TicketIdx>,
    matrices: &TravelMatrices,
    oracle: &DistanceOracle,
    deadline: Option<&Deadline>,
) -> Result<Vec<TicketIdx>, EngineError> {
    match clusters.len() {
        0 => return Ok(Vec::new()),
        1 => {
            return Ok(tours
                .into_iter()
                .next()
                .expect("one tour per cluster"))
        }
        _ => {}
    }

    let weights = centroid_weights(clusters, oracle);
    let tree = minimum_spanning_tree(&weights);
    let root = root_cluster(clusters, tickets, scores);
    let visit_order = preorder(&tree, root, clusters);

    let mut route: Vec<TicketIdx> = Vec::with_capacity(tickets.len());

    for &cluster in &visit_order {
        if let Some(deadline) = deadline {
            if deadline.expired() {
                return Err(EngineError::DeadlineExceeded);
            }
        }

        let tour = &tours[cluster.get()];
        match route.last() {
            None => route.extend_from_slice(tour),
            Some(&exit) => {
                let rotated = rotate_for_entry(tour, exit, tickets, id_index, matrices);
                route.extend(rotated);
            }
        }
    }

    Ok(route)
}

fn centroid_weights(clusters: &[Cluster], oracle: &DistanceOracle) -> Vec<Vec<f64>> {
    let n = clusters.len();
    let mut weights = vec![vec![0.0; n]; n];

    for a in 0..n {
        for b in (a + 1)..n {
            let minutes = oracle
                .travel(clusters[a].centroid(), clusters[b].centroid())
                .minutes;
            weights[a][b] = minutes;
            weights[b][a] = minutes;
        }
    }

    weights
}

/// The cluster holding the globally most urgent ticket (score, then id).
fn root_cluster(clusters: &[Cluster], tickets: &[Ticket], scores: &[f64]) -> ClusterIdx {
    let mut best: Option<(ClusterIdx, TicketIdx)> = None;

    for (cluster_pos, cluster) in clusters.iter().enumerate() {
        for &member in cluster.members() {
            let better = match best {
                None => true,
                Some((_, current)) => {
                    scores[member.get()]
                        .total_cmp(&scores[current.get()])
                        .then_with(|| tickets[current].id().cmp(tickets[member].id()))
                        .is_gt()
                }
            };
            if better {
                best = Some((ClusterIdx::new(cluster_pos), member));
            }
        }
    }

    best.map(|(cluster_pos, _)| cluster_pos)
        .expect("stitcher requires at least one cluster")
}

/// Depth-first preorder of the MST. At each branch children go out in
/// ascending edge weight, ties broken by descending aggregate urgency,
/// then cluster position.
fn preorder(tree: &[Vec<(usize, f64)>], root: ClusterIdx, clusters: &[Cluster]) -> Vec<ClusterIdx> {
    let mut visited = vec![false; tree.len()];
    let mut order = Vec::with_capacity(tree.len());
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if visited[node.get()] {
            continue;
        }
        visited[node.get()] = true;
        order.push(node);

        let mut children: Vec<(usize, f64)> = tree[node.get()]
            .iter()
            .copied()
            .filter(|&(child, _)| !visited[child])
            .collect();
        children.sort_by(|&(ca, wa), &(cb, wb)| {
            wa.total_cmp(&wb)
                .then_with(|| clusters[cb].max_urgency().total_cmp(&clusters[ca].max_urgency()))
                .then_with(|| ca.cmp(&cb))
        });

        // Reverse push so the lightest edge is popped first.
        for &(child, _) in children.iter().rev() {
            stack.push(ClusterIdx::new(child));
        }
    }

    order
}

/// Rotates a cluster tour so its entry is the member cheapest to reach
/// from the previous cluster's exit, unless every such rotation would put
/// a ticket before one of its in-cluster dependencies; then the original
/// urgency-seeded start stands.
fn rotate_for_entry(
    tour: &[TicketIdx],
    exit: TicketIdx,
    tickets: &[Ticket],
    id_index: &FxHashMap<TicketId, TicketIdx>,
    matrices: &TravelMatrices,
) -> Vec<TicketIdx> {
    let len = tour.len();
    if len <= 1 {
        return tour.to_vec();
    }

    let position: FxHashMap<TicketIdx, usize> = tour
        .iter()
        .enumerate()
        .map(|(pos, &idx)| (idx, pos))
        .collect();
    let members: FxHashSet<TicketIdx> = tour.iter().copied().collect();

    // (dependency position, dependent position) pairs inside this cluster.
    let mut dep_pairs: Vec<(usize, usize)> = Vec::new();
    for &member in tour {
        for dep_id in tickets[member].dependencies() {
            if let Some(&dep_idx) = id_index.get(dep_id) {
                if members.contains(&dep_idx) {
                    dep_pairs.push((position[&dep_idx], position[&member]));
                }
            }
        }
    }

    let mut starts: Vec<usize> = (0..len).collect();
    starts.sort_by(|&a, &b| {
        matrices
            .minutes(exit.get(), tour[a].get())
            .total_cmp(&matrices.minutes(exit.get(), tour[b].get()))
            .then_with(|| a.cmp(&b))
    });

    for start in starts {
        let valid = dep_pairs.iter().all(|&(dep_pos, dependent_pos)| {
            let dep_rotated = (dep_pos + len - start) % len;
            let dependent_rotated = (dependent_pos + len - start) % len;
            dep_rotated < dependent_rotated
        });
        if valid {
            let mut rotated = Vec::with_capacity(len);
            rotated.extend_from_slice(&tour[start..]);
            rotated.extend_from_slice(&tour[..start]);
            return rotated;
        }
    }

    tour.to_vec()
}

#[cfg(test)]
mod tests {
    use brigade_matrix::kmh::Kmh;

    use super::*;
    use crate::cluster::{build_clusters, dbscan::DbscanParams};
    use crate::problem::ticket::Priority;
    use crate::scoring::urgency::score_all;
    use crate::solver::{solve_clusters, SeedRule};
    use crate::test_utils::{all_members, build_matrices};

    struct Fixture {
        tickets: Vec<Ticket>,
        scores: Vec<f64>,
        clusters: Vec<Cluster>,
        tours: Vec<Vec<TicketIdx>>,
        id_index: FxHashMap<TicketId, TicketIdx>,
        matrices: TravelMatrices,
        oracle: DistanceOracle,
    }

    fn fixture(tickets: Vec<Ticket>) -> Fixture {
        let scores = score_all(&tickets);
        let members = all_members(&tickets);
        let clusters = build_clusters(&tickets, &members, &scores, DbscanParams::default());

        let oracle = DistanceOracle::new(Kmh::default());
        let matrices = build_matrices(&tickets);

        let rank: Vec<usize> = (0..tickets.len()).collect();
        let tours = solve_clusters(
            &clusters,
            &tickets,
            &scores,
            &matrices,
            SeedRule::MaxUrgency,
            &rank,
            None,
        )
        .unwrap()
        .tours;

        let id_index = crate::test_utils::id_index(&tickets);

        Fixture {
            tickets,
            scores,
            clusters,
            tours,
            id_index,
            matrices,
            oracle,
        }
    }

    fn stitched_ids(fx: &Fixture) -> Vec<String> {
        stitch(
            &fx.clusters,
            fx.tours.clone(),
            &fx.tickets,
            &fx.scores,
            &fx.id_index,
            &fx.matrices,
            &fx.oracle,
            None,
        )
        .unwrap()
        .into_iter()
        .map(|idx| fx.tickets[idx].id().to_string())
        .collect()
    }

    #[test]
    fn test_root_is_most_urgent_cluster() {
        let fx = fixture(vec![
            Ticket::builder("far_low").coordinates(0.0, 0.0).priority(Priority::Low).build(),
            Ticket::builder("mid_low").coordinates(0.5, 0.5).priority(Priority::Low).build(),
            Ticket::builder("hot")
                .coordinates(1.0, 1.0)
                .priority(Priority::Emergency)
                .build(),
        ]);

        let ids = stitched_ids(&fx);
        assert_eq!(ids[0], "hot");
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_preorder_prefers_light_edges() {
        // Root at the emergency; the nearer cluster must come before the
        // farther one.
        let fx = fixture(vec![
            Ticket::builder("root")
                .coordinates(0.0, 0.0)
                .priority(Priority::Emergency)
                .build(),
            Ticket::builder("near").coordinates(0.1, 0.1).build(),
            Ticket::builder("far").coordinates(2.0, 2.0).build(),
        ]);

        assert_eq!(stitched_ids(&fx), ["root", "near", "far"]);
    }

    #[test]
    fn test_rotation_picks_cheapest_entry() {
        // One dense pair to the north; the tour of the second cluster is
        // urgency-seeded at its far end, but entering from the first
        // cluster should rotate it to the near member.
        let fx = fixture(vec![
            Ticket::builder("start")
                .coordinates(0.0, 0.0)
                .priority(Priority::Emergency)
                .build(),
            Ticket::builder("pair_far")
                .coordinates(0.1004, 0.0)
                .priority(Priority::Urgent)
                .build(),
            Ticket::builder("pair_near").coordinates(0.1, 0.0).build(),
        ]);

        assert_eq!(stitched_ids(&fx), ["start", "pair_near", "pair_far"]);
    }

    #[test]
    fn test_rotation_respects_dependencies() {
        // Same geometry, but the near member depends on the far one; the
        // cheap rotation would break the dependency, so the original
        // urgency-seeded start must survive.
        let fx = fixture(vec![
            Ticket::builder("start")
                .coordinates(0.0, 0.0)
                .priority(Priority::Emergency)
                .build(),
            Ticket::builder("pair_far")
                .coordinates(0.1004, 0.0)
                .priority(Priority::Urgent)
                .build(),
            Ticket::builder("pair_near")
                .coordinates(0.1, 0.0)
                .depends_on("pair_far")
                .build(),
        ]);

        assert_eq!(stitched_ids(&fx), ["start", "pair_far", "pair_near"]);
    }

    #[test]
    fn test_deadline_aborts_stitching() {
        let fx = fixture(vec![
            Ticket::builder("a").coordinates(0.0, 0.0).build(),
            Ticket::builder("b").coordinates(1.0, 1.0).build(),
        ]);
        let deadline = Deadline::after(std::time::Duration::ZERO);

        let result = stitch(
            &fx.clusters,
            fx.tours.clone(),
            &fx.tickets,
            &fx.scores,
            &fx.id_index,
            &fx.matrices,
            &fx.oracle,
            Some(&deadline),
        );

        assert!(matches!(result, Err(EngineError::DeadlineExceeded)));
    }
}
