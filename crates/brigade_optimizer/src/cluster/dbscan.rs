use std::collections::VecDeque;

/// DBSCAN parameters in projected kilometers.
#[derive(Debug, Clone, Copy)]
pub struct DbscanParams {
    pub eps_km: f64,
    pub min_samples: usize,
}

impl Default for DbscanParams {
    fn default() -> Self {
        DbscanParams {
            eps_km: 0.5,
            min_samples: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Cluster(usize),
    Noise,
}

/// Density-based clustering over points in a projected plane.
///
/// Exhaustive O(n²) neighborhood queries; candidate sets are a crew's open
/// tickets for one day, so no index is warranted. Labels are deterministic:
/// points are expanded in slice order.
pub fn dbscan(points: &[(f64, f64)], params: DbscanParams) -> Vec<Label> {
    let n = points.len();
    let eps_sq = params.eps_km * params.eps_km;

    let mut labels = vec![None; n];
    let mut next_cluster = 0;

    for start in 0..n {
        if labels[start].is_some() {
            continue;
        }

        let neighbors = region_query(points, start, eps_sq);
        if neighbors.len() < params.min_samples {
            labels[start] = Some(Label::Noise);
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[start] = Some(Label::Cluster(cluster));

        let mut frontier: VecDeque<usize> = neighbors.into();
        while let Some(point) = frontier.pop_front() {
            match labels[point] {
                Some(Label::Noise) => {
                    // Border point reachable from a core point.
                    labels[point] = Some(Label::Cluster(cluster));
                }
                Some(Label::Cluster(_)) => continue,
                None => {
                    labels[point] = Some(Label::Cluster(cluster));
                    let reachable = region_query(points, point, eps_sq);
                    if reachable.len() >= params.min_samples {
                        frontier.extend(reachable);
                    }
                }
            }
        }
    }

    labels.into_iter().map(|label| label.unwrap()).collect()
}

/// Indices within `eps` of `center`, the center included (standard DBSCAN
/// counts the point itself toward `min_samples`).
fn region_query(points: &[(f64, f64)], center: usize, eps_sq: f64) -> Vec<usize> {
    let (cx, cy) = points[center];
    points
        .iter()
        .enumerate()
        .filter(|&(_, &(x, y))| {
            let dx = x - cx;
            let dy = y - cy;
            dx * dx + dy * dy <= eps_sq
        })
        .map(|(i, _)| i)
        .collect()
}
