use std::collections::BinaryHeap;

/// Candidate edge between two cluster centroids.
struct CentroidEdge {
    a: usize,
    b: usize,
    minutes: f64,
}

impl PartialEq for CentroidEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CentroidEdge {}

impl PartialOrd for CentroidEdge {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CentroidEdge {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed weight for a min-heap; endpoint order keeps equal-weight
        // pops deterministic.
        other
            .minutes
            .total_cmp(&self.minutes)
            .then_with(|| (other.a, other.b).cmp(&(self.a, self.b)))
    }
}

// Disjoint set union
struct Dsu {
    parent: Vec<usize>,
    components: usize,
}

impl Dsu {
    fn new(n: usize) -> Self {
        Dsu {
            parent: (0..n).collect(),
            components: n,
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] == i {
            i
        } else {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
            root
        }
    }

    fn union(&mut self, i: usize, j: usize) -> bool {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i == root_j {
            return false;
        }
        self.parent[root_i] = root_j;
        self.components -= 1;
        true
    }
}

/// Kruskal's minimum spanning tree over a complete symmetric weight
/// matrix. Returns the adjacency list of the tree, `(neighbor, weight)`.
pub fn minimum_spanning_tree(weights: &[Vec<f64>]) -> Vec<Vec<(usize, f64)>> {
    let n = weights.len();
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];

    if n <= 1 {
        return adjacency;
    }

    let mut edges = BinaryHeap::new();
    for a in 0..n {
        for b in (a + 1)..n {
            edges.push(CentroidEdge {
                a,
                b,
                minutes: weights[a][b],
            });
        }
    }

    let mut dsu = Dsu::new(n);
    while let Some(edge) = edges.pop() {
        if dsu.components == 1 {
            break;
        }
        if dsu.union(edge.a, edge.b) {
            adjacency[edge.a].push((edge.b, edge.minutes));
            adjacency[edge.b].push((edge.a, edge.minutes));
        }
    }

    adjacency
}
