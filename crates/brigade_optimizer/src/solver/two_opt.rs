use brigade_matrix::matrices::TravelMatrices;

use crate::problem::ticket::TicketIdx;
use crate::solver::deadline::Deadline;

/// Minimum saving, in travel minutes, for a reversal to count.
pub const IMPROVEMENT_EPSILON: f64 = 1e-6;
/// Full-pass cap; city-scale tours converge long before this.
pub const MAX_PASSES: usize = 50;

/// In-place 2-opt refinement of an open tour, in travel minutes.
///
/// Considers every pair of non-adjacent edges `(i, i+1)` and `(j, j+1)`
/// with `j > i + 1` and reverses the segment between them whenever
///
/// ```text
///    ... [i] --x--> [i+1] -> ... -> [j] --x--> [j+1] ...
/// becomes
///    ... [i] -----> [j] -> ... -> [i+1] -----> [j+1] ...
/// ```
///
/// saves more than [`IMPROVEMENT_EPSILON`]. Repeats until a full pass finds
/// no improvement, capped at [`MAX_PASSES`]. Returns `false` when the
/// deadline cut refinement short; the tour is still a complete permutation.
pub fn refine(order: &mut [TicketIdx], matrices: &TravelMatrices, deadline: Option<&Deadline>) -> bool {
    let n = order.len();
    if n < 4 {
        return true;
    }

    for _pass in 0..MAX_PASSES {
        if let Some(deadline) = deadline {
            if deadline.expired() {
                return false;
            }
        }

        let mut improved = false;

        for i in 0..n - 3 {
            for j in i + 2..n - 1 {
                let current = matrices.minutes(order[i].get(), order[i + 1].get())
                    + matrices.minutes(order[j].get(), order[j + 1].get());
                let candidate = matrices.minutes(order[i].get(), order[j].get())
                    + matrices.minutes(order[i + 1].get(), order[j + 1].get());

                if candidate < current - IMPROVEMENT_EPSILON {
                    order[i + 1..=j].reverse();
                    improved = true;
                }
            }
        }

        if !improved {
            return true;
        }
    }

    true
}
