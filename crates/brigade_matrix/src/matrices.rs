use geo_types::Point;

use crate::oracle::{DistanceOracle, Leg};

/// Symmetric travel matrices over a candidate set.
///
/// Flat layout: the entry for a pair is at `from * len + to`. Rows follow
/// the order of the slice the matrices were built from.
pub struct TravelMatrices {
    km: Vec<f64>,
    minutes: Vec<f64>,
    len: usize,
}

impl TravelMatrices {
    /// Computes every unordered pair once through the oracle; the diagonal
    /// stays zero and the mirror entry is filled from the same leg.
    pub fn build(entries: &[(&str, Point)], oracle: &DistanceOracle) -> Self {
        let len = entries.len();
        let mut km = vec![0.0; len * len];
        let mut minutes = vec![0.0; len * len];

        for (i, &(a_id, a)) in entries.iter().enumerate() {
            for (j, &(b_id, b)) in entries.iter().enumerate().skip(i + 1) {
                let leg = oracle.between(a_id, a, b_id, b);
                km[i * len + j] = leg.km;
                km[j * len + i] = leg.km;
                minutes[i * len + j] = leg.minutes;
                minutes[j * len + i] = leg.minutes;
            }
        }

        TravelMatrices { km, minutes, len }
    }

    #[inline(always)]
    pub fn km(&self, from: usize, to: usize) -> f64 {
        self.km[from * self.len + to]
    }

    #[inline(always)]
    pub fn minutes(&self, from: usize, to: usize) -> f64 {
        self.minutes[from * self.len + to]
    }

    pub fn leg(&self, from: usize, to: usize) -> Leg {
        Leg {
            km: self.km(from, to),
            minutes: self.minutes(from, to),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
