use geo_types::Point;

use crate::define_index_newtype;
use crate::problem::ticket::{Priority, Ticket, TicketIdx};

define_index_newtype!(ClusterIdx, Cluster);

/// Ephemeral geographic cluster produced for one optimization run.
#[derive(Debug, Clone)]
pub struct Cluster {
    members: Vec<TicketIdx>,
    centroid: Point,
    aggregate_priority: Priority,
    max_urgency: f64,
    total_service_minutes: u32,
}

impl Cluster {
    /// `members` must be non-empty; the clusterer never emits an empty
    /// cluster.
    pub fn new(members: Vec<TicketIdx>, centroid: Point, tickets: &[Ticket], scores: &[f64]) -> Self {
        debug_assert!(!members.is_empty());

        let aggregate_priority = members
            .iter()
            .map(|&idx| tickets[idx].priority())
            .min()
            .unwrap_or(Priority::Low);
        let max_urgency = members
            .iter()
            .map(|&idx| scores[idx.get()])
            .fold(0.0_f64, f64::max);
        let total_service_minutes = members
            .iter()
            .map(|&idx| tickets[idx].estimated_service_minutes())
            .sum();

        Cluster {
            members,
            centroid,
            aggregate_priority,
            max_urgency,
            total_service_minutes,
        }
    }

    pub fn members(&self) -> &[TicketIdx] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    /// Most urgent priority among members.
    pub fn aggregate_priority(&self) -> Priority {
        self.aggregate_priority
    }

    /// Highest urgency score among members.
    pub fn max_urgency(&self) -> f64 {
        self.max_urgency
    }

    pub fn total_service_minutes(&self) -> u32 {
        self.total_service_minutes
    }
}
