use jiff::civil::Date;
use schemars::JsonSchema;
use serde::Serialize;

use crate::problem::ticket::{CrewType, TicketId};

/// Facade-level outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    NoCandidates,
    /// The deadline cut cluster solving short; the route is still feasible.
    Partial,
}

/// Why a candidate ticket did not make it into the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Budget,
    DependencyMissing,
    DependencyCycle,
    InvalidData,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DroppedTicket {
    pub ticket_id: TicketId,
    pub reason: DropReason,
}

/// One planned visit.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RouteStop {
    pub ticket_id: TicketId,
    /// Minutes from shift start until the crew arrives here.
    pub arrival_offset_minutes: f64,
    /// Kilometers traveled from the previous stop (0 for the first).
    pub leg_km: f64,
    /// Travel minutes to the next stop, absent on the last.
    pub travel_minutes_to_next: Option<f64>,
    pub service_minutes: u32,
}

#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct RouteStatistics {
    pub total_points: usize,
    pub clusters_served: usize,
    pub emergencies_covered: usize,
    pub urgent_covered: usize,
    pub skipped_for_budget: usize,
    pub complaints_resolved: u32,
    pub main_roads: usize,
    pub critical_locations: usize,
    pub road_blocks_needed: usize,
    pub total_service_minutes: f64,
    pub total_travel_minutes: f64,
    /// Stops per kilometer of the closed tour; falls back to the stop count
    /// when the route never moves.
    pub efficiency_points_per_km: f64,
    pub emergency_swaps_applied: usize,
    pub emergency_swaps_infeasible: usize,
}

/// The ordered, budget-feasible visit plan emitted by the engine.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Route {
    pub crew_type: CrewType,
    #[schemars(with = "String")]
    pub date: Date,
    pub stops: Vec<RouteStop>,
    /// Closed-tour distance: every leg plus the return to the first stop.
    pub total_distance_km: f64,
    /// Service plus travel minutes of the walked route.
    pub total_time_minutes: f64,
    pub statistics: RouteStatistics,
}

impl Route {
    pub fn ticket_ids(&self) -> impl Iterator<Item = &TicketId> {
        self.stops.iter().map(|stop| &stop.ticket_id)
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
