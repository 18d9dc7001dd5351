use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use brigade_matrix::kmh::Kmh;
use brigade_matrix::matrices::TravelMatrices;
use brigade_matrix::oracle::DistanceOracle;
use fxhash::{FxHashMap, FxHashSet};
use geo_types::Point;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cluster::{build_clusters, dbscan::DbscanParams, single_cluster};
use crate::error::EngineError;
use crate::problem::cluster::{Cluster, ClusterIdx};
use crate::problem::route::{
    DropReason, DroppedTicket, Route, RouteStatistics, RouteStop, RunStatus,
};
use crate::problem::ticket::{CrewType, Priority, Ticket, TicketId, TicketIdx};
use crate::scoring::{prioritized_order, urgency::score_all};
use crate::solver::{solve_clusters, Deadline, SeedRule};
use crate::stitch::stitch;
use crate::store::TicketStore;
use crate::validate::{validate, ValidatedPlan, ValidationParams};

/// Route construction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Skip clustering; one cluster holding the prioritized candidates.
    UrgencyFirst,
    /// Cluster tours seeded at the member nearest the centroid.
    Geographic,
    /// Full pipeline: urgency-seeded tours over geographic clusters.
    #[default]
    Mixed,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "urgency_first" => Ok(Strategy::UrgencyFirst),
            "geographic" => Ok(Strategy::Geographic),
            "mixed" => Ok(Strategy::Mixed),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub speed: Kmh,
    pub clustering: DbscanParams,
    /// Fixed overhead charged per stop on top of service time.
    pub setup_minutes: f64,
    pub emergency_swap_limit: usize,
    pub default_max_hours: f64,
    pub default_max_points: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            speed: Kmh::default(),
            clustering: DbscanParams::default(),
            setup_minutes: 0.0,
            emergency_swap_limit: 10,
            default_max_hours: 8.0,
            default_max_points: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub crew_type: CrewType,
    pub date: Date,
    /// Shift budget in hours; the engine default applies when absent.
    pub max_hours: Option<f64>,
    pub max_points: Option<usize>,
    pub strategy: Strategy,
    /// Wall-clock budget for the optimization itself.
    pub deadline: Option<Duration>,
}

impl OptimizeRequest {
    pub fn new(crew_type: CrewType, date: Date) -> Self {
        OptimizeRequest {
            crew_type,
            date,
            max_hours: None,
            max_points: None,
            strategy: Strategy::default(),
            deadline: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeResult {
    pub status: RunStatus,
    /// Storage id of the persisted route; absent for empty runs or when
    /// persistence was unavailable.
    pub route_id: Option<String>,
    pub route: Route,
    pub dropped: Vec<DroppedTicket>,
    /// Tickets moved by dependency repair.
    pub reordered: Vec<TicketId>,
}

/// Orchestrates one optimize call end to end. Stateless between calls;
/// every buffer below belongs to the run and dies with it.
pub struct Engine<S> {
    store: Arc<S>,
    oracle: DistanceOracle,
    config: EngineConfig,
}

impl<S: TicketStore> Engine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        let oracle = DistanceOracle::new(config.speed);
        Engine {
            store,
            oracle,
            config,
        }
    }

    /// Replaces the default oracle, e.g. to attach an external distance
    /// cache store or a road-network provider.
    pub fn with_oracle(mut self, oracle: DistanceOracle) -> Self {
        self.oracle = oracle;
        self
    }

    #[instrument(skip(self, request), fields(crew = %request.crew_type, strategy = ?request.strategy))]
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResult, EngineError> {
        let max_hours = request.max_hours.unwrap_or(self.config.default_max_hours);
        if !max_hours.is_finite() || max_hours <= 0.0 {
            return Err(EngineError::InvalidRequest(format!(
                "max_hours must be positive, got {max_hours}"
            )));
        }
        let max_points = request.max_points.unwrap_or(self.config.default_max_points);
        if max_points == 0 {
            return Err(EngineError::InvalidRequest(
                "max_points must be positive".into(),
            ));
        }

        let deadline = request.deadline.map(Deadline::after);

        let listed = self.store.list_open_tickets(request.crew_type)?;
        let (candidates, invalid) = screen_candidates(listed, request.crew_type);
        let unroutable: FxHashSet<TicketId> = invalid
            .iter()
            .map(|drop| drop.ticket_id.clone())
            .collect();

        let mut manifest: Vec<DroppedTicket> = invalid;

        if candidates.is_empty() {
            info!("no open candidates for crew");
            return Ok(OptimizeResult {
                status: RunStatus::NoCandidates,
                route_id: None,
                route: empty_route(request),
                dropped: manifest,
                reordered: Vec::new(),
            });
        }

        let id_index: FxHashMap<TicketId, TicketIdx> = candidates
            .iter()
            .enumerate()
            .map(|(position, ticket)| (ticket.id().clone(), TicketIdx::new(position)))
            .collect();
        warn_unknown_dependencies(&candidates, &id_index, &unroutable);

        let scores = score_all(&candidates);
        let order = prioritized_order(&candidates, &scores);
        let mut rank = vec![0usize; candidates.len()];
        for (position, &idx) in order.iter().enumerate() {
            rank[idx.get()] = position;
        }

        let clusters = match request.strategy {
            Strategy::UrgencyFirst => single_cluster(&candidates, &order, &scores),
            Strategy::Geographic | Strategy::Mixed => {
                build_clusters(&candidates, &order, &scores, self.config.clustering)
            }
        };
        if clusters.iter().any(Cluster::is_empty) {
            return Err(EngineError::Internal("clusterer produced an empty cluster".into()));
        }

        let entries: Vec<(&str, Point)> = candidates
            .iter()
            .map(|ticket| (ticket.id().as_str(), ticket.point()))
            .collect();
        let matrices = TravelMatrices::build(&entries, &self.oracle);

        let seed_rule = match request.strategy {
            Strategy::Geographic => SeedRule::NearestCentroid,
            Strategy::UrgencyFirst | Strategy::Mixed => SeedRule::MaxUrgency,
        };
        let solved = solve_clusters(
            &clusters,
            &candidates,
            &scores,
            &matrices,
            seed_rule,
            &rank,
            deadline.as_ref(),
        )
        .map_err(|error| EngineError::Internal(error.to_string()))?;
        let partial = solved.partial;

        // A run already marked partial gets to finish; only a deadline
        // first crossed here aborts.
        let stitch_deadline = if partial { None } else { deadline.as_ref() };
        let sequence = stitch(
            &clusters,
            solved.tours,
            &candidates,
            &scores,
            &id_index,
            &matrices,
            &self.oracle,
            stitch_deadline,
        )?;

        let params = ValidationParams {
            max_minutes: max_hours * 60.0,
            max_points,
            setup_minutes: self.config.setup_minutes,
            emergency_swap_limit: self.config.emergency_swap_limit,
        };
        let plan = validate(
            &sequence,
            &candidates,
            &scores,
            &id_index,
            &unroutable,
            &matrices,
            &params,
        );

        let route = assemble_route(request, &candidates, &clusters, &plan, &matrices, &params);

        manifest.extend(plan.dropped.iter().map(|&(idx, reason)| DroppedTicket {
            ticket_id: candidates[idx].id().clone(),
            reason,
        }));
        let reordered: Vec<TicketId> = plan
            .reordered
            .iter()
            .map(|&idx| candidates[idx].id().clone())
            .collect();

        let route_id = if route.is_empty() {
            None
        } else {
            match self.store.save_route(&route) {
                Ok(id) => Some(id),
                Err(error) => {
                    warn!(%error, "route persistence unavailable, returning unsaved route");
                    None
                }
            }
        };

        let status = if partial { RunStatus::Partial } else { RunStatus::Ok };
        info!(
            stops = route.stops.len(),
            dropped = manifest.len(),
            ?status,
            "optimization finished"
        );

        Ok(OptimizeResult {
            status,
            route_id,
            route,
            dropped: manifest,
            reordered,
        })
    }
}

/// Splits the listed tickets into routable candidates and invalid-data
/// drops. Closed tickets and crew mismatches are filtered defensively even
/// though the store contract already excludes them.
fn screen_candidates(
    listed: Vec<Ticket>,
    crew_type: CrewType,
) -> (Vec<Ticket>, Vec<DroppedTicket>) {
    let mut candidates = Vec::with_capacity(listed.len());
    let mut invalid = Vec::new();

    for ticket in listed {
        if !ticket.is_open() || ticket.crew_type() != crew_type {
            continue;
        }
        match ticket.check_data() {
            Ok(()) => candidates.push(ticket),
            Err(issue) => {
                warn!(ticket = %ticket.id(), ?issue, "skipping malformed ticket");
                invalid.push(DroppedTicket {
                    ticket_id: ticket.id().clone(),
                    reason: DropReason::InvalidData,
                });
            }
        }
    }

    (candidates, invalid)
}

/// Dependencies on tickets outside this crew's open set are ignored with a
/// warning; dependencies on screened-out tickets are the validator's
/// problem and drop the dependent instead.
fn warn_unknown_dependencies(
    candidates: &[Ticket],
    id_index: &FxHashMap<TicketId, TicketIdx>,
    unroutable: &FxHashSet<TicketId>,
) {
    for ticket in candidates {
        for dep in ticket.dependencies() {
            if !id_index.contains_key(dep) && !unroutable.contains(dep) {
                warn!(
                    ticket = %ticket.id(),
                    dependency = %dep,
                    "ignoring dependency on a ticket outside this crew's open set"
                );
            }
        }
    }
}

fn empty_route(request: &OptimizeRequest) -> Route {
    Route {
        crew_type: request.crew_type,
        date: request.date,
        stops: Vec::new(),
        total_distance_km: 0.0,
        total_time_minutes: 0.0,
        statistics: RouteStatistics::default(),
    }
}

fn assemble_route(
    request: &OptimizeRequest,
    candidates: &[Ticket],
    clusters: &[Cluster],
    plan: &ValidatedPlan,
    matrices: &TravelMatrices,
    params: &ValidationParams,
) -> Route {
    let kept = &plan.kept;

    let mut stops = Vec::with_capacity(kept.len());
    let mut total_travel = 0.0;
    let mut leg_distance = 0.0;
    for (position, &member) in kept.iter().enumerate() {
        let leg_km = if position > 0 {
            let km = matrices.km(kept[position - 1].get(), member.get());
            total_travel += matrices.minutes(kept[position - 1].get(), member.get());
            km
        } else {
            0.0
        };
        leg_distance += leg_km;

        stops.push(RouteStop {
            ticket_id: candidates[member].id().clone(),
            arrival_offset_minutes: plan.arrival_offsets[position],
            leg_km,
            travel_minutes_to_next: kept
                .get(position + 1)
                .map(|&next| matrices.minutes(member.get(), next.get())),
            service_minutes: candidates[member].estimated_service_minutes(),
        });
    }

    // Closed-tour distance: the crew heads back toward its first stop.
    let total_distance_km = if kept.len() > 1 {
        let first = kept[0];
        let last = kept[kept.len() - 1];
        leg_distance + matrices.km(last.get(), first.get())
    } else {
        leg_distance
    };

    let total_service: f64 = kept
        .iter()
        .map(|&member| f64::from(candidates[member].estimated_service_minutes()))
        .sum();
    let total_time_minutes =
        total_service + total_travel + params.setup_minutes * kept.len() as f64;

    let mut clusters_served: FxHashSet<ClusterIdx> = FxHashSet::default();
    for (cluster_position, cluster) in clusters.iter().enumerate() {
        if cluster.members().iter().any(|member| kept.contains(member)) {
            clusters_served.insert(ClusterIdx::new(cluster_position));
        }
    }

    let statistics = RouteStatistics {
        total_points: kept.len(),
        clusters_served: clusters_served.len(),
        emergencies_covered: count_priority(candidates, kept, Priority::Emergency),
        urgent_covered: count_priority(candidates, kept, Priority::Urgent),
        skipped_for_budget: plan
            .dropped
            .iter()
            .filter(|&&(_, reason)| reason == DropReason::Budget)
            .count(),
        complaints_resolved: kept
            .iter()
            .map(|&member| candidates[member].complaints_count())
            .sum(),
        main_roads: kept
            .iter()
            .filter(|&&member| candidates[member].main_road())
            .count(),
        critical_locations: kept
            .iter()
            .filter(|&&member| candidates[member].near_critical_location())
            .count(),
        road_blocks_needed: kept
            .iter()
            .filter(|&&member| candidates[member].requires_road_block())
            .count(),
        total_service_minutes: total_service,
        total_travel_minutes: total_travel,
        efficiency_points_per_km: if total_distance_km > 0.0 {
            kept.len() as f64 / total_distance_km
        } else {
            kept.len() as f64
        },
        emergency_swaps_applied: plan.emergency_swaps_applied,
        emergency_swaps_infeasible: plan.emergency_swaps_infeasible,
    };

    Route {
        crew_type: request.crew_type,
        date: request.date,
        stops,
        total_distance_km,
        total_time_minutes,
        statistics,
    }
}

fn count_priority(candidates: &[Ticket], kept: &[TicketIdx], priority: Priority) -> usize {
    kept.iter()
        .filter(|&&member| candidates[member].priority() == priority)
        .count()
}
