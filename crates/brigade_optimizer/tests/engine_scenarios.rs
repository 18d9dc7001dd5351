mod common;

use std::time::Duration;

use brigade_optimizer::problem::{CrewType, DropReason, Priority, RunStatus, Ticket};
use common::{engine_with, request, stop_ids};

#[test]
fn urgency_dominates_distance() {
    let (engine, _) = engine_with(vec![
        Ticket::builder("A")
            .coordinates(0.0, 0.0)
            .crew_type(CrewType::Asphalt)
            .priority(Priority::Low)
            .build(),
        Ticket::builder("B")
            .coordinates(1.0, 1.0)
            .crew_type(CrewType::Asphalt)
            .priority(Priority::Emergency)
            .build(),
    ]);

    let result = engine.optimize(&request(CrewType::Asphalt)).unwrap();

    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(stop_ids(&result.route), ["B", "A"]);
    // Twice the great-circle leg: out and back closes the tour.
    assert!(
        (result.route.total_distance_km - 314.47).abs() < 0.5,
        "got {}",
        result.route.total_distance_km
    );
}

#[test]
fn two_dense_groups_stitch_with_one_hop() {
    let mut tickets = Vec::new();
    for (index, (lat, lon)) in [
        (0.0, 0.0),
        (0.0, 0.001),
        (0.0, 0.002),
        (10.0, 10.0),
        (10.0, 10.001),
        (10.0, 10.002),
    ]
    .into_iter()
    .enumerate()
    {
        tickets.push(
            Ticket::builder(format!("t{index}"))
                .coordinates(lat, lon)
                .service_minutes(10)
                .build(),
        );
    }

    let (engine, _) = engine_with(tickets);
    // The inter-cluster hop is ~1565 km; widen the shift budget so the
    // cluster structure, not the time budget, is what this exercises.
    let mut req = request(CrewType::General);
    req.max_hours = Some(60.0);

    let result = engine.optimize(&req).unwrap();

    assert_eq!(result.route.stops.len(), 6);
    assert_eq!(result.route.statistics.clusters_served, 2);

    // Exactly one leg jumps between the groups.
    let long_hops = result
        .route
        .stops
        .iter()
        .filter(|stop| stop.leg_km > 1.0)
        .count();
    assert_eq!(long_hops, 1);
}

#[test]
fn dependency_overrides_urgency() {
    let (engine, _) = engine_with(vec![
        Ticket::builder("T1")
            .coordinates(0.0, 0.0)
            .priority(Priority::Low)
            .build(),
        Ticket::builder("T2")
            .coordinates(0.0, 0.001)
            .priority(Priority::Emergency)
            .depends_on("T1")
            .build(),
    ]);

    let result = engine.optimize(&request(CrewType::General)).unwrap();

    assert_eq!(stop_ids(&result.route), ["T1", "T2"]);
    assert_eq!(result.reordered, [brigade_optimizer::problem::TicketId::new("T2")]);
    assert!(result.dropped.is_empty());
}

#[test]
fn budget_keeps_top_three_by_urgency() {
    let tickets = (0..10)
        .map(|index| {
            Ticket::builder(format!("t{index}"))
                .coordinates(0.0, 0.0)
                .service_minutes(60)
                .complaints(index)
                .build()
        })
        .collect();
    let (engine, _) = engine_with(tickets);

    let mut req = request(CrewType::General);
    req.max_hours = Some(3.0);
    let result = engine.optimize(&req).unwrap();

    assert_eq!(stop_ids(&result.route), ["t9", "t8", "t7"]);
    assert_eq!(result.dropped.len(), 7);
    assert!(result
        .dropped
        .iter()
        .all(|drop| drop.reason == DropReason::Budget));
}

#[test]
fn cycle_drops_largest_id_and_routes_the_rest() {
    let (engine, _) = engine_with(vec![
        Ticket::builder("T1")
            .coordinates(0.0, 0.0)
            .depends_on("T2")
            .build(),
        Ticket::builder("T2")
            .coordinates(0.0, 0.001)
            .depends_on("T1")
            .build(),
    ]);

    let result = engine.optimize(&request(CrewType::General)).unwrap();

    assert_eq!(stop_ids(&result.route), ["T1"]);
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(result.dropped[0].ticket_id.as_str(), "T2");
    assert_eq!(result.dropped[0].reason, DropReason::DependencyCycle);
}

#[test]
fn expired_deadline_returns_partial_but_feasible() {
    let mut tickets = Vec::new();
    for group in 0..5 {
        let base_lat = group as f64 * 0.05;
        for member in 0..20 {
            tickets.push(
                Ticket::builder(format!("g{group}m{member:02}"))
                    .coordinates(base_lat, member as f64 * 0.0005)
                    .service_minutes(5)
                    .build(),
            );
        }
    }

    let (engine, _) = engine_with(tickets);
    let mut req = request(CrewType::General);
    req.deadline = Some(Duration::from_millis(1));

    let result = engine.optimize(&req).unwrap();

    assert_eq!(result.status, RunStatus::Partial);

    // Invariants still hold on the partial output.
    let route = &result.route;
    assert!(route.stops.len() <= 50);
    assert!(route.total_time_minutes <= 8.0 * 60.0 + 1e-6);

    let mut seen = std::collections::HashSet::new();
    for stop in &route.stops {
        assert!(seen.insert(stop.ticket_id.clone()), "duplicate stop");
    }
}

#[test]
fn routes_are_persisted() {
    let (engine, store) = engine_with(vec![
        Ticket::builder("t1").coordinates(0.0, 0.0).build(),
        Ticket::builder("t2").coordinates(0.0, 0.001).build(),
    ]);

    let result = engine.optimize(&request(CrewType::General)).unwrap();

    assert_eq!(result.route_id.as_deref(), Some("route-1"));
    let saved = store.saved_routes();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].1["stops"].as_array().unwrap().len(), 2);
}
