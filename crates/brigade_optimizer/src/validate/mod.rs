use brigade_matrix::matrices::TravelMatrices;
use fxhash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::problem::route::DropReason;
use crate::problem::ticket::{Priority, Ticket, TicketId, TicketIdx};

#[derive(Debug, Clone, Copy)]
pub struct ValidationParams {
    pub max_minutes: f64,
    pub max_points: usize,
    /// Fixed per-stop overhead (parking, signage). Zero by default.
    pub setup_minutes: f64,
    pub emergency_swap_limit: usize,
}

/// The accepted subsequence plus the manifest of everything that fell out.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub kept: Vec<TicketIdx>,
    /// Minutes from shift start until arrival, parallel to `kept`.
    pub arrival_offsets: Vec<f64>,
    pub dropped: Vec<(TicketIdx, DropReason)>,
    /// Tickets moved later than their stitched position to sit after their
    /// dependencies.
    pub reordered: Vec<TicketIdx>,
    pub emergency_swaps_applied: usize,
    pub emergency_swaps_infeasible: usize,
}

/// Enforces the shift budget and dependency precedence over a stitched
/// sequence.
///
/// Order of operations is load-bearing: dependents of screened-out tickets
/// go first, cycles are broken next (largest id in the cycle goes, its
/// edges severed so the survivors stay routable), unsatisfiable
/// dependencies cascade out, the sequence is then repaired to respect
/// precedence, and only that repaired order is walked against the time and
/// point budget. A final safeguard swaps dropped emergencies back in for
/// kept low-priority work where the budget allows.
pub fn validate(
    sequence: &[TicketIdx],
    tickets: &[Ticket],
    scores: &[f64],
    id_index: &FxHashMap<TicketId, TicketIdx>,
    unroutable: &FxHashSet<TicketId>,
    matrices: &TravelMatrices,
    params: &ValidationParams,
) -> ValidatedPlan {
    let in_sequence: FxHashSet<TicketIdx> = sequence.iter().copied().collect();
    let mut dropped: Vec<(TicketIdx, DropReason)> = Vec::new();

    // Dependency lists resolved to candidate indices, sorted for
    // deterministic traversal. Unresolvable ids were already warned about
    // and ignored upstream.
    let mut deps: FxHashMap<TicketIdx, Vec<TicketIdx>> = FxHashMap::default();
    for &member in sequence {
        let mut list: Vec<TicketIdx> = tickets[member]
            .dependencies()
            .iter()
            .filter_map(|id| id_index.get(id).copied())
            .collect();
        list.sort_unstable();
        if !list.is_empty() {
            deps.insert(member, list);
        }
    }

    let mut alive: FxHashSet<TicketIdx> = in_sequence.clone();

    // 1. A dependency screened out of the run (bad data) will not be
    // serviced, so its dependents cannot be either.
    for &member in sequence {
        let blocked = tickets[member]
            .dependencies()
            .iter()
            .any(|id| unroutable.contains(id));
        if blocked {
            alive.remove(&member);
            dropped.push((member, DropReason::DependencyMissing));
        }
    }

    // 2a. Break dependency cycles: deterministically drop the largest id of
    // each cycle and sever its edges so the rest of the cycle stays in.
    while let Some(cycle) = find_cycle(sequence, &deps, &alive) {
        let victim = cycle
            .iter()
            .copied()
            .max_by(|&a, &b| tickets[a].id().cmp(tickets[b].id()))
            .expect("cycles are non-empty");
        warn!(ticket = %tickets[victim].id(), "dependency cycle, dropping largest id");

        alive.remove(&victim);
        deps.remove(&victim);
        for list in deps.values_mut() {
            list.retain(|&dep| dep != victim);
        }
        dropped.push((victim, DropReason::DependencyCycle));
    }

    // 2b. A dependency no longer alive in the sequence cannot be serviced
    // first; drop the dependents, cascading.
    loop {
        let mut changed = false;
        for &member in sequence {
            if !alive.contains(&member) {
                continue;
            }
            let unsatisfiable = deps
                .get(&member)
                .map(|list| list.iter().any(|dep| !in_sequence.contains(dep) || !alive.contains(dep)))
                .unwrap_or(false);
            if unsatisfiable {
                // Cycle-severed edges are already gone; this only fires for
                // dependencies that were dropped outright.
                alive.remove(&member);
                dropped.push((member, DropReason::DependencyMissing));
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // 3. Repair: emit in stitched order, deferring a ticket until all its
    // dependencies are out, which lands it at the earliest legal position.
    let (repaired, reordered) = repair_order(sequence, &deps, &alive);
    if !reordered.is_empty() {
        debug!(count = reordered.len(), "dependency repair reordered tickets");
    }

    // 4. Budget walk: accumulate travel + setup + service and stop at the
    // first ticket that would cross the shift budget or the point cap.
    let mut kept: Vec<TicketIdx> = Vec::new();
    let mut total = 0.0;
    for (position, &member) in repaired.iter().enumerate() {
        if kept.len() == params.max_points {
            dropped.extend(repaired[position..].iter().map(|&t| (t, DropReason::Budget)));
            break;
        }

        let leg = kept
            .last()
            .map(|&prev| matrices.minutes(prev.get(), member.get()))
            .unwrap_or(0.0);
        let cost = leg + params.setup_minutes + f64::from(tickets[member].estimated_service_minutes());

        if total + cost > params.max_minutes {
            dropped.extend(repaired[position..].iter().map(|&t| (t, DropReason::Budget)));
            break;
        }

        total += cost;
        kept.push(member);
    }

    // 5. Emergency safeguard.
    let (swaps_applied, swaps_infeasible) = swap_in_emergencies(
        &mut kept,
        &mut dropped,
        tickets,
        scores,
        &deps,
        matrices,
        params,
    );

    let arrival_offsets = arrival_offsets(&kept, tickets, matrices, params);

    ValidatedPlan {
        kept,
        arrival_offsets,
        dropped,
        reordered,
        emergency_swaps_applied: swaps_applied,
        emergency_swaps_infeasible: swaps_infeasible,
    }
}

/// One dependency cycle among the alive members, if any. DFS in sequence
/// order with sorted adjacency, so repeated runs find the same cycle.
fn find_cycle(
    sequence: &[TicketIdx],
    deps: &FxHashMap<TicketIdx, Vec<TicketIdx>>,
    alive: &FxHashSet<TicketIdx>,
) -> Option<Vec<TicketIdx>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn visit(
        node: TicketIdx,
        deps: &FxHashMap<TicketIdx, Vec<TicketIdx>>,
        alive: &FxHashSet<TicketIdx>,
        colors: &mut FxHashMap<TicketIdx, Color>,
        trail: &mut Vec<TicketIdx>,
    ) -> Option<Vec<TicketIdx>> {
        colors.insert(node, Color::Gray);
        trail.push(node);

        if let Some(list) = deps.get(&node) {
            for &dep in list {
                if !alive.contains(&dep) {
                    continue;
                }
                match colors.get(&dep).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = trail
                            .iter()
                            .position(|&t| t == dep)
                            .expect("gray nodes are on the trail");
                        return Some(trail[start..].to_vec());
                    }
                    Color::White => {
                        if let Some(cycle) = visit(dep, deps, alive, colors, trail) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        trail.pop();
        colors.insert(node, Color::Black);
        None
    }

    let mut colors: FxHashMap<TicketIdx, Color> = FxHashMap::default();
    for &member in sequence {
        if !alive.contains(&member) {
            continue;
        }
        if colors.get(&member).copied().unwrap_or(Color::White) == Color::White {
            let mut trail = Vec::new();
            if let Some(cycle) = visit(member, deps, alive, &mut colors, &mut trail) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Emits the sequence with every ticket at the earliest position after all
/// of its dependencies. Returns the repaired order and the tickets that had
/// to move.
fn repair_order(
    sequence: &[TicketIdx],
    deps: &FxHashMap<TicketIdx, Vec<TicketIdx>>,
    alive: &FxHashSet<TicketIdx>,
) -> (Vec<TicketIdx>, Vec<TicketIdx>) {
    let mut emitted: FxHashSet<TicketIdx> = FxHashSet::default();
    let mut repaired: Vec<TicketIdx> = Vec::with_capacity(alive.len());
    let mut pending: Vec<TicketIdx> = Vec::new();
    let mut reordered: Vec<TicketIdx> = Vec::new();

    let ready = |member: TicketIdx, emitted: &FxHashSet<TicketIdx>| {
        deps.get(&member)
            .map(|list| list.iter().all(|dep| emitted.contains(dep)))
            .unwrap_or(true)
    };

    let flush =
        |pending: &mut Vec<TicketIdx>, emitted: &mut FxHashSet<TicketIdx>, repaired: &mut Vec<TicketIdx>, reordered: &mut Vec<TicketIdx>| loop {
            let before = pending.len();
            pending.retain(|&waiting| {
                if ready(waiting, emitted) {
                    emitted.insert(waiting);
                    repaired.push(waiting);
                    reordered.push(waiting);
                    false
                } else {
                    true
                }
            });
            if pending.len() == before {
                break;
            }
        };

    for &member in sequence {
        if !alive.contains(&member) {
            continue;
        }
        if ready(member, &emitted) {
            emitted.insert(member);
            repaired.push(member);
            flush(&mut pending, &mut emitted, &mut repaired, &mut reordered);
        } else {
            pending.push(member);
        }
    }
    flush(&mut pending, &mut emitted, &mut repaired, &mut reordered);

    // Alive members all have alive dependencies, so the repair always
    // drains; anything left over is a bug in the cascade above.
    debug_assert!(pending.is_empty());

    (repaired, reordered)
}

/// Greedy one-for-one swaps of budget-dropped emergencies against kept
/// low-priority work. Returns (applied, infeasible).
fn swap_in_emergencies(
    kept: &mut Vec<TicketIdx>,
    dropped: &mut Vec<(TicketIdx, DropReason)>,
    tickets: &[Ticket],
    scores: &[f64],
    deps: &FxHashMap<TicketIdx, Vec<TicketIdx>>,
    matrices: &TravelMatrices,
    params: &ValidationParams,
) -> (usize, usize) {
    let mut emergencies: Vec<TicketIdx> = dropped
        .iter()
        .filter(|(member, reason)| {
            *reason == DropReason::Budget && tickets[*member].priority() == Priority::Emergency
        })
        .map(|&(member, _)| member)
        .collect();
    if emergencies.is_empty() {
        return (0, 0);
    }
    emergencies.sort_by(|&a, &b| {
        scores[b.get()]
            .total_cmp(&scores[a.get()])
            .then_with(|| tickets[a].id().cmp(tickets[b].id()))
    });

    let mut applied = 0;
    let mut infeasible = 0;

    for emergency in emergencies {
        if applied == params.emergency_swap_limit {
            break;
        }

        // Sacrifice candidates: kept tickets below urgent, least urgent
        // first.
        let mut candidates: Vec<usize> = (0..kept.len())
            .filter(|&pos| {
                let member = kept[pos];
                tickets[member].priority() > Priority::Urgent
                    && scores[member.get()] < scores[emergency.get()]
            })
            .collect();
        candidates.sort_by(|&a, &b| {
            scores[kept[a].get()]
                .total_cmp(&scores[kept[b].get()])
                .then_with(|| tickets[kept[a]].id().cmp(tickets[kept[b]].id()))
        });

        let mut swapped = false;
        for position in candidates {
            let victim = kept[position];

            // Nothing kept may depend on the victim.
            let victim_needed = kept.iter().any(|&member| {
                member != victim
                    && deps
                        .get(&member)
                        .map(|list| list.contains(&victim))
                        .unwrap_or(false)
            });
            if victim_needed {
                continue;
            }

            // The emergency's own dependencies must already sit before the
            // insertion point.
            let deps_satisfied = deps
                .get(&emergency)
                .map(|list| {
                    list.iter()
                        .all(|dep| kept[..position].contains(dep))
                })
                .unwrap_or(true);
            if !deps_satisfied {
                continue;
            }

            let mut tentative = kept.clone();
            tentative[position] = emergency;
            if walk_total(&tentative, tickets, matrices, params) <= params.max_minutes {
                kept[position] = emergency;
                dropped.retain(|&(member, _)| member != emergency);
                dropped.push((victim, DropReason::Budget));
                applied += 1;
                swapped = true;
                break;
            }
        }

        if !swapped {
            infeasible += 1;
            debug!(ticket = %tickets[emergency].id(), "emergency swap infeasible within budget");
        }
    }

    (applied, infeasible)
}

fn walk_total(
    order: &[TicketIdx],
    tickets: &[Ticket],
    matrices: &TravelMatrices,
    params: &ValidationParams,
) -> f64 {
    let mut total = 0.0;
    for (position, &member) in order.iter().enumerate() {
        if position > 0 {
            total += matrices.minutes(order[position - 1].get(), member.get());
        }
        total += params.setup_minutes + f64::from(tickets[member].estimated_service_minutes());
    }
    total
}

fn arrival_offsets(
    order: &[TicketIdx],
    tickets: &[Ticket],
    matrices: &TravelMatrices,
    params: &ValidationParams,
) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(order.len());
    let mut clock = 0.0;
    for (position, &member) in order.iter().enumerate() {
        if position > 0 {
            clock += matrices.minutes(order[position - 1].get(), member.get());
        }
        offsets.push(clock);
        clock += params.setup_minutes + f64::from(tickets[member].estimated_service_minutes());
    }
    offsets
}
