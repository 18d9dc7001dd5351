use brigade_matrix::kmh::Kmh;
use brigade_matrix::matrices::TravelMatrices;
use brigade_matrix::oracle::DistanceOracle;
use fxhash::FxHashMap;
use geo_types::Point;

use crate::problem::ticket::{Ticket, TicketId, TicketIdx};

pub fn build_matrices(tickets: &[Ticket]) -> TravelMatrices {
    let oracle = DistanceOracle::new(Kmh::default());
    let entries: Vec<(&str, Point)> = tickets
        .iter()
        .map(|ticket| (ticket.id().as_str(), ticket.point()))
        .collect();
    TravelMatrices::build(&entries, &oracle)
}

pub fn id_index(tickets: &[Ticket]) -> FxHashMap<TicketId, TicketIdx> {
    tickets
        .iter()
        .enumerate()
        .map(|(position, ticket)| (ticket.id().clone(), TicketIdx::new(position)))
        .collect()
}

pub fn all_members(tickets: &[Ticket]) -> Vec<TicketIdx> {
    (0..tickets.len()).map(TicketIdx::new).collect()
}
