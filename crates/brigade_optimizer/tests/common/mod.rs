use std::sync::Arc;

use brigade_optimizer::engine::{Engine, OptimizeRequest};
use brigade_optimizer::problem::{CrewType, Route, Ticket};
use brigade_optimizer::store::InMemoryTicketStore;
use jiff::civil::Date;

pub fn engine_with(tickets: Vec<Ticket>) -> (Engine<InMemoryTicketStore>, Arc<InMemoryTicketStore>) {
    let store = Arc::new(InMemoryTicketStore::new());
    store.insert_all(tickets);
    (Engine::new(Arc::clone(&store)), store)
}

pub fn request(crew_type: CrewType) -> OptimizeRequest {
    OptimizeRequest::new(crew_type, Date::constant(2024, 7, 1))
}

pub fn stop_ids(route: &Route) -> Vec<String> {
    route.ticket_ids().map(ToString::to_string).collect()
}
