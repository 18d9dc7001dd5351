use fxhash::FxHashMap;
use parking_lot::RwLock;
use thiserror::Error;

use crate::problem::route::Route;
use crate::problem::ticket::{CrewType, Ticket, TicketId};

#[derive(Debug, Error)]
#[error("ticket store: {0}")]
pub struct StoreError(pub String);

/// The persistence surface the engine consumes. The production
/// implementation sits on the relational store; the engine never issues
/// spatial queries against it, it pulls filtered sets and does its own
/// spatial math.
pub trait TicketStore: Send + Sync {
    fn list_open_tickets(&self, crew_type: CrewType) -> Result<Vec<Ticket>, StoreError>;
    fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError>;
    /// Persists a finished route, returning its storage id.
    fn save_route(&self, route: &Route) -> Result<String, StoreError>;
}

/// Map-backed store for tests and embedders without the relational
/// backend. Routes are kept as JSON documents the way the production
/// store's route table does.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<FxHashMap<TicketId, Ticket>>,
    routes: RwLock<Vec<(String, serde_json::Value)>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ticket: Ticket) {
        self.tickets.write().insert(ticket.id().clone(), ticket);
    }

    pub fn insert_all(&self, tickets: impl IntoIterator<Item = Ticket>) {
        let mut guard = self.tickets.write();
        for ticket in tickets {
            guard.insert(ticket.id().clone(), ticket);
        }
    }

    pub fn saved_routes(&self) -> Vec<(String, serde_json::Value)> {
        self.routes.read().clone()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn list_open_tickets(&self, crew_type: CrewType) -> Result<Vec<Ticket>, StoreError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .read()
            .values()
            .filter(|ticket| ticket.is_open() && ticket.crew_type() == crew_type)
            .cloned()
            .collect();
        // Map iteration order is arbitrary; the engine's contract is
        // deterministic output for identical ticket sets.
        tickets.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(tickets)
    }

    fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StoreError> {
        Ok(self.tickets.read().get(id).cloned())
    }

    fn save_route(&self, route: &Route) -> Result<String, StoreError> {
        let document =
            serde_json::to_value(route).map_err(|error| StoreError(error.to_string()))?;
        let mut routes = self.routes.write();
        let id = format!("route-{}", routes.len() + 1);
        routes.push((id.clone(), document));
        Ok(id)
    }
}
