pub mod cluster;
pub mod route;
pub mod ticket;

pub use cluster::{Cluster, ClusterIdx};
pub use route::{DropReason, DroppedTicket, Route, RouteStatistics, RouteStop, RunStatus};
pub use ticket::{
    CrewType, Priority, ProblemSize, ProblemType, Ticket, TicketBuilder, TicketId, TicketIdx,
    TicketStatus,
};
