pub mod prioritizer;
pub mod urgency;

pub use prioritizer::prioritized_order;
pub use urgency::{score_all, urgency_score};
