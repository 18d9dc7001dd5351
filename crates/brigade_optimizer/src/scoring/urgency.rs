use crate::problem::ticket::{Priority, ProblemSize, ProblemType, Ticket};

// The urgency weights are a contract with dispatch: changing any value
// reorders live routes. Tests pin every constant.

pub const TRAFFIC_BONUS: f64 = 150.0;
pub const CRITICAL_LOCATION_BONUS: f64 = 100.0;
pub const MAIN_ROAD_BONUS: f64 = 80.0;
pub const COMMERCE_BONUS: f64 = 60.0;

pub const COMPLAINT_WEIGHT: f64 = 5.0;
pub const COMPLAINT_CAP: u32 = 50;

pub fn priority_base(priority: Priority) -> f64 {
    match priority {
        Priority::Emergency => 1000.0,
        Priority::Urgent => 500.0,
        Priority::High => 200.0,
        Priority::Medium => 50.0,
        Priority::Low => 10.0,
    }
}

pub fn type_bonus(problem_type: ProblemType) -> f64 {
    match problem_type {
        ProblemType::ExposedWiring => 200.0,
        ProblemType::FaultyTrafficLight => 180.0,
        ProblemType::SewerLeak => 120.0,
        ProblemType::WaterLeak => 100.0,
        ProblemType::DarkLamp => 60.0,
        ProblemType::Pothole => 40.0,
        ProblemType::CloggedDrain => 40.0,
        ProblemType::BrokenSidewalk => 20.0,
    }
}

pub fn size_factor(size: Option<ProblemSize>) -> f64 {
    match size {
        Some(ProblemSize::Large) => 1.5,
        Some(ProblemSize::Medium) | None => 1.0,
        Some(ProblemSize::Small) => 0.7,
    }
}

/// Scalar urgency of one ticket.
///
/// `(priority_base + type_bonus + impact_bonus + complaint_bonus) * size_factor`
pub fn urgency_score(ticket: &Ticket) -> f64 {
    let mut impact_bonus = 0.0;
    if ticket.affects_traffic() {
        impact_bonus += TRAFFIC_BONUS;
    }
    if ticket.near_critical_location() {
        impact_bonus += CRITICAL_LOCATION_BONUS;
    }
    if ticket.main_road() {
        impact_bonus += MAIN_ROAD_BONUS;
    }
    if ticket.affects_commerce() {
        impact_bonus += COMMERCE_BONUS;
    }

    let complaint_bonus =
        f64::from(ticket.complaints_count().min(COMPLAINT_CAP)) * COMPLAINT_WEIGHT;

    (priority_base(ticket.priority())
        + type_bonus(ticket.problem_type())
        + impact_bonus
        + complaint_bonus)
        * size_factor(ticket.problem_size())
}

/// Scores for a candidate set, indexed like the slice.
pub fn score_all(tickets: &[Ticket]) -> Vec<f64> {
    tickets.iter().map(urgency_score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ticket::Ticket;

    fn base_ticket() -> crate::problem::ticket::TicketBuilder {
        Ticket::builder("t1").coordinates(0.0, 0.0)
    }

    #[test]
    fn test_priority_base_values() {
        assert_eq!(priority_base(Priority::Emergency), 1000.0);
        assert_eq!(priority_base(Priority::Urgent), 500.0);
        assert_eq!(priority_base(Priority::High), 200.0);
        assert_eq!(priority_base(Priority::Medium), 50.0);
        assert_eq!(priority_base(Priority::Low), 10.0);
    }

    #[test]
    fn test_type_bonus_values() {
        assert_eq!(type_bonus(ProblemType::ExposedWiring), 200.0);
        assert_eq!(type_bonus(ProblemType::FaultyTrafficLight), 180.0);
        assert_eq!(type_bonus(ProblemType::SewerLeak), 120.0);
        assert_eq!(type_bonus(ProblemType::WaterLeak), 100.0);
        assert_eq!(type_bonus(ProblemType::DarkLamp), 60.0);
        assert_eq!(type_bonus(ProblemType::Pothole), 40.0);
        assert_eq!(type_bonus(ProblemType::CloggedDrain), 40.0);
        assert_eq!(type_bonus(ProblemType::BrokenSidewalk), 20.0);
    }

    #[test]
    fn test_size_factor_values() {
        assert_eq!(size_factor(Some(ProblemSize::Large)), 1.5);
        assert_eq!(size_factor(Some(ProblemSize::Medium)), 1.0);
        assert_eq!(size_factor(Some(ProblemSize::Small)), 0.7);
        assert_eq!(size_factor(None), 1.0);
    }

    #[test]
    fn test_full_formula() {
        let ticket = base_ticket()
            .priority(Priority::Urgent)
            .problem_type(ProblemType::WaterLeak)
            .problem_size(ProblemSize::Large)
            .affects_traffic(true)
            .main_road(true)
            .complaints(10)
            .build();

        // (500 + 100 + 150 + 80 + 10*5) * 1.5
        assert_eq!(urgency_score(&ticket), 880.0 * 1.5);
    }

    #[test]
    fn test_complaints_are_capped() {
        let capped = base_ticket().complaints(50).build();
        let over = base_ticket().complaints(5000).build();
        assert_eq!(urgency_score(&capped), urgency_score(&over));

        // Medium pothole, 50 complaints: (50 + 40 + 250) * 1.0
        assert_eq!(urgency_score(&capped), 340.0);
    }

    #[test]
    fn test_emergencies_dominate_impact_stacking() {
        let plain_emergency = base_ticket()
            .priority(Priority::Emergency)
            .problem_type(ProblemType::BrokenSidewalk)
            .problem_size(ProblemSize::Small)
            .build();
        let loaded_high = base_ticket()
            .priority(Priority::High)
            .problem_type(ProblemType::ExposedWiring)
            .affects_traffic(true)
            .affects_commerce(true)
            .near_critical_location(true)
            .main_road(true)
            .complaints(20)
            .build();

        assert!(urgency_score(&plain_emergency) < urgency_score(&loaded_high));
        // But with equal adornment the emergency always wins.
        let loaded_emergency = base_ticket()
            .priority(Priority::Emergency)
            .problem_type(ProblemType::ExposedWiring)
            .affects_traffic(true)
            .affects_commerce(true)
            .near_critical_location(true)
            .main_road(true)
            .complaints(20)
            .build();
        assert!(urgency_score(&loaded_emergency) > urgency_score(&loaded_high));
    }
}
