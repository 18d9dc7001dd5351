use std::cmp::Ordering;

use crate::problem::ticket::{Ticket, TicketIdx};

/// Total order over a candidate set: urgency descending, then priority
/// rank, then complaints descending, then id ascending. Deterministic for
/// identical inputs.
pub fn prioritized_order(tickets: &[Ticket], scores: &[f64]) -> Vec<TicketIdx> {
    let mut order: Vec<TicketIdx> = (0..tickets.len()).map(TicketIdx::new).collect();
    order.sort_by(|&a, &b| compare(&tickets[a], scores[a.get()], &tickets[b], scores[b.get()]));
    order
}

fn compare(a: &Ticket, a_score: f64, b: &Ticket, b_score: f64) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a.priority().rank().cmp(&b.priority().rank()))
        .then_with(|| b.complaints_count().cmp(&a.complaints_count()))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ticket::{Priority, ProblemType};
    use crate::scoring::urgency::score_all;

    fn ids(tickets: &[Ticket], order: &[TicketIdx]) -> Vec<String> {
        order
            .iter()
            .map(|&idx| tickets[idx].id().to_string())
            .collect()
    }

    #[test]
    fn test_urgency_is_primary() {
        let tickets = vec![
            Ticket::builder("low")
                .coordinates(0.0, 0.0)
                .priority(Priority::Low)
                .build(),
            Ticket::builder("emergency")
                .coordinates(0.0, 0.0)
                .priority(Priority::Emergency)
                .build(),
            Ticket::builder("high")
                .coordinates(0.0, 0.0)
                .priority(Priority::High)
                .build(),
        ];
        let scores = score_all(&tickets);

        assert_eq!(
            ids(&tickets, &prioritized_order(&tickets, &scores)),
            ["emergency", "high", "low"]
        );
    }

    #[test]
    fn test_complaints_break_equal_scores() {
        // Same priority and type; complaints feed the score, so pin the
        // scores equal and let the complaint tie-break decide.
        let tickets = vec![
            Ticket::builder("quiet").coordinates(0.0, 0.0).build(),
            Ticket::builder("noisy")
                .coordinates(0.0, 0.0)
                .complaints(3)
                .build(),
        ];
        let scores = vec![100.0, 100.0];

        assert_eq!(
            ids(&tickets, &prioritized_order(&tickets, &scores)),
            ["noisy", "quiet"]
        );
    }

    #[test]
    fn test_id_is_final_tie_break() {
        let tickets = vec![
            Ticket::builder("b").coordinates(0.0, 0.0).build(),
            Ticket::builder("a").coordinates(0.0, 0.0).build(),
            Ticket::builder("c").coordinates(0.0, 0.0).build(),
        ];
        let scores = score_all(&tickets);

        assert_eq!(
            ids(&tickets, &prioritized_order(&tickets, &scores)),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_priority_rank_beats_type_on_equal_score() {
        // An urgent dark lamp (500 + 60) and a high exposed wiring with a
        // critical location hit different components but can tie on score;
        // rank must then favor the urgent ticket.
        let tickets = vec![
            Ticket::builder("wiring")
                .coordinates(0.0, 0.0)
                .priority(Priority::High)
                .problem_type(ProblemType::ExposedWiring)
                .build(),
            Ticket::builder("lamp")
                .coordinates(0.0, 0.0)
                .priority(Priority::Urgent)
                .problem_type(ProblemType::DarkLamp)
                .build(),
        ];
        let scores = vec![560.0, 560.0];

        assert_eq!(
            ids(&tickets, &prioritized_order(&tickets, &scores)),
            ["lamp", "wiring"]
        );
    }
}
