//! Financial impact of downtime: minutes lost times a flat penalty rate.
//! RECOVERING time is charged at the same rate as BROKEN time.

use crate::services::analysis::events::MachineEvent;

/// Total estimated cost across every event in the supplied list. Empty
/// list costs nothing. Linear in both duration and rate.
pub fn estimate_financial_risk(events: &[MachineEvent], cost_per_minute: f64) -> f64 {
    events.iter().map(|e| e.duration_mins).sum::<f64>() * cost_per_minute
}

/// Cost of a single event at the given rate.
pub fn event_cost(event: &MachineEvent, cost_per_minute: f64) -> f64 {
    event.duration_mins * cost_per_minute
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(duration_mins: f64) -> MachineEvent {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MachineEvent {
            start,
            end: start,
            duration_mins,
            status: "BROKEN".to_string(),
            max_anomaly_score: 0.0,
        }
    }

    #[test]
    fn empty_event_list_costs_nothing() {
        assert_eq!(estimate_financial_risk(&[], 500.0), 0.0);
    }

    #[test]
    fn doubling_every_duration_doubles_the_total_risk() {
        let events = [event(10.0), event(25.0)];
        let doubled = [event(20.0), event(50.0)];
        let base = estimate_financial_risk(&events, 500.0);
        assert_eq!(base, 17_500.0);
        assert_eq!(estimate_financial_risk(&doubled, 500.0), 2.0 * base);
    }

    #[test]
    fn per_event_cost_uses_the_flat_rate() {
        assert_eq!(event_cost(&event(30.0), 100.0), 3_000.0);
    }
}
