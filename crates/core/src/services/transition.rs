//! Status transition policy for outage reports.

use gridwatch_db::entities::outage_report::OutageStatus;

/// Returns the status a report moves to when `requested` is applied to
/// `current`.
///
/// Every transition is currently accepted, including re-entering the same
/// status and moving backwards out of `Resolved`. The single call site in
/// `OutageReportService::update_status` keeps the policy easy to tighten
/// later without touching handlers.
pub fn apply(current: OutageStatus, requested: OutageStatus) -> OutageStatus {
    let _ = current;
    requested
}

/// True when entering `next` should stamp a resolution timestamp.
pub fn enters_resolved(next: OutageStatus) -> bool {
    matches!(next, OutageStatus::Resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_transition_is_accepted() {
        let all = [
            OutageStatus::Pending,
            OutageStatus::InProgress,
            OutageStatus::Resolved,
        ];
        for from in all {
            for to in all {
                assert_eq!(apply(from, to), to);
            }
        }
    }

    #[test]
    fn only_resolved_stamps_resolution() {
        assert!(enters_resolved(OutageStatus::Resolved));
        assert!(!enters_resolved(OutageStatus::Pending));
        assert!(!enters_resolved(OutageStatus::InProgress));
    }
}
