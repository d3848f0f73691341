//! Bidirectional priority mapping between the local 0..4 scale (0 most
//! urgent) and the remote 1..4 scale (4 highest), including the overdue
//! escalation rule.

use chrono::NaiveDate;

use crate::task::{Due, Task};

/// Remote priority level that qualifies for overdue escalation.
pub const REMOTE_TOP_PRIORITY: u8 = 4;

/// Local priority assigned to escalated tasks.
pub const LOCAL_URGENT: u8 = 0;

/// Map a remote-scale priority to the local scale.
///
/// Out-of-range input clamps to the lowest local priority; remote snapshots
/// are validated before they reach this point.
pub fn remote_to_local(remote: u8) -> u8 {
    match remote {
        4 => 1,
        3 => 2,
        2 => 3,
        _ => 4,
    }
}

/// Map a local-scale priority to the remote scale.
///
/// Local 0 and 1 both land on remote 4: the remote scale has no slot above
/// "highest", so urgency collapses into it.
pub fn local_to_remote(local: u8) -> u8 {
    match local {
        0 | 1 => 4,
        2 => 3,
        3 => 2,
        _ => 1,
    }
}

/// Map a remote task's priority to the local scale, applying escalation.
///
/// A remote task at the top level whose due date is `today` or earlier maps
/// to local 0 regardless of the table. Tasks without a due date, without a
/// parseable day, or below the top level never escalate.
pub fn remote_task_to_local(task: &Task, today: NaiveDate) -> Option<u8> {
    let remote = task.priority?;
    if remote == REMOTE_TOP_PRIORITY && is_due_or_overdue(task.due.as_ref(), today) {
        return Some(LOCAL_URGENT);
    }
    Some(remote_to_local(remote))
}

fn is_due_or_overdue(due: Option<&Due>, today: NaiveDate) -> bool {
    due.and_then(Due::day)
        .map(|day| day <= today)
        .unwrap_or(false)
}

/// Compare a local task's literal priority against a remote task's mapped
/// local priority for duplicate detection.
///
/// An unknown (missing) priority never equals a numeric one.
pub fn priorities_match(local: Option<u8>, remote_mapped: Option<u8>) -> bool {
    match (local, remote_mapped) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use chrono::TimeZone;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    #[test]
    fn remote_to_local_table() {
        assert_eq!(remote_to_local(4), 1);
        assert_eq!(remote_to_local(3), 2);
        assert_eq!(remote_to_local(2), 3);
        assert_eq!(remote_to_local(1), 4);
    }

    #[test]
    fn local_to_remote_table() {
        assert_eq!(local_to_remote(0), 4);
        assert_eq!(local_to_remote(1), 4);
        assert_eq!(local_to_remote(2), 3);
        assert_eq!(local_to_remote(3), 2);
        assert_eq!(local_to_remote(4), 1);
    }

    #[test]
    fn escalates_top_priority_due_today() {
        let task = Task::new("file taxes")
            .with_priority(4)
            .with_due(Due::Date(today()));
        assert_eq!(remote_task_to_local(&task, today()), Some(0));
    }

    #[test]
    fn escalates_top_priority_overdue() {
        let yesterday = today().pred_opt().unwrap();
        let task = Task::new("file taxes")
            .with_priority(4)
            .with_due(Due::Date(yesterday));
        assert_eq!(remote_task_to_local(&task, today()), Some(0));
    }

    #[test]
    fn no_escalation_when_due_tomorrow() {
        let tomorrow = today().succ_opt().unwrap();
        let task = Task::new("file taxes")
            .with_priority(4)
            .with_due(Due::Date(tomorrow));
        assert_eq!(remote_task_to_local(&task, today()), Some(1));
    }

    #[test]
    fn no_escalation_below_top_priority() {
        let task = Task::new("file taxes")
            .with_priority(3)
            .with_due(Due::Date(today()));
        assert_eq!(remote_task_to_local(&task, today()), Some(2));
    }

    #[test]
    fn no_escalation_without_due_date() {
        let task = Task::new("file taxes").with_priority(4);
        assert_eq!(remote_task_to_local(&task, today()), Some(1));
    }

    #[test]
    fn datetime_due_compared_at_day_granularity() {
        // Due late tonight still counts as due today.
        let dt = Utc.with_ymd_and_hms(2026, 8, 27, 23, 59, 0).unwrap();
        let task = Task::new("file taxes")
            .with_priority(4)
            .with_due(Due::Datetime(dt));
        assert_eq!(remote_task_to_local(&task, today()), Some(0));
    }

    #[test]
    fn unknown_priority_never_matches() {
        assert!(!priorities_match(None, Some(1)));
        assert!(!priorities_match(Some(1), None));
        assert!(!priorities_match(None, None));
        assert!(priorities_match(Some(2), Some(2)));
    }
}
