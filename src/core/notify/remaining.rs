//! People-ahead calculation
//!
//! Three tiers, tried in order. The two list tiers can disagree when a
//! ticket between current and target was skipped or voided: the detailed
//! tier drops tickets marked 完成, the waiting-list tier counts every
//! listed ticket below the target. Both behaviours are kept as-is.

use crate::domain::{QueueEntry, SnapshotRow};

/// Status label of a ticket that has been seen
pub const COMPLETED_STATUS: &str = "完成";

/// Which tier produced a remaining-ahead count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingSource {
    QueueDetails,
    WaitingList,
    Arithmetic,
}

/// People ahead of the target ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingAhead {
    pub count: i32,
    pub source: RemainingSource,
}

/// Count the tickets still ahead of `target`.
///
/// Empty lists count as absent.
pub fn remaining_ahead(
    current: i32,
    target: i32,
    queue_details: Option<&[QueueEntry]>,
    waiting_list: Option<&[i32]>,
) -> RemainingAhead {
    if let Some(details) = queue_details.filter(|d| !d.is_empty()) {
        let count = if current >= target {
            0
        } else {
            details
                .iter()
                .filter(|e| e.number > current && e.number < target)
                .filter(|e| e.status != COMPLETED_STATUS)
                .count() as i32
        };
        return RemainingAhead {
            count,
            source: RemainingSource::QueueDetails,
        };
    }

    if let Some(waiting) = waiting_list.filter(|w| !w.is_empty()) {
        let count = if current > target {
            0
        } else {
            waiting.iter().filter(|n| **n < target).count() as i32
        };
        return RemainingAhead {
            count,
            source: RemainingSource::WaitingList,
        };
    }

    RemainingAhead {
        count: (target - current).max(0),
        source: RemainingSource::Arithmetic,
    }
}

/// Remaining-ahead for a stored snapshot
pub fn remaining_for_snapshot(snapshot: &SnapshotRow, current: i32, target: i32) -> RemainingAhead {
    remaining_ahead(
        current,
        target,
        snapshot.queue_details.as_deref(),
        snapshot.waiting_list.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(number: i32, status: &str) -> QueueEntry {
        QueueEntry {
            number,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_details_take_precedence_and_skip_completed() {
        let details = vec![
            entry(10, "看診中"),
            entry(11, "完成"),
            entry(12, "未看診"),
            entry(13, "未看診"),
            entry(20, "未看診"),
        ];
        let waiting = vec![11, 12, 13];

        let result = remaining_ahead(10, 15, Some(&details), Some(&waiting));

        // The waiting list alone would say 3
        assert_eq!(result.count, 2);
        assert_eq!(result.source, RemainingSource::QueueDetails);
    }

    #[test]
    fn test_details_zero_once_target_reached() {
        let details = vec![entry(16, "未看診")];
        assert_eq!(remaining_ahead(15, 15, Some(&details), None).count, 0);
    }

    #[test]
    fn test_waiting_list_counts_below_target() {
        let waiting = vec![11, 12, 14, 18];
        let result = remaining_ahead(10, 15, None, Some(&waiting));
        assert_eq!(result.count, 3);
        assert_eq!(result.source, RemainingSource::WaitingList);
    }

    #[test]
    fn test_waiting_list_zero_when_past_target() {
        let waiting = vec![3, 4];
        assert_eq!(remaining_ahead(16, 15, None, Some(&waiting)).count, 0);
    }

    #[test]
    fn test_waiting_list_at_target_still_counts() {
        // Equal current and target is not "past" for this tier
        let waiting = vec![12, 13];
        assert_eq!(remaining_ahead(15, 15, None, Some(&waiting)).count, 2);
    }

    #[test]
    fn test_arithmetic_fallback() {
        let result = remaining_ahead(10, 25, Some(&[]), Some(&[]));
        assert_eq!(result.count, 15);
        assert_eq!(result.source, RemainingSource::Arithmetic);
        assert_eq!(remaining_ahead(30, 25, None, None).count, 0);
    }
}
