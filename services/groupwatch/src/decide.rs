//! Notification decision engine: which instances to notify this cycle

use chrono::{DateTime, Duration, Utc};

use crate::ledger::NotificationLedger;
use crate::model::Instance;

/// How long a notified instance must go unnotified before it is re-notified
pub const RENOTIFY_AFTER_HOURS: i64 = 4;

/// Why an instance was selected for notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyReason {
    /// First time this instance id has been seen
    New,
    /// Known instance whose last notification is past the re-notify threshold
    Stale,
}

/// An instance selected for notification this cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    pub instance: Instance,
    pub reason: NotifyReason,
}

/// Decide which instances to notify.
///
/// Two passes over the fetched list, in fetch order:
///
/// 1. every instance whose id is absent from the ledger is selected and its
///    ledger entry set to `now` immediately, so the stale pass below cannot
///    pick it up again in the same cycle;
/// 2. among instances already in the ledger, those last notified at or
///    before `now - 4h` are candidates, and only the one with the smallest
///    `last_notified` is selected. The strict `<` during the scan means the
///    first candidate in fetch order wins an exact tie.
///
/// Apart from the documented ledger mutation this is deterministic over its
/// inputs: the same instances, ledger and `now` always produce the same
/// selection.
pub fn decide(
    instances: &[Instance],
    ledger: &mut NotificationLedger,
    now: DateTime<Utc>,
) -> Vec<Selected> {
    let mut selected = Vec::new();

    for instance in instances {
        if !ledger.contains(&instance.id) {
            ledger.mark_notified(&instance.id, now);
            selected.push(Selected {
                instance: instance.clone(),
                reason: NotifyReason::New,
            });
        }
    }

    let threshold = now - Duration::hours(RENOTIFY_AFTER_HOURS);
    let mut candidate: Option<(&Instance, DateTime<Utc>)> = None;
    for instance in instances {
        let Some(last_notified) = ledger.last_notified(&instance.id) else {
            continue;
        };
        if last_notified <= threshold
            && candidate.is_none_or(|(_, oldest)| last_notified < oldest)
        {
            candidate = Some((instance, last_notified));
        }
    }

    if let Some((instance, _)) = candidate {
        ledger.mark_notified(&instance.id, now);
        selected.push(Selected {
            instance: instance.clone(),
            reason: NotifyReason::Stale,
        });
    }

    selected
}
