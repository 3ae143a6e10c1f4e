use chrono::{DateTime, Utc};

use super::target::MonitoredTarget;

/// Days to wait between checks for a given stability streak.
///
/// Targets that have not changed for a while are checked less often,
/// bounding external fetch load while keeping worst-case detection
/// latency at three days once fully stabilized.
pub fn required_interval_days(stable_count: u32) -> i64 {
    if stable_count >= 14 {
        3
    } else if stable_count >= 7 {
        2
    } else {
        1
    }
}

/// Whether a target is due for a check at `now`.
///
/// Never-checked targets are always due. Otherwise the whole days elapsed
/// since the last check must meet the interval for the target's current
/// stability streak.
pub fn is_due(target: &MonitoredTarget, now: DateTime<Utc>) -> bool {
    let Some(last_checked) = target.last_checked_at else {
        return true;
    };
    let elapsed_days = (now - last_checked).num_days();
    elapsed_days >= required_interval_days(target.stable_count)
}
