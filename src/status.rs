//! Activity-facing consumers of the virtual clock.
//!
//! Everything here reads time through [`VirtualClock::now`]; none of it
//! touches the system clock directly, so a set/restore of the time machine
//! is immediately reflected in deadline badges and form defaults.

use jiff::{SignedDuration, Timestamp};

use crate::clock::{VirtualClock, shift_millis};

/// Deadline for a freshly created activity: one day out.
const DEFAULT_ACTIVITY_SPAN: SignedDuration = SignedDuration::from_hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    NotStarted,
    InProgress,
    Late,
    Done,
}

/// Status of an activity as of the current virtual time. A completed
/// activity is `Done` even when its deadline has passed.
pub fn activity_status(
    clock: &VirtualClock,
    start: Option<Timestamp>,
    deadline: Timestamp,
    done: bool,
) -> ActivityStatus {
    if done {
        return ActivityStatus::Done;
    }
    let now = clock.now();
    if now > deadline {
        return ActivityStatus::Late;
    }
    match start {
        Some(start) if now < start => ActivityStatus::NotStarted,
        _ => ActivityStatus::InProgress,
    }
}

/// Default start/deadline pair used to pre-populate activity forms.
pub fn default_activity_window(clock: &VirtualClock) -> (Timestamp, Timestamp) {
    let now = clock.now();
    (now, shift_millis(now, DEFAULT_ACTIVITY_SPAN.as_millis() as i64))
}

/// Moment an activity's notification should fire: `advance` ahead of the
/// deadline, e.g. one day before.
pub fn notification_time(deadline: Timestamp, advance: SignedDuration) -> Timestamp {
    shift_millis(deadline, -(advance.as_millis() as i64))
}

/// Suspend until the activity's notification moment on the virtual clock.
///
/// Scheduling follows the shifted clock, so a notification one virtual hour
/// away takes one real hour to fire.
pub async fn wait_for_notification(
    clock: &VirtualClock,
    deadline: Timestamp,
    advance: SignedDuration,
) {
    clock.sleep_until(notification_time(deadline, advance)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn deadline_in_the_virtual_past_reads_late() {
        let clock = VirtualClock::new();
        clock.install(ts("2026-01-01T00:00:00Z"));
        // Deadline far beyond the wall clock, but behind the virtual one.
        let status = activity_status(&clock, None, ts("2025-06-15T12:00:00Z"), false);
        assert_eq!(status, ActivityStatus::Late);
    }

    #[test]
    fn done_wins_over_late() {
        let clock = VirtualClock::new();
        clock.install(ts("2026-01-01T00:00:00Z"));
        let status = activity_status(&clock, None, ts("2025-06-15T12:00:00Z"), true);
        assert_eq!(status, ActivityStatus::Done);
    }

    #[test]
    fn not_started_before_virtual_start() {
        let clock = VirtualClock::new();
        clock.install(ts("2025-06-15T12:00:00Z"));
        let status = activity_status(
            &clock,
            Some(ts("2025-06-16T00:00:00Z")),
            ts("2025-06-17T00:00:00Z"),
            false,
        );
        assert_eq!(status, ActivityStatus::NotStarted);
    }

    #[test]
    fn in_progress_between_start_and_deadline() {
        let clock = VirtualClock::new();
        clock.install(ts("2025-06-16T06:00:00Z"));
        let status = activity_status(
            &clock,
            Some(ts("2025-06-16T00:00:00Z")),
            ts("2025-06-17T00:00:00Z"),
            false,
        );
        assert_eq!(status, ActivityStatus::InProgress);
    }

    #[test]
    fn notification_time_precedes_deadline_by_advance() {
        let at = notification_time(ts("2025-06-17T00:00:00Z"), SignedDuration::from_hours(24));
        assert_eq!(at, ts("2025-06-16T00:00:00Z"));
    }

    #[tokio::test(start_paused = true)]
    async fn notification_waits_on_the_virtual_clock() {
        let clock = VirtualClock::new();
        clock.install(ts("2025-06-15T12:00:00Z"));
        // Deadline one virtual hour out, notified 30 minutes ahead.
        let deadline = shift_millis(clock.now(), 3_600_000);
        let before = tokio::time::Instant::now();
        wait_for_notification(&clock, deadline, SignedDuration::from_mins(30)).await;
        let elapsed = before.elapsed();
        assert!(elapsed >= std::time::Duration::from_secs(29 * 60));
        assert!(elapsed < std::time::Duration::from_secs(31 * 60));
    }

    #[test]
    fn default_window_follows_the_virtual_clock() {
        let clock = VirtualClock::new();
        clock.install(ts("2025-06-15T12:00:00Z"));
        let (start, deadline) = default_activity_window(&clock);
        let span = deadline.as_millisecond() - start.as_millisecond();
        assert_eq!(span, DEFAULT_ACTIVITY_SPAN.as_millis() as i64);
        let drift = start.as_millisecond() - ts("2025-06-15T12:00:00Z").as_millisecond();
        assert!((0..2_000).contains(&drift), "drift was {drift}ms");
    }
}
