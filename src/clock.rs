//! Shifted-origin clock shared by every time-sensitive component.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

/// Clock provider with an installable virtual-time override.
///
/// Consumers read the current time through [`VirtualClock::now`] instead of
/// querying the system clock. While an override is installed, `now` reports
/// wall-clock time shifted by a fixed offset: time keeps flowing at real
/// speed, only the origin moves. Handles are cheap clones of one shared
/// state, so the whole application observes a single override.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Arc<ClockState>,
}

#[derive(Default)]
struct ClockState {
    offset_ms: AtomicI64,
    installed: AtomicBool,
}

/// Shift `base` by `diff_ms` milliseconds, clamping at the representable
/// timestamp range instead of failing.
pub(crate) fn shift_millis(base: Timestamp, diff_ms: i64) -> Timestamp {
    let shifted = base.as_millisecond().saturating_add(diff_ms);
    Timestamp::from_millisecond(shifted).unwrap_or(if diff_ms >= 0 {
        Timestamp::MAX
    } else {
        Timestamp::MIN
    })
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an override so that `now()` reads `target` from this instant
    /// on. Any previously active override is replaced, never stacked.
    ///
    /// Installing with `target` equal to the current wall-clock time is
    /// legal: the offset is zero but the clock still reports itself as
    /// installed.
    pub fn install(&self, target: Timestamp) {
        let diff = target.as_millisecond() - Timestamp::now().as_millisecond();
        self.state.offset_ms.store(diff, Ordering::SeqCst);
        self.state.installed.store(true, Ordering::SeqCst);
    }

    /// Re-apply a previously computed offset, e.g. one loaded from the
    /// offset store at startup.
    pub fn install_offset(&self, diff: SignedDuration) {
        self.state.offset_ms.store(diff.as_millis() as i64, Ordering::SeqCst);
        self.state.installed.store(true, Ordering::SeqCst);
    }

    /// Remove the override; `now()` reverts to wall-clock time. Idempotent.
    pub fn uninstall(&self) {
        self.state.offset_ms.store(0, Ordering::SeqCst);
        self.state.installed.store(false, Ordering::SeqCst);
    }

    /// Current virtual time: wall-clock now plus the active offset.
    pub fn now(&self) -> Timestamp {
        let diff = self.state.offset_ms.load(Ordering::SeqCst);
        shift_millis(Timestamp::now(), diff)
    }

    /// The active offset between virtual and wall-clock time.
    pub fn current_offset(&self) -> SignedDuration {
        SignedDuration::from_millis(self.state.offset_ms.load(Ordering::SeqCst))
    }

    pub fn is_installed(&self) -> bool {
        self.state.installed.load(Ordering::SeqCst)
    }

    /// Suspend until the virtual clock crosses `deadline`.
    ///
    /// A deadline five virtual seconds away takes five real seconds to
    /// arrive. Returns immediately if the deadline has already passed.
    pub async fn sleep_until(&self, deadline: Timestamp) {
        let wait_ms = deadline.as_millisecond() - self.now().as_millisecond();
        if wait_ms > 0 {
            tokio::time::sleep(Duration::from_millis(wait_ms as u64)).await;
        }
    }
}
