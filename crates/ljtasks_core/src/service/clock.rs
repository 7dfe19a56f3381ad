//! Time source for reference-now baselines.

use chrono::{DateTime, FixedOffset, Local};

/// Supplies the current instant with the caller's local offset.
///
/// The offset matters: a defaulted post time keeps its local wall clock,
/// like any caller-supplied time.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall-clock time in the system's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}
