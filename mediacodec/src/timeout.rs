use std::time::Duration;

/// Bounded wait for a single dequeue call.
///
/// Converted to the microsecond timeouts of the NDK: zero polls without
/// blocking, a negative value blocks until a buffer is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeout(i64);

impl Timeout {
    /// Return immediately when nothing is available.
    pub const NONE: Self = Self(0);
    /// Block until a buffer or event is available.
    pub const INFINITE: Self = Self(-1);

    /// Any negative value means [`Timeout::INFINITE`].
    pub const fn from_micros(us: i64) -> Self {
        if us < 0 { Self::INFINITE } else { Self(us) }
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    pub const fn is_poll(self) -> bool {
        self.0 == 0
    }

    pub const fn is_infinite(self) -> bool {
        self.0 < 0
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_micros()).unwrap_or(i64::MAX))
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::INFINITE, Self::from)
    }
}

#[test]
fn timeout_conversions() {
    assert_eq!(Timeout::from(Duration::from_millis(10)).as_micros(), 10_000);
    assert_eq!(Timeout::from(Duration::ZERO), Timeout::NONE);
    assert!(Timeout::from(None::<Duration>).is_infinite());
    assert_eq!(Timeout::from_micros(-250), Timeout::INFINITE);
    assert_eq!(Timeout::from(Duration::MAX).as_micros(), i64::MAX);
    assert!(Timeout::NONE.is_poll());
}
