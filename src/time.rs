//! Time units carried in-band by the compressed stream.
//!
//! The stream's timestamps are wall-clock nanoseconds, but deltas between
//! them are normalized to the active [`TimeUnit`] before bucket encoding. A
//! `TimeUnit` marker may switch the active unit mid-stream.

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

/// A duration granularity for normalized timestamp deltas.
///
/// `None` is a sentinel, not an actual unit: it carries no nanosecond value
/// and no encoding scheme is registered for it by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Placeholder for "no unit"; never valid for normalization.
    #[default]
    None,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Minute,
    Hour,
}

impl TimeUnit {
    /// Decodes a wire code into a unit. Unknown codes yield `None` so the
    /// caller can retain the current unit.
    pub fn from_code(code: u8) -> Option<TimeUnit> {
        match code {
            0 => Some(TimeUnit::None),
            1 => Some(TimeUnit::Second),
            2 => Some(TimeUnit::Millisecond),
            3 => Some(TimeUnit::Microsecond),
            4 => Some(TimeUnit::Nanosecond),
            5 => Some(TimeUnit::Minute),
            6 => Some(TimeUnit::Hour),
            _ => None,
        }
    }

    /// The unit's wire code (8 bits in a TimeUnit marker payload).
    pub fn code(self) -> u8 {
        match self {
            TimeUnit::None => 0,
            TimeUnit::Second => 1,
            TimeUnit::Millisecond => 2,
            TimeUnit::Microsecond => 3,
            TimeUnit::Nanosecond => 4,
            TimeUnit::Minute => 5,
            TimeUnit::Hour => 6,
        }
    }

    /// The size of one tick of this unit in nanoseconds, or `None` for the
    /// sentinel unit.
    pub fn nanos(self) -> Option<i64> {
        match self {
            TimeUnit::None => None,
            TimeUnit::Second => Some(NANOS_PER_SECOND),
            TimeUnit::Millisecond => Some(NANOS_PER_MILLI),
            TimeUnit::Microsecond => Some(NANOS_PER_MICRO),
            TimeUnit::Nanosecond => Some(1),
            TimeUnit::Minute => Some(NANOS_PER_MINUTE),
            TimeUnit::Hour => Some(NANOS_PER_HOUR),
        }
    }

    /// Returns `true` if this is an actual unit rather than the sentinel.
    #[inline]
    pub fn is_valid(self) -> bool {
        self != TimeUnit::None
    }
}

/// Derives the initial time unit for a stream starting at `start_nanos`.
///
/// The default unit applies only when the start instant is a whole multiple
/// of it; otherwise the unit is the sentinel until a TimeUnit marker sets
/// one. Mirrors the encoder so both sides agree without extra wire bits.
pub(crate) fn initial_time_unit(start_nanos: i64, default: TimeUnit) -> TimeUnit {
    match default.nanos() {
        Some(size) if start_nanos % size == 0 => default,
        _ => TimeUnit::None,
    }
}
