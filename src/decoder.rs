//! The streaming decoder: an iterator over a compressed datapoint stream.

use std::io::Read;
use std::sync::{Arc, Weak};

use log::{debug, warn};

use crate::bitstream::BitReader;
use crate::error::DecodeError;
use crate::options::Options;
use crate::pool::ReaderIteratorPool;
use crate::scheme::{
    TimeEncodingScheme, OPCODE_CONTAINED_VALUE_XOR, OPCODE_ZERO_VALUE_XOR,
};
use crate::time::{initial_time_unit, TimeUnit};

/// A single time-series data point: a timestamp in nanoseconds since the
/// Unix epoch and an f64 value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datapoint {
    pub timestamp: i64,
    pub value: f64,
}

impl Datapoint {
    /// Creates a new `Datapoint`.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Outcome of probing the stream for a marker.
enum MarkerRead {
    /// An annotation or time-unit marker was consumed; probe again.
    Consumed,
    /// The end-of-stream marker was consumed.
    EndOfStream,
    /// The next bits are not a marker; decode them as a delta-of-delta.
    NotAMarker,
}

/// Incremental decoder for a compressed datapoint stream.
///
/// Drives the timestamp and value decompressors off a shared bit reader and
/// exposes the record-at-a-time contract: [`next`](Self::next) advances,
/// [`current`](Self::current) reads the decoded tuple, [`err`](Self::err)
/// reports the first failure. End-of-stream, error, and closed states are
/// absorbing until [`reset`](Self::reset).
///
/// A single iterator is not meant to be shared across threads; separate
/// iterators over separate readers are independent and may run concurrently.
pub struct ReaderIterator<R: Read> {
    is: BitReader<R>,
    opts: Options,

    // internal bookkeeping
    t: i64,           // current timestamp, ns since epoch
    dt: i64,          // current delta between timestamps, ns
    vb: u64,          // current value bit pattern
    xor: u64,         // XOR between the current and previous value bits
    tu: TimeUnit,     // active time unit
    tu_changed: bool, // a TimeUnit marker was consumed during this next()
    ant: Vec<u8>,     // annotation attached to the current record
    seen_first: bool,
    done: bool,
    closed: bool,
    err: Option<DecodeError>,

    pool: Option<Weak<ReaderIteratorPool<R>>>,
}

impl<R: Read> ReaderIterator<R> {
    /// Creates a new iterator decoding the given byte stream.
    pub fn new(reader: R, options: Options) -> Self {
        Self {
            is: BitReader::new(reader),
            opts: options,
            t: 0,
            dt: 0,
            vb: 0,
            xor: 0,
            tu: TimeUnit::None,
            tu_changed: false,
            ant: Vec::new(),
            seen_first: false,
            done: false,
            closed: false,
            err: None,
            pool: None,
        }
    }

    pub(crate) fn new_pooled(
        reader: R,
        options: Options,
        pool: Weak<ReaderIteratorPool<R>>,
    ) -> Self {
        let mut it = Self::new(reader, options);
        it.pool = Some(pool);
        it
    }

    /// Advances to the next datapoint. Returns `true` if a new datapoint is
    /// available via [`current`](Self::current), `false` once the stream has
    /// terminated (end-of-stream marker, error, or close).
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.ant.clear();
        self.tu_changed = false;
        if !self.seen_first {
            self.read_first_timestamp();
            self.read_first_value();
            self.seen_first = true;
        } else {
            self.read_next_timestamp();
            self.read_next_value();
        }
        // A time unit change resets the time delta, matching the encoder.
        if self.tu_changed {
            self.dt = 0;
        }
        self.has_next()
    }

    /// Returns the current datapoint, the active time unit, and the
    /// annotation attached to this record, if any.
    ///
    /// Valid only after a [`next`](Self::next) call that returned `true`.
    /// The annotation borrow ends at the next call to `next`; copy it out
    /// to keep it longer.
    pub fn current(&self) -> (Datapoint, TimeUnit, Option<&[u8]>) {
        let ant = if self.ant.is_empty() {
            None
        } else {
            Some(self.ant.as_slice())
        };
        (
            Datapoint::new(self.t, f64::from_bits(self.vb)),
            self.tu,
            ant,
        )
    }

    /// Returns the first error encountered, if any.
    pub fn err(&self) -> Option<&DecodeError> {
        self.err.as_ref()
    }

    /// Reinitializes all state and rewires the bit reader onto `reader`,
    /// leaving the iterator indistinguishable from a freshly constructed
    /// one.
    pub fn reset(&mut self, reader: R) {
        self.is.reset(reader);
        self.t = 0;
        self.dt = 0;
        self.vb = 0;
        self.xor = 0;
        self.tu = TimeUnit::None;
        self.tu_changed = false;
        self.ant.clear();
        self.seen_first = false;
        self.done = false;
        self.closed = false;
        self.err = None;
    }

    /// Closes the iterator, returning it to the recycle pool it was drawn
    /// from, if any. A pooled iterator stays inert until the pool revives
    /// it with [`reset`](Self::reset).
    pub fn close(mut self) {
        self.closed = true;
        self.ant.clear();
        if let Some(pool) = self.pool.as_ref().and_then(Weak::upgrade) {
            pool.put(self);
        }
    }

    // ── timestamps ──────────────────────────────────────────────────────

    fn read_first_timestamp(&mut self) {
        // The start instant is always a raw 64-bit nanosecond count.
        let start = self.read_bits(64) as i64;
        self.tu = initial_time_unit(start, self.opts.default_time_unit());
        let dod = self.read_marker_or_delta_of_delta();
        self.dt = self.dt.wrapping_add(dod);
        self.t = start.wrapping_add(self.dt);
    }

    fn read_next_timestamp(&mut self) {
        let dod = self.read_marker_or_delta_of_delta();
        self.dt = self.dt.wrapping_add(dod);
        self.t = self.t.wrapping_add(self.dt);
    }

    /// Consumes markers until a delta-of-delta shows up or the stream
    /// terminates. Annotation and time-unit markers may chain before a
    /// single dod.
    fn read_marker_or_delta_of_delta(&mut self) -> i64 {
        loop {
            if !self.has_next() {
                return 0;
            }
            match self.try_read_marker() {
                MarkerRead::EndOfStream => return 0,
                MarkerRead::Consumed => continue,
                MarkerRead::NotAMarker => {}
            }
            if self.tu_changed {
                // Right after a unit change the dod is a raw sign-extended
                // nanosecond count; no scheme is involved.
                return sign_extend(self.read_bits(64), 64);
            }
            let schemes = Arc::clone(self.opts.time_encoding_schemes());
            return match schemes.get(&self.tu) {
                Some(tes) => self.read_delta_of_delta(tes),
                None => {
                    self.err = Some(DecodeError::SchemeMissing(self.tu));
                    0
                }
            };
        }
    }

    fn try_read_marker(&mut self) -> MarkerRead {
        let mes = self.opts.marker_encoding_scheme();
        let num_bits = mes.num_opcode_bits + mes.num_value_bits;
        let opcode_and_value = match self.is.peek_bits(num_bits) {
            Ok(v) => v,
            // Too few bits left to hold a marker; if the stream is really
            // short the delta-of-delta reads will surface the error.
            Err(_) => return MarkerRead::NotAMarker,
        };
        if opcode_and_value >> mes.num_value_bits != mes.opcode {
            return MarkerRead::NotAMarker;
        }
        let value_mask = (1u64 << mes.num_value_bits) - 1;
        let marker_value = opcode_and_value & value_mask;
        if marker_value == mes.end_of_stream {
            self.read_bits(num_bits);
            self.done = true;
            MarkerRead::EndOfStream
        } else if marker_value == mes.annotation {
            self.read_bits(num_bits);
            self.read_annotation();
            MarkerRead::Consumed
        } else if marker_value == mes.time_unit {
            self.read_bits(num_bits);
            self.read_time_unit();
            MarkerRead::Consumed
        } else {
            // Reserved marker value: not a marker, decode as data.
            MarkerRead::NotAMarker
        }
    }

    fn read_delta_of_delta(&mut self, tes: &TimeEncodingScheme) -> i64 {
        let mut cb = self.read_bits(1);
        if cb == tes.zero_bucket.opcode {
            return 0;
        }
        for bucket in &tes.buckets {
            cb = (cb << 1) | self.read_bits(1);
            if cb == bucket.opcode {
                let ticks =
                    sign_extend(self.read_bits(bucket.num_value_bits), bucket.num_value_bits);
                return self.from_normalized(ticks);
            }
        }
        let num_bits = tes.default_bucket.num_value_bits;
        let ticks = sign_extend(self.read_bits(num_bits), num_bits);
        self.from_normalized(ticks)
    }

    /// Converts a normalized tick count of the active unit to nanoseconds.
    fn from_normalized(&mut self, ticks: i64) -> i64 {
        if self.has_error() {
            return 0;
        }
        match self.tu.nanos() {
            Some(size) => ticks.wrapping_mul(size),
            None => {
                self.err = Some(DecodeError::SchemeMissing(self.tu));
                0
            }
        }
    }

    // ── values ──────────────────────────────────────────────────────────

    fn read_first_value(&mut self) {
        self.vb = self.read_bits(64);
        self.xor = self.vb;
    }

    fn read_next_value(&mut self) {
        self.xor = self.read_xor();
        self.vb ^= self.xor;
    }

    fn read_xor(&mut self) -> u64 {
        let mut cb = self.read_bits(1);
        if cb == OPCODE_ZERO_VALUE_XOR {
            return 0;
        }

        cb = (cb << 1) | self.read_bits(1);
        if cb == OPCODE_CONTAINED_VALUE_XOR {
            let (prev_leading, prev_trailing) = leading_and_trailing_zeros(self.xor);
            let num_meaningful = 64 - prev_leading - prev_trailing;
            return self.read_bits(num_meaningful) << prev_trailing;
        }

        let num_leading = self.read_bits(6) as u32;
        let num_meaningful = self.read_bits(6) as u32 + 1;
        let num_trailing = 64u32.saturating_sub(num_leading + num_meaningful);
        self.read_bits(num_meaningful) << num_trailing
    }

    // ── markers ─────────────────────────────────────────────────────────

    fn read_annotation(&mut self) {
        // The encoder stores length minus one; add it back.
        let ant_len = self.read_varint().wrapping_add(1);
        if self.has_error() {
            return;
        }
        if ant_len <= 0 {
            self.err = Some(DecodeError::InvalidAnnotationLength(ant_len));
            return;
        }
        self.ant.clear();
        for _ in 0..ant_len {
            let byte = self.read_bits(8) as u8;
            if self.has_error() {
                return;
            }
            self.ant.push(byte);
        }
    }

    fn read_time_unit(&mut self) {
        let code = self.read_bits(8) as u8;
        if self.has_error() {
            return;
        }
        match TimeUnit::from_code(code) {
            Some(unit) if unit.is_valid() => {
                if unit != self.tu {
                    debug!("time unit changed to {unit:?}");
                    self.tu_changed = true;
                    self.tu = unit;
                }
            }
            // Unrecognized codes are ignored; the current unit stays active.
            _ => warn!("ignoring unrecognized time unit code {code:#04x}"),
        }
    }

    // ── plumbing ────────────────────────────────────────────────────────

    /// Reads `n` bits, recording the first failure and returning 0 from
    /// then on.
    fn read_bits(&mut self, n: u32) -> u64 {
        if !self.has_next() {
            return 0;
        }
        match self.is.read_bits(n) {
            Ok(v) => v,
            Err(e) => {
                self.err = Some(e);
                0
            }
        }
    }

    fn read_varint(&mut self) -> i64 {
        if !self.has_next() {
            return 0;
        }
        match self.is.read_varint() {
            Ok(v) => v,
            Err(e) => {
                self.err = Some(e);
                0
            }
        }
    }

    fn has_error(&self) -> bool {
        self.err.is_some()
    }

    fn has_next(&self) -> bool {
        !self.has_error() && !self.done && !self.closed
    }
}

/// Sign-extend an `n`-bit value stored in a `u64` to a full `i64`.
#[inline]
fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Leading and trailing zero counts of a 64-bit word, pinned to (64, 0)
/// for zero so the contained-window width degrades to empty.
#[inline]
fn leading_and_trailing_zeros(v: u64) -> (u32, u32) {
    if v == 0 {
        return (64, 0);
    }
    (v.leading_zeros(), v.trailing_zeros())
}
