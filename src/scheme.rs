//! Encoding schemes: prefix-coded delta-of-delta buckets per time unit and
//! the reserved marker opcode that shares the stream with them.
//!
//! Schemes are plain data. A [`TimeEncodingScheme`] lists its buckets in the
//! order the decoder extends the prefix, one lookahead bit at a time; the
//! marker opcode is chosen so that no data encoding starts with it.

use std::collections::HashMap;

use crate::time::TimeUnit;

/// Opcode for an XOR of zero (value unchanged), 1 bit.
pub const OPCODE_ZERO_VALUE_XOR: u64 = 0x0;
/// Opcode for an XOR contained in the previous meaningful-bit window, 2 bits.
pub const OPCODE_CONTAINED_VALUE_XOR: u64 = 0x2;
/// Opcode for an XOR with a freshly described window, 2 bits.
pub const OPCODE_UNCONTAINED_VALUE_XOR: u64 = 0x3;

/// One entry of a time encoding scheme: a prefix opcode plus the width of
/// the sign-extended value that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// The prefix bit pattern, right-aligned.
    pub opcode: u64,
    /// Width of the prefix in bits.
    pub num_opcode_bits: u32,
    /// Width of the two's-complement value following the prefix.
    pub num_value_bits: u32,
}

impl Bucket {
    pub const fn new(opcode: u64, num_opcode_bits: u32, num_value_bits: u32) -> Self {
        Self {
            opcode,
            num_opcode_bits,
            num_value_bits,
        }
    }
}

/// A prefix-code scheme for delta-of-delta magnitudes in one time unit.
///
/// Values carried by `buckets` and `default_bucket` are normalized tick
/// counts of the unit; the decoder multiplies them back to nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEncodingScheme {
    /// 1-bit opcode meaning "delta-of-delta is zero".
    pub zero_bucket: Bucket,
    /// Buckets in prefix order; each adds one opcode bit over the previous.
    pub buckets: Vec<Bucket>,
    /// Fallback once every bucket prefix has been ruled out. Its opcode is
    /// implied (all lookahead bits set) and never compared.
    pub default_bucket: Bucket,
}

impl TimeEncodingScheme {
    /// Builds a scheme with the standard ladder of prefixes `10`, `110`,
    /// `1110`, ... over `value_bits`, falling back to an all-ones prefix
    /// with `default_value_bits`.
    pub fn new(value_bits: &[u32], default_value_bits: u32) -> Self {
        let buckets = value_bits
            .iter()
            .enumerate()
            .map(|(i, &bits)| {
                let width = i as u32 + 2;
                Bucket::new((1u64 << width) - 2, width, bits)
            })
            .collect::<Vec<_>>();
        let default_width = value_bits.len() as u32 + 1;
        Self {
            zero_bucket: Bucket::new(0x0, 1, 0),
            buckets,
            default_bucket: Bucket::new(
                (1u64 << default_width) - 1,
                default_width,
                default_value_bits,
            ),
        }
    }
}

/// Mapping from time unit to the scheme used while that unit is active.
pub type TimeEncodingSchemes = HashMap<TimeUnit, TimeEncodingScheme>;

/// The default scheme table.
///
/// Every unit shares the 7/9/12-bit bucket ladder; only the wide fallback
/// differs, sized for roughly a century of delta-of-delta at that unit. The
/// 7-bit first bucket keeps the marker opcode unambiguous: `10` followed by
/// seven zero bits is delta-of-delta zero, which encoders always emit
/// through the zero bucket instead.
pub fn default_time_encoding_schemes() -> TimeEncodingSchemes {
    let mut schemes = HashMap::new();
    schemes.insert(TimeUnit::Second, TimeEncodingScheme::new(&[7, 9, 12], 32));
    schemes.insert(
        TimeUnit::Millisecond,
        TimeEncodingScheme::new(&[7, 9, 12], 42),
    );
    schemes.insert(
        TimeUnit::Microsecond,
        TimeEncodingScheme::new(&[7, 9, 12], 52),
    );
    schemes.insert(
        TimeUnit::Nanosecond,
        TimeEncodingScheme::new(&[7, 9, 12], 64),
    );
    schemes.insert(TimeUnit::Minute, TimeEncodingScheme::new(&[7, 9, 12], 26));
    schemes.insert(TimeUnit::Hour, TimeEncodingScheme::new(&[7, 9, 12], 21));
    schemes
}

/// The reserved in-band marker encoding: a fixed opcode prefix followed by a
/// small value naming the marker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerEncodingScheme {
    /// The reserved opcode bit pattern, right-aligned.
    pub opcode: u64,
    /// Width of the opcode in bits.
    pub num_opcode_bits: u32,
    /// Width of the marker value following the opcode.
    pub num_value_bits: u32,
    /// Marker value terminating the stream.
    pub end_of_stream: u64,
    /// Marker value preceding an annotation payload.
    pub annotation: u64,
    /// Marker value preceding a time-unit payload.
    pub time_unit: u64,
}

impl Default for MarkerEncodingScheme {
    fn default() -> Self {
        Self {
            opcode: 0b1_0000_0000,
            num_opcode_bits: 9,
            num_value_bits: 2,
            end_of_stream: 0,
            annotation: 1,
            time_unit: 2,
        }
    }
}
