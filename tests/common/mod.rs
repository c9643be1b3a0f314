//! Test-support encoder producing streams in the decoder's wire format.
//!
//! Mirrors the decoder's state machine record for record: normalized
//! delta-of-delta buckets per time unit, XOR value windows, and in-band
//! markers for annotations, unit switches, and end-of-stream.

use tsz::{BitWriter, Options, TimeUnit};

pub struct StreamEncoder {
    w: BitWriter,
    opts: Options,
    start: i64,
    t: i64,
    dt: i64,
    vb: u64,
    xor: u64,
    tu: TimeUnit,
    seen_first: bool,
    pending_annotation: Option<Vec<u8>>,
    pending_time_unit: Option<TimeUnit>,
}

impl StreamEncoder {
    /// Creates an encoder for a stream starting at `start` nanoseconds. The
    /// initial time unit derivation matches the decoder's.
    pub fn new(start: i64, opts: Options) -> Self {
        let default = opts.default_time_unit();
        let tu = match default.nanos() {
            Some(size) if start % size == 0 => default,
            _ => TimeUnit::None,
        };
        Self {
            w: BitWriter::new(),
            opts,
            start,
            t: start,
            dt: 0,
            vb: 0,
            xor: 0,
            tu,
            seen_first: false,
            pending_annotation: None,
            pending_time_unit: None,
        }
    }

    /// Attaches an annotation to the next encoded datapoint.
    pub fn annotate(&mut self, bytes: &[u8]) {
        assert!(!bytes.is_empty(), "annotations carry at least one byte");
        self.pending_annotation = Some(bytes.to_vec());
    }

    /// Switches the stream's time unit before the next encoded datapoint.
    pub fn set_time_unit(&mut self, unit: TimeUnit) {
        self.pending_time_unit = Some(unit);
    }

    pub fn encode(&mut self, timestamp: i64, value: f64) {
        if !self.seen_first {
            self.w.write_bits(self.start as u64, 64);
        }

        if let Some(bytes) = self.pending_annotation.take() {
            self.write_marker_annotation();
            self.w.write_varint(bytes.len() as i64 - 1);
            for b in &bytes {
                self.w.write_bits(*b as u64, 8);
            }
        }

        let mut unit_changed = false;
        if let Some(unit) = self.pending_time_unit.take() {
            self.write_marker_time_unit(unit);
            if unit.is_valid() && unit != self.tu {
                self.tu = unit;
                unit_changed = true;
            }
        }

        let dt = timestamp - self.t;
        let dod = dt - self.dt;
        if unit_changed {
            // The first dod after a unit change is raw nanoseconds.
            self.w.write_bits(dod as u64, 64);
        } else {
            self.write_dod(dod);
        }
        self.t = timestamp;
        self.dt = dt;

        if self.seen_first {
            self.write_value(value);
        } else {
            self.vb = value.to_bits();
            self.xor = self.vb;
            self.w.write_bits(self.vb, 64);
            self.seen_first = true;
        }

        if unit_changed {
            self.dt = 0;
        }
    }

    /// Terminates the stream and returns the encoded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let mes = self.opts.marker_encoding_scheme();
        self.w.write_bits(mes.opcode, mes.num_opcode_bits);
        self.w.write_bits(mes.end_of_stream, mes.num_value_bits);
        self.w.into_bytes()
    }

    fn write_marker_annotation(&mut self) {
        let mes = self.opts.marker_encoding_scheme();
        self.w.write_bits(mes.opcode, mes.num_opcode_bits);
        self.w.write_bits(mes.annotation, mes.num_value_bits);
    }

    fn write_marker_time_unit(&mut self, unit: TimeUnit) {
        let mes = self.opts.marker_encoding_scheme();
        self.w.write_bits(mes.opcode, mes.num_opcode_bits);
        self.w.write_bits(mes.time_unit, mes.num_value_bits);
        self.w.write_bits(unit.code() as u64, 8);
    }

    fn write_dod(&mut self, dod: i64) {
        let tes = self
            .opts
            .time_encoding_schemes()
            .get(&self.tu)
            .unwrap_or_else(|| panic!("no scheme for {:?}", self.tu))
            .clone();
        if dod == 0 {
            self.w
                .write_bits(tes.zero_bucket.opcode, tes.zero_bucket.num_opcode_bits);
            return;
        }
        let size = self.tu.nanos().expect("dod with no valid time unit");
        assert_eq!(dod % size, 0, "dod must be a whole number of unit ticks");
        let ticks = dod / size;
        for bucket in &tes.buckets {
            if fits(ticks, bucket.num_value_bits) {
                self.w.write_bits(bucket.opcode, bucket.num_opcode_bits);
                self.w
                    .write_bits((ticks as u64) & mask(bucket.num_value_bits), bucket.num_value_bits);
                return;
            }
        }
        let db = &tes.default_bucket;
        assert!(fits(ticks, db.num_value_bits), "dod exceeds default bucket");
        self.w.write_bits(db.opcode, db.num_opcode_bits);
        self.w
            .write_bits((ticks as u64) & mask(db.num_value_bits), db.num_value_bits);
    }

    fn write_value(&mut self, value: f64) {
        let bits = value.to_bits();
        let xor = bits ^ self.vb;
        self.vb = bits;
        if xor == 0 {
            self.w.write_bit(false);
            self.xor = 0;
            return;
        }
        self.w.write_bit(true);

        let leading = xor.leading_zeros();
        let trailing = xor.trailing_zeros();
        if self.xor != 0
            && leading >= self.xor.leading_zeros()
            && trailing >= self.xor.trailing_zeros()
        {
            // Contained in the previous XOR's window.
            let prev_leading = self.xor.leading_zeros();
            let prev_trailing = self.xor.trailing_zeros();
            self.w.write_bit(false);
            let num_meaningful = 64 - prev_leading - prev_trailing;
            self.w.write_bits(xor >> prev_trailing, num_meaningful);
        } else {
            self.w.write_bit(true);
            let num_meaningful = 64 - leading - trailing;
            self.w.write_bits(leading as u64, 6);
            self.w.write_bits((num_meaningful - 1) as u64, 6);
            self.w.write_bits(xor >> trailing, num_meaningful);
        }
        self.xor = xor;
    }
}

fn fits(ticks: i64, bits: u32) -> bool {
    if bits >= 64 {
        return true;
    }
    let bound = 1i64 << (bits - 1);
    (-bound..bound).contains(&ticks)
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
