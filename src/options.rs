//! Decoder configuration: the scheme tables and the default time unit.

use std::sync::Arc;

use crate::scheme::{
    default_time_encoding_schemes, MarkerEncodingScheme, TimeEncodingSchemes,
};
use crate::time::TimeUnit;

/// Options bundle consumed by [`ReaderIterator`](crate::ReaderIterator).
///
/// The scheme table is shared immutably across iterators; cloning `Options`
/// is cheap. Defaults match the wire format's standard tables with seconds
/// as the default unit.
#[derive(Debug, Clone)]
pub struct Options {
    time_encoding_schemes: Arc<TimeEncodingSchemes>,
    marker_encoding_scheme: MarkerEncodingScheme,
    default_time_unit: TimeUnit,
}

impl Options {
    pub fn new() -> Self {
        Self {
            time_encoding_schemes: Arc::new(default_time_encoding_schemes()),
            marker_encoding_scheme: MarkerEncodingScheme::default(),
            default_time_unit: TimeUnit::Second,
        }
    }

    /// Replaces the per-unit time encoding scheme table.
    pub fn with_time_encoding_schemes(mut self, schemes: TimeEncodingSchemes) -> Self {
        self.time_encoding_schemes = Arc::new(schemes);
        self
    }

    /// Replaces the marker encoding scheme.
    pub fn with_marker_encoding_scheme(mut self, scheme: MarkerEncodingScheme) -> Self {
        self.marker_encoding_scheme = scheme;
        self
    }

    /// Sets the unit used to derive the initial time unit from the stream's
    /// start instant.
    pub fn with_default_time_unit(mut self, unit: TimeUnit) -> Self {
        self.default_time_unit = unit;
        self
    }

    pub fn time_encoding_schemes(&self) -> &Arc<TimeEncodingSchemes> {
        &self.time_encoding_schemes
    }

    pub fn marker_encoding_scheme(&self) -> MarkerEncodingScheme {
        self.marker_encoding_scheme
    }

    pub fn default_time_unit(&self) -> TimeUnit {
        self.default_time_unit
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
