//! Out-of-range event log.
//!
//! The sampler hands a [`LogRecord`] to the [`EventLogger`] whenever the
//! alert level is Red (once per entry into Red by default).  `append` never
//! blocks and never fails the caller: the record goes into a bounded
//! `embassy-sync` channel, and a full queue drops it and bumps the
//! dropped-records counter.  A separate writer thread drains the channel
//! into a [`RecordSink`] (the CSV file on the device).
//!
//! ```text
//!  Sampler ──append()──▶ [ queue, LOG_QUEUE_DEPTH ] ──run()──▶ RecordSink
//!                 │ full                                 │ Err
//!                 └──────────▶ dropped += 1 ◀────────────┘
//! ```
//!
//! ## Line format
//!
//! `temperature,pressure,humidity,co2_ppm,tvoc_ppb,YYYY-MM-DD HH:MM:SS\n`
//!
//! Absent readings are written as empty fields.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::RecordSink;
use crate::error::LogWriteError;
use crate::status::SensorSnapshot;

/// Capacity of the record queue between the sampler and the writer.
pub const LOG_QUEUE_DEPTH: usize = 16;

/// `chrono` format of the trailing timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TEMPERATURE_INDEX: usize = 0;
const PRESSURE_INDEX: usize = 1;
const HUMIDITY_INDEX: usize = 2;
const CO2_INDEX: usize = 3;
const TVOC_INDEX: usize = 4;
const TIMESTAMP_INDEX: usize = 5;
const FIELD_COUNT: usize = 6;

/// When the sampler appends a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventLogPolicy {
    /// One record per transition into Red.
    #[default]
    OnEntry,
    /// One record for every cycle spent in Red.
    EveryCycle,
}

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

/// One immutable log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub temperature_c: Option<f32>,
    pub pressure_hpa: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub co2_ppm: Option<u16>,
    pub tvoc_ppb: Option<u16>,
    pub timestamp: NaiveDateTime,
}

impl LogRecord {
    /// Record for `snapshot`.  A warming-up air-quality sensor reports a
    /// fixed baseline, not a measurement, so CO2/TVOC are left empty.
    pub fn from_snapshot(snapshot: &SensorSnapshot) -> Self {
        let (co2_ppm, tvoc_ppb) = if snapshot.air_quality_warming {
            (None, None)
        } else {
            (snapshot.co2_ppm, snapshot.tvoc_ppb)
        };
        Self {
            temperature_c: snapshot.temperature_c,
            pressure_hpa: snapshot.pressure_hpa,
            humidity_pct: snapshot.humidity_pct,
            co2_ppm,
            tvoc_ppb,
            timestamp: snapshot.captured_at,
        }
    }

    /// Encode as one newline-terminated CSV line.
    pub fn to_csv_line(&self) -> Result<Vec<u8>, LogWriteError> {
        let fields = [
            opt_field(self.temperature_c),
            opt_field(self.pressure_hpa),
            opt_field(self.humidity_pct),
            opt_field(self.co2_ppm),
            opt_field(self.tvoc_ppb),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ];

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::with_capacity(64));
        writer.write_record(&fields).map_err(|e| {
            warn!("event log: encode failed: {}", e);
            LogWriteError::Io
        })?;
        writer.into_inner().map_err(|e| {
            warn!("event log: flush failed: {}", e.error());
            LogWriteError::Io
        })
    }

    /// Decode one line produced by [`to_csv_line`](Self::to_csv_line).
    pub fn parse_csv_line(line: &str) -> Result<Self, RecordParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let row = reader
            .records()
            .next()
            .ok_or(RecordParseError::Empty)?
            .map_err(|_| RecordParseError::Malformed)?;
        if row.len() != FIELD_COUNT {
            return Err(RecordParseError::FieldCount(row.len()));
        }

        let timestamp = NaiveDateTime::parse_from_str(&row[TIMESTAMP_INDEX], TIMESTAMP_FORMAT)
            .map_err(|_| RecordParseError::Timestamp)?;

        Ok(Self {
            temperature_c: parse_opt(&row[TEMPERATURE_INDEX], TEMPERATURE_INDEX)?,
            pressure_hpa: parse_opt(&row[PRESSURE_INDEX], PRESSURE_INDEX)?,
            humidity_pct: parse_opt(&row[HUMIDITY_INDEX], HUMIDITY_INDEX)?,
            co2_ppm: parse_opt(&row[CO2_INDEX], CO2_INDEX)?,
            tvoc_ppb: parse_opt(&row[TVOC_INDEX], TVOC_INDEX)?,
            timestamp,
        })
    }
}

fn opt_field<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_opt<T: core::str::FromStr>(
    field: &str,
    index: usize,
) -> Result<Option<T>, RecordParseError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse()
        .map(Some)
        .map_err(|_| RecordParseError::Field(index))
}

/// Why a log line could not be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordParseError {
    Empty,
    Malformed,
    FieldCount(usize),
    Field(usize),
    Timestamp,
}

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::Malformed => write!(f, "malformed CSV"),
            Self::FieldCount(n) => write!(f, "expected {} fields, got {}", FIELD_COUNT, n),
            Self::Field(i) => write!(f, "bad value in column {}", i),
            Self::Timestamp => write!(f, "bad timestamp"),
        }
    }
}

impl std::error::Error for RecordParseError {}

// ═══════════════════════════════════════════════════════════════
//  Logger
// ═══════════════════════════════════════════════════════════════

/// Bounded, non-blocking front end of the event log.
///
/// `const`-constructible so the firmware can keep it in a `static` shared
/// by the sampler and the writer thread.
pub struct EventLogger {
    queue: Channel<CriticalSectionRawMutex, LogRecord, LOG_QUEUE_DEPTH>,
    written: AtomicU32,
    dropped: AtomicU32,
}

impl EventLogger {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            written: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue `record` for the writer.  Never blocks.  A full queue drops
    /// the record, counts it, and reports [`LogWriteError::QueueFull`] for
    /// the caller's event stream only.
    pub fn append(&self, record: LogRecord) -> Result<(), LogWriteError> {
        if self.queue.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("event log: queue full, record dropped");
            return Err(LogWriteError::QueueFull);
        }
        Ok(())
    }

    /// Writer loop.  Waits on the queue and hands every record to `sink`;
    /// a failed write drops that record and counts it.
    pub async fn run<S: RecordSink>(&self, sink: &mut S) {
        loop {
            let record = self.queue.receive().await;
            self.write_one(sink, &record);
        }
    }

    /// Write every queued record to `sink` without waiting.  Returns the
    /// number of records taken off the queue.
    pub fn drain_into<S: RecordSink>(&self, sink: &mut S) -> usize {
        let mut taken = 0;
        while let Ok(record) = self.queue.try_receive() {
            self.write_one(sink, &record);
            taken += 1;
        }
        taken
    }

    fn write_one<S: RecordSink>(&self, sink: &mut S, record: &LogRecord) {
        match sink.append(record) {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
                debug!("event log: record written");
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("event log: write failed ({}), record dropped", e);
            }
        }
    }

    /// Records successfully written since boot.
    pub fn written(&self) -> u32 {
        self.written.load(Ordering::Relaxed)
    }

    /// Records lost to a full queue or a failed write since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records waiting for the writer.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new()
    }
}
