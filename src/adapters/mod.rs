//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                |
//! |----------------|--------------------|----------------------------|
//! | `csv_file`     | RecordSink         | Append-mode CSV on flash   |
//! | `log_sink`     | EventSink          | Serial log output          |
//! | `nvs`          | ConfigPort         | NVS / in-memory store      |
//! | `status_page`  |:                  | HTTP JSON over TCP         |
//! | `time`         | ClockPort          | System clock (SNTP-synced) |
//! | `wifi`         | StationLink        | ESP-IDF WiFi STA           |

pub mod csv_file;
pub mod log_sink;
pub mod nvs;
pub mod status_page;
pub mod time;
pub(super) mod utils;
pub mod wifi;
