//! # itch-vwap
//!
//! Hourly per-symbol VWAP reports from NASDAQ TotalView-ITCH 5.0 captures.
//!
//! This library replays an unzipped ITCH 5.0 binary capture — a
//! length-prefixed stream of fixed-layout order-lifecycle messages — and
//! folds every reportable execution into per-symbol running (volume,
//! notional) accumulators, snapshotting a `Stock_VWAP_HH.csv` report at
//! every wall-clock hour boundary.
//!
//! ## How it works
//!
//! ITCH execution messages omit the symbol, and the plain `OrderExecuted`
//! case omits the price too. Both are recovered by following the chain of
//! `OrderReplace` messages from the executed reference back to the
//! originating `AddOrder`. The engine keeps an index from reference number
//! to the byte offset of the defining message inside the read-only mapping,
//! and re-reads frames on demand instead of storing decoded orders — tens of
//! millions of live references fit in a flat u64 → offset map.
//!
//! ## Quick Start
//!
//! ```ignore
//! use itch_vwap::{EngineConfig, MessageReader, VwapEngine};
//!
//! let reader = MessageReader::open("01302019.NASDAQ_ITCH50")?;
//! let mut engine = VwapEngine::with_config(
//!     &reader,
//!     EngineConfig::default().with_output_dir("reports/"),
//! );
//!
//! for msg in reader.messages() {
//!     engine.handle_message(&msg);
//! }
//! engine.finish(); // flush the final hour
//!
//! println!("{}", engine.stats().to_json());
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Wire enums, `Stock`, `Timestamp`, protocol constants |
//! | [`reader`] | Memory-mapped capture framing: `MessageReader` |
//! | [`message`] | Zero-copy typed views over message payloads |
//! | [`engine`] | Order index, chain-walk reconstruction, VWAP folding |
//! | [`report`] | Hourly `Stock_VWAP_HH.csv` writer |
//!
//! ## Design notes
//!
//! - Single-threaded and synchronous: each message is fully processed,
//!   chain re-reads and report I/O included, before the next one is pulled.
//!   Replays are deterministic.
//! - The mapping is owned by the reader and borrowed everywhere else, so it
//!   outlives every view by construction.
//! - Per-message errors never abort the replay; only a failed mapping is
//!   fatal.

pub mod engine;
pub mod error;
pub mod message;
pub mod reader;
pub mod report;
pub mod types;

// Re-exports - Core types
pub use error::{ItchError, Result};
pub use types::{
    MessageKind, Order, Printable, Side, Stock, SystemEventKind, Timestamp, NANOS_PER_HOUR,
    PRICE_SCALE, REPORT_PERIOD_NS,
};

// Re-exports - Capture access
pub use message::{MessageBody, RawMessage};
pub use reader::{MessageReader, Messages};

// Re-exports - Engine
pub use engine::{EngineConfig, EngineStats, SymbolAggregate, VwapEngine};
pub use report::ReportWriter;
