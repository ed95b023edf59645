//! Order-lifecycle reconstruction and VWAP aggregation.
//!
//! The engine consumes a sequential stream of message views and maintains
//! two pieces of state:
//!
//! - the **order index**: reference number → byte offset of the message that
//!   most recently defined that reference (an add or a replace). Entries are
//!   offsets, not decoded orders; an order is decoded on demand at execution
//!   time by re-reading the mapped capture, trading a cold re-read for a
//!   massive memory-footprint reduction over tens of millions of live
//!   orders.
//! - the **per-symbol aggregates**: cumulative (volume, notional) per raw
//!   8-byte symbol, folded on every reportable execution and snapshotted to
//!   a CSV once per wall-clock hour.
//!
//! The hard part is that `OrderExecuted` carries neither symbol nor price.
//! Both are recovered by walking the replacement chain from the executed
//! reference back to the originating add ([`VwapEngine::construct_order`]).
//! The walk is iterative, bounded by the number of replaces applied to the
//! order.
//!
//! Everything is single-threaded and strictly in file order: each message is
//! fully processed, chain re-reads and report I/O included, before the next
//! one is pulled. Replaying the same capture twice produces identical
//! reports.
//!
//! No error on this path is fatal. Executions that cannot be reconstructed
//! are dropped with a diagnostic and counted; the replay continues.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use serde::Serialize;

use crate::error::{ItchError, Result};
use crate::message::{MessageBody, RawMessage};
use crate::reader::MessageReader;
use crate::report::ReportWriter;
use crate::types::{Order, Printable, Side, Stock, Timestamp, REPORT_PERIOD_NS};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the VWAP engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory the hourly CSV reports are written into.
    ///
    /// Default: the current working directory.
    pub output_dir: PathBuf,

    /// Reporting period in nanoseconds.
    ///
    /// Default: one wall-clock hour. Shorter periods are useful in tests.
    pub report_period_ns: u64,

    /// Initial capacity of the order index.
    ///
    /// A full trading day holds tens of millions of live references;
    /// pre-sizing the index avoids rehashing churn early in the session.
    pub index_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            report_period_ns: REPORT_PERIOD_NS,
            index_capacity: 1 << 20,
        }
    }
}

impl EngineConfig {
    /// Set the report output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the reporting period in nanoseconds.
    pub fn with_report_period_ns(mut self, period_ns: u64) -> Self {
        self.report_period_ns = period_ns;
        self
    }

    /// Set the initial order-index capacity.
    pub fn with_index_capacity(mut self, capacity: usize) -> Self {
        self.index_capacity = capacity;
        self
    }
}

// ============================================================================
// Aggregates and statistics
// ============================================================================

/// Cumulative execution volume and notional for one symbol.
///
/// Created on the first execution touching the symbol, accumulated for the
/// rest of the session, never evicted. VWAP is session-to-date, not
/// per-hour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SymbolAggregate {
    /// Total executed shares.
    pub volume: u64,

    /// Total executed notional in dollars (shares × price).
    pub notional: f64,
}

impl SymbolAggregate {
    /// Volume-weighted average price, 0 when no volume has printed.
    #[inline]
    pub fn vwap(&self) -> f64 {
        if self.volume == 0 {
            0.0
        } else {
            self.notional / self.volume as f64
        }
    }
}

/// Counters for monitoring a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Total messages handled, consumed kinds and skipped kinds alike.
    pub messages_processed: u64,

    /// System event messages logged.
    pub system_events: u64,

    /// Add-order messages indexed (both 'A' and 'F').
    pub orders_added: u64,

    /// Replace messages applied to the index.
    pub orders_replaced: u64,

    /// Replace messages dropped because the original reference was unknown.
    pub replaces_dropped: u64,

    /// Delete messages applied (absent references count as applied no-ops).
    pub orders_deleted: u64,

    /// Executions folded into the aggregates (all sources: 'E', 'C', 'P').
    pub executions_applied: u64,

    /// Executions dropped because the order could not be reconstructed.
    pub executions_dropped: u64,

    /// Non-printable executions skipped ('C' with printable = 'N').
    pub non_printable_skipped: u64,

    /// Hourly reports written successfully.
    pub reports_written: u64,

    /// Hourly reports that failed to write.
    pub report_failures: u64,
}

impl EngineStats {
    /// Serialize the counters as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Write the counters as JSON to `path`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_json())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Order-lifecycle and VWAP replay engine over one mapped capture.
///
/// Borrows the [`MessageReader`] for the chained-lookup path, so every view
/// and every re-read shares the single read-only mapping.
pub struct VwapEngine<'a> {
    reader: &'a MessageReader,
    config: EngineConfig,
    writer: ReportWriter,

    /// Reference number → offset of the newest defining message.
    orders: AHashMap<u64, usize>,

    /// Raw 8-byte symbol → cumulative (volume, notional). Ordered bytewise
    /// so report rows come out in a stable order.
    symbols: BTreeMap<Stock, SymbolAggregate>,

    /// Always a multiple of the report period; never decreases.
    last_report_time: u64,

    stats: EngineStats,
}

impl<'a> VwapEngine<'a> {
    /// Create an engine with default configuration.
    pub fn new(reader: &'a MessageReader) -> Self {
        Self::with_config(reader, EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(reader: &'a MessageReader, config: EngineConfig) -> Self {
        let writer = ReportWriter::new(&config.output_dir);
        Self {
            reader,
            orders: AHashMap::with_capacity(config.index_capacity),
            symbols: BTreeMap::new(),
            last_report_time: 0,
            stats: EngineStats::default(),
            writer,
            config,
        }
    }

    /// Replay statistics so far.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Number of live entries in the order index.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// The per-symbol aggregates accumulated so far.
    pub fn symbols(&self) -> &BTreeMap<Stock, SymbolAggregate> {
        &self.symbols
    }

    /// The last report boundary crossed, in nanoseconds since midnight.
    pub fn last_report_time(&self) -> u64 {
        self.last_report_time
    }

    /// Offset stored in the order index for `reference`, if present.
    pub fn index_offset(&self, reference: u64) -> Option<usize> {
        self.orders.get(&reference).copied()
    }

    /// Process one message in stream order.
    ///
    /// Never fails: every per-message error is logged, counted and
    /// recovered from locally.
    pub fn handle_message(&mut self, msg: &RawMessage<'_>) {
        let timestamp = msg.timestamp();
        self.maybe_report(timestamp);

        self.stats.messages_processed += 1;

        match msg.body() {
            MessageBody::SystemEvent(view) => {
                self.stats.system_events += 1;
                let description = view
                    .event()
                    .map(|e| e.description())
                    .unwrap_or("Unknown system event");
                println!("{} | {}", Timestamp(timestamp), description);
            }

            MessageBody::AddOrder(view) => {
                // The exchange guarantees reference uniqueness for the
                // session; a duplicate is overwritten silently.
                self.orders.insert(view.reference(), msg.offset());
                self.stats.orders_added += 1;
            }

            MessageBody::AddOrderMpid(view) => {
                self.orders.insert(view.reference(), msg.offset());
                self.stats.orders_added += 1;
            }

            MessageBody::OrderReplace(view) => {
                let original = view.original_reference();
                if self.orders.contains_key(&original) {
                    // The original entry stays: the chain walk needs every
                    // predecessor to recover symbol and side from the
                    // originating add. Only Delete removes entries.
                    self.orders.insert(view.new_reference(), msg.offset());
                    self.stats.orders_replaced += 1;
                } else {
                    log::debug!(
                        "Dropping replace {} -> {}: original reference unknown",
                        original,
                        view.new_reference()
                    );
                    self.stats.replaces_dropped += 1;
                }
            }

            MessageBody::OrderDelete(view) => {
                // Absent references are a silent no-op.
                self.orders.remove(&view.reference());
                self.stats.orders_deleted += 1;
            }

            MessageBody::OrderCancel(_) => {
                // Partial cancels only reduce remaining shares, which the
                // VWAP path never consumes; the index stores offsets, not
                // sizes, so there is nothing to decrement.
            }

            MessageBody::OrderExecuted(view) => {
                let reference = view.reference();
                match self.construct_order(reference) {
                    Ok(order) => {
                        self.apply_execution(order.stock, view.executed_shares(), order.price);
                    }
                    Err(e) => {
                        log::warn!("Dropping execution for reference {reference}: {e}");
                        self.stats.executions_dropped += 1;
                    }
                }
            }

            MessageBody::OrderExecutedWithPrice(view) => {
                // Non-printable prints must not affect VWAP.
                if view.printable() != Some(Printable::Yes) {
                    self.stats.non_printable_skipped += 1;
                    return;
                }
                let reference = view.reference();
                match self.construct_order(reference) {
                    Ok(order) => {
                        // The execution price overrides the resting limit.
                        self.apply_execution(order.stock, view.executed_shares(), view.price());
                    }
                    Err(e) => {
                        log::warn!("Dropping execution for reference {reference}: {e}");
                        self.stats.executions_dropped += 1;
                    }
                }
            }

            MessageBody::Trade(view) => {
                // Non-cross trades carry their own symbol and price. The
                // reference number is only meaningful server-side; no index
                // interaction.
                self.apply_execution(view.stock(), view.shares(), view.price());
            }

            MessageBody::BrokenTrade(_) => {
                // Ignored: broken trades have no impact on a book-only
                // consumer per the feed specification.
            }

            MessageBody::Other(_) => {}
        }
    }

    /// Reconstruct the order behind `reference` by walking its replacement
    /// chain back to the originating add.
    ///
    /// The index entry points at the newest defining message. If that is a
    /// replace, its reference, shares and price are the order's current
    /// values; symbol and side survive from the add at the head of the
    /// chain. The walk is iterative and fails cleanly on a missing
    /// predecessor, a self-referential replace, or a chain head that is not
    /// an add.
    pub fn construct_order(&self, reference: u64) -> Result<Order> {
        let offset = self
            .orders
            .get(&reference)
            .copied()
            .ok_or(ItchError::OrderNotFound(reference))?;
        let mut msg = self
            .reader
            .read_at(offset)
            .ok_or(ItchError::OrderNotFound(reference))?;

        // Current values from the newest message, when it is a replace.
        let mut replaced: Option<(u64, u32, f64)> = None;
        let mut walk_ref = reference;

        loop {
            match msg.body() {
                MessageBody::AddOrder(view) => {
                    let side = view.side().unwrap_or(Side::Buy);
                    return Ok(Self::finish_order(
                        reference,
                        side,
                        view.shares(),
                        view.stock(),
                        view.price(),
                        replaced,
                    ));
                }

                MessageBody::AddOrderMpid(view) => {
                    let side = view.side().unwrap_or(Side::Buy);
                    return Ok(Self::finish_order(
                        reference,
                        side,
                        view.shares(),
                        view.stock(),
                        view.price(),
                        replaced,
                    ));
                }

                MessageBody::OrderReplace(view) => {
                    let original = view.original_reference();
                    if original == view.new_reference() {
                        // A self-referential entry would never terminate.
                        return Err(ItchError::BrokenChain(walk_ref));
                    }
                    if replaced.is_none() {
                        replaced = Some((view.new_reference(), view.shares(), view.price()));
                    }

                    let offset = self
                        .orders
                        .get(&original)
                        .copied()
                        .ok_or(ItchError::BrokenChain(original))?;
                    msg = self
                        .reader
                        .read_at(offset)
                        .ok_or(ItchError::BrokenChain(original))?;
                    walk_ref = original;
                }

                _ => {
                    return Err(ItchError::UnexpectedChainHead {
                        reference: walk_ref,
                        kind: msg.type_byte() as char,
                    });
                }
            }
        }
    }

    /// Assemble the reconstructed order, applying the newest replace's
    /// values over the originating add's.
    fn finish_order(
        reference: u64,
        side: Side,
        shares: u32,
        stock: Stock,
        price: f64,
        replaced: Option<(u64, u32, f64)>,
    ) -> Order {
        match replaced {
            Some((new_reference, new_shares, new_price)) => Order {
                reference: new_reference,
                side,
                shares: new_shares,
                stock,
                price: new_price,
            },
            None => Order {
                reference,
                side,
                shares,
                stock,
                price,
            },
        }
    }

    /// Fold one reportable execution into the per-symbol aggregates.
    fn apply_execution(&mut self, stock: Stock, shares: u32, price: f64) {
        let aggregate = self.symbols.entry(stock).or_default();
        aggregate.volume += shares as u64;
        aggregate.notional += shares as f64 * price;
        self.stats.executions_applied += 1;
    }

    /// Emit an hourly snapshot if `current_time` crossed a report boundary.
    ///
    /// `last_report_time` advances to the boundary just crossed and the
    /// completed hour's report is written. Aggregates are not reset: VWAP is
    /// cumulative session-to-date. A write failure is logged and counted;
    /// the replay continues.
    fn maybe_report(&mut self, current_time: u64) {
        let period = self.config.report_period_ns;
        if self.symbols.is_empty() || current_time < self.last_report_time + period {
            return;
        }

        self.last_report_time = self.last_report_time.max(current_time / period * period);

        // The snapshot covers the hour that just completed.
        let hour = self.last_report_time / period - 1;
        let path = self.writer.path_for_hour(hour);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        println!(
            "{} | Reporting VWAP | {} | {} stocks",
            Timestamp(current_time),
            filename,
            self.symbols.len()
        );

        match self.writer.write(hour, &self.symbols) {
            Ok(_) => self.stats.reports_written += 1,
            Err(source) => {
                let err = ItchError::ReportWrite { path, source };
                log::error!("{err}");
                self.stats.report_failures += 1;
            }
        }
    }

    /// Flush the final hour after the last message.
    ///
    /// Runs one more report pass with a synthetic current time one period
    /// past the last boundary, so the rows folded since then are emitted.
    pub fn finish(&mut self) {
        self.maybe_report(self.last_report_time + self.config.report_period_ns);
    }
}
