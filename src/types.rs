//! Core types shared across the ITCH replay engine.
//!
//! These types are designed to be:
//! - Zero-cost over the wire representation (byte enums, fixed arrays)
//! - Cheap to copy and hash on the hot path
//! - Faithful to the TotalView-ITCH 5.0 field encoding

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds in one minute.
pub const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;

/// Nanoseconds in one hour.
pub const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

/// Default reporting period: one wall-clock hour.
pub const REPORT_PERIOD_NS: u64 = NANOS_PER_HOUR;

/// ITCH prices are unsigned 32-bit integers in units of 1/10,000 USD.
pub const PRICE_SCALE: f64 = 1.0 / 10_000.0;

/// Width of the big-endian length prefix in front of every ITCH payload.
pub const FRAME_LENGTH_SIZE: usize = 2;

/// ITCH 5.0 message type code (the leading payload byte).
///
/// Only the types the VWAP engine consumes are enumerated; every other code
/// is accepted and skipped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageKind {
    /// System event
    SystemEvent = b'S',
    /// Add order (no MPID attribution)
    AddOrder = b'A',
    /// Add order with MPID attribution
    AddOrderMpid = b'F',
    /// Order executed at the resting limit price
    OrderExecuted = b'E',
    /// Order executed at an explicit price
    OrderExecutedWithPrice = b'C',
    /// Partial cancel
    OrderCancel = b'X',
    /// Full delete
    OrderDelete = b'D',
    /// Replace: new reference, size and price for a resting order
    OrderReplace = b'U',
    /// Non-cross trade against a non-displayed order
    Trade = b'P',
    /// Broken trade / order execution
    BrokenTrade = b'B',
}

impl MessageKind {
    /// Parse a message type from the leading payload byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(MessageKind::SystemEvent),
            b'A' => Some(MessageKind::AddOrder),
            b'F' => Some(MessageKind::AddOrderMpid),
            b'E' => Some(MessageKind::OrderExecuted),
            b'C' => Some(MessageKind::OrderExecutedWithPrice),
            b'X' => Some(MessageKind::OrderCancel),
            b'D' => Some(MessageKind::OrderDelete),
            b'U' => Some(MessageKind::OrderReplace),
            b'P' => Some(MessageKind::Trade),
            b'B' => Some(MessageKind::BrokenTrade),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Whether this kind defines an order on the book (valid chain head).
    #[inline]
    pub fn is_add(self) -> bool {
        matches!(self, MessageKind::AddOrder | MessageKind::AddOrderMpid)
    }
}

/// System event code carried by a `SystemEvent` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SystemEventKind {
    StartMessages = b'O',
    StartSystemHours = b'S',
    StartMarketHours = b'Q',
    EndMarketHours = b'M',
    EndSystemHours = b'E',
    EndMessages = b'C',
}

impl SystemEventKind {
    /// Parse an event code byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'O' => Some(SystemEventKind::StartMessages),
            b'S' => Some(SystemEventKind::StartSystemHours),
            b'Q' => Some(SystemEventKind::StartMarketHours),
            b'M' => Some(SystemEventKind::EndMarketHours),
            b'E' => Some(SystemEventKind::EndSystemHours),
            b'C' => Some(SystemEventKind::EndMessages),
            _ => None,
        }
    }

    /// Human-readable description used in the session log.
    pub fn description(self) -> &'static str {
        match self {
            SystemEventKind::StartMessages => "Start of Messages",
            SystemEventKind::StartSystemHours => "Start of System hours",
            SystemEventKind::StartMarketHours => "Start of Market hours",
            SystemEventKind::EndMarketHours => "End of Market hours",
            SystemEventKind::EndSystemHours => "End of System hours",
            SystemEventKind::EndMessages => "End of Messages",
        }
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Buy = b'B',
    /// Sell order (ask)
    Sell = b'S',
}

impl Side {
    /// Parse a side from the wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'B' => Some(Side::Buy),
            b'S' => Some(Side::Sell),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Printable flag on `OrderExecutedWithPrice`.
///
/// Non-printable executions must not contribute to public statistics such as
/// VWAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Printable {
    Yes = b'Y',
    No = b'N',
}

impl Printable {
    /// Parse a printable flag from the wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'Y' => Some(Printable::Yes),
            b'N' => Some(Printable::No),
            _ => None,
        }
    }
}

/// An 8-byte, right-space-padded stock symbol.
///
/// Comparison and hashing are bytewise, trailing spaces included, so the
/// aggregate map key matches the raw wire window exactly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stock([u8; 8]);

impl Stock {
    /// Wrap a raw 8-byte symbol window.
    #[inline]
    pub fn new(bytes: [u8; 8]) -> Self {
        Stock(bytes)
    }

    /// The raw 8 bytes, trailing spaces included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The symbol with trailing spaces removed.
    pub fn trimmed(&self) -> &str {
        std::str::from_utf8(&self.0)
            .unwrap_or("")
            .trim_end_matches(' ')
    }
}

impl From<&str> for Stock {
    /// Build a symbol from a short string, right-padding with spaces.
    fn from(s: &str) -> Self {
        let mut bytes = [b' '; 8];
        for (dst, src) in bytes.iter_mut().zip(s.bytes()) {
            *dst = src;
        }
        Stock(bytes)
    }
}

impl fmt::Display for Stock {
    /// Writes the raw 8 characters, trailing spaces included, as they appear
    /// in the report rows. Symbols are ASCII on the wire; anything else is
    /// masked to keep the column width fixed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).unwrap_or("????????"))
    }
}

impl fmt::Debug for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stock({:?})", self.trimmed())
    }
}

/// A 48-bit ITCH timestamp: nanoseconds since midnight Eastern.
///
/// Wraps the raw value for formatting as `HH:MM:SS.nnnnnnnnn` in the
/// session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The raw nanosecond count.
    #[inline]
    pub fn nanos(self) -> u64 {
        self.0
    }

    /// The wall-clock hour index this timestamp falls in.
    #[inline]
    pub fn hour(self) -> u64 {
        self.0 / NANOS_PER_HOUR
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.0;
        let hour = remaining / NANOS_PER_HOUR;
        remaining -= hour * NANOS_PER_HOUR;
        let min = remaining / NANOS_PER_MIN;
        remaining -= min * NANOS_PER_MIN;
        let sec = remaining / NANOS_PER_SEC;
        remaining -= sec * NANOS_PER_SEC;
        write!(f, "{hour:02}:{min:02}:{sec:02}.{remaining:09}")
    }
}

/// An order reconstructed from its defining messages at execution time.
///
/// Transient: built on demand by walking the replacement chain back to the
/// originating add, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    /// Current reference number (the newest in the chain).
    pub reference: u64,
    /// Side, carried over from the originating add.
    pub side: Side,
    /// Remaining shares as of the last defining message.
    pub shares: u32,
    /// Symbol, carried over from the originating add.
    pub stock: Stock,
    /// Limit price in dollars as of the last defining message.
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_round_trip() {
        for byte in [b'S', b'A', b'F', b'E', b'C', b'X', b'D', b'U', b'P', b'B'] {
            let kind = MessageKind::from_byte(byte).unwrap();
            assert_eq!(kind.to_byte(), byte);
        }
        assert_eq!(MessageKind::from_byte(b'R'), None);
        assert_eq!(MessageKind::from_byte(b'I'), None);
    }

    #[test]
    fn test_message_kind_is_add() {
        assert!(MessageKind::AddOrder.is_add());
        assert!(MessageKind::AddOrderMpid.is_add());
        assert!(!MessageKind::OrderReplace.is_add());
        assert!(!MessageKind::Trade.is_add());
    }

    #[test]
    fn test_system_event_descriptions() {
        assert_eq!(
            SystemEventKind::from_byte(b'Q').unwrap().description(),
            "Start of Market hours"
        );
        assert_eq!(
            SystemEventKind::from_byte(b'C').unwrap().description(),
            "End of Messages"
        );
        assert_eq!(SystemEventKind::from_byte(b'Z'), None);
    }

    #[test]
    fn test_side_from_byte() {
        assert_eq!(Side::from_byte(b'B'), Some(Side::Buy));
        assert_eq!(Side::from_byte(b'S'), Some(Side::Sell));
        assert_eq!(Side::from_byte(b'X'), None);
    }

    #[test]
    fn test_stock_padding_and_display() {
        let stock = Stock::from("AAPL");
        assert_eq!(stock.as_bytes(), b"AAPL    ");
        assert_eq!(stock.to_string(), "AAPL    ");
        assert_eq!(stock.trimmed(), "AAPL");
    }

    #[test]
    fn test_stock_ordering_is_bytewise() {
        let a = Stock::from("AAPL");
        let b = Stock::from("MSFT");
        assert!(a < b);

        // Trailing spaces participate in the comparison.
        let short = Stock::new(*b"AB      ");
        let long = Stock::new(*b"ABC     ");
        assert!(short < long);
    }

    #[test]
    fn test_timestamp_display() {
        // 09:30:00.000000001
        let ts = Timestamp(9 * NANOS_PER_HOUR + 30 * NANOS_PER_MIN + 1);
        assert_eq!(ts.to_string(), "09:30:00.000000001");
        assert_eq!(ts.hour(), 9);

        let midnight = Timestamp(0);
        assert_eq!(midnight.to_string(), "00:00:00.000000000");
    }
}
