//! Market event record carried through the pipeline
//!
//! One struct covers every event kind (add, execute, cancel, trade). It is
//! `Copy`, has no heap data and occupies exactly one 64-byte cache line, so
//! a ring slot holds exactly one message.
//!
//! ## Layout
//!
//! ```text
//! offset  size  field
//!      0     1  kind            (ITCH letter code)
//!      4     4  order_id        u32
//!      8     8  symbol          NUL-padded ASCII
//!     16     4  size            u32
//!     24     8  price           f64
//!     32     1  side            0 = buy, 1 = sell, 255 = unknown
//!     40     8  timestamp_ns    u64
//!     48     8  sequence        u64
//!     56     8  (padding)
//! ```

use std::fmt;

use crate::core::errors::MessageValidationError;

/// Length of the fixed symbol field
pub const SYMBOL_LEN: usize = 8;

/// Market event kind, encoded as the ITCH message letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MessageKind {
    AddOrder = b'A',
    /// Add order with market participant attribution
    AddOrderAttributed = b'F',
    OrderExecuted = b'E',
    OrderCanceled = b'X',
    Trade = b'P',
    #[default]
    Unknown = 0,
}

impl MessageKind {
    /// Wire code for this kind
    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire code; unrecognised codes map to `Unknown`
    #[inline(always)]
    pub const fn from_code(code: u8) -> Self {
        match code {
            b'A' => Self::AddOrder,
            b'F' => Self::AddOrderAttributed,
            b'E' => Self::OrderExecuted,
            b'X' => Self::OrderCanceled,
            b'P' => Self::Trade,
            _ => Self::Unknown,
        }
    }
}

/// Order side
///
/// `Unknown` is a sentinel for missing or corrupt data and is never a
/// tradeable side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
    #[default]
    Unknown = 255,
}

impl Side {
    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Buy,
            1 => Self::Sell,
            _ => Self::Unknown,
        }
    }

    /// True for `Buy` and `Sell`
    #[inline(always)]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Fixed 8-byte instrument symbol, NUL padded
///
/// A symbol of exactly eight characters carries no terminator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Symbol(pub [u8; SYMBOL_LEN]);

impl Symbol {
    /// Build a symbol from text, truncating to eight bytes
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; SYMBOL_LEN];
        let src = name.as_bytes();
        let len = src.len().min(SYMBOL_LEN);
        bytes[..len].copy_from_slice(&src[..len]);
        Self(bytes)
    }

    /// Raw bytes including padding
    #[inline(always)]
    pub const fn as_bytes(&self) -> &[u8; SYMBOL_LEN] {
        &self.0
    }

    /// Logical length (bytes before the first NUL)
    #[inline]
    pub fn len(&self) -> usize {
        self.0.iter().position(|&b| b == 0).unwrap_or(SYMBOL_LEN)
    }

    /// True when the logical name is empty (first byte NUL)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// True when every byte after the logical name is NUL
    #[inline]
    pub fn has_clean_padding(&self) -> bool {
        self.0[self.len()..].iter().all(|&b| b == 0)
    }

    /// Copy with every byte after the logical name zeroed
    #[inline]
    pub fn normalized(self) -> Self {
        let mut bytes = self.0;
        bytes[self.len()..].fill(0);
        Self(bytes)
    }

    /// Symbol text, lossy for non-UTF-8 bytes
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0[..self.len()])
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single market event
///
/// Fields are public in the same spirit as a C struct: the layout above is
/// part of the wire contract (see [`crate::core::wire`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, align(64))]
pub struct Message {
    pub kind: MessageKind,
    pub order_id: u32,
    pub symbol: Symbol,
    pub size: u32,
    pub price: f64,
    pub side: Side,
    pub timestamp_ns: u64,
    pub sequence: u64,
}

impl Message {
    /// Symbol text up to the first NUL
    pub fn symbol_str(&self) -> std::borrow::Cow<'_, str> {
        self.symbol.as_str()
    }

    /// Add order, with or without attribution
    #[inline(always)]
    pub fn is_add_order(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::AddOrder | MessageKind::AddOrderAttributed
        )
    }

    #[inline(always)]
    pub fn is_executed(&self) -> bool {
        self.kind == MessageKind::OrderExecuted
    }

    #[inline(always)]
    pub fn is_canceled(&self) -> bool {
        self.kind == MessageKind::OrderCanceled
    }

    #[inline(always)]
    pub fn is_trade(&self) -> bool {
        self.kind == MessageKind::Trade
    }

    /// Check the fields a replayable record must carry
    ///
    /// Non-empty symbol with zeroed padding, positive size, positive
    /// finite price.
    pub fn validate(&self) -> Result<(), MessageValidationError> {
        if self.symbol.is_empty() {
            return Err(MessageValidationError::EmptySymbol);
        }
        if !self.symbol.has_clean_padding() {
            return Err(MessageValidationError::DirtySymbolPadding {
                symbol: self.symbol.0,
            });
        }
        if self.size == 0 {
            return Err(MessageValidationError::ZeroSize { size: self.size });
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(MessageValidationError::InvalidPrice { price: self.price });
        }
        Ok(())
    }

    /// Swap the integer fields from host to network (big-endian) order
    ///
    /// Symbol, price, kind and side are byte-order neutral and untouched.
    #[inline(always)]
    pub fn to_network_order(self) -> Self {
        Self {
            order_id: self.order_id.to_be(),
            size: self.size.to_be(),
            timestamp_ns: self.timestamp_ns.to_be(),
            sequence: self.sequence.to_be(),
            ..self
        }
    }

    /// Swap the integer fields from network (big-endian) to host order
    #[inline(always)]
    pub fn to_host_order(self) -> Self {
        Self {
            order_id: u32::from_be(self.order_id),
            size: u32::from_be(self.size),
            timestamp_ns: u64::from_be(self.timestamp_ns),
            sequence: u64::from_be(self.sequence),
            ..self
        }
    }
}
