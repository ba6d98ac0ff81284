//! Datagram wire codec
//!
//! One message per datagram. The payload mirrors the in-memory
//! [`Message`] layout byte for byte (same offsets, zeroed padding) with the
//! integer fields in network byte order. Price travels as raw IEEE-754
//! bytes and the symbol as-is.
//!
//! Receivers must discard any datagram whose length is not exactly
//! [`WIRE_SIZE`].

use crate::core::message::{Message, MessageKind, Side, Symbol, SYMBOL_LEN};

/// Size of one encoded message
pub const WIRE_SIZE: usize = std::mem::size_of::<Message>();

const KIND_OFFSET: usize = 0;
const ORDER_ID_OFFSET: usize = 4;
const SYMBOL_OFFSET: usize = 8;
const SIZE_OFFSET: usize = 16;
const PRICE_OFFSET: usize = 24;
const SIDE_OFFSET: usize = 32;
const TIMESTAMP_OFFSET: usize = 40;
const SEQUENCE_OFFSET: usize = 48;

/// Encode a host-order message into its wire representation
#[inline]
pub fn encode(msg: &Message) -> [u8; WIRE_SIZE] {
    let mut buf = [0u8; WIRE_SIZE];
    buf[KIND_OFFSET] = msg.kind.code();
    buf[ORDER_ID_OFFSET..ORDER_ID_OFFSET + 4].copy_from_slice(&msg.order_id.to_be_bytes());
    buf[SYMBOL_OFFSET..SYMBOL_OFFSET + SYMBOL_LEN].copy_from_slice(msg.symbol.as_bytes());
    buf[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&msg.size.to_be_bytes());
    buf[PRICE_OFFSET..PRICE_OFFSET + 8].copy_from_slice(&msg.price.to_ne_bytes());
    buf[SIDE_OFFSET] = msg.side.code();
    buf[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8].copy_from_slice(&msg.timestamp_ns.to_be_bytes());
    buf[SEQUENCE_OFFSET..SEQUENCE_OFFSET + 8].copy_from_slice(&msg.sequence.to_be_bytes());
    buf
}

/// Decode a datagram payload into a host-order message
///
/// Returns `None` unless `bytes.len() == WIRE_SIZE`.
#[inline]
pub fn decode(bytes: &[u8]) -> Option<Message> {
    let buf: &[u8; WIRE_SIZE] = bytes.try_into().ok()?;
    Some(decode_record(buf))
}

/// Decode an exactly-sized record
#[inline]
pub fn decode_record(buf: &[u8; WIRE_SIZE]) -> Message {
    Message {
        kind: MessageKind::from_code(buf[KIND_OFFSET]),
        order_id: u32::from_be_bytes(array_at(buf, ORDER_ID_OFFSET)),
        symbol: Symbol(array_at(buf, SYMBOL_OFFSET)),
        size: u32::from_be_bytes(array_at(buf, SIZE_OFFSET)),
        price: f64::from_ne_bytes(array_at(buf, PRICE_OFFSET)),
        side: Side::from_code(buf[SIDE_OFFSET]),
        timestamp_ns: u64::from_be_bytes(array_at(buf, TIMESTAMP_OFFSET)),
        sequence: u64::from_be_bytes(array_at(buf, SEQUENCE_OFFSET)),
    }
}

#[inline(always)]
fn array_at<const N: usize>(buf: &[u8; WIRE_SIZE], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}
