//! Read/Write Tag services and the Unconnected Send + CPF wrapping that
//! carries them to the target.

use bytes::{BufMut, BytesMut};

use super::types;
use crate::config::RoutePath;

pub const READ_TAG: u8 = 0x4C;
pub const WRITE_TAG: u8 = 0x4D;
pub const UNCONNECTED_SEND: u8 = 0x52;

// Connection Manager, class 0x06 instance 0x01
const CONNECTION_MANAGER_PATH: [u8; 4] = [0x20, 0x06, 0x24, 0x01];
const PRIORITY_TICK_TIME: u8 = 0x0A;
const TIMEOUT_TICKS: u8 = 0xF0;

const NULL_ADDRESS_ITEM: u16 = 0x0000;
const UNCONNECTED_DATA_ITEM: u16 = 0x00B2;
const CPF_TIMEOUT: u16 = 10;

/// Read Tag service: path plus element count.
pub fn read_request(path: &[u8], elements: u16) -> BytesMut {
    debug_assert!(path.len() % 2 == 0);
    let mut out = BytesMut::with_capacity(4 + path.len());
    out.put_u8(READ_TAG);
    out.put_u8((path.len() / 2) as u8);
    out.put_slice(path);
    out.put_u16_le(elements);
    out
}

/// Write Tag service: path, type code, element count, value bytes. A single
/// pad byte is appended iff the write is one BOOL element with an odd-length
/// value.
pub fn write_request(path: &[u8], type_code: u16, elements: u16, value: &[u8]) -> BytesMut {
    debug_assert!(path.len() % 2 == 0);
    let mut out = BytesMut::with_capacity(6 + path.len() + value.len() + 1);
    out.put_u8(WRITE_TAG);
    out.put_u8((path.len() / 2) as u8);
    out.put_slice(path);
    out.put_u16_le(type_code);
    out.put_u16_le(elements);
    out.put_slice(value);
    if type_code == types::BOOL && elements == 1 && value.len() % 2 != 0 {
        out.put_u8(0);
    }
    out
}

/// Wrap a service message in an Unconnected Send against the Connection
/// Manager, trailed by the even-padded backplane route path.
pub fn unconnected_send(message: &[u8], route: &RoutePath) -> BytesMut {
    let route_bytes = route.bytes();
    let mut out = BytesMut::with_capacity(12 + message.len() + route_bytes.len());
    out.put_u8(UNCONNECTED_SEND);
    out.put_u8(0x02);
    out.put_slice(&CONNECTION_MANAGER_PATH);
    out.put_u8(PRIORITY_TICK_TIME);
    out.put_u8(TIMEOUT_TICKS);
    out.put_u16_le(message.len() as u16);
    out.put_slice(message);
    if message.len() % 2 != 0 {
        out.put_u8(0);
    }
    out.put_u8(route_bytes.len().div_ceil(2) as u8);
    out.put_slice(route_bytes);
    if route_bytes.len() % 2 != 0 {
        out.put_u8(0);
    }
    out
}

/// SendRRData body: interface handle, timeout, then a Null Address item and
/// one Unconnected Data item carrying the CIP message.
pub fn rr_data_body(data: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(16 + data.len());
    out.put_u32_le(0);
    out.put_u16_le(CPF_TIMEOUT);
    out.put_u16_le(2);
    out.put_u16_le(NULL_ADDRESS_ITEM);
    out.put_u16_le(0);
    out.put_u16_le(UNCONNECTED_DATA_ITEM);
    out.put_u16_le(data.len() as u16);
    out.put_slice(data);
    out
}
