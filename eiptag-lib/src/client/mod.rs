//! Typed tag facade: per-type read/write operations over one PLC session.

pub(crate) mod bits;
pub(crate) mod chunk;
pub(crate) mod strings;

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::error;

use crate::addr::{self, TagAddress};
use crate::cip::types::ElemType;
use crate::cip::{self, types, CipResponse};
use crate::config::{Options, RoutePath};
use crate::error::{ClientError, Result};
use crate::transport::Transport;

/// Result of an array read: a buffer plus the window of elements actually
/// decoded. The physical buffer may be longer than the window, so callers
/// go through [`ArrayView::as_slice`] rather than assuming the lengths
/// match.
#[derive(Debug, Clone)]
pub struct ArrayView<T> {
    buffer: Vec<T>,
    offset: usize,
    len: usize,
}

impl<T> ArrayView<T> {
    pub(crate) fn new(buffer: Vec<T>, requested: usize) -> ArrayView<T> {
        let len = requested.min(buffer.len());
        ArrayView {
            buffer,
            offset: 0,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer[self.offset..self.offset + self.len]
    }

    pub fn into_vec(mut self) -> Vec<T> {
        self.buffer.truncate(self.offset + self.len);
        if self.offset > 0 {
            self.buffer.drain(..self.offset);
        }
        self.buffer
    }
}

/// Asynchronous tag client. One instance owns one session to one PLC;
/// concurrent callers serialize on the session mutex in FIFO order. Use
/// one instance per PLC target.
pub struct Client {
    transport: Mutex<Transport>,
}

impl Client {
    pub fn new(options: Options) -> Client {
        let route = RoutePath::parse(options.path.as_deref());
        let io_timeout = Duration::from_millis(options.timeout_ms);
        let transport = Transport::new(options.ip, route, io_timeout);
        Client {
            transport: Mutex::new(transport),
        }
    }

    /// Read one or more elements of a tag, returning the decoded reply.
    pub(crate) async fn read_raw(&self, address: &str, elements: u16) -> Result<CipResponse> {
        let parsed = TagAddress::parse(address)?;
        let path = cip::path::encode(&parsed);
        let message = cip::service::read_request(&path, elements);
        let mut transport = self.transport.lock().await;
        let reply = transport.transact(&message).await?;
        cip::response::parse_read(&reply)
    }

    /// Write elements of a tag with the given wire type.
    pub(crate) async fn write_raw(
        &self,
        address: &str,
        type_code: u16,
        elements: u16,
        value: &[u8],
    ) -> Result<()> {
        let parsed = TagAddress::parse(address)?;
        let path = cip::path::encode(&parsed);
        let message = cip::service::write_request(&path, type_code, elements, value);
        let mut transport = self.transport.lock().await;
        let reply = transport.transact(&message).await?;
        cip::response::parse_write(&reply)
    }

    pub async fn read_float(&self, address: &str) -> Result<f32> {
        let result = async {
            let resp = self.read_raw(address, 1).await?;
            scalar_4(&resp).map(f32::from_le_bytes)
        }
        .await;
        surface(address, result)
    }

    pub async fn write_float(&self, address: &str, value: f32) -> Result<()> {
        let result = self
            .write_raw(address, types::REAL, 1, &value.to_le_bytes())
            .await;
        surface(address, result)
    }

    pub async fn read_dint(&self, address: &str) -> Result<i32> {
        let result = async {
            let resp = self.read_raw(address, 1).await?;
            scalar_4(&resp).map(i32::from_le_bytes)
        }
        .await;
        surface(address, result)
    }

    pub async fn write_dint(&self, address: &str, value: i32) -> Result<()> {
        let result = self
            .write_raw(address, types::DINT, 1, &value.to_le_bytes())
            .await;
        surface(address, result)
    }

    pub async fn read_float_array(&self, address: &str, count: usize) -> Result<ArrayView<f32>> {
        let result = async {
            let raw = chunk::read_array(self, address, count).await?;
            let values = raw
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Ok(ArrayView::new(values, count))
        }
        .await;
        surface(address, result)
    }

    pub async fn write_float_array(&self, address: &str, values: &[f32]) -> Result<()> {
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let result = chunk::write_array(self, address, ElemType::Real, &data).await;
        surface(address, result)
    }

    pub async fn read_dint_array(&self, address: &str, count: usize) -> Result<ArrayView<i32>> {
        let result = async {
            let raw = chunk::read_array(self, address, count).await?;
            let values = raw
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Ok(ArrayView::new(values, count))
        }
        .await;
        surface(address, result)
    }

    pub async fn write_dint_array(&self, address: &str, values: &[i32]) -> Result<()> {
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let result = chunk::write_array(self, address, ElemType::Dint, &data).await;
        surface(address, result)
    }

    /// Write a scalar BOOL tag, or one bit of an integer host tag when the
    /// address is `i=…` or `NAME[N]`.
    pub async fn write_bool(&self, address: &str, value: bool) -> Result<()> {
        let result = async {
            if let Some((host, bit)) = addr::parse_bit_access(address) {
                return bits::write_bit(self, &host, bit, value).await;
            }
            if address.starts_with("i=") {
                return Err(ClientError::InvalidAddress(format!(
                    "bit access without a bit selector: {address}"
                )));
            }
            if let Some((base, bit)) = addr::parse_bit(address) {
                return bits::write_bit(self, base, bit, value).await;
            }
            let payload = if value { [0xFF, 0xFF] } else { [0x00, 0x00] };
            self.write_raw(address, types::BOOL, 1, &payload).await
        }
        .await;
        surface(address, result)
    }

    /// Read booleans. `i=` addresses and un-indexed addresses are decoded as
    /// bit-packed data; an address that itself ends in `[N]` is decoded one
    /// byte per element.
    pub async fn read_bool_array(&self, address: &str, count: usize) -> Result<ArrayView<bool>> {
        let result = async {
            if let Some((host, bit)) = addr::parse_bit_access(address) {
                return bits::read_bits(self, &host, bit, count).await;
            }
            if address.starts_with("i=") {
                return Err(ClientError::InvalidAddress(format!(
                    "bit access without a bit selector: {address}"
                )));
            }
            if addr::parse_bit(address).is_some() {
                let resp = self.read_raw(address, count as u16).await?;
                let values = resp.payload.iter().map(|&b| b != 0).collect();
                return Ok(ArrayView::new(values, count));
            }
            bits::read_bits(self, address, 0, count).await
        }
        .await;
        surface(address, result)
    }

    /// Write a BOOL array in one service, one byte per element, with a tail
    /// pad when the element count is odd.
    pub async fn write_bool_array(&self, address: &str, values: &[bool]) -> Result<()> {
        let mut payload: Vec<u8> = values.iter().map(|&v| u8::from(v)).collect();
        if payload.len() % 2 != 0 {
            payload.push(0);
        }
        let result = self
            .write_raw(address, types::BOOL, values.len() as u16, &payload)
            .await;
        surface(address, result)
    }

    pub async fn read_string(&self, address: &str) -> Result<String> {
        let result = async {
            let resp = self.read_raw(address, 1).await?;
            Ok(strings::decode(&resp.payload))
        }
        .await;
        surface(address, result)
    }

    pub async fn write_string(&self, address: &str, value: &str) -> Result<()> {
        let payload = strings::encode(value);
        let result = self
            .write_raw(address, types::STRING, 1, &payload)
            .await;
        surface(address, result)
    }

    /// Read a string array. A single un-indexed element is one scalar read;
    /// anything else is one request per element.
    pub async fn read_string_array(
        &self,
        address: &str,
        count: usize,
    ) -> Result<ArrayView<String>> {
        let result = async {
            if count <= 1 && !address.contains('[') {
                let resp = self.read_raw(address, 1).await?;
                let values = vec![strings::decode(&resp.payload)];
                return Ok(ArrayView::new(values, count));
            }
            let (base, start) = addr::parse_array_start(address);
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                let elem_addr = addr::normalize_array_name(&base, start + i as u32);
                let resp = self.read_raw(&elem_addr, 1).await?;
                values.push(strings::decode(&resp.payload));
            }
            Ok(ArrayView::new(values, count))
        }
        .await;
        surface(address, result)
    }

    /// Write a string array, one request per element.
    pub async fn write_string_array(&self, address: &str, values: &[&str]) -> Result<()> {
        let result = async {
            let (base, start) = addr::parse_array_start(address);
            for (i, value) in values.iter().enumerate() {
                let elem_addr = addr::normalize_array_name(&base, start + i as u32);
                let payload = strings::encode(value);
                self.write_raw(&elem_addr, types::STRING, 1, &payload)
                    .await?;
            }
            Ok(())
        }
        .await;
        surface(address, result)
    }

    /// Unregister the session and close the socket. Idempotent; a later
    /// operation re-opens the session.
    pub async fn close(&self) {
        let mut transport = self.transport.lock().await;
        transport.close().await;
    }
}

fn scalar_4(resp: &CipResponse) -> Result<[u8; 4]> {
    if resp.payload.len() < 4 {
        return Err(ClientError::Truncated {
            needed: 4,
            got: resp.payload.len(),
        });
    }
    Ok([
        resp.payload[0],
        resp.payload[1],
        resp.payload[2],
        resp.payload[3],
    ])
}

fn surface<T>(address: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(tag = %address, error = %err, "tag operation failed");
    }
    result
}
