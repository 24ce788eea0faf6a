//! Array transfer chunking and the adaptive shrink on oversize rejections.

use crate::addr;
use crate::cip::types::ElemType;
use crate::client::Client;
use crate::error::Result;

/// Elements per read request for 4-byte element types.
pub const READ_CHUNK_ELEMENTS: usize = 124;
/// Starting elements per write request for 4-byte element types.
pub const WRITE_CHUNK_ELEMENTS: usize = 490;

const ELEMENT_BYTES: usize = 4;

/// Read `count` 4-byte elements in fixed chunks, concatenating the raw
/// little-endian payloads. Stops early if the device returns fewer elements
/// than requested.
pub(crate) async fn read_array(client: &Client, address: &str, count: usize) -> Result<Vec<u8>> {
    let (base, start) = addr::parse_array_start(address);
    let mut raw = Vec::with_capacity(count * ELEMENT_BYTES);
    let mut copied = 0usize;
    while copied < count {
        let take = (count - copied).min(READ_CHUNK_ELEMENTS);
        let chunk_addr = addr::normalize_array_name(&base, start + copied as u32);
        let resp = client.read_raw(&chunk_addr, take as u16).await?;
        let got = resp.payload.len() / ELEMENT_BYTES;
        raw.extend_from_slice(&resp.payload[..got * ELEMENT_BYTES]);
        if got < take {
            break;
        }
        copied += take;
    }
    Ok(raw)
}

/// Write 4-byte elements, starting at 490 per request and halving on an
/// oversize encapsulation rejection. Later chunks never try larger than the
/// size that last went through.
pub(crate) async fn write_array(
    client: &Client,
    address: &str,
    elem: ElemType,
    data: &[u8],
) -> Result<()> {
    debug_assert!(data.len() % ELEMENT_BYTES == 0);
    let total = data.len() / ELEMENT_BYTES;
    let (base, start) = addr::parse_array_start(address);
    let mut ceiling = WRITE_CHUNK_ELEMENTS;
    let mut written = 0usize;
    while written < total {
        let mut attempt = ceiling.min(total - written);
        loop {
            let chunk_addr = addr::normalize_array_name(&base, start + written as u32);
            let slice = &data[written * ELEMENT_BYTES..(written + attempt) * ELEMENT_BYTES];
            match client
                .write_raw(&chunk_addr, elem.type_code(), attempt as u16, slice)
                .await
            {
                Ok(()) => break,
                Err(err) if err.is_oversize() && attempt > 1 => {
                    attempt = (attempt / 2).max(1);
                    ceiling = attempt;
                }
                Err(err) => return Err(err),
            }
        }
        written += attempt;
    }
    Ok(())
}
