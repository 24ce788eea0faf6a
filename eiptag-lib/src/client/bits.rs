//! Bit access on multi-byte integer host tags: a bit index is split into an
//! element offset and an intra-element bit offset, bits are unpacked
//! LSB-first within each byte, and single-bit writes go through a
//! read-modify-write of one host element.

use crate::addr;
use crate::cip::types;
use crate::client::{ArrayView, Client};
use crate::error::{ClientError, Result};

/// Read `count` bits of the host tag starting at `bit_index`.
pub(crate) async fn read_bits(
    client: &Client,
    host: &str,
    bit_index: u32,
    count: usize,
) -> Result<ArrayView<bool>> {
    let (base, start) = addr::parse_array_start(host);
    let probe = client
        .read_raw(&addr::normalize_array_name(&base, start), 1)
        .await?;
    let width = types::width_of(probe.type_code);
    let element_offset = bit_index / width;
    let intra = (bit_index % width) as usize;

    let elements = (intra + count).div_ceil(width as usize).max(1);
    let run_addr = addr::normalize_array_name(&base, start + element_offset);
    let resp = client.read_raw(&run_addr, elements as u16).await?;

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let bit = intra + i;
        let Some(byte) = resp.payload.get(bit / 8) else {
            break;
        };
        values.push((byte >> (bit % 8)) & 1 == 1);
    }
    Ok(ArrayView::new(values, count))
}

/// Set or clear one bit of the host tag, leaving every other bit of the
/// element untouched.
pub(crate) async fn write_bit(
    client: &Client,
    host: &str,
    bit_index: u32,
    value: bool,
) -> Result<()> {
    let (base, start) = addr::parse_array_start(host);
    let probe = client
        .read_raw(&addr::normalize_array_name(&base, start), 1)
        .await?;
    let width = types::width_of(probe.type_code);
    let element_offset = bit_index / width;
    let intra = (bit_index % width) as usize;

    let elem_addr = addr::normalize_array_name(&base, start + element_offset);
    let current = if element_offset == 0 {
        probe
    } else {
        client.read_raw(&elem_addr, 1).await?
    };

    let elem_bytes = (width / 8) as usize;
    if current.payload.len() < elem_bytes {
        return Err(ClientError::Truncated {
            needed: elem_bytes,
            got: current.payload.len(),
        });
    }
    let mut raw = current.payload[..elem_bytes].to_vec();
    let mask = 1u8 << (intra % 8);
    if value {
        raw[intra / 8] |= mask;
    } else {
        raw[intra / 8] &= !mask;
    }
    client
        .write_raw(&elem_addr, current.type_code, 1, &raw)
        .await
}
