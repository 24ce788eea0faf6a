//! Symbolic request path encoding.

use bytes::{BufMut, BytesMut};

use crate::addr::TagAddress;

const EXTENDED_SYMBOL: u8 = 0x91;
const ELEMENT_U8: u8 = 0x28;
const ELEMENT_U16: u8 = 0x29;
const ELEMENT_U32: u8 = 0x2A;

/// Encode the logical path for a parsed tag address: one extended-symbol
/// segment per dotted name (padded to even length), one element segment per
/// bracketed index, sized to the smallest fitting width.
pub fn encode(address: &TagAddress) -> BytesMut {
    let mut out = BytesMut::new();
    for seg in &address.segments {
        out.put_u8(EXTENDED_SYMBOL);
        out.put_u8(seg.name.len() as u8);
        out.put_slice(seg.name.as_bytes());
        if seg.name.len() % 2 != 0 {
            out.put_u8(0);
        }
        for &idx in &seg.indices {
            if idx < 0x100 {
                out.put_u8(ELEMENT_U8);
                out.put_u8(idx as u8);
            } else if idx < 0x1_0000 {
                out.put_u8(ELEMENT_U16);
                out.put_u8(0);
                out.put_u16_le(idx as u16);
            } else {
                out.put_u8(ELEMENT_U32);
                out.put_u8(0);
                out.put_u32_le(idx);
            }
        }
    }
    out
}
