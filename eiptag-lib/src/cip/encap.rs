//! EtherNet/IP encapsulation framing, all little-endian.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ClientError, Result};

pub const REGISTER_SESSION: u16 = 0x0065;
pub const UNREGISTER_SESSION: u16 = 0x0066;
pub const SEND_RR_DATA: u16 = 0x006F;

pub const HEADER_LEN: usize = 24;

/// The 24-byte encapsulation header framing every request and reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: u16,
    pub length: u16,
    pub session_handle: u32,
    pub status: u32,
    pub sender_context: u64,
    pub options: u32,
}

impl Header {
    pub fn parse(buf: &[u8]) -> Result<Header> {
        if buf.len() < HEADER_LEN {
            return Err(ClientError::Truncated {
                needed: HEADER_LEN,
                got: buf.len(),
            });
        }
        let mut b = buf;
        Ok(Header {
            command: b.get_u16_le(),
            length: b.get_u16_le(),
            session_handle: b.get_u32_le(),
            status: b.get_u32_le(),
            sender_context: b.get_u64_le(),
            options: b.get_u32_le(),
        })
    }
}

/// Frame a command body with the encapsulation header.
pub fn frame(command: u16, session_handle: u32, context: u64, body: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u16_le(command);
    out.put_u16_le(body.len() as u16);
    out.put_u32_le(session_handle);
    out.put_u32_le(0);
    out.put_u64_le(context);
    out.put_u32_le(0);
    out.put_slice(body);
    out
}

/// RegisterSession request: protocol version 1, options 0.
pub fn register_session(context: u64) -> BytesMut {
    let mut body = BytesMut::with_capacity(4);
    body.put_u16_le(1);
    body.put_u16_le(0);
    frame(REGISTER_SESSION, 0, context, &body)
}

/// UnRegisterSession request; the body is empty.
pub fn unregister_session(session_handle: u32, context: u64) -> BytesMut {
    frame(UNREGISTER_SESSION, session_handle, context, &[])
}
