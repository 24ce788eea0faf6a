//! Reply parsing with dual-layer status checking: the encapsulation status
//! first, then the CIP general status of the embedded service reply.

use super::encap;
use crate::error::{ClientError, Result};

/// Decoded read reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipResponse {
    pub payload: Vec<u8>,
    pub type_code: u16,
    /// Set when the CIP general status is 6, meaning partial data follows.
    pub has_more: bool,
}

const CIP_STATUS_OK: u8 = 0x00;
const CIP_STATUS_PARTIAL: u8 = 0x06;
const MULTI_SERVICE_REPLY: u8 = 0x8A;

const WRITE_REPLY_SERVICES: [u8; 3] = [0xCD, 0xCE, 0xD3];

const SERVICE_OFFSET: usize = 40;
const STATUS_OFFSET: usize = 42;
const ITEM_LENGTH_OFFSET: usize = 38;
const TYPE_OFFSET: usize = 44;
const PAYLOAD_OFFSET: usize = 46;

/// Check the encapsulation status at offset 8. Shared by read and write
/// parsing; the transport also uses it to decide whether to re-register.
pub fn check_encapsulation(response: &[u8]) -> Result<()> {
    if response.len() < encap::HEADER_LEN {
        return Err(ClientError::Truncated {
            needed: encap::HEADER_LEN,
            got: response.len(),
        });
    }
    let status = u32::from_le_bytes([response[8], response[9], response[10], response[11]]);
    if status != 0 {
        return Err(ClientError::Encapsulation(status));
    }
    Ok(())
}

/// Validate a Write Tag reply. Replies too short to carry a service status
/// are accepted as-is.
pub fn parse_write(response: &[u8]) -> Result<()> {
    check_encapsulation(response)?;
    if response.len() < STATUS_OFFSET + 1 {
        return Ok(());
    }
    let service = response[SERVICE_OFFSET];
    if !WRITE_REPLY_SERVICES.contains(&service) {
        return Err(ClientError::UnsupportedService(service));
    }
    let status = response[STATUS_OFFSET];
    if status != CIP_STATUS_OK {
        return Err(ClientError::WriteFailed(status));
    }
    Ok(())
}

/// Decode a Read Tag reply into its payload window and type code.
pub fn parse_read(response: &[u8]) -> Result<CipResponse> {
    check_encapsulation(response)?;
    if response.len() < TYPE_OFFSET {
        return Err(ClientError::Truncated {
            needed: TYPE_OFFSET,
            got: response.len(),
        });
    }
    let service = response[SERVICE_OFFSET];
    if service == MULTI_SERVICE_REPLY {
        return Err(ClientError::UnsupportedService(service));
    }
    let has_more = match response[STATUS_OFFSET] {
        CIP_STATUS_OK => false,
        CIP_STATUS_PARTIAL => true,
        other => return Err(ClientError::ReadFailed(other)),
    };
    let item_length =
        u16::from_le_bytes([response[ITEM_LENGTH_OFFSET], response[ITEM_LENGTH_OFFSET + 1]])
            as usize;
    let type_code = if response.len() >= TYPE_OFFSET + 2 {
        u16::from_le_bytes([response[TYPE_OFFSET], response[TYPE_OFFSET + 1]])
    } else {
        0
    };
    let end = (PAYLOAD_OFFSET + item_length.saturating_sub(6)).min(response.len());
    let start = PAYLOAD_OFFSET.min(end);
    Ok(CipResponse {
        payload: response[start..end].to_vec(),
        type_code,
        has_more,
    })
}
