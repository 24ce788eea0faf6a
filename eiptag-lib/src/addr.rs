//! Tag address parsing.
//!
//! Addresses follow `[i=]SEGMENT (. SEGMENT)*` where a segment is a name
//! followed by zero or more bracketed decimal indices. The optional `i=`
//! prefix selects bit access on an integer host tag, with the bit named by
//! a trailing `[N]` or `.N`. Malformed bracket content is never an error
//! here; the address just fails to match and is treated as a scalar name.

use crate::error::{ClientError, Result};

/// One dotted segment: a name plus its bracketed indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub indices: Vec<u32>,
}

/// Bit selector extracted from an `i=` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitAccess {
    pub host_address: String,
    pub bit_index: u32,
}

/// Parsed form of a user-supplied tag address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAddress {
    pub segments: Vec<Segment>,
    pub bit_access: Option<BitAccess>,
}

impl TagAddress {
    pub fn parse(raw: &str) -> Result<TagAddress> {
        let (body, bit_access) = match parse_bit_access(raw) {
            Some((host, bit)) => (
                host.clone(),
                Some(BitAccess {
                    host_address: host,
                    bit_index: bit,
                }),
            ),
            None if raw.starts_with("i=") => {
                return Err(ClientError::InvalidAddress(format!(
                    "bit access without a bit selector: {raw}"
                )));
            }
            None => (raw.to_string(), None),
        };

        let mut segments = Vec::new();
        for part in body.split('.') {
            let seg = parse_segment(part);
            if seg.name.is_empty() {
                return Err(ClientError::InvalidAddress(format!(
                    "empty segment name in: {raw}"
                )));
            }
            segments.push(seg);
        }
        Ok(TagAddress {
            segments,
            bit_access,
        })
    }
}

fn parse_segment(part: &str) -> Segment {
    let Some(open) = part.find('[') else {
        return Segment {
            name: part.to_string(),
            indices: Vec::new(),
        };
    };
    let mut indices = Vec::new();
    let mut rest = &part[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        let Some(idx) = parse_index(&stripped[..close]) else {
            break;
        };
        indices.push(idx);
        rest = &stripped[close + 1..];
    }
    if rest.is_empty() && !indices.is_empty() {
        Segment {
            name: part[..open].to_string(),
            indices,
        }
    } else {
        // malformed bracket content, keep the whole text as a scalar name
        Segment {
            name: part.to_string(),
            indices: Vec::new(),
        }
    }
}

fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split a trailing `[N]` off an address. Returns the base and the number
/// only when the brackets were actually present and well formed.
pub fn parse_bit(address: &str) -> Option<(&str, u32)> {
    let rest = address.strip_suffix(']')?;
    let open = rest.rfind('[')?;
    let idx = parse_index(&rest[open + 1..])?;
    let base = &rest[..open];
    if base.is_empty() {
        return None;
    }
    Some((base, idx))
}

/// Extract the first `[N]` of an address as the array start index. Addresses
/// without a well-formed index parse as `(address, 0)`.
pub fn parse_array_start(address: &str) -> (String, u32) {
    if let Some(open) = address.find('[') {
        if let Some(close) = address[open..].find(']').map(|c| open + c) {
            if let Some(idx) = parse_index(&address[open + 1..close]) {
                let mut base = String::with_capacity(address.len());
                base.push_str(&address[..open]);
                base.push_str(&address[close + 1..]);
                return (base, idx);
            }
        }
    }
    (address.to_string(), 0)
}

/// Parse an explicit bit-access address. Succeeds only for the `i=` prefix,
/// with the bit named `NAME[N]` or `NAME.N`.
pub fn parse_bit_access(address: &str) -> Option<(String, u32)> {
    let rest = address.strip_prefix("i=")?;
    if let Some((base, bit)) = parse_bit(rest) {
        return Some((base.to_string(), bit));
    }
    let dot = rest.rfind('.')?;
    let bit = parse_index(&rest[dot + 1..])?;
    let base = &rest[..dot];
    if base.is_empty() {
        return None;
    }
    Some((base.to_string(), bit))
}

/// Append `[start]` to a base name unless it is already indexed.
pub fn normalize_array_name(base: &str, start: u32) -> String {
    if base.contains('[') {
        base.to_string()
    } else {
        format!("{base}[{start}]")
    }
}
