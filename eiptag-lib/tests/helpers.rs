//! Shared test helpers: an in-process mock PLC speaking just enough
//! EtherNet/IP to exercise the client, with fault-injection knobs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use eiptag_lib::Options;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TYPE_BOOL: u16 = 0x00C1;
pub const TYPE_DINT: u16 = 0x00C4;
pub const TYPE_REAL: u16 = 0x00CA;
pub const TYPE_STRING: u16 = 0x00D0;

pub enum MockData {
    Fixed { element_size: usize, bytes: Vec<u8> },
    Strings(Vec<Vec<u8>>),
}

pub struct MockTag {
    pub type_code: u16,
    pub data: MockData,
}

pub struct WriteAttempt {
    pub tag: String,
    pub elements: u16,
    pub accepted: bool,
}

/// Tag store plus request log and fault-injection knobs.
#[derive(Default)]
pub struct MockState {
    pub tags: HashMap<String, MockTag>,
    pub registrations: usize,
    /// (tag, start index, element count) per Read Tag service
    pub read_requests: Vec<(String, u32, u16)>,
    pub write_attempts: Vec<WriteAttempt>,
    /// Reply to the next SendRRData with this encapsulation status, once.
    pub fail_next_rr: Option<u32>,
    /// Reject write services above an element count with this status.
    pub reject_write_over: Option<(u16, u32)>,
}

impl MockState {
    pub fn insert_dint(&mut self, name: &str, values: &[i32]) {
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.tags.insert(
            name.to_string(),
            MockTag {
                type_code: TYPE_DINT,
                data: MockData::Fixed {
                    element_size: 4,
                    bytes,
                },
            },
        );
    }

    pub fn insert_real(&mut self, name: &str, values: &[f32]) {
        let mut bytes = Vec::with_capacity(values.len() * 4);
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        self.tags.insert(
            name.to_string(),
            MockTag {
                type_code: TYPE_REAL,
                data: MockData::Fixed {
                    element_size: 4,
                    bytes,
                },
            },
        );
    }

    pub fn insert_bools(&mut self, name: &str, values: &[bool]) {
        self.tags.insert(
            name.to_string(),
            MockTag {
                type_code: TYPE_BOOL,
                data: MockData::Fixed {
                    element_size: 1,
                    bytes: values.iter().map(|&v| u8::from(v)).collect(),
                },
            },
        );
    }

    pub fn dint(&self, name: &str, index: usize) -> i32 {
        match &self.tags[name].data {
            MockData::Fixed { bytes, .. } => {
                let from = index * 4;
                i32::from_le_bytes([
                    bytes[from],
                    bytes[from + 1],
                    bytes[from + 2],
                    bytes[from + 3],
                ])
            }
            MockData::Strings(_) => panic!("{name} is a string tag"),
        }
    }

    pub fn reals(&self, name: &str) -> Vec<f32> {
        match &self.tags[name].data {
            MockData::Fixed { bytes, .. } => bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            MockData::Strings(_) => panic!("{name} is a string tag"),
        }
    }

    pub fn string_payload(&self, name: &str, index: usize) -> Vec<u8> {
        match &self.tags[name].data {
            MockData::Strings(items) => items[index].clone(),
            MockData::Fixed { .. } => panic!("{name} is not a string tag"),
        }
    }

    pub fn accepted_write_counts(&self) -> Vec<u16> {
        self.write_attempts
            .iter()
            .filter(|a| a.accepted)
            .map(|a| a.elements)
            .collect()
    }

    pub fn rejected_write_counts(&self) -> Vec<u16> {
        self.write_attempts
            .iter()
            .filter(|a| !a.accepted)
            .map(|a| a.elements)
            .collect()
    }

    pub fn read_counts(&self) -> Vec<u16> {
        self.read_requests.iter().map(|r| r.2).collect()
    }
}

pub struct MockPlc {
    pub addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockPlc {
    pub async fn spawn(state: MockState) -> MockPlc {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(state));
        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            let mut session_counter = 0u32;
            // serve connections one at a time; the client holds a single
            // socket and reconnects after faults
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                serve_conn(&mut stream, &shared, &mut session_counter).await;
            }
        });
        MockPlc { addr, state }
    }

    pub fn options(&self) -> Options {
        Options {
            ip: self.addr.to_string(),
            path: None,
            timeout_ms: 2000,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state")
    }
}

async fn serve_conn(
    stream: &mut TcpStream,
    state: &Arc<Mutex<MockState>>,
    session_counter: &mut u32,
) {
    loop {
        let mut header = [0u8; 24];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let command = u16::from_le_bytes([header[0], header[1]]);
        let length = u16::from_le_bytes([header[2], header[3]]) as usize;
        let session = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let mut body = vec![0u8; length];
        if length > 0 && stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let reply = match command {
            0x65 => {
                *session_counter += 1;
                state.lock().expect("mock state").registrations += 1;
                Some(encap_frame(0x65, *session_counter, 0, &[1, 0, 0, 0]))
            }
            0x66 => None,
            0x6F => Some(handle_rr(state, session, &body)),
            _ => Some(encap_frame(command, session, 0x01, &[])),
        };
        if let Some(reply) = reply {
            if stream.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

fn handle_rr(state: &Arc<Mutex<MockState>>, session: u32, body: &[u8]) -> Vec<u8> {
    let mut st = state.lock().expect("mock state");
    if let Some(code) = st.fail_next_rr.take() {
        return encap_frame(0x6F, session, code, &[]);
    }

    // CPF: interface handle (4), timeout (2), item count (2), null address
    // item (4), data item header (4), then the unconnected send
    let Some(data) = body.get(16..) else {
        return encap_frame(0x6F, session, 0x03, &[]);
    };
    if data.first() != Some(&0x52) || data.len() < 10 {
        return encap_frame(0x6F, session, 0x03, &[]);
    }
    let msg_len = u16::from_le_bytes([data[8], data[9]]) as usize;
    let Some(message) = data.get(10..10 + msg_len) else {
        return encap_frame(0x6F, session, 0x03, &[]);
    };
    if message.len() < 2 {
        return encap_frame(0x6F, session, 0x03, &[]);
    }
    let service = message[0];
    let path_words = message[1] as usize;
    let Some(path) = message.get(2..2 + path_words * 2) else {
        return encap_frame(0x6F, session, 0x03, &[]);
    };
    let Some((name, start)) = parse_symbolic_path(path) else {
        return cip_reply(session, service | 0x80, 0x04, None);
    };
    let tail = &message[2 + path_words * 2..];

    match service {
        0x4C => {
            let Some(count_bytes) = tail.get(0..2) else {
                return cip_reply(session, 0xCC, 0x04, None);
            };
            let elements = u16::from_le_bytes([count_bytes[0], count_bytes[1]]);
            st.read_requests.push((name.clone(), start, elements));
            match st.tags.get(&name) {
                None => cip_reply(session, 0xCC, 0x04, None),
                Some(tag) => match &tag.data {
                    MockData::Fixed {
                        element_size,
                        bytes,
                    } => {
                        let from = (start as usize * element_size).min(bytes.len());
                        let to = (from + elements as usize * element_size).min(bytes.len());
                        cip_reply(session, 0xCC, 0, Some((tag.type_code, &bytes[from..to])))
                    }
                    MockData::Strings(items) => {
                        let empty = Vec::new();
                        let payload = items.get(start as usize).unwrap_or(&empty);
                        cip_reply(session, 0xCC, 0, Some((tag.type_code, payload)))
                    }
                },
            }
        }
        0x4D => {
            let Some(head) = tail.get(0..4) else {
                return cip_reply(session, 0xCD, 0x04, None);
            };
            let type_code = u16::from_le_bytes([head[0], head[1]]);
            let elements = u16::from_le_bytes([head[2], head[3]]);
            let value = &tail[4..];
            let rejected = matches!(st.reject_write_over, Some((max, _)) if elements > max);
            st.write_attempts.push(WriteAttempt {
                tag: name.clone(),
                elements,
                accepted: !rejected,
            });
            if rejected {
                let (_, code) = st.reject_write_over.expect("reject config");
                return encap_frame(0x6F, session, code, &[]);
            }
            apply_write(&mut st, &name, start, type_code, elements, value);
            cip_reply(session, 0xCD, 0, None)
        }
        other => cip_reply(session, other | 0x80, 0x08, None),
    }
}

fn apply_write(
    st: &mut MockState,
    name: &str,
    start: u32,
    type_code: u16,
    elements: u16,
    value: &[u8],
) {
    if type_code == TYPE_STRING {
        let tag = st.tags.entry(name.to_string()).or_insert_with(|| MockTag {
            type_code,
            data: MockData::Strings(Vec::new()),
        });
        if let MockData::Strings(items) = &mut tag.data {
            let idx = start as usize;
            if items.len() <= idx {
                items.resize(idx + 1, Vec::new());
            }
            items[idx] = value.to_vec();
        }
        return;
    }
    let new_element_size = if type_code == TYPE_BOOL { 1 } else { 4 };
    let tag = st.tags.entry(name.to_string()).or_insert_with(|| MockTag {
        type_code,
        data: MockData::Fixed {
            element_size: new_element_size,
            bytes: Vec::new(),
        },
    });
    if let MockData::Fixed {
        element_size,
        bytes,
    } = &mut tag.data
    {
        let es = *element_size;
        let from = start as usize * es;
        let needed = from + elements as usize * es;
        if bytes.len() < needed {
            bytes.resize(needed, 0);
        }
        let n = (elements as usize * es).min(value.len());
        bytes[from..from + n].copy_from_slice(&value[..n]);
    }
}

fn parse_symbolic_path(path: &[u8]) -> Option<(String, u32)> {
    let mut names: Vec<String> = Vec::new();
    let mut index = 0u32;
    let mut i = 0usize;
    while i < path.len() {
        match path[i] {
            0x91 => {
                let len = *path.get(i + 1)? as usize;
                let name = path.get(i + 2..i + 2 + len)?;
                names.push(String::from_utf8_lossy(name).into_owned());
                i += 2 + len + (len % 2);
            }
            0x28 => {
                index = *path.get(i + 1)? as u32;
                i += 2;
            }
            0x29 => {
                let b = path.get(i + 2..i + 4)?;
                index = u16::from_le_bytes([b[0], b[1]]) as u32;
                i += 4;
            }
            0x2A => {
                let b = path.get(i + 2..i + 6)?;
                index = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                i += 6;
            }
            _ => return None,
        }
    }
    if names.is_empty() {
        return None;
    }
    Some((names.join("."), index))
}

fn encap_frame(command: u16, session: u32, status: u32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(24 + body.len());
    out.extend_from_slice(&command.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(&session.to_le_bytes());
    out.extend_from_slice(&status.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn cip_reply(session: u32, service: u8, status: u8, payload: Option<(u16, &[u8])>) -> Vec<u8> {
    let mut item = vec![service, 0, status, 0];
    if let Some((type_code, data)) = payload {
        item.extend_from_slice(&type_code.to_le_bytes());
        item.extend_from_slice(data);
    }
    let mut body = Vec::with_capacity(16 + item.len());
    body.extend_from_slice(&0u32.to_le_bytes());
    body.extend_from_slice(&10u16.to_le_bytes());
    body.extend_from_slice(&2u16.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&0x00B2u16.to_le_bytes());
    body.extend_from_slice(&(item.len() as u16).to_le_bytes());
    body.extend_from_slice(&item);
    encap_frame(0x6F, session, 0, &body)
}
