//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tmcl_core::protocol::{checksum, PortOpener, ProtocolError, Reply, Transport, FRAME_LEN};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

/// What happened on the link, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Write(Vec<u8>),
    /// The last pending reply byte was handed to the host
    ReplyDrained,
}

#[derive(Default)]
struct MockState {
    /// Chunk lists answered to successive writes
    scripted: VecDeque<Vec<Vec<u8>>>,
    responder: Option<Responder>,
    /// Chunks of the reply currently being read
    pending: VecDeque<Vec<u8>>,
    /// Empty polls to report before each reply starts
    delay_polls: usize,
    polls_left: usize,
    fail_open: bool,
    fail_write: bool,
    fail_read: bool,
    events: Vec<Event>,
    opens: usize,
    discards: usize,
}

/// Mock link: records writes and hands back scripted reply chunks
#[derive(Clone, Default)]
pub struct MockOpener {
    state: Arc<Mutex<MockState>>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next write with `reply`, split into `chunks`
    pub fn reply_chunks(&self, chunks: Vec<Vec<u8>>) {
        self.state().scripted.push_back(chunks);
    }

    /// Answer the next write with `bytes` in one piece
    pub fn reply_bytes(&self, bytes: &[u8]) {
        self.reply_chunks(vec![bytes.to_vec()]);
    }

    /// Answer the next write with a well-formed reply
    pub fn reply(&self, status: u8, command: u8, value: i32) {
        self.reply_bytes(&Reply::new(1, status, command, value).encode());
    }

    /// Answer every write that has no scripted reply through `responder`
    pub fn respond_with(&self, responder: impl FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static) {
        self.state().responder = Some(Box::new(responder));
    }

    pub fn set_delay_polls(&self, polls: usize) {
        self.state().delay_polls = polls;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.state().fail_write = fail;
    }

    pub fn set_fail_read(&self, fail: bool) {
        self.state().fail_read = fail;
    }

    /// Leave bytes on the line as if a previous reply arrived late
    pub fn inject_stale(&self, bytes: &[u8]) {
        self.state().pending.push_back(bytes.to_vec());
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.state().opens
    }

    pub fn discards(&self) -> usize {
        self.state().discards
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PortOpener for MockOpener {
    fn open(&self, port_name: &str, _baud_rate: u32) -> Result<Box<dyn Transport>, ProtocolError> {
        let mut state = self.state();
        if state.fail_open {
            return Err(ProtocolError::PortOpen {
                port: port_name.to_string(),
                reason: "mock open failure".to_string(),
            });
        }
        state.opens += 1;
        state.events.push(Event::Open);
        Ok(Box::new(MockTransport {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let mut state = self.state();
        if state.fail_write {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure").into());
        }
        state.events.push(Event::Write(data.to_vec()));

        let chunks = match state.scripted.pop_front() {
            Some(chunks) => chunks,
            None => match state.responder.as_mut() {
                Some(responder) => responder(data),
                None => Vec::new(),
            },
        };
        state.pending.extend(chunks.into_iter().filter(|c| !c.is_empty()));
        state.polls_left = state.delay_polls;
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let mut state = self.state();
        if state.fail_read {
            return Err(ProtocolError::SerialError("mock read failure".to_string()));
        }
        if state.polls_left > 0 {
            state.polls_left -= 1;
            return Ok(0);
        }

        let Some(mut chunk) = state.pending.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            state.pending.push_front(chunk);
        } else if state.pending.is_empty() {
            state.events.push(Event::ReplyDrained);
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<(), ProtocolError> {
        let mut state = self.state();
        state.pending.clear();
        state.discards += 1;
        Ok(())
    }
}

/// Well-formed reply frame bytes
pub fn reply_frame(status: u8, command: u8, value: i32) -> [u8; FRAME_LEN] {
    Reply::new(1, status, command, value).encode()
}

/// Reply frame with explicit value bytes and a correct checksum
pub fn raw_reply(status: u8, value: [u8; 4]) -> [u8; FRAME_LEN] {
    let mut bytes = [2, 1, status, 6, value[0], value[1], value[2], value[3], 0];
    bytes[8] = checksum(&bytes[..8]);
    bytes
}

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
