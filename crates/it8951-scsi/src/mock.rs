//! Scripted in-memory transport
//!
//! [`MockTransport`] records every request and answers data-in requests from
//! a reply queue first, then from a small model of the chip (inquiry string,
//! system info, register file). Writes succeed unless failure is switched on.
//!
//! Single-threaded: state lives in a `RefCell`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::cdb::{Cdb, Opcode, INQUIRY_OPCODE, VENDOR_OPCODE};
use crate::protocol::IT8951_INQUIRY_ID;
use crate::transport::{DataDirection, Transport, TransportError, MAX_TRANSFER_LEN};
use crate::types::{DisplayCommand, SystemInfo};
use crate::wire::{from_wire, to_wire};

/// Data phase of a recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Data-in of the requested length.
    In(usize),
    /// Data-out with a copy of the payload.
    Out(Vec<u8>),
}

/// One request as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    /// CDB as issued.
    pub cdb: Cdb,
    /// Data phase.
    pub phase: Phase,
    /// Timeout passed by the caller.
    pub timeout: Duration,
}

impl SentCommand {
    /// Data-out payload, empty for data-in requests.
    pub fn payload(&self) -> &[u8] {
        match &self.phase {
            Phase::Out(data) => data,
            Phase::In(_) => &[],
        }
    }

    /// True when this is a vendor command with `opcode`.
    pub fn is(&self, opcode: Opcode) -> bool {
        self.cdb.as_bytes()[0] == VENDOR_OPCODE && self.cdb.opcode_byte() == opcode as u8
    }
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<Option<Vec<u8>>>,
    inquiry: Option<Vec<u8>>,
    system_info: Option<SystemInfo>,
    registers: HashMap<u32, u32>,
    fail_writes: bool,
    sent: Vec<SentCommand>,
}

/// In-memory [`Transport`] for tests.
pub struct MockTransport {
    state: RefCell<MockState>,
    max_transfer_len: usize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Device that answers nothing: every data-in returns zero bytes and
    /// registers read as 0.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(MockState::default()),
            max_transfer_len: MAX_TRANSFER_LEN,
        }
    }

    /// Device that identifies as an IT8951 and reports `info`.
    pub fn it8951(info: SystemInfo) -> Self {
        let mock = Self::new();
        {
            let mut state = mock.state.borrow_mut();
            state.inquiry = Some(ramdisc_inquiry());
            state.system_info = Some(info);
        }
        mock
    }

    /// Override the per-transfer limit.
    #[must_use]
    pub fn with_max_transfer_len(mut self, len: usize) -> Self {
        self.max_transfer_len = len;
        self
    }

    /// Queue a data-in reply; queued replies take precedence over the chip model.
    pub fn push_reply(&self, bytes: Vec<u8>) {
        self.state.borrow_mut().replies.push_back(Some(bytes));
    }

    /// Queue a failing data-in request.
    pub fn push_failure(&self) {
        self.state.borrow_mut().replies.push_back(None);
    }

    /// Preset a register value.
    pub fn set_register(&self, address: u32, value: u32) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Make every data-out request fail (after being recorded).
    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Every request so far, in order.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.state.borrow().sent.clone()
    }

    /// Forget recorded requests.
    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    /// Number of requests with `opcode`.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.state.borrow().sent.iter().filter(|c| c.is(opcode)).count()
    }

    /// Data-out payloads of requests with `opcode`, in order.
    pub fn payloads(&self, opcode: Opcode) -> Vec<Vec<u8>> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter(|c| c.is(opcode))
            .map(|c| c.payload().to_vec())
            .collect()
    }

    /// Decoded display-area headers, in order. Undecodable payloads are skipped.
    pub fn display_commands(&self) -> Vec<DisplayCommand> {
        self.payloads(Opcode::DisplayArea)
            .iter()
            .filter_map(|p| from_wire(p).ok())
            .collect()
    }

    fn answer(&self, cdb: &Cdb) -> Option<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        if let Some(reply) = state.replies.pop_front() {
            return reply;
        }
        let bytes = cdb.as_bytes();
        if bytes[0] == INQUIRY_OPCODE {
            return Some(state.inquiry.clone().unwrap_or_default());
        }
        let reply = match cdb.opcode_byte() {
            op if op == Opcode::SystemInfo as u8 => {
                state.system_info.as_ref().map(to_wire).unwrap_or_default()
            }
            op if op == Opcode::ReadRegister as u8 => state
                .registers
                .get(&cdb.address())
                .copied()
                .unwrap_or(0)
                .to_be_bytes()
                .to_vec(),
            _ => Vec::new(),
        };
        Some(reply)
    }

    fn store(&self, cdb: &Cdb, data: &[u8]) {
        if cdb.as_bytes()[0] == VENDOR_OPCODE && cdb.opcode_byte() == Opcode::WriteRegister as u8 {
            if let Ok(word) = <[u8; 4]>::try_from(data) {
                self.set_register(cdb.address(), u32::from_be_bytes(word));
            }
        }
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        cdb: &Cdb,
        direction: DataDirection<'_>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let phase = match direction {
            DataDirection::In(len) => Phase::In(len),
            DataDirection::Out(data) => Phase::Out(data.to_vec()),
        };
        self.state.borrow_mut().sent.push(SentCommand {
            cdb: *cdb,
            phase,
            timeout,
        });

        if direction.len() > self.max_transfer_len {
            return Err(TransportError::TransferTooLarge {
                len: direction.len(),
            });
        }

        match direction {
            DataDirection::In(len) => {
                let mut reply = self.answer(cdb).ok_or_else(mock_failure)?;
                reply.truncate(len);
                Ok(reply)
            }
            DataDirection::Out(data) => {
                if self.state.borrow().fail_writes {
                    return Err(mock_failure());
                }
                self.store(cdb, data);
                Ok(Vec::new())
            }
        }
    }

    fn max_transfer_len(&self) -> usize {
        self.max_transfer_len
    }
}

fn mock_failure() -> TransportError {
    TransportError::PassThrough(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "scripted failure",
    ))
}

/// A 40-byte inquiry response carrying the RamDisc identification.
pub fn ramdisc_inquiry() -> Vec<u8> {
    // direct-access device, additional length 31
    let mut resp = vec![0x00, 0x00, 0x00, 0x00, 31, 0x00, 0x00, 0x00];
    resp.extend_from_slice(IT8951_INQUIRY_ID);
    resp.resize(40, 0);
    resp
}
