//! Snowflake-style identifiers.
//!
//! Layout of the 63 usable bits: 41 bits of milliseconds since [`EPOCH_MS`],
//! 10 bits of node id, 12 bits of per-millisecond sequence. Replicas sharing a
//! database must run with distinct node ids.

use std::sync::Mutex;

use chrono::Utc;

use crate::error::{Error, Result};

/// 2020-01-01T00:00:00Z
const EPOCH_MS: i64 = 1_577_836_800_000;

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;

pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug)]
struct State {
    last_ms: i64,
    sequence: i64,
}

#[derive(Debug)]
pub struct IdGenerator {
    node: i64,
    state: Mutex<State>,
}

impl IdGenerator {
    pub fn new(node: u16) -> Result<Self> {
        if node > MAX_NODE_ID {
            return Err(Error::Config(format!(
                "node id must be between 0 and {MAX_NODE_ID}, got {node}"
            )));
        }

        Ok(Self {
            node: i64::from(node),
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
        })
    }

    #[must_use]
    pub fn node(&self) -> u16 {
        self.node as u16
    }

    /// Returns the next id. Blocks for at most one millisecond when the
    /// sequence for the current millisecond is exhausted.
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut now = current_ms();
        if now < state.last_ms {
            // Clock went backwards; keep ids monotonic.
            now = state.last_ms;
        }

        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                while now <= state.last_ms {
                    std::hint::spin_loop();
                    now = current_ms();
                }
            }
        } else {
            state.sequence = 0;
        }

        state.last_ms = now;

        ((now - EPOCH_MS) << (NODE_BITS + SEQUENCE_BITS))
            | (self.node << SEQUENCE_BITS)
            | state.sequence
    }
}

fn current_ms() -> i64 {
    Utc::now().timestamp_millis()
}
