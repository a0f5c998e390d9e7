//! Connecting to a simulator that may still be starting up.

use crate::error::{Result, TraciError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::TcpStream;
use std::process::Child;
use std::thread;
use std::time::Duration;

/// Bounded retries with a doubling delay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_attempts: 8,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (zero based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

/// A simulator subprocess whose liveness can be polled
pub trait ProcessHandle {
    /// `Some(description)` once the process has exited
    fn exit_status(&mut self) -> io::Result<Option<String>>;
}

impl ProcessHandle for Child {
    fn exit_status(&mut self) -> io::Result<Option<String>> {
        Ok(self.try_wait()?.map(|status| status.to_string()))
    }
}

/// Opens a connection with `open`, retrying according to `policy`.
///
/// The process, when given, is checked before every attempt; once it has
/// exited no further attempt is made.
pub fn establish<S>(
    addr: &str,
    mut open: impl FnMut() -> io::Result<S>,
    mut process: Option<&mut dyn ProcessHandle>,
    policy: &RetryPolicy,
    mut sleep: impl FnMut(Duration),
) -> Result<S> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if let Some(process) = process.as_deref_mut() {
            if let Some(status) = process.exit_status()? {
                return Err(TraciError::ProcessExited(status));
            }
        }

        match open() {
            Ok(stream) => {
                info!("connected to {} on attempt {}", addr, attempt + 1);
                return Ok(stream);
            }
            Err(e) => {
                warn!(
                    "connection attempt {}/{} to {} failed: {}",
                    attempt + 1,
                    attempts,
                    addr,
                    e
                );
                last_error = Some(e);
            }
        }

        if attempt + 1 < attempts {
            sleep(policy.delay_after(attempt));
        }
    }

    Err(TraciError::ConnectFailed {
        addr: addr.to_string(),
        attempts,
        source: last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no attempt was made")),
    })
}

/// Connects over TCP, sleeping between attempts
pub fn connect(
    addr: &str,
    process: Option<&mut dyn ProcessHandle>,
    policy: &RetryPolicy,
) -> Result<TcpStream> {
    let stream = establish(addr, || TcpStream::connect(addr), process, policy, thread::sleep)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
