//! The physical round trip.
//!
//! A link writes one framed request and blocks until the whole framed
//! response has been read. The simulator handles one message at a time, so
//! the write and the read of a batch must never interleave with another
//! batch: [`Locked`] guards that critical section with a mutex, [`Unlocked`]
//! skips the lock for single-threaded embedders (and is not `Sync`).

use crate::error::Result;
use log::trace;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::io::{Read, Write};
use wire::WireError;

const FRAME_HEADER: usize = 4;
/// Largest response frame accepted from the simulator
pub const MAX_FRAME: usize = 64 * 1024 * 1024;

pub trait Link {
    /// Sends a framed request and returns the complete framed response
    fn transact(&self, request: &[u8]) -> Result<Vec<u8>>;
}

/// Writes `request`, then reads exactly one length-prefixed frame
pub fn exchange<S: Read + Write>(stream: &mut S, request: &[u8]) -> Result<Vec<u8>> {
    stream.write_all(request)?;
    stream.flush()?;

    let mut header = [0u8; FRAME_HEADER];
    stream.read_exact(&mut header)?;
    let total = u32::from_be_bytes(header) as usize;
    if total < FRAME_HEADER {
        return Err(WireError::MalformedLength(total).into());
    }
    if total > MAX_FRAME {
        return Err(WireError::FrameTooLarge(total).into());
    }

    let mut frame = vec![0u8; total];
    frame[..FRAME_HEADER].copy_from_slice(&header);
    stream.read_exact(&mut frame[FRAME_HEADER..])?;

    trace!("sent {} bytes, received {} bytes", request.len(), total);
    Ok(frame)
}

/// Serializes round trips from any number of threads
pub struct Locked<S> {
    stream: Mutex<S>,
}

impl<S> Locked<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

impl<S: Read + Write> Link for Locked<S> {
    fn transact(&self, request: &[u8]) -> Result<Vec<u8>> {
        let mut stream = self.stream.lock();
        exchange(&mut *stream, request)
    }
}

/// Lock-free link for a single calling thread
pub struct Unlocked<S> {
    stream: RefCell<S>,
}

impl<S> Unlocked<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: RefCell::new(stream),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

impl<S: Read + Write> Link for Unlocked<S> {
    fn transact(&self, request: &[u8]) -> Result<Vec<u8>> {
        exchange(&mut *self.stream.borrow_mut(), request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraciError;
    use std::io::Cursor;

    /// Canned inbound bytes, recorded outbound bytes
    struct Duplex {
        inbound: Cursor<Vec<u8>>,
        outbound: Vec<u8>,
    }

    impl Duplex {
        fn new(inbound: Vec<u8>) -> Self {
            Self {
                inbound: Cursor::new(inbound),
                outbound: Vec::new(),
            }
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inbound.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outbound.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_exactly_one_frame() {
        let mut inbound = vec![0, 0, 0, 6, 2, 0x7F];
        inbound.extend_from_slice(&[0, 0, 0, 4]);
        let link = Locked::new(Duplex::new(inbound));

        let frame = link.transact(&[0, 0, 0, 6, 2, 0x7F]).unwrap();
        assert_eq!(frame, vec![0, 0, 0, 6, 2, 0x7F]);

        let second = link.transact(&[0, 0, 0, 4]).unwrap();
        assert_eq!(second, vec![0, 0, 0, 4]);

        let duplex = link.into_inner();
        assert_eq!(duplex.outbound, vec![0, 0, 0, 6, 2, 0x7F, 0, 0, 0, 4]);
    }

    #[test]
    fn test_truncated_frame_is_transport_error() {
        let link = Unlocked::new(Duplex::new(vec![0, 0, 0, 10, 1]));
        let err = link.transact(&[0, 0, 0, 4]).unwrap_err();
        assert!(matches!(err, TraciError::Io(_)));
    }

    #[test]
    fn test_impossible_frame_length() {
        let link = Unlocked::new(Duplex::new(vec![0, 0, 0, 3]));
        let err = link.transact(&[0, 0, 0, 4]).unwrap_err();
        assert!(matches!(err, TraciError::Wire(WireError::MalformedLength(3))));
    }

    #[test]
    fn test_oversized_frame_is_rejected_before_reading() {
        let link = Unlocked::new(Duplex::new(vec![0xFF, 0xFF, 0xFF, 0xF0, 1, 2, 3]));
        let err = link.transact(&[0, 0, 0, 4]).unwrap_err();
        assert!(matches!(
            err,
            TraciError::Wire(WireError::FrameTooLarge(0xFFFF_FFF0))
        ));
        assert!(err.is_fatal_for_connection());
    }
}
