use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use super::{Outcome, ParserContext};
use crate::Result;

const READ_SIZE: usize = 4096;

/// Iterator of accepted frame payloads read from a byte stream.
///
/// Created by [read_frames].
pub struct FrameIter<R>
where
    R: Read,
{
    reader: R,
    ctx: ParserContext,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
    done: bool,
    accepted: u64,
    rejected: u64,
}

impl<R> FrameIter<R>
where
    R: Read,
{
    /// Decode frames using a pre-configured context.
    pub fn with_context(reader: R, ctx: ParserContext) -> Self {
        FrameIter {
            reader,
            ctx,
            buf: vec![0u8; READ_SIZE],
            pos: 0,
            end: 0,
            done: false,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Number of frames accepted so far.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Number of frames dropped so far due to checksum mismatches.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    // Refill the read buffer. Returns false at end of input.
    fn fill(&mut self) -> std::io::Result<bool> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    trace!(bytes = n, "read");
                    self.pos = 0;
                    self.end = n;
                    return Ok(true);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R> Iterator for FrameIter<R>
where
    R: Read,
{
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            while self.pos < self.end {
                let byte = self.buf[self.pos];
                self.pos += 1;
                match self.ctx.push(byte) {
                    Outcome::Incomplete => {}
                    Outcome::Accepted(payload) => {
                        self.accepted += 1;
                        return Some(Ok(payload.to_vec()));
                    }
                    Outcome::Rejected { computed, received } => {
                        self.rejected += 1;
                        debug!(computed, received, "skipping rejected frame");
                    }
                }
            }
            match self.fill() {
                Ok(true) => {}
                Ok(false) => {
                    if self.ctx.filled() > 0 {
                        debug!(
                            filled = self.ctx.filled(),
                            state = ?self.ctx.state(),
                            "end of input with partial frame"
                        );
                    }
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
            }
        }
    }
}

/// Return an iterator providing the payload of every frame that passes its integrity
/// check in the byte stream read from `reader`.
///
/// Noise between frames and frames that fail their checksum are skipped. Reading stops at
/// end of input or on the first I/O error, which is yielded as [crate::Error::Io].
///
/// # Examples
/// ```
/// use satframe::frame::{encode, read_frames};
///
/// let mut dat = vec![0x13, 0x37];
/// dat.extend(encode(&[0x01]).unwrap().to_bytes());
/// dat.extend(encode(&[0x02, 0x03]).unwrap().to_bytes());
///
/// let payloads: Vec<Vec<u8>> = read_frames(&dat[..]).map_while(Result::ok).collect();
/// assert_eq!(payloads, vec![vec![0x01], vec![0x02, 0x03]]);
/// ```
pub fn read_frames<R>(reader: R) -> FrameIter<R>
where
    R: Read,
{
    FrameIter::with_context(reader, ParserContext::new())
}
