use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use satframe::{
    frame::{encode, MAX_PAYLOAD},
    spacepacket::{self, Apid, PrimaryHeader, SecondaryHeader},
    time::{MonotonicClock, TimeSource},
};
use tracing::{debug, info};

/// Largest chunk of user data that fits in a single frame once wrapped in a packet.
const MAX_PACKET_DATA: usize = MAX_PAYLOAD - PrimaryHeader::LEN - SecondaryHeader::LEN;

// Fill `buf` as far as possible, returning the number of bytes read. Short only at EOF.
fn read_chunk<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("reading input"),
        }
    }
    Ok(filled)
}

/// Frame everything from `src` into `dst`, returning the number of frames written.
pub fn frame_stream<R, W>(
    mut src: R,
    mut dst: W,
    apid: Option<Apid>,
    met: Option<u64>,
) -> Result<usize>
where
    R: Read,
    W: Write,
{
    let clock = MonotonicClock::new();
    let chunk_len = if apid.is_some() {
        MAX_PACKET_DATA
    } else {
        MAX_PAYLOAD
    };
    let mut chunk = vec![0u8; chunk_len];
    let mut count = 0;

    loop {
        let n = read_chunk(&mut src, &mut chunk)?;
        if n == 0 {
            break;
        }
        let payload = match apid {
            Some(apid) => {
                let now_ms = met.unwrap_or_else(|| clock.now_ms());
                spacepacket::wrap(apid, &chunk[..n], now_ms).context("wrapping packet")?
            }
            None => chunk[..n].to_vec(),
        };
        let frame = encode(&payload).context("encoding frame")?;
        dst.write_all(&frame.to_bytes()).context("writing frame")?;
        count += 1;
    }
    dst.flush().context("flushing output")?;
    debug!(frames = count, "framing complete");

    Ok(count)
}

pub fn frame(srcpath: &Path, dstpath: &Path, apid: Option<Apid>, met: Option<u64>) -> Result<()> {
    let src = BufReader::new(File::open(srcpath).context("opening input")?);
    let dst = BufWriter::new(
        File::create(dstpath).with_context(|| format!("failed to create output {dstpath:?}"))?,
    );

    let count = frame_stream(src, dst, apid, met)?;
    info!("wrote {count} frames");
    Ok(())
}
