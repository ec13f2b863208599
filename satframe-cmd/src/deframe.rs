use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use satframe::frame::read_frames;
use tracing::{info, warn};

/// Write the payload of every accepted frame in `src` to `dst`, returning the accepted
/// and rejected frame counts.
pub fn deframe_stream<R, W>(src: R, mut dst: W) -> Result<(u64, u64)>
where
    R: Read,
    W: Write,
{
    let mut frames = read_frames(src);
    for payload in &mut frames {
        let payload = payload.context("reading frames")?;
        dst.write_all(&payload).context("writing payload")?;
    }
    dst.flush().context("flushing output")?;

    Ok((frames.accepted(), frames.rejected()))
}

pub fn deframe(srcpath: &Path, dstpath: &Path) -> Result<()> {
    let src = BufReader::new(File::open(srcpath).context("opening input")?);
    let dst = BufWriter::new(
        File::create(dstpath).with_context(|| format!("failed to create output {dstpath:?}"))?,
    );

    let (accepted, rejected) = deframe_stream(src, dst)?;
    info!("accepted {accepted} frames");
    if rejected > 0 {
        warn!("rejected {rejected} frames with bad checksums");
    }
    Ok(())
}
