mod deframe;
mod frame;
mod info;

use std::io::stderr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hifitime::Epoch;
use satframe::spacepacket::Apid;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into link frames.
    ///
    /// The input is split into chunks of at most 64 bytes, each written as a single frame.
    /// With --apid each chunk of at most 50 bytes is first wrapped in a space packet.
    Frame {
        /// Wrap each chunk in a space packet with this APID.
        #[arg(short, long)]
        apid: Option<Apid>,

        /// Mission elapsed time in milliseconds used to timestamp packets. Defaults to
        /// the milliseconds elapsed since the command started.
        #[arg(short, long, value_name = "ms", requires = "apid")]
        met: Option<u64>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "framed.dat", value_name = "path")]
        output: PathBuf,

        /// Input file.
        input: PathBuf,
    },
    /// Recover frame payloads from a noisy byte stream.
    ///
    /// Payloads of frames passing their CRC check are written back to back. Noise and
    /// frames failing their CRC check are dropped.
    Deframe {
        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "deframed.dat", value_name = "path")]
        output: PathBuf,

        /// Input stream file.
        input: PathBuf,
    },
    /// Show information about the space packets carried in a framed stream.
    Info {
        /// Input stream file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        /// Mission epoch (RFC3339). When provided, packet times are also reported in UTC.
        #[arg(short, long, value_parser = parse_timestamp, value_name = "timestamp")]
        epoch: Option<Epoch>,
    },
}

fn parse_timestamp(s: &str) -> Result<Epoch, String> {
    Epoch::from_str(s).map_err(|_| "Could not parse into an RFC3339 timestamp".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("SATFRAME_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Frame {
            apid,
            met,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            info!("framing {input:?} to {output:?}");
            frame::frame(input, output, *apid, *met)
        }
        Commands::Deframe {
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            info!("deframing {input:?} to {output:?}");
            deframe::deframe(input, output)
        }
        Commands::Info {
            input,
            format,
            epoch,
        } => info::info(input, format, *epoch),
    }
}
