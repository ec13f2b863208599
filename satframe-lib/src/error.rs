#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Not enough bytes")]
    NotEnoughData {
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of expected bytes
        minimum: usize,
    },

    /// Frames must carry at least one payload byte.
    #[error("Empty payload")]
    EmptyPayload,
    #[error("Payload too large: {actual} > {max}")]
    PayloadTooLarge { actual: usize, max: usize },

    #[error("Invalid sync byte {0:#04x}")]
    InvalidSync(u8),
    #[error("Invalid frame length {0}")]
    InvalidLength(u8),
    #[error("Checksum mismatch: computed {computed:#06x}, received {received:#06x}")]
    ChecksumMismatch { computed: u16, received: u16 },

    #[error("Overflow")]
    Overflow,

    #[error("Packet has no secondary header")]
    NoSecondaryHeader,
}

pub type Result<T> = std::result::Result<T, Error>;
