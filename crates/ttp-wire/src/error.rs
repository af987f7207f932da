/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The stream was closed cleanly at a frame boundary.
    ///
    /// A signal rather than a fault: loops reading packet after packet
    /// use this to detect normal peer closure.
    #[error("end of stream")]
    EndOfStream,

    /// The stream ended in the middle of a frame.
    #[error("truncated frame (stream ended mid-frame)")]
    Truncated,

    /// The frame declares a negative body length.
    #[error("negative body length {0}")]
    NegativeBodyLength(i32),

    /// The body exceeds what the 32-bit length field can express.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
