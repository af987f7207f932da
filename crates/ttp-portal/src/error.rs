/// Errors that can occur in portal operations.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] ttp_transport::TransportError),

    /// Wire-level error.
    #[error("wire error: {0}")]
    Wire(#[from] ttp_wire::WireError),

    /// Operation attempted on a closed portal.
    #[error("portal is closed")]
    Closed,

    /// A routing frame named a channel this portal does not have.
    #[error("invalid routing id {id:?} ({count} channels)")]
    InvalidRouting { id: String, count: usize },

    /// An I/O error outside the wire codec (e.g. spawning the selector).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;
