use thiserror::Error;

/// Rejected user input. Raised before any probe is admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("port specification is empty")]
    EmptyPortSpec,

    #[error("empty entry at position {position} in port specification")]
    EmptyPortToken { position: usize },

    #[error("invalid port '{token}'")]
    InvalidPort { token: String },

    #[error("port {value} is out of range (1-65535)")]
    PortOutOfRange { value: u64 },

    #[error("inverted port range '{start}-{end}'")]
    InvertedRange { start: u16, end: u16 },

    #[error("Invalid CIDR notation: {reason}")]
    InvalidCidr { reason: String },
}

impl ValidationError {
    pub(crate) fn cidr(reason: impl Into<String>) -> Self {
        Self::InvalidCidr {
            reason: reason.into(),
        }
    }
}
