//! Packet analysis error types.

use thiserror::Error;

/// Error type for packet resolution and IR synthesis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// No packet boundary found within the architecture's maximum
    /// packet length.
    #[error("no packet boundary within {max_words} words of {address:#x}")]
    MalformedPacket { address: u64, max_words: usize },

    /// A constant extender could not bind to its packet partner.
    /// Diagnostic only; the target is decoded unextended.
    #[error("constant extender at {extender:#x} cannot bind to {target:#x}")]
    MisplacedExtension { extender: u64, target: u64 },

    /// A new-value operand has no unique producer register.
    #[error("ambiguous new-value producer for consumer at {address:#x}")]
    AmbiguousNewValue { address: u64 },

    /// A new-value operand's encoded distance reaches no producer
    /// within the packet.
    #[error("no new-value producer within distance {distance} of consumer at {address:#x}")]
    MissingNewValueProducer { address: u64, distance: u8 },

    /// An instruction in the packet has no decodable IR template.
    /// Fatal to the whole packet's IR synthesis.
    #[error("no IR template for instruction at {address:#x}")]
    UnknownEncoding { address: u64 },
}

impl PacketError {
    /// Creates a new MalformedPacket error.
    pub fn malformed(address: u64, max_words: usize) -> Self {
        Self::MalformedPacket { address, max_words }
    }

    /// Creates a new MisplacedExtension error.
    pub fn misplaced_extension(extender: u64, target: u64) -> Self {
        Self::MisplacedExtension { extender, target }
    }

    /// Creates a new AmbiguousNewValue error.
    pub fn ambiguous_new_value(address: u64) -> Self {
        Self::AmbiguousNewValue { address }
    }

    /// Creates a new MissingNewValueProducer error.
    pub fn missing_new_value_producer(address: u64, distance: u8) -> Self {
        Self::MissingNewValueProducer { address, distance }
    }

    /// Creates a new UnknownEncoding error.
    pub fn unknown_encoding(address: u64) -> Self {
        Self::UnknownEncoding { address }
    }

    /// The stream address the error refers to.
    pub fn address(&self) -> u64 {
        match self {
            Self::MalformedPacket { address, .. }
            | Self::AmbiguousNewValue { address }
            | Self::MissingNewValueProducer { address, .. }
            | Self::UnknownEncoding { address } => *address,
            Self::MisplacedExtension { extender, .. } => *extender,
        }
    }
}

/// Result type for packet operations.
pub type PacketResult<T> = Result<T, PacketError>;
