//! Error types for bundle operations
//!
//! Only conditions that stop a decode outright are errors. Recoverable
//! framing and integrity faults are reported as
//! [`DecodeWarning`](crate::types::DecodeWarning)s on the decoded bundle.

use alloc::string::String;

/// Errors that can occur while reading or writing a bundle
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq)]
pub enum BundleError {
    /// Input shorter than the container header
    #[cfg_attr(feature = "std", error("Incomplete container header: expected {expected} bytes, got {actual}"))]
    IncompleteHeader {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually found.
        actual: usize,
    },

    /// Global magic does not match the bundle sentinel
    #[cfg_attr(feature = "std", error("Not a bundle: expected magic 0xdeadbeef, got {0:#010x}"))]
    BadMagic(u32),

    /// Container format version is not 1 or 2
    #[cfg_attr(feature = "std", error("Unsupported bundle version {0}"))]
    UnsupportedVersion(u32),

    /// Payload cannot be represented in the frame length field
    #[cfg_attr(feature = "std", error("Payload size {0} exceeds the 32-bit frame length field"))]
    PayloadTooLarge(usize),

    /// Section payload does not have the layout its type requires
    #[cfg_attr(feature = "std", error("Invalid section structure: {0}"))]
    InvalidStructure(String),

    /// IO error during read/write
    #[cfg_attr(feature = "std", error("IO error: {0}"))]
    Io(String),
}

impl BundleError {
    /// Whether this error is one of the fatal container format errors
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            BundleError::IncompleteHeader { .. }
                | BundleError::BadMagic(_)
                | BundleError::UnsupportedVersion(_)
        )
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for BundleError {
    fn from(err: std::io::Error) -> Self {
        BundleError::Io(err.to_string())
    }
}
