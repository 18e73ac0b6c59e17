//! # Bundlekit Core
//!
//! Decoder for the diagnostic bundles an embedded device dumps when it
//! crashes or is asked for its state. A bundle is a container header
//! followed by typed, versioned, length-prefixed sections, written under
//! conditions where torn and truncated writes are routine.
//!
//! ## Modules
//!
//! - `constants`: Container and frame format constants
//! - `types`: Core types (Bundle, Section, DecodeWarning)
//! - `checksum`: CRC-32 and Adler-32
//! - `registry`: Section type classification and display order
//! - `decoder`: v1 and v2 frame scanners
//! - `scanner`: Resynchronization on damaged streams
//! - `reader`: Container reader driving the scan/resync loop
//! - `encoder`: Bundle encoding
//! - `firmware`: Firmware identity and release image selection

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod checksum;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod firmware;
pub mod reader;
pub mod registry;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use constants::FormatVersion;
pub use error::BundleError;
pub use reader::{decode_bundle, decode_bundle_zero_copy};
pub use registry::SectionKind;
pub use types::{Bundle, DecodeWarning, FaultClass, FaultKind, LocatedSection, Section};

/// Result type alias for bundle operations
pub type Result<T> = core::result::Result<T, BundleError>;
