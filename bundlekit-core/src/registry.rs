//! Section type registry
//!
//! Maps the numeric type code carried by every frame to a known section
//! kind. The decoder itself never consults this table; it is used by
//! consumers to name sections, pick a presentation order and choose file
//! names on extraction. Codes without an entry map to
//! [`SectionKind::Unknown`] so that bundles from newer firmware still list
//! cleanly.

use alloc::format;
use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Display weight used for sections without a specific priority
pub const DEFAULT_WEIGHT: u8 = 5;

/// Known section types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// CPU, memory, battery and reset information
    SysInfo,
    /// Application identity and version
    Firmware,
    /// Raw core dump
    CoreDump,
    /// Trace log ring
    Trace,
    /// Kernel module state
    ModuleInfo,
    /// GPIO pin levels
    Gpio,
    /// Module-provided diagnostics blob
    Diagnostics,
    /// Per-core backtrace addresses
    Backtrace,
    /// Type code this build does not know
    Unknown(u8),
}

impl SectionKind {
    /// Classify a raw type code
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => SectionKind::SysInfo,
            1 => SectionKind::Firmware,
            2 => SectionKind::CoreDump,
            3 => SectionKind::Trace,
            4 => SectionKind::ModuleInfo,
            5 => SectionKind::Gpio,
            6 => SectionKind::Diagnostics,
            7 => SectionKind::Backtrace,
            other => SectionKind::Unknown(other),
        }
    }

    /// Raw type code of this kind
    pub const fn code(&self) -> u8 {
        match self {
            SectionKind::SysInfo => 0,
            SectionKind::Firmware => 1,
            SectionKind::CoreDump => 2,
            SectionKind::Trace => 3,
            SectionKind::ModuleInfo => 4,
            SectionKind::Gpio => 5,
            SectionKind::Diagnostics => 6,
            SectionKind::Backtrace => 7,
            SectionKind::Unknown(code) => *code,
        }
    }

    /// Presentation weight; lighter sections are shown first
    pub const fn weight(&self) -> u8 {
        match self {
            SectionKind::CoreDump => 10,
            SectionKind::Backtrace => 9,
            SectionKind::Trace => 6,
            _ => DEFAULT_WEIGHT,
        }
    }

    /// Short section name
    pub fn name(&self) -> String {
        match self {
            SectionKind::SysInfo => "sysinfo".into(),
            SectionKind::Firmware => "firmware".into(),
            SectionKind::CoreDump => "coredump".into(),
            SectionKind::Trace => "trace".into(),
            SectionKind::ModuleInfo => "modinfo".into(),
            SectionKind::Gpio => "gpio".into(),
            SectionKind::Diagnostics => "diagnostics".into(),
            SectionKind::Backtrace => "backtrace".into(),
            SectionKind::Unknown(code) => format!("section-{:02x}h", code),
        }
    }

    /// File name used when a section of this kind is extracted
    pub fn file_name(&self, version: u8) -> String {
        format!("{}-{}.bin", self.name(), version)
    }

    /// Whether the type code has a registry entry
    pub const fn is_known(&self) -> bool {
        !matches!(self, SectionKind::Unknown(_))
    }
}

impl From<u8> for SectionKind {
    fn from(code: u8) -> Self {
        SectionKind::from_code(code)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in 0..=u8::MAX {
            assert_eq!(SectionKind::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(SectionKind::from_code(0).name(), "sysinfo");
        assert_eq!(SectionKind::from_code(4).name(), "modinfo");
        assert_eq!(SectionKind::from_code(0x2a).name(), "section-2ah");
        assert!(!SectionKind::from_code(8).is_known());
    }

    #[test]
    fn test_weights() {
        assert_eq!(SectionKind::CoreDump.weight(), 10);
        assert_eq!(SectionKind::Backtrace.weight(), 9);
        assert_eq!(SectionKind::Trace.weight(), 6);
        assert_eq!(SectionKind::Gpio.weight(), DEFAULT_WEIGHT);
        assert_eq!(SectionKind::Unknown(200).weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(SectionKind::SysInfo.file_name(3), "sysinfo-3.bin");
        assert_eq!(SectionKind::Unknown(9).file_name(1), "section-09h-1.bin");
    }
}
