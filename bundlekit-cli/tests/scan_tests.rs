use std::fs;
use tempfile::tempdir;

use bundlekit_cli::commands::scan::{self, ScanReport};
use bundlekit_core::{
    encoder::{encode_section_v2, BundleBuilder},
    FormatVersion, Section,
};

/// Helper: a clean bundle with one section of each common kind
fn create_test_bundle(version: FormatVersion) -> Vec<u8> {
    BundleBuilder::new(version)
        .section(2, 1, vec![0xC0u8; 256])
        .section(7, 1, vec![0u8; 32])
        .section(0, 3, b"cpu=cortex-m4".to_vec())
        .section(1, 1, vec![0x11u8; 108])
        .build()
        .unwrap()
        .to_vec()
}

/// Helper: a bundle whose first section was torn mid-payload
fn create_damaged_bundle() -> Vec<u8> {
    let torn = encode_section_v2(&Section::new(2, 1, vec![0xC0u8; 256])).unwrap();
    let mut data = BundleBuilder::new(FormatVersion::V2).build().unwrap().to_vec();
    data.extend_from_slice(&torn[..80]);
    data.extend_from_slice(&encode_section_v2(&Section::new(0, 3, b"sysinfo".to_vec())).unwrap());
    data
}

#[test]
fn test_scan_basic_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("bundle.bin");
    let output_path = td.path().join("output.json");

    fs::write(&input_path, create_test_bundle(FormatVersion::V2)).unwrap();

    scan::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        false,
    )
    .unwrap();

    let json = fs::read_to_string(&output_path).unwrap();
    let report: ScanReport = serde_json::from_str(&json).unwrap();

    assert_eq!(report.version, FormatVersion::V2);
    assert_eq!(report.stats.sections_found, 4);
    assert!(report.warnings.is_empty());

    // Display order, not stream order
    let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["sysinfo", "firmware", "backtrace", "coredump"]);
    assert_eq!(report.sections[3].offset, 8);
}

#[test]
fn test_scan_v1_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("legacy.bin");
    let output_path = td.path().join("legacy.json");

    fs::write(&input_path, create_test_bundle(FormatVersion::V1)).unwrap();

    scan::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        false,
    )
    .unwrap();

    let report: ScanReport =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(report.version, FormatVersion::V1);
    assert_eq!(report.sections.len(), 4);
}

#[test]
fn test_scan_damaged_file_reports_warnings() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("damaged.bin");
    let output_path = td.path().join("damaged.json");

    fs::write(&input_path, create_damaged_bundle()).unwrap();

    scan::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        false,
    )
    .unwrap();

    let json = fs::read_to_string(&output_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["sections"].as_array().unwrap().len(), 1);
    assert_eq!(value["sections"][0]["name"], "sysinfo");
    assert_eq!(value["stats"]["framing_faults"], 1);

    let warning = &value["warnings"][0];
    assert_eq!(warning["offset"], 8);
    assert_eq!(warning["type_code"], 2);
    assert!(warning["kind"]["fault"].is_string());
}

#[test]
fn test_scan_stats_only_writes_nothing() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("bundle.bin");
    let output_path = td.path().join("output.json");

    fs::write(&input_path, create_test_bundle(FormatVersion::V2)).unwrap();

    scan::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        true,
    )
    .unwrap();

    assert!(!output_path.exists());
}

#[test]
fn test_scan_to_stdout() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("bundle.bin");
    fs::write(&input_path, create_damaged_bundle()).unwrap();

    let result = scan::execute(input_path.to_str().unwrap(), None, false);
    assert!(result.is_ok());
}

#[test]
fn test_scan_header_only() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("empty.bin");
    let output_path = td.path().join("empty.json");

    fs::write(&input_path, BundleBuilder::new(FormatVersion::V2).build().unwrap()).unwrap();

    scan::execute(
        input_path.to_str().unwrap(),
        Some(output_path.to_str().unwrap()),
        false,
    )
    .unwrap();

    let report: ScanReport =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert!(report.sections.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_scan_not_a_bundle() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("random.bin");
    fs::write(&input_path, b"this is not a bundle at all").unwrap();

    let err = scan::execute(input_path.to_str().unwrap(), None, false).unwrap_err();
    assert!(format!("{:#}", err).contains("Not a bundle"));
}

#[test]
fn test_scan_missing_file() {
    let td = tempdir().unwrap();
    let input_path = td.path().join("missing.bin");

    let err = scan::execute(input_path.to_str().unwrap(), None, false).unwrap_err();
    assert!(err.to_string().contains("Failed to read input file"));
}
