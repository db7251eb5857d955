use port_sweep_rs::{PortRange, ScanError};

#[test]
fn parse_single_and_range() {
    let single: PortRange = "80".parse().expect("parse ok");
    assert_eq!((single.start(), single.end()), (80, 80));

    let range: PortRange = " 8000 - 8002 ".parse().expect("parse ok");
    assert_eq!(range.iter().collect::<Vec<_>>(), vec![8000, 8001, 8002]);
    assert_eq!(range.len(), 3);
}

#[test]
fn invalid_text_rejected() {
    for input in ["", "0", "70000", "10-5", "http", "1-"] {
        assert!(input.parse::<PortRange>().is_err(), "{input:?} should fail");
    }
}

#[test]
fn numeric_bounds_yield_invalid_range_error() {
    let err = PortRange::new(5002, 4998).unwrap_err();
    assert!(matches!(err, ScanError::InvalidRange { start: 5002, end: 4998 }));
}
