//! Wire-format tests for frames and command payloads

use maxy_core::protocol::commands::{INTENSITY_MAX, MODULE_INDEX_MAX, TARGET_MAX, TARGET_MIN};
use maxy_core::protocol::{escape, frame, Command, ProtocolError};
use pretty_assertions::assert_eq;
use proptest::collection::vec;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_set_module_target_is_six_bytes(
        module in 0..=MODULE_INDEX_MAX,
        target in TARGET_MIN..=TARGET_MAX,
    ) {
        let payload = Command::SetModuleTarget { module, target }.encode().unwrap();
        prop_assert_eq!(payload.len(), 6);
        prop_assert_eq!(payload[0], 0x42);
        prop_assert_eq!(payload[1], module);
        prop_assert_eq!(&payload[2..], &target.to_be_bytes()[..]);
    }

    #[test]
    fn test_target_outside_range_is_rejected(
        module in 0..=MODULE_INDEX_MAX,
        target in prop_oneof![i32::MIN..TARGET_MIN, (TARGET_MAX + 1)..=i32::MAX],
    ) {
        let err = Command::SetModuleTarget { module, target }.encode().unwrap_err();
        prop_assert!(
            matches!(err, ProtocolError::OutOfRange { field: "target", .. }),
            "unexpected error {:?}",
            err
        );
    }

    #[test]
    fn test_all_intensity_rejects_out_of_range(intensity in (INTENSITY_MAX + 1)..=u8::MAX) {
        let err = Command::SetAllIntensity { intensity }.encode().unwrap_err();
        match err {
            ProtocolError::OutOfRange {
                field, min, max, ..
            } => {
                prop_assert_eq!(field, "intensity");
                prop_assert_eq!((min, max), (0, 15));
            }
            other => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_escape_leaves_no_bare_reserved_bytes(payload in vec(any::<u8>(), 0..64)) {
        let escaped = escape(&payload);
        let reserved = payload.iter().filter(|&&b| b >= 0xFC).count();
        prop_assert_eq!(escaped.len(), payload.len() + reserved);

        let mut i = 0;
        while i < escaped.len() {
            if escaped[i] == 0xFC {
                prop_assert!(i + 1 < escaped.len(), "dangling escape");
                prop_assert!(escaped[i + 1] >= 0xFC);
                i += 2;
            } else {
                prop_assert!(escaped[i] < 0xFC);
                i += 1;
            }
        }
    }

    #[test]
    fn test_frame_wraps_escaped_payload(payload in vec(any::<u8>(), 0..64)) {
        let bytes = frame(&payload);
        prop_assert_eq!(bytes.first(), Some(&0xFD));
        prop_assert_eq!(bytes.last(), Some(&0xFE));
        let escaped = escape(&payload);
        prop_assert_eq!(&bytes[1..bytes.len() - 1], escaped.as_slice());
    }
}

#[test]
fn test_frame_delimiters() {
    assert_eq!(frame(&[]), vec![0xFD, 0xFE]);
    assert_eq!(frame(&[0xFC]), vec![0xFD, 0xFC, 0xFC, 0xFE]);
    assert_eq!(
        frame(&[0x43, 0xFD, 0xFE, 0xFF, 0x00]),
        vec![0xFD, 0x43, 0xFC, 0xFD, 0xFC, 0xFE, 0xFC, 0xFF, 0x00, 0xFE]
    );
}

#[test]
fn test_escaped_region_has_no_bare_reserved_bytes() {
    // Every reserved byte inside the frame must follow an escape byte
    let payload = Command::SetSubModuleTarget {
        module: 2,
        sub_module: 1,
        target: -259, // 0xFFFFFEFD
    }
    .encode()
    .unwrap();
    let bytes = frame(&payload);
    let inner = &bytes[1..bytes.len() - 1];

    let mut i = 0;
    while i < inner.len() {
        if inner[i] == 0xFC {
            assert!(i + 1 < inner.len(), "dangling escape");
            i += 2;
        } else {
            assert!(inner[i] < 0xFC, "bare reserved byte {:#04x} at {}", inner[i], i);
            i += 1;
        }
    }
}

#[test]
fn test_encode_failure_produces_nothing() {
    let cmd = Command::SetSubModuleTarget {
        module: 0,
        sub_module: 0,
        target: TARGET_MAX + 1,
    };
    assert!(cmd.encode().is_err());
    assert!(cmd.to_frame().is_err());
}
