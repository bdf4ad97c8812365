//! Tests for replay script parsing.

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn net(s: &str) -> IpNet {
    s.parse().unwrap()
}

mod parsing {
    use super::*;

    #[test]
    fn parse_address_events() {
        let script = r#"
            {"at_ms": 0, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "del"}
            {"at_ms": 20, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "add"}
        "#;

        let events = parse_script(script).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].at, Duration::ZERO);
        assert_eq!(
            events[0].update,
            Update::Addr(AddrUpdate::removed(3, net("10.0.0.5/32")))
        );
        assert_eq!(events[1].at, Duration::from_millis(20));
        assert_eq!(
            events[1].update,
            Update::Addr(AddrUpdate::added(3, net("10.0.0.5/32")))
        );
    }

    #[test]
    fn parse_link_event() {
        let script =
            r#"{"at_ms": 5, "type": "link", "index": 2, "name": "wlan0", "state": "lower-layer-down", "flags": 4099}"#;

        let events = parse_script(script).unwrap();

        let expected = LinkUpdate::new(
            2,
            LinkState::new("wlan0", OperState::LowerLayerDown).with_flags(4099),
        );
        assert_eq!(events[0].update, Update::Link(expected));
    }

    #[test]
    fn link_defaults_to_unknown_state() {
        let events = parse_script(r#"{"at_ms": 0, "type": "link", "index": 1}"#).unwrap();

        let link = events[0].update.as_link().unwrap();
        assert_eq!(link.state.oper_state, OperState::Unknown);
        assert!(link.state.name.is_empty());
    }

    #[test]
    fn parse_address_attributes() {
        let script = r#"{"at_ms": 0, "type": "addr", "index": 1, "prefix": "2001:db8::5/64", "op": "add", "flags": 128, "scope": 253, "preferred_lft": 300, "valid_lft": 600}"#;

        let events = parse_script(script).unwrap();
        let addr = events[0].update.as_addr().unwrap();

        assert_eq!(addr.flags, 128);
        assert_eq!(addr.scope, 253);
        assert_eq!(addr.preferred_lifetime, Some(Duration::from_secs(300)));
        assert_eq!(addr.valid_lifetime, Some(Duration::from_secs(600)));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let script = "
            # DHCP renewal on eth0

            {\"at_ms\": 0, \"type\": \"link\", \"index\": 1, \"state\": \"up\"}
        ";

        assert_eq!(parse_script(script).unwrap().len(), 1);
    }

    #[test]
    fn equal_timestamps_are_allowed() {
        let script = r#"
            {"at_ms": 10, "type": "link", "index": 1}
            {"at_ms": 10, "type": "link", "index": 2}
        "#;

        assert_eq!(parse_script(script).unwrap().len(), 2);
    }

    #[test]
    fn empty_script_has_no_events() {
        assert!(parse_script("").unwrap().is_empty());
    }
}

mod errors {
    use super::*;

    #[test]
    fn malformed_json_reports_line() {
        let script = "{\"at_ms\": 0, \"type\": \"link\", \"index\": 1}\nnot json";

        let result = parse_script(script);

        assert!(matches!(result, Err(ReplayError::Parse { line: 2, .. })));
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result = parse_script(r#"{"at_ms": 0, "type": "route", "index": 1}"#);
        assert!(matches!(result, Err(ReplayError::Parse { line: 1, .. })));
    }

    #[test]
    fn unknown_op_is_rejected() {
        let result = parse_script(
            r#"{"at_ms": 0, "type": "addr", "index": 1, "prefix": "10.0.0.1/32", "op": "replace"}"#,
        );
        assert!(matches!(result, Err(ReplayError::Parse { .. })));
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        let result = parse_script(
            r#"{"at_ms": 0, "type": "addr", "index": 1, "prefix": "10.0.0.1/33", "op": "add"}"#,
        );

        match result {
            Err(ReplayError::InvalidPrefix { line, value, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(value, "10.0.0.1/33");
            }
            other => panic!("expected InvalidPrefix, got {other:?}"),
        }
    }

    #[test]
    fn backwards_timestamp_is_rejected() {
        let script = r#"
            {"at_ms": 50, "type": "link", "index": 1}
            {"at_ms": 40, "type": "link", "index": 1}
        "#;

        let result = parse_script(script);

        assert!(matches!(
            result,
            Err(ReplayError::OutOfOrder {
                line: 3,
                at_ms: 40,
                previous_ms: 50
            })
        ));
    }
}

mod loading {
    use super::*;

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"at_ms": 0, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "del"}}"#
        )
        .unwrap();

        let events = load_script(file.path()).unwrap();

        assert_eq!(events.len(), 1);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");

        let result = load_script(&path);

        assert!(matches!(result, Err(ReplayError::FileRead { .. })));
    }
}
