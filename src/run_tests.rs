//! Tests for the run module.

use super::*;
use flap_filter::config::Cli;
use std::io::Write as _;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config(args: &[&str]) -> ValidatedConfig {
    let mut full_args = vec!["flap-filter"];
    full_args.extend(args);
    full_args.extend(["replay", "unused.jsonl"]);
    ValidatedConfig::from_raw(&Cli::parse_from_iter(full_args), None).unwrap()
}

fn script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

const RENEWAL: &[&str] = &[
    "# lease renewal on eth0",
    r#"{"at_ms": 0, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "del"}"#,
    r#"{"at_ms": 20, "type": "addr", "index": 3, "prefix": "10.0.0.5/32", "op": "add"}"#,
];

mod run_error {
    use super::*;

    #[test]
    fn replay_error_displays_source() {
        let error = RunError::from(ReplayError::OutOfOrder {
            line: 3,
            at_ms: 1,
            previous_ms: 2,
        });

        assert!(error.to_string().starts_with("Replay failed"));
        assert!(error.to_string().contains("line 3"));
    }

    #[test]
    fn output_error_displays_message() {
        let error = RunError::Output(std::io::Error::other("broken pipe"));
        assert_eq!(error.to_string(), "Failed to write output: broken pipe");
    }
}

mod replaying {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn flap_is_squashed() {
        let file = script(RENEWAL);

        let emitted = replay_script(&config(&[]), file.path(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].at, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_delay_is_used() {
        let file = script(&[
            r#"{"at_ms": 0, "type": "addr", "index": 1, "prefix": "10.0.0.1/32", "op": "del"}"#,
        ]);

        let emitted = replay_script(
            &config(&["--damping-delay-ms", "30"]),
            file.path(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(emitted[0].at, Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_script_is_replay_error() {
        let file = script(&["{\"at_ms\": 0"]);

        let result = replay_script(&config(&[]), file.path(), CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(RunError::Replay(ReplayError::Parse { line: 1, .. }))
        ));
    }
}

mod report {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn json_report_has_one_line_per_update() {
        let file = script(RENEWAL);
        let emitted = replay_script(&config(&[]), file.path(), CancellationToken::new())
            .await
            .unwrap();

        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Json, &emitted).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(r#""op":"add""#));
        assert!(text.contains(r#""at_ms":100"#));
    }

    #[test]
    fn text_report() {
        let emitted = vec![Emitted {
            at: Duration::from_millis(100),
            update: flap_filter::update::AddrUpdate::removed(3, "10.0.0.5/32".parse().unwrap())
                .into(),
        }];

        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Text, &emitted).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "   100ms  addr del if=3 10.0.0.5/32\n"
        );
    }

    #[test]
    fn empty_report_writes_nothing() {
        let mut out = Vec::new();
        write_report(&mut out, OutputFormat::Json, &[]).unwrap();
        assert!(out.is_empty());
    }
}
