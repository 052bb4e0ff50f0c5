mod common;

use common::{list_files, Sandbox};
use flate2::read::GzDecoder;
use report_pipeline::pipeline::{FileOutcome, SanitizePipeline};
use report_pipeline::report::Report;
use serde_yaml::Value;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

const BRIDGE_DB: &str = r#"{
    "1.2.3.4:443": {"distributor": "https"},
    "5.6.7.8:9001": {"distributor": "email", "transport": "obfs3"}
}"#;

const FINGERPRINT: &str = "c30842abb5027d7fbd15973a3d0875ad87cecd3f";

const BRIDGE_REPORT: &str = "---
probe_cc: it
input: 1.2.3.4:443
test_name: bridge_reachability
...
---
input: 1.2.3.4:443
bridge_address: 1.2.3.4:443
success: true
tor_log: 'Bootstrapped 100% via 1.2.3.4:443'
...
---
...
---
input: 5.6.7.8:9001
bridge_address: 5.6.7.8:9001
success: false
...
---
input: 203.0.113.9:80
bridge_address: 203.0.113.9:80
success: true
...
";

fn gunzip(path: &Path) -> String {
    let mut out = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn test_header_bridge_is_sanitized() {
    let sandbox = Sandbox::new();
    sandbox.write_bridge_db(BRIDGE_DB);
    let raw = sandbox.write_raw("a.yamloo", "---\nprobe_cc: it\ninput: 1.2.3.4:443\n...\n");

    let summary = SanitizePipeline::from_config(&sandbox.config)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.done, 1);

    let out = fs::read_to_string(sandbox.sanitized("a.yamloo")).unwrap();
    assert_eq!(
        out,
        format!(
            "---\nprobe_cc: it\nbridge_hashed_fingerprint: {FINGERPRINT}\n\
             bridge_address: null\ndistributor: https\nreport_file: a.yamloo\n...\n"
        )
    );

    assert!(!raw.exists());
    assert_eq!(
        gunzip(&sandbox.archive("a.yamloo")),
        "---\nprobe_cc: it\ninput: 1.2.3.4:443\n...\n"
    );
}

#[test]
fn test_redaction_and_pass_through() {
    let sandbox = Sandbox::new();
    sandbox.write_bridge_db(BRIDGE_DB);
    sandbox.write_raw("bridges.yamloo", BRIDGE_REPORT);

    let summary = SanitizePipeline::from_config(&sandbox.config)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.entries, 3);

    let text = fs::read_to_string(sandbox.sanitized("bridges.yamloo")).unwrap();
    assert!(!text.contains("1.2.3.4"));
    assert!(!text.contains("5.6.7.8"));

    let report = Report::open(sandbox.sanitized("bridges.yamloo")).unwrap();
    assert_eq!(
        report.header.get("bridge_hashed_fingerprint"),
        Some(&Value::from(FINGERPRINT))
    );
    let entries: Vec<_> = report.map(|e| e.unwrap()).collect();
    assert_eq!(entries.len(), 3, "blank document is dropped");

    assert_eq!(entries[0].get("distributor"), Some(&Value::from("https")));
    assert_eq!(entries[0].get("bridge_address"), Some(&Value::Null));
    assert_eq!(entries[0].get("success"), Some(&Value::from(true)));

    let second = entries[1]
        .get("bridge_hashed_fingerprint")
        .and_then(Value::as_str)
        .unwrap();
    assert_eq!(second.len(), 40);
    assert!(second.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(entries[1].get("distributor"), Some(&Value::from("email")));

    // unknown bridge: untouched
    assert_eq!(entries[2].get("input"), Some(&Value::from("203.0.113.9:80")));
    assert_eq!(
        entries[2].get("bridge_address"),
        Some(&Value::from("203.0.113.9:80"))
    );
    assert!(entries[2].get("distributor").is_none());
}

#[test]
fn test_rerun_overwrites_archive_and_rewrites_identically() {
    let sandbox = Sandbox::new();
    sandbox.write_bridge_db(BRIDGE_DB);
    let raw = sandbox.write_raw("2014/r.yamloo", BRIDGE_REPORT);

    let pipeline = SanitizePipeline::from_config(&sandbox.config).unwrap();
    pipeline.run().unwrap();
    let first = fs::read(sandbox.sanitized("r.yamloo")).unwrap();
    assert!(sandbox.archive("r.yamloo").exists());

    // crash-and-retry: the raw file is back while its archive already exists
    sandbox.write_raw("2014/r.yamloo", BRIDGE_REPORT);
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.done, 1);
    assert!(summary.failed.is_empty());

    let second = fs::read(sandbox.sanitized("r.yamloo")).unwrap();
    assert_eq!(first, second);
    assert!(!raw.exists());
    assert_eq!(gunzip(&sandbox.archive("r.yamloo")), BRIDGE_REPORT);
    assert_eq!(list_files(&sandbox.config.archive_directory), vec!["r.yamloo.gz"]);
}

#[test]
fn test_no_raw_report_is_lost() {
    let sandbox = Sandbox::new();
    sandbox.write_bridge_db(BRIDGE_DB);
    let names = ["good1.yamloo", "nested/good2.yamloo", "bad.yamloo", "empty.yamloo"];
    sandbox.write_raw(names[0], BRIDGE_REPORT);
    sandbox.write_raw(names[1], "---\nprobe_cc: US\n...\n");
    sandbox.write_raw(names[2], "---\n- this header is a list\n...\n");
    sandbox.write_raw(names[3], "");
    sandbox.write_raw("notes.txt", "not a report");

    let summary = SanitizePipeline::from_config(&sandbox.config)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.done, 2);
    assert_eq!(summary.skipped.len(), 2);

    for name in names {
        let raw = sandbox.config.reports_directory.join(name);
        let basename = Path::new(name).file_name().unwrap().to_str().unwrap();
        let archived = sandbox.archive(basename).exists();
        assert!(
            archived != raw.exists(),
            "{name} must be either archived or still in the reports directory"
        );
    }
    assert!(sandbox.config.reports_directory.join("notes.txt").exists());
    assert!(!sandbox.sanitized("bad.yamloo").exists());
}

#[test]
fn test_processing_order_does_not_matter() {
    let contents = [
        ("x.yamloo", BRIDGE_REPORT),
        ("y.yamloo", "---\nprobe_cc: US\ninput: 5.6.7.8:9001\n...\n---\nk: v\n...\n"),
        ("z.yamloo", "---\nprobe_cc: DE\n...\n"),
    ];

    let run_in_order = |order: &[usize]| {
        let sandbox = Sandbox::new();
        sandbox.write_bridge_db(BRIDGE_DB);
        let pipeline = SanitizePipeline::from_config(&sandbox.config).unwrap();
        let paths: Vec<_> = contents
            .iter()
            .map(|(name, content)| sandbox.write_raw(name, content))
            .collect();
        for &i in order {
            assert!(matches!(
                pipeline.process_file(&paths[i]),
                FileOutcome::Done { .. }
            ));
        }
        let sanitized: Vec<(String, Vec<u8>)> = list_files(&sandbox.config.sanitized_directory)
            .into_iter()
            .map(|name| {
                let bytes = fs::read(sandbox.sanitized(&name)).unwrap();
                (name, bytes)
            })
            .collect();
        (sanitized, list_files(&sandbox.config.archive_directory))
    };

    assert_eq!(run_in_order(&[0, 1, 2]), run_in_order(&[2, 0, 1]));
}
