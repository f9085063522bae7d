// tests/cli_dry_run.rs

use std::error::Error;
use std::path::Path;

use clap::Parser;
use tracing::Level;

use stag::cli::{CliArgs, LogLevel};
use stag::config::load_and_validate_with;
use stag::fs::mock::MockFileSystem;
use stag::logging::resolve_level;
use stag::print_dry_run;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn cli_defaults() {
    let args = CliArgs::parse_from(["stag"]);
    assert_eq!(args.config, "stag.toml");
    assert_eq!(args.log_level, None);
    assert!(!args.dry_run);
}

#[test]
fn cli_flags() {
    let args = CliArgs::parse_from(["stag", "-c", "dev.toml", "--log-level", "debug", "--dry-run"]);
    assert_eq!(args.config, "dev.toml");
    assert_eq!(args.log_level, Some(LogLevel::Debug));
    assert!(args.dry_run);
}

#[test]
fn log_level_priority() {
    assert_eq!(resolve_level(Some(LogLevel::Warn), Some("trace")), Level::WARN);
    assert_eq!(resolve_level(None, Some("TRACE")), Level::TRACE);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}

#[test]
fn dry_run_lists_tasks_and_resolved_files() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("src/main.rs", "");
    fs.add_file("src/gen/out.rs", "");
    fs.add_file(
        "stag.toml",
        r#"
[[watch]]
name = "build"
files = ["src/**/*.rs"]
exclude = ["src/gen/**"]
run = ["cargo build", "cargo test"]

[[menu]]
key = "d"
run = "cargo doc"
log = "doc.log"
"#,
    );
    let cfg = load_and_validate_with(&fs, Path::new("stag.toml"))?;

    let mut out = Vec::new();
    print_dry_run(&cfg, &fs, &mut out)?;
    let text = String::from_utf8(out)?;

    assert!(text.contains("format = bash -c %"));
    assert!(text.contains("  - [0] build\n"));
    assert!(text.contains("      run: cargo build\n      run: cargo test\n"));
    assert!(text.contains("watching 1 file(s)\n        src/main.rs\n"));
    assert!(!text.contains("src/gen/out.rs"));
    assert!(text.contains("  - [1] d (key 'd')\n"));
    assert!(text.contains("      log: doc.log\n"));
    Ok(())
}
