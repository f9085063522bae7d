// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, MenuTaskBuilder, WatchTaskBuilder};

use std::error::Error;
use std::path::{Path, PathBuf};

use stag::config::{
    DEFAULT_STORE_SIZE, StoreSize, load_and_validate, load_and_validate_with, validate_config,
};
use stag::errors::StagError;
use stag::exec::{CommandTemplate, DEFAULT_TEMPLATE};
use stag::fs::mock::MockFileSystem;

type TestResult = Result<(), Box<dyn Error>>;

fn load(text: &str) -> Result<stag::config::ConfigFile, StagError> {
    let fs = MockFileSystem::new();
    fs.add_file("stag.toml", text);
    load_and_validate_with(&fs, Path::new("stag.toml"))
}

#[test]
fn full_config_assigns_ids_watch_first() -> TestResult {
    let cfg = load(
        r#"
format = "sh -c %"
store = "2M"

[[menu]]
key = "d"
run = ["cargo doc", "echo done"]

[[watch]]
name = "build"
files = ["src/**/*.rs"]
exclude = ["src/gen/**"]
run = "cargo build"
log = "build.log"

[[watch]]
files = ["*.md"]
run = ["mdbook build"]
"#,
    )?;

    assert_eq!(cfg.store, 2 * 1024 * 1024);
    assert_eq!(cfg.template.render("x"), vec!["sh", "-c", "x"]);

    assert_eq!(cfg.watch.len(), 2);
    assert_eq!(cfg.watch[0].id, 0);
    assert_eq!(cfg.watch[0].name, "build");
    assert_eq!(cfg.watch[0].commands, vec!["cargo build"]);
    assert_eq!(cfg.watch[0].exclude, vec!["src/gen/**"]);
    assert_eq!(cfg.watch[0].log, Some(PathBuf::from("build.log")));
    assert_eq!(cfg.watch[1].id, 1);
    assert_eq!(cfg.watch[1].name, "task-1");
    assert_eq!(cfg.watch[1].log, None);

    assert_eq!(cfg.menu.len(), 1);
    let menu = cfg.menu_by_key("d").expect("menu task d");
    assert_eq!(menu.id, 2);
    assert_eq!(menu.name, "d");
    assert_eq!(menu.commands, vec!["cargo doc", "echo done"]);
    assert_eq!(cfg.task_count(), 3);

    let spec = menu.spec(&cfg.template);
    assert!(spec.is_menu_task);
    assert_eq!(spec.id, 2);
    Ok(())
}

#[test]
fn defaults_apply_when_optional_keys_are_missing() -> TestResult {
    let cfg = load(
        r#"
[[watch]]
run = "make"
"#,
    )?;
    assert_eq!(cfg.template, CommandTemplate::default());
    assert_eq!(cfg.template.to_string(), DEFAULT_TEMPLATE);
    assert_eq!(cfg.template, CommandTemplate::parse(DEFAULT_TEMPLATE)?);
    assert_eq!(cfg.store, DEFAULT_STORE_SIZE);
    assert!(cfg.watch[0].files.is_empty());
    Ok(())
}

#[test]
fn prefix_puts_the_command_last() -> TestResult {
    let cfg = load(
        r#"
prefix = ["docker", "exec", "dev", "sh", "-c"]
store = 4096

[[watch]]
run = "make test"
"#,
    )?;
    assert_eq!(
        cfg.template.render("make test"),
        vec!["docker", "exec", "dev", "sh", "-c", "make test"]
    );
    assert_eq!(cfg.store, 4096);
    Ok(())
}

#[test]
fn zero_store_means_default() -> TestResult {
    let cfg = load("store = \"0\"\n[[watch]]\nrun = \"make\"\n")?;
    assert_eq!(cfg.store, DEFAULT_STORE_SIZE);
    Ok(())
}

#[test]
fn invalid_configs_are_rejected() {
    let cases = [
        ("no tasks", "format = \"bash -c %\"\n"),
        (
            "format and prefix",
            "format = \"sh -c %\"\nprefix = [\"sh\", \"-c\"]\n[[watch]]\nrun = \"x\"\n",
        ),
        ("format without placeholder", "format = \"sh -c\"\n[[watch]]\nrun = \"x\"\n"),
        ("empty run", "[[watch]]\nrun = []\n"),
        ("blank command", "[[watch]]\nrun = [\"make\", \" \"]\n"),
        ("blank key", "[[menu]]\nkey = \" \"\nrun = \"x\"\n"),
        (
            "duplicate key",
            "[[menu]]\nkey = \"t\"\nrun = \"x\"\n[[menu]]\nkey = \"t\"\nrun = \"y\"\n",
        ),
    ];

    for (what, text) in cases {
        match load(text) {
            Err(StagError::Config(_)) => {}
            other => panic!("{what}: expected a config error, got {other:?}"),
        }
    }
}

#[test]
fn malformed_toml_is_a_parse_error() {
    for text in ["[[watch]\nrun = 1", "[[watch]]\nrun = 5\n", "store = \"12X\"\n[[watch]]\nrun = \"x\"\n"] {
        let err = load(text).unwrap_err();
        assert!(matches!(err, StagError::Toml(_)), "{text:?}: {err:?}");
    }
}

#[test]
fn missing_file_names_the_path() {
    let fs = MockFileSystem::new();
    let err = load_and_validate_with(&fs, Path::new("nowhere/stag.toml")).unwrap_err();
    match err {
        StagError::Config(msg) => assert!(msg.contains("nowhere/stag.toml"), "{msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn loads_from_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("stag.toml");
    std::fs::write(&path, "[[menu]]\nkey = \"t\"\nname = \"tests\"\nrun = \"cargo test\"\n")?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.menu[0].name, "tests");
    assert_eq!(cfg.menu[0].id, 0);
    Ok(())
}

#[test]
fn store_sizes_parse_with_suffixes() {
    let ok = [
        ("512", 512),
        ("512B", 512),
        ("64k", 64 * 1024),
        ("64K", 64 * 1024),
        ("3M", 3 * 1024 * 1024),
        ("1G", 1024 * 1024 * 1024),
        (" 2 M ", 2 * 1024 * 1024),
    ];
    for (text, bytes) in ok {
        assert_eq!(text.parse::<StoreSize>(), Ok(StoreSize(bytes)), "{text}");
    }

    for text in ["", "M", "12X", "-1K", "99999999999999999999G"] {
        assert!(text.parse::<StoreSize>().is_err(), "{text} should not parse");
    }
}

#[test]
fn builders_produce_the_same_shape_as_toml() {
    let cfg = ConfigFileBuilder::new()
        .with_menu(MenuTaskBuilder::new("d", &["cargo doc"]).name("docs").build())
        .with_watch(WatchTaskBuilder::new(&["cargo build"]).files("src/**/*.rs").build())
        .build();

    assert_eq!(cfg.watch[0].id, 0);
    assert_eq!(cfg.watch[0].files, vec!["src/**/*.rs"]);
    assert_eq!(cfg.menu[0].id, 1);
    assert_eq!(cfg.menu[0].name, "docs");

    let raw = ConfigFileBuilder::new().raw();
    assert!(matches!(validate_config(raw), Err(StagError::Config(_))));
}

#[test]
fn templates_substitute_every_placeholder() -> TestResult {
    let t = CommandTemplate::parse("ssh box --cmd=% --echo %")?;
    assert_eq!(
        t.render("ls -l"),
        vec!["ssh", "box", "--cmd=ls -l", "--echo", "ls -l"]
    );
    assert_eq!(t.to_string(), "ssh box --cmd=% --echo %");

    assert!(CommandTemplate::parse("   ").is_err());
    assert!(CommandTemplate::from_prefix::<&str>(&[]).is_err());
    Ok(())
}
