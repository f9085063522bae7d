// tests/glob_resolver.rs

use std::error::Error;

use stag::errors::StagError;
use stag::fs::mock::MockFileSystem;
use stag::watch::{expand_extension, expand_glob, globs, resolve_watch_set, subtract};

type TestResult = Result<(), Box<dyn Error>>;

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("go.mod", "module demo");
    fs.add_file("src/a.go", "package a");
    fs.add_file("src/b.txt", "notes");
    fs.add_file("src/sub/c.go", "package sub");
    fs.add_file("src/sub/deep/d.go", "package deep");
    fs.add_file("src/sub/deep/e.md", "# e");
    fs.add_file("vendor/x/y.go", "package y");
    fs
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn trailing_brace_group_is_expanded() {
    assert_eq!(expand_extension("src/*.{go,md}"), vec!["src/*.go", "src/*.md"]);
    assert_eq!(expand_extension("src/*.{ go , md }"), vec!["src/*.go", "src/*.md"]);
    assert_eq!(expand_extension("src/*.{go}"), vec!["src/*.go"]);
    assert_eq!(expand_extension("src/*.go"), vec!["src/*.go"]);
}

#[test]
fn only_the_last_brace_group_is_expanded() {
    assert_eq!(expand_extension("{a,b}/x.{c,d}"), vec!["{a,b}/x.c", "{a,b}/x.d"]);
    assert_eq!(expand_extension("{a,b}/file"), vec!["{a,b}/file"]);
}

#[test]
fn flat_glob_matches_one_component() -> TestResult {
    let fs = project();
    assert_eq!(expand_glob(&fs, "src/*.go")?, strings(&["src/a.go"]));
    assert_eq!(expand_glob(&fs, "src/?.txt")?, strings(&["src/b.txt"]));
    assert_eq!(expand_glob(&fs, "*/*.go")?, strings(&["src/a.go"]));
    assert_eq!(expand_glob(&fs, "src/[ab].*")?, strings(&["src/a.go", "src/b.txt"]));
    Ok(())
}

#[test]
fn braces_inside_a_component_are_literal() -> TestResult {
    let fs = project();
    assert!(expand_glob(&fs, "src/{a,b}*")?.is_empty());
    assert!(expand_glob(&fs, "src/{a,b}.*")?.is_empty());

    fs.add_file("src/{a,b}.go", "package odd");
    assert_eq!(expand_glob(&fs, "src/{a,b}*.go")?, strings(&["src/{a,b}.go"]));
    assert_eq!(expand_glob(&fs, "src/{a,b}.go")?, strings(&["src/{a,b}.go"]));
    assert_eq!(expand_glob(&fs, "src/[{]a,b}.go")?, strings(&["src/{a,b}.go"]));
    Ok(())
}

#[test]
fn literal_pattern_matches_only_if_present() -> TestResult {
    let fs = project();
    assert_eq!(expand_glob(&fs, "go.mod")?, strings(&["go.mod"]));
    assert_eq!(expand_glob(&fs, "src")?, strings(&["src"]));
    assert!(expand_glob(&fs, "missing.txt")?.is_empty());
    Ok(())
}

#[test]
fn recursive_glob_includes_files_directly_below_the_prefix() -> TestResult {
    let fs = project();
    assert_eq!(
        expand_glob(&fs, "src/**/*.go")?,
        strings(&["src/a.go", "src/sub/c.go", "src/sub/deep/d.go"])
    );
    Ok(())
}

#[test]
fn recursive_glob_from_the_current_directory() -> TestResult {
    let fs = project();
    assert_eq!(
        expand_glob(&fs, "**/*.md")?,
        strings(&["src/sub/deep/e.md"])
    );
    Ok(())
}

#[test]
fn trailing_double_star_yields_everything_below() -> TestResult {
    let fs = project();
    assert_eq!(
        expand_glob(&fs, "src/sub/**")?,
        strings(&[
            "src/sub",
            "src/sub/c.go",
            "src/sub/deep",
            "src/sub/deep/d.go",
            "src/sub/deep/e.md",
        ])
    );
    Ok(())
}

#[test]
fn a_last_segment_matching_a_directory_pulls_in_its_contents() -> TestResult {
    let fs = project();
    assert_eq!(
        expand_glob(&fs, "src/**/dee?")?,
        strings(&["src/sub/deep", "src/sub/deep/d.go", "src/sub/deep/e.md"])
    );
    Ok(())
}

#[test]
fn no_match_is_empty_not_an_error() -> TestResult {
    let fs = project();
    assert!(expand_glob(&fs, "docs/**/*.md")?.is_empty());
    assert!(expand_glob(&fs, "src/*.rs")?.is_empty());
    Ok(())
}

#[test]
fn unreadable_directory_aborts_resolution() {
    let fs = project();
    fs.deny("src/sub/deep");

    let err = expand_glob(&fs, "src/**/*.go").unwrap_err();
    match err {
        StagError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn malformed_pattern_is_rejected() {
    let fs = project();
    let err = expand_glob(&fs, "src/[a-.go").unwrap_err();
    assert!(matches!(err, StagError::Pattern { ref pattern, .. } if pattern == "src/[a-.go"));
}

#[test]
fn globs_concatenates_in_pattern_order() -> TestResult {
    let fs = project();
    let paths = globs(&fs, &["src/*.txt", "src/**/*.{md,go}"])?;
    assert_eq!(
        paths,
        strings(&[
            "src/b.txt",
            "src/sub/deep/e.md",
            "src/a.go",
            "src/sub/c.go",
            "src/sub/deep/d.go",
        ])
    );
    Ok(())
}

#[test]
fn subtract_is_exact_string_difference() {
    let includes = strings(&["src/a.go", "./src/a.go", "src/b.go", "src/c.go"]);
    let excludes = strings(&["src/a.go", "src/zzz.go"]);
    assert_eq!(
        subtract(includes, &excludes),
        strings(&["./src/a.go", "src/b.go", "src/c.go"])
    );
}

#[test]
fn watch_set_excludes_and_deduplicates() -> TestResult {
    let fs = project();
    let set = resolve_watch_set(
        &fs,
        &["**/*.go", "src/*.go"],
        &["vendor/**"],
    )?;
    assert_eq!(set, strings(&["src/a.go", "src/sub/c.go", "src/sub/deep/d.go"]));
    Ok(())
}

#[test]
fn empty_includes_give_an_empty_watch_set() -> TestResult {
    let fs = project();
    let none: &[&str] = &[];
    assert!(resolve_watch_set(&fs, none, &["**"])?.is_empty());
    Ok(())
}
