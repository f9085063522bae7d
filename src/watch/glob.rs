// src/watch/glob.rs

//! Glob resolver: turns user patterns into concrete path lists.
//!
//! Supported syntax:
//! - a single trailing brace group, `src/*.{rs,toml}`
//! - shell-style component matching (`*`, `?`, `[...]`), never crossing a
//!   `/` implicitly; any other `{` or `}` is a literal character
//! - `**` as a recursive segment, expanded by descendant enumeration
//!
//! Every walk after a segment enumerates all descendants of each match,
//! including after the final segment. A pattern whose last segment matches a
//! directory therefore also yields everything below that directory.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, trace};

use crate::errors::{Result, StagError};
use crate::fs::FileSystem;
use crate::watch::path_utils::{clean, has_meta, join, split_last};

/// Expand a trailing `{a,b,c}` group into one pattern per alternative.
///
/// Only the last brace group is expanded, and only when the pattern ends with
/// `}`. Alternatives are trimmed; nested braces are not understood.
pub fn expand_extension(pattern: &str) -> Vec<String> {
    if !pattern.ends_with('}') {
        return vec![pattern.to_string()];
    }

    let Some(open) = pattern.rfind('{') else {
        return vec![pattern.to_string()];
    };

    let stem = &pattern[..open];
    pattern[open + 1..pattern.len() - 1]
        .split(',')
        .map(|alt| format!("{stem}{}", alt.trim()))
        .collect()
}

/// Expand one pattern (no brace group) into matching paths.
///
/// Without `**` this is plain component-wise matching. With `**` the pattern
/// is split on the literal `**`; starting from the empty prefix, each segment
/// is appended to every current match, matched, and every result is replaced
/// by itself plus all of its descendants. Results are sorted and unique.
pub fn expand_glob(fs: &dyn FileSystem, pattern: &str) -> Result<Vec<String>> {
    let segments: Vec<&str> = pattern.split("**").collect();

    if segments.len() == 1 {
        return glob_flat(fs, pattern);
    }

    let mut matches = vec![String::new()];

    for segment in segments {
        let mut found = BTreeSet::new();

        for prefix in &matches {
            let candidate = clean(&format!("{prefix}{segment}"));
            for child in glob_flat(fs, &candidate)? {
                collect_descendants(fs, &child, &mut found)?;
            }
        }

        trace!(segment, count = found.len(), "expanded recursive glob segment");
        matches = found.into_iter().collect();
    }

    Ok(matches)
}

/// Expand every pattern's brace group, then every resulting glob, and
/// concatenate the results in pattern order.
///
/// A pattern that matches nothing contributes nothing. Any filesystem failure
/// aborts the whole resolution.
pub fn globs<S: AsRef<str>>(fs: &dyn FileSystem, patterns: &[S]) -> Result<Vec<String>> {
    let expanded: Vec<String> = patterns
        .iter()
        .flat_map(|p| expand_extension(p.as_ref()))
        .collect();

    let mut paths = Vec::new();
    for pattern in &expanded {
        let matches = expand_glob(fs, pattern)?;
        debug!(pattern = %pattern, count = matches.len(), "glob resolved");
        paths.extend(matches);
    }

    Ok(paths)
}

/// Remove from `includes` every path that appears verbatim in `excludes`.
/// Order of the remaining paths is preserved.
pub fn subtract(includes: Vec<String>, excludes: &[String]) -> Vec<String> {
    let excluded: HashSet<&str> = excludes.iter().map(String::as_str).collect();
    includes
        .into_iter()
        .filter(|path| !excluded.contains(path.as_str()))
        .collect()
}

/// Resolve include and exclude pattern lists into a deduplicated watch set.
pub fn resolve_watch_set<S: AsRef<str>>(
    fs: &dyn FileSystem,
    includes: &[S],
    excludes: &[S],
) -> Result<Vec<String>> {
    let included = globs(fs, includes)?;
    let excluded = globs(fs, excludes)?;

    let mut seen = HashSet::new();
    let watch_set: Vec<String> = subtract(included, &excluded)
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect();

    debug!(
        count = watch_set.len(),
        excluded = excluded.len(),
        "watch set resolved"
    );
    Ok(watch_set)
}

/// Non-recursive glob: `*`, `?` and classes match within one component.
///
/// A pattern without metacharacters matches itself if it exists. Otherwise
/// the directory part is resolved first (recursively, if it has
/// metacharacters itself) and the final component is matched against each
/// resulting directory's entries.
fn glob_flat(fs: &dyn FileSystem, pattern: &str) -> Result<Vec<String>> {
    if !has_meta(pattern) {
        return Ok(if fs.exists(Path::new(pattern)) {
            vec![pattern.to_string()]
        } else {
            Vec::new()
        });
    }

    let (dir, file) = split_last(pattern);
    let matcher = component_matcher(pattern, file)?;

    if !has_meta(&dir) {
        return glob_dir(fs, &dir, &matcher);
    }

    let mut matches = Vec::new();
    for parent in glob_flat(fs, &dir)? {
        matches.extend(glob_dir(fs, &parent, &matcher)?);
    }
    Ok(matches)
}

fn glob_dir(fs: &dyn FileSystem, dir: &str, matcher: &GlobMatcher) -> Result<Vec<String>> {
    if !fs.is_dir(Path::new(dir)) {
        return Ok(Vec::new());
    }

    let mut names = entry_names(fs, dir)?;
    names.retain(|name| matcher.is_match(name));
    Ok(names.iter().map(|name| join(dir, name)).collect())
}

/// Add `root` and, if it is a real directory, everything below it.
fn collect_descendants(
    fs: &dyn FileSystem,
    root: &str,
    found: &mut BTreeSet<String>,
) -> Result<()> {
    let mut stack = vec![root.to_string()];

    while let Some(path) = stack.pop() {
        let p = Path::new(&path);
        let descend = fs.is_dir(p) && !fs.is_symlink(p);
        if descend {
            for name in entry_names(fs, &path)? {
                stack.push(join(&path, &name));
            }
        }
        found.insert(path);
    }

    Ok(())
}

fn entry_names(fs: &dyn FileSystem, dir: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs
        .read_dir(Path::new(dir))?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    Ok(names)
}

fn component_matcher(pattern: &str, component: &str) -> Result<GlobMatcher> {
    let component = escape_braces(component);
    let glob = GlobBuilder::new(&component)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|source| StagError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher())
}

/// Escape `{` and `}` so globset does not read them as alternation.
fn escape_braces(component: &str) -> Cow<'_, str> {
    if !component.contains(['{', '}']) {
        return Cow::Borrowed(component);
    }

    let mut out = String::with_capacity(component.len() + 4);
    let mut escaped = false;
    let mut in_class = false;
    for c in component.chars() {
        if !escaped {
            match c {
                '{' | '}' if !in_class => out.push('\\'),
                '[' => in_class = true,
                ']' => in_class = false,
                _ => {}
            }
        }
        escaped = !escaped && c == '\\';
        out.push(c);
    }
    Cow::Owned(out)
}
