// src/watch/path_utils.rs

//! Lexical path helpers for the glob resolver.
//!
//! Paths are handled as `/`-separated strings because the resolver's output is
//! compared by exact string equality (include minus exclude). Nothing here
//! touches the filesystem.

/// True if `pattern` contains any glob metacharacter.
pub fn has_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '\\'])
}

/// Lexically normalise a path: collapse repeated separators, drop `.`
/// components, resolve `..` against preceding components and strip any
/// trailing separator. The empty path becomes `"."`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join a directory and an entry name, cleaning the result.
///
/// `join(".", "src") == "src"`, so walks rooted at the current directory
/// yield paths without a leading `./`.
pub fn join(dir: &str, name: &str) -> String {
    clean(&format!("{dir}/{name}"))
}

/// Split a pattern into its directory part and final component.
///
/// The directory part is returned without its trailing separator; an empty
/// directory part becomes `"."` and the root stays `"/"`.
pub fn split_last(pattern: &str) -> (String, &str) {
    match pattern.rfind('/') {
        Some(0) => ("/".to_string(), &pattern[1..]),
        Some(idx) => {
            let dir = pattern[..idx].trim_end_matches('/');
            let dir = if dir.is_empty() { "/" } else { dir };
            (dir.to_string(), &pattern[idx + 1..])
        }
        None => (".".to_string(), pattern),
    }
}
