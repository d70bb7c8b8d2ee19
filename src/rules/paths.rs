// src/rules/paths.rs

//! Path helpers for rule generation
//!
//! Paths in the generated BUCK file are plain `/`-separated strings relative
//! to the switch root. They are built and normalized lexically; only
//! `check_file` touches the filesystem.

use std::path::{Component, Path};
use tracing::warn;

/// Portion of `directory` after the last component equal to `switch_name`
///
/// `/store/myswitch/lib/foo` with `myswitch` gives `lib/foo`. Returns `None`
/// when no component matches.
pub fn relative_to_switch(directory: &str, switch_name: &str) -> Option<String> {
    let components: Vec<_> = Path::new(directory).components().collect();
    let index = components
        .iter()
        .rposition(|component| matches!(component, Component::Normal(name) if *name == switch_name))?;

    let rest: Vec<String> = components[index + 1..]
        .iter()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(rest.join("/"))
}

/// Join two relative paths with `/`, skipping empty sides
pub fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Lexically normalize a relative path
///
/// Removes `.` and empty components and folds `dir/..`. Leading `..` that
/// cannot be folded are kept. An empty result is `.`.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Normalized `target_dir/file` if it exists under `switch`
pub fn find_file(switch: &Path, target_dir: &str, file: &str) -> Option<String> {
    let path = normalize(&join(target_dir, file));
    switch.join(&path).exists().then_some(path)
}

/// Like `find_file`, logging when the file is missing
pub fn check_file(switch: &Path, target_dir: &str, file: &str) -> Option<String> {
    let found = find_file(switch, target_dir, file);
    if found.is_none() {
        warn!(
            "Can't find file {} in {}",
            file,
            switch.join(target_dir).display()
        );
    }
    found
}
