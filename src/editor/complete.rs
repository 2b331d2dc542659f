use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::expand_home;

/// The run of non-space characters ending at `cursor`.
pub fn completion_prefix(chars: &[char], cursor: usize) -> String {
    let before = &chars[..cursor.min(chars.len())];
    let start = before
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |i| i + 1);
    before[start..].iter().collect()
}

/// The text to insert after `prefix`, when exactly one directory entry
/// completes it. A prefix containing `/` completes inside that directory,
/// relative to `cwd` unless absolute.
pub fn complete(prefix: &str, cwd: &Path) -> Option<String> {
    let (dir, stem) = match prefix.rfind('/') {
        Some(i) => (resolve_dir(&prefix[..=i], cwd), &prefix[i + 1..]),
        None => (cwd.to_path_buf(), prefix),
    };
    if stem.is_empty() {
        return None;
    }

    let mut matches = fs::read_dir(&dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(stem));

    let only = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(only[stem.len()..].to_string())
}

fn resolve_dir(dir: &str, cwd: &Path) -> PathBuf {
    if dir.starts_with('~') {
        expand_home(dir)
    } else {
        cwd.join(dir)
    }
}
