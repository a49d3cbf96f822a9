use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Loads shell history as a recency-first, de-duplicated candidate list.
///
/// An unreadable or missing file is not an error: the picker still starts,
/// just with nothing to pick from.
pub fn load_history(path: &Path) -> Vec<String> {
    match fs::read(path) {
        Ok(bytes) => {
            let candidates = parse_history(&String::from_utf8_lossy(&bytes));
            tracing::info!(
                path = %path.display(),
                count = candidates.len(),
                "history loaded"
            );
            candidates
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "history unreadable");
            Vec::new()
        }
    }
}

pub fn parse_history(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.lines()
        .rev()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}
