use std::path::Path;

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use archlens_core::{FileRecord, Result};

use crate::java::parse_java_source;

/// Scan a repository for production Java sources and extract a record per
/// file. Test sources under `src/test/` are excluded, matching the analysis
/// target of the dependency graph. Unreadable files are skipped with a
/// warning; they never become records.
pub fn scan_repo_java(repo_path: &Path) -> Result<Vec<FileRecord>> {
    info!("Scanning Java sources under {:?}", repo_path);

    let walker = WalkBuilder::new(repo_path)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .build();

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!("Walker error: {}", e);
                continue;
            }
        };

        let path = dent.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }

        let rel_path = path
            .strip_prefix(repo_path)
            .unwrap_or(path)
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        if rel_path.starts_with("src/test/") {
            debug!("Excluding test source {}", rel_path);
            continue;
        }

        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping unreadable file {}: {}", rel_path, e);
                skipped += 1;
                continue;
            }
        };

        records.push(parse_java_source(&rel_path, &text));
    }

    // Deterministic record order regardless of directory traversal order.
    records.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        "Extraction complete: {} files, {} skipped",
        records.len(),
        skipped
    );
    Ok(records)
}

/// Repo-wide Java line count: total LOC and number of files scanned.
pub fn count_repo_loc(repo_path: &Path) -> Result<(usize, usize)> {
    let records = scan_repo_java(repo_path)?;
    let total = records.iter().map(|r| r.loc).sum();
    Ok((total, records.len()))
}
