use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use archlens_core::{ArchLensError, Result, Verdict, VerifyConfig};

/// Section headings a candidate answer must contain exactly once, each as a
/// standalone line.
pub const REQUIRED_HEADINGS: [&str; 5] = [
    "Smell:",
    "Evidence:",
    "Refactoring:",
    "Trade-offs / Risks:",
    "Self-check:",
];

/// Marker that licenses a package token absent from the evidence.
pub const NEW_MARKER: &str = "[NEW]";

// Grammar shared with the evidence formatter. The formatter and these
// patterns must agree byte-for-byte on line prefixes.
static EVIDENCE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:CYCLE|EDGE|MAGNET|OVERSIZED)_\d+\b").unwrap());

static EDGE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*EDGE_\d+:\s*(.+?)\s*cycle=CYCLE_\d+\s*$").unwrap());

static MAGNET_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*MAGNET_\d+:\s*([a-zA-Z0-9_.]+)\s+fin=").unwrap());

static OVERSIZED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*OVERSIZED_\d+:\s*([a-zA-Z0-9_.]+)\s+total_loc=").unwrap());

static BREAK_EDGE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*-\s*Break edge:").unwrap());

static EDGE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bEDGE_\d+\b").unwrap());

static CYCLE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bCYCLE_\d+\b").unwrap());

/// Collect every ID-grammar token present in the evidence block.
pub fn collect_valid_ids(evidence: &str) -> HashSet<String> {
    EVIDENCE_ID_RE
        .find_iter(evidence)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Collect the package names the evidence grounds: both endpoints of every
/// EDGE line, each MAGNET line's package, each OVERSIZED line's package.
pub fn collect_allowed_packages(evidence: &str) -> HashSet<String> {
    let mut allowed = HashSet::new();

    for line in evidence.lines() {
        if let Some(caps) = EDGE_LINE_RE.captures(line) {
            let arrow = caps[1].trim();
            let parts: Vec<&str> = arrow.split("->").collect();
            if parts.len() == 2 {
                allowed.insert(parts[0].trim().to_string());
                allowed.insert(parts[1].trim().to_string());
            }
            continue;
        }
        if let Some(caps) = MAGNET_LINE_RE.captures(line) {
            allowed.insert(caps[1].trim().to_string());
            continue;
        }
        if let Some(caps) = OVERSIZED_LINE_RE.captures(line) {
            allowed.insert(caps[1].trim().to_string());
        }
    }

    allowed
}

/// Checks a free-text recommendation against the evidence block it must be
/// grounded in. Rules run in a fixed order and the first failure
/// short-circuits with a specific reason.
pub struct ResponseVerifier {
    package_token_re: Regex,
}

impl ResponseVerifier {
    pub fn new(config: &VerifyConfig) -> Result<Self> {
        let pattern = format!(
            r"{}(?:\.[A-Za-z0-9_]+)+",
            regex::escape(&config.package_root)
        );
        let package_token_re = Regex::new(&pattern)
            .map_err(|e| ArchLensError::Config(format!("invalid package_root: {}", e)))?;
        Ok(Self { package_token_re })
    }

    pub fn verify(&self, answer: &str, evidence: &str) -> Verdict {
        if answer.trim().is_empty() {
            return Verdict::reject("Empty answer.");
        }

        if let Err(reason) = check_headings(answer) {
            return Verdict::reject(reason);
        }

        let valid_ids = collect_valid_ids(evidence);

        if let Err(reason) = check_evidence_section(answer, &valid_ids) {
            return Verdict::reject(reason);
        }

        if let Err(reason) = check_break_edge(answer, &valid_ids) {
            return Verdict::reject(reason);
        }

        let allowed = collect_allowed_packages(evidence);
        if let Err(reason) = self.check_package_tokens(answer, &allowed) {
            return Verdict::reject(reason);
        }

        Verdict::accept()
    }

    /// Every package-shaped token must be grounded in evidence or appear on
    /// a line carrying the `[NEW]` marker. Marking is required at first
    /// mention: an unmarked first occurrence is fatal even if a later line
    /// marks the same token.
    fn check_package_tokens(
        &self,
        answer: &str,
        allowed: &HashSet<String>,
    ) -> std::result::Result<(), String> {
        let mut seen: HashSet<&str> = HashSet::new();

        for line in answer.lines() {
            let is_new = line.contains(NEW_MARKER);
            for m in self.package_token_re.find_iter(line) {
                let token = m.as_str();
                if !allowed.contains(token) && !is_new && !seen.contains(token) {
                    return Err(format!(
                        "Unknown package not in evidence (mark [NEW] if intended): {}",
                        token
                    ));
                }
                seen.insert(token);
            }
        }

        Ok(())
    }
}

fn check_headings(answer: &str) -> std::result::Result<(), String> {
    for heading in REQUIRED_HEADINGS {
        let count = answer.lines().filter(|l| l.trim() == heading).count();
        match count {
            0 => return Err(format!("Missing heading: {}", heading)),
            1 => {}
            _ => return Err(format!("Duplicate heading: {}", heading)),
        }
    }
    Ok(())
}

/// Return the lines strictly between the `Evidence:` and `Refactoring:`
/// headings (to the end of the text when `Refactoring:` precedes
/// `Evidence:`). Callers run this only after heading uniqueness held.
fn evidence_section(answer: &str) -> String {
    let lines: Vec<&str> = answer.lines().collect();
    let idx_ev = lines.iter().position(|l| l.trim() == "Evidence:");
    let idx_ref = lines.iter().position(|l| l.trim() == "Refactoring:");

    match (idx_ev, idx_ref) {
        (Some(ev), Some(rf)) if rf > ev => lines[ev + 1..rf].join("\n"),
        (Some(ev), _) => lines[ev + 1..].join("\n"),
        (None, _) => String::new(),
    }
}

fn check_evidence_section(
    answer: &str,
    valid_ids: &HashSet<String>,
) -> std::result::Result<(), String> {
    let section = evidence_section(answer);

    if !CYCLE_ID_RE.is_match(&section) {
        return Err("Evidence must reference at least one CYCLE_k ID from the evidence block."
            .to_string());
    }

    for m in EVIDENCE_ID_RE.find_iter(&section) {
        if !valid_ids.contains(m.as_str()) {
            return Err(format!("Evidence references unknown ID: {}", m.as_str()));
        }
    }

    Ok(())
}

fn check_break_edge(
    answer: &str,
    valid_ids: &HashSet<String>,
) -> std::result::Result<(), String> {
    let lines: Vec<&str> = answer.lines().collect();
    let idx_ref = lines
        .iter()
        .position(|l| l.trim() == "Refactoring:")
        .unwrap_or(0);

    let break_lines: Vec<&str> = lines[idx_ref..]
        .iter()
        .copied()
        .filter(|l| BREAK_EDGE_LINE_RE.is_match(l))
        .collect();

    let break_line = match break_lines.as_slice() {
        [] => return Err("Missing 'Break edge:' line.".to_string()),
        [one] => *one,
        _ => return Err("Multiple 'Break edge:' lines; expected exactly one.".to_string()),
    };

    let edge_ids: Vec<&str> = EDGE_ID_RE
        .find_iter(break_line)
        .map(|m| m.as_str())
        .collect();
    if edge_ids.len() != 1 {
        return Err("Break edge must reference exactly one EDGE_k ID.".to_string());
    }

    if !valid_ids.contains(edge_ids[0]) {
        return Err(format!(
            "Break edge references unknown EDGE id: {}",
            edge_ids[0]
        ));
    }

    Ok(())
}
