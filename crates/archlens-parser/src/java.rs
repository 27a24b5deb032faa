use once_cell::sync::Lazy;
use regex::Regex;

use archlens_core::FileRecord;

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([a-zA-Z0-9_.]+)\s*;").unwrap());

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([a-zA-Z0-9_.]+)\s*;").unwrap());

/// Count non-blank lines that are not `//` comments.
pub fn count_loc(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with("//"))
        .count()
}

/// Extract a [`FileRecord`] from raw Java source. A file with no package
/// declaration yields an empty package; it still contributes its line count.
pub fn parse_java_source(rel_path: &str, text: &str) -> FileRecord {
    let package = PACKAGE_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let imports = IMPORT_RE
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();

    FileRecord::new(rel_path, package, imports, count_loc(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
package net.lingala.zip4j.io;

import net.lingala.zip4j.util.Raw;
import net.lingala.zip4j.model.FileHeader;
import java.io.IOException;

// stream wrapper
public class ZipInputStream {
    private int count;
}
"#;

    #[test]
    fn extracts_package_and_imports_in_order() {
        let record = parse_java_source("src/ZipInputStream.java", SAMPLE);
        assert_eq!(record.package, "net.lingala.zip4j.io");
        assert_eq!(
            record.imports,
            vec![
                "net.lingala.zip4j.util.Raw",
                "net.lingala.zip4j.model.FileHeader",
                "java.io.IOException",
            ]
        );
    }

    #[test]
    fn loc_skips_blanks_and_line_comments() {
        // package + 3 imports + class line + field + closing brace = 7
        let record = parse_java_source("a.java", SAMPLE);
        assert_eq!(record.loc, 7);
    }

    #[test]
    fn missing_package_yields_empty_string() {
        let record = parse_java_source("b.java", "public class Naked {}\n");
        assert_eq!(record.package, "");
        assert!(record.imports.is_empty());
        assert_eq!(record.loc, 1);
    }

    #[test]
    fn indented_declarations_still_match() {
        let record = parse_java_source("c.java", "  package a.b;\n  import a.c.D;\n");
        assert_eq!(record.package, "a.b");
        assert_eq!(record.imports, vec!["a.c.D"]);
    }

    #[test]
    fn wildcard_imports_are_ignored_by_the_grammar() {
        // `a.b.*` contains `*`, which the identifier grammar rejects.
        let record = parse_java_source("d.java", "package x;\nimport a.b.*;\n");
        assert!(record.imports.is_empty());
    }
}
