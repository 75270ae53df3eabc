//! javac log parser.
//!
//! Turns plain-text compiler output into [`Diagnostic`] records. A
//! diagnostic starts at a header line
//!
//! ```text
//! /src/Foo.java:12: error: cannot find symbol
//! ```
//!
//! (an optional `:<column>` may follow the line number) and absorbs the
//! source-context lines javac prints after it, up to the next header:
//!
//! ```text
//!         Bar bar = new Bar();
//!         ^
//!   symbol:   class Bar
//!   location: class Foo
//! ```
//!
//! Parsing never fails. Lines that are not part of a diagnostic are skipped.

use std::iter::Peekable;
use std::path::PathBuf;
use std::str::Lines;
use std::sync::{Arc, OnceLock};

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{Diagnostic, Severity};
use crate::error::RdfError;
use crate::fs::FileSystem;

const HEADER_PATTERN: &str = r"^(?P<file>\S.*?):(?P<line>\d+):(?:(?P<column>\d+):)? (?P<severity>(?i:error|warning|warn|note|info)): ?(?P<message>.*)$";

/// Lines that end a diagnostic's context block without belonging to it.
const BOUNDARY_PATTERN: &str = r"^(?:\d+ (?:errors?|warnings?)|Note: .*|(?i:error|warning|warn|note): .*|> Task .*|FAILURE: .*|BUILD (?:SUCCESSFUL|FAILED).*)$";

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(HEADER_PATTERN).expect("javac header pattern must compile"))
}

fn boundary_regex() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY
        .get_or_init(|| Regex::new(BOUNDARY_PATTERN).expect("javac boundary pattern must compile"))
}

enum LineKind {
    Header(Diagnostic),
    /// Ends the current block and is dropped.
    Boundary,
    Other,
}

fn classify(line: &str) -> LineKind {
    if let Some(caps) = header_regex().captures(line) {
        let severity = Severity::from_keyword(&caps["severity"]);
        let line_no = caps["line"].parse::<u32>().ok();

        let diag = match (severity, line_no) {
            (Some(severity), Some(line_no)) => {
                Diagnostic::new(&caps["file"], line_no, severity, caps["message"].trim_end())
            }
            _ => None,
        };

        return match diag {
            Some(diag) => {
                let column = caps
                    .name("column")
                    .and_then(|c| c.as_str().parse::<u32>().ok())
                    .unwrap_or(0);
                LineKind::Header(diag.with_column(column))
            }
            // Looked like a header but the numbers were unusable.
            None => LineKind::Boundary,
        };
    }

    if boundary_regex().is_match(line.trim_end()) {
        LineKind::Boundary
    } else {
        LineKind::Other
    }
}

/// 1-based column of a caret marker line (`    ^`), if `line` is one.
fn caret_column(line: &str) -> Option<u32> {
    let trimmed = line.trim_end();
    let offset = trimmed.find('^')?;
    if trimmed[..offset].chars().all(char::is_whitespace) && trimmed.len() == offset + 1 {
        u32::try_from(trimmed[..offset].chars().count() + 1).ok()
    } else {
        None
    }
}

/// Lazy iterator over the diagnostics of one log.
pub struct JavacDiagnostics<'a> {
    lines: Peekable<Lines<'a>>,
}

impl<'a> JavacDiagnostics<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
        }
    }

    /// Consume continuation lines following a header.
    fn take_context(&mut self) -> Vec<&'a str> {
        let mut context = Vec::new();
        while let Some(&line) = self.lines.peek() {
            match classify(line) {
                LineKind::Other => {
                    context.push(line.trim_end());
                    self.lines.next();
                }
                LineKind::Header(_) | LineKind::Boundary => break,
            }
        }
        while context.last().is_some_and(|l| l.is_empty()) {
            context.pop();
        }
        context
    }
}

impl Iterator for JavacDiagnostics<'_> {
    type Item = Diagnostic;

    fn next(&mut self) -> Option<Diagnostic> {
        let mut diag = loop {
            if let LineKind::Header(diag) = classify(self.lines.next()?) {
                break diag;
            }
        };

        let context = self.take_context();
        if diag.column.is_none() {
            if let Some(column) = context.iter().find_map(|l| caret_column(l)) {
                diag = diag.with_column(column);
            }
        }
        for line in context {
            if !diag.message.is_empty() {
                diag.message.push('\n');
            }
            diag.message.push_str(line);
        }

        Some(diag)
    }
}

/// Parse the text of one javac log.
pub fn parse_log(text: &str) -> JavacDiagnostics<'_> {
    JavacDiagnostics::new(text)
}

/// A log file that could not be read.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: RdfError,
}

/// Diagnostics extracted from one log file.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of parsing every listed log.
#[derive(Debug, Default)]
pub struct LogParseOutcome {
    /// Parsed logs, in the order they were listed.
    pub logs: Vec<ParsedLog>,

    /// Logs that could not be opened.
    pub failures: Vec<FileFailure>,
}

impl LogParseOutcome {
    pub fn succeeded(&self) -> usize {
        self.logs.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// All diagnostics: file order, then line order within a file.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.logs.iter().flat_map(|log| log.diagnostics.iter())
    }

    pub fn into_diagnostics(self) -> impl Iterator<Item = Diagnostic> {
        self.logs.into_iter().flat_map(|log| log.diagnostics)
    }
}

/// Reads javac logs through a [`FileSystem`] and parses them.
pub struct LogParser {
    fs: Arc<dyn FileSystem>,
}

impl LogParser {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read and parse every log. Reads run concurrently; output keeps the
    /// listed order. An unreadable log is recorded and skipped.
    pub async fn parse_files(&self, paths: &[PathBuf]) -> LogParseOutcome {
        let reads = join_all(paths.iter().map(|p| self.fs.read_text(p))).await;

        let mut outcome = LogParseOutcome::default();
        for (path, read) in paths.iter().zip(reads) {
            match read {
                Ok(text) => {
                    let diagnostics: Vec<Diagnostic> = parse_log(&text).collect();
                    debug!(log = %path.display(), diagnostics = diagnostics.len(), "Parsed javac log");
                    outcome.logs.push(ParsedLog {
                        path: path.clone(),
                        diagnostics,
                    });
                }
                Err(error) => {
                    warn!(log = %path.display(), error = %error, "Failed to read javac log");
                    outcome.failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryFileSystem;

    const CANNOT_FIND_SYMBOL: &str = "\
/src/main/java/demo/Foo.java:12: error: cannot find symbol
        Bar bar = new Bar();
        ^
  symbol:   class Bar
  location: class Foo
/src/main/java/demo/Foo.java:20: warning: [deprecation] stop() in Thread has been deprecated
        t.stop();
         ^
1 error
1 warning
";

    #[test]
    fn test_single_line_diagnostic() {
        let diags: Vec<_> = parse_log("/src/Foo.java:12: error: cannot find symbol").collect();

        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.file, "/src/Foo.java");
        assert_eq!(d.line.get(), 12);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "cannot find symbol");
        assert!(d.column.is_none());
    }

    #[test]
    fn test_multi_line_diagnostics_absorb_context() {
        let diags: Vec<_> = parse_log(CANNOT_FIND_SYMBOL).collect();

        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags[0].message,
            "cannot find symbol\n        Bar bar = new Bar();\n        ^\n  symbol:   class Bar\n  location: class Foo"
        );
        assert_eq!(diags[0].column.map(|c| c.get()), Some(9));

        assert_eq!(diags[1].severity, Severity::Warning);
        assert_eq!(diags[1].line.get(), 20);
        assert_eq!(diags[1].column.map(|c| c.get()), Some(10));
        assert!(!diags[1].message.contains("1 error"), "trailer lines are not context");
        assert!(diags[1].message.ends_with('^'));
    }

    #[test]
    fn test_severity_is_case_insensitive() {
        let text = "A.java:1: ERROR: one\nB.java:2: Warning: two\nC.java:3: note: three\n";
        let sev: Vec<_> = parse_log(text).map(|d| d.severity).collect();
        assert_eq!(sev, vec![Severity::Error, Severity::Warning, Severity::Info]);
    }

    #[test]
    fn test_explicit_column_form() {
        let diags: Vec<_> = parse_log("src/Foo.kt:7:15: warning: unused variable").collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].line.get(), 7);
        assert_eq!(diags[0].column.map(|c| c.get()), Some(15));
        assert_eq!(diags[0].message, "unused variable");
    }

    #[test]
    fn test_unrecognized_lines_are_skipped() {
        let text = "\
> Task :compileJava
warning: [options] bootstrap class path not set in conjunction with -source 8
Compiling 3 files
Foo.java: error: missing line number
Foo.java:abc: error: bad line
Foo.java:4: fatal: unknown severity
";
        assert_eq!(parse_log(text).count(), 0);
    }

    #[test]
    fn test_line_zero_is_not_a_diagnostic_and_not_context() {
        let text = "A.java:5: error: real\nA.java:0: error: bogus\n    context\n";
        let diags: Vec<_> = parse_log(text).collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "real");
    }

    #[test]
    fn test_note_lines_end_context() {
        let text = "\
/src/A.java:3: warning: [unchecked] unchecked call
        list.add(x);
                ^
Note: Some input files use unchecked or unsafe operations.
Note: Recompile with -Xlint:unchecked for details.
";
        let diags: Vec<_> = parse_log(text).collect();
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].message.contains("Note:"));
        assert_eq!(diags[0].column.map(|c| c.get()), Some(17));
    }

    #[test]
    fn test_windows_paths_and_crlf() {
        let text = "C:\\work\\src\\Foo.java:12: error: cannot find symbol\r\n  symbol: class Bar\r\n";
        let diags: Vec<_> = parse_log(text).collect();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, "C:\\work\\src\\Foo.java");
        assert_eq!(diags[0].message, "cannot find symbol\n  symbol: class Bar");
    }

    #[test]
    fn test_every_header_yields_exactly_one_diagnostic() {
        let text: String = (1..=25)
            .map(|i| format!("/src/F{i}.java:{i}: error: problem {i}\n    ctx {i}\n"))
            .collect();
        let diags: Vec<_> = parse_log(&text).collect();
        assert_eq!(diags.len(), 25);
        for (i, d) in diags.iter().enumerate() {
            let n = i as u32 + 1;
            assert_eq!(d.line.get(), n);
            assert_eq!(d.file, format!("/src/F{n}.java"));
            assert_eq!(d.message, format!("problem {n}\n    ctx {n}"));
        }
    }

    #[test]
    fn test_caret_column_detection() {
        assert_eq!(caret_column("    ^"), Some(5));
        assert_eq!(caret_column("^"), Some(1));
        assert_eq!(caret_column("  ^  "), Some(3));
        assert_eq!(caret_column("  x ^"), None);
        assert_eq!(caret_column("  ^^"), None);
        assert_eq!(caret_column("no caret"), None);
    }

    #[test]
    fn test_parser_is_lazy() {
        let mut iter = parse_log(CANNOT_FIND_SYMBOL);
        let first = iter.next().expect("first diagnostic");
        assert_eq!(first.line.get(), 12);
        assert_eq!(iter.next().map(|d| d.line.get()), Some(20));
        assert!(iter.next().is_none());
    }

    #[tokio::test]
    async fn test_parse_files_keeps_order_and_records_failures() {
        let fs = Arc::new(
            MemoryFileSystem::new()
                .with_file("/logs/b.log", "/src/B.java:2: warning: b\n")
                .with_file("/logs/a.log", "/src/A.java:9: error: a1\n/src/A.java:3: error: a2\n"),
        );
        let parser = LogParser::new(fs);

        let outcome = parser
            .parse_files(&[
                PathBuf::from("/logs/a.log"),
                PathBuf::from("/logs/missing.log"),
                PathBuf::from("/logs/b.log"),
            ])
            .await;

        assert_eq!(outcome.succeeded(), 2);
        assert_eq!(outcome.failed(), 1);
        assert_eq!(outcome.failures[0].path, PathBuf::from("/logs/missing.log"));

        let order: Vec<_> = outcome.diagnostics().map(|d| d.message.as_str()).collect();
        assert_eq!(order, vec!["a1", "a2", "b"]);
    }

    #[tokio::test]
    async fn test_log_with_invalid_utf8_still_parses() {
        let fs = Arc::new(MemoryFileSystem::new().with_file(
            "/logs/javac.log",
            b"/src/A.java:1: error: first\n/src/B.java:2: warning: caf\xE9 symbol\n",
        ));
        let parser = LogParser::new(fs);

        let outcome = parser.parse_files(&[PathBuf::from("/logs/javac.log")]).await;

        assert_eq!(outcome.failed(), 0);
        let diags: Vec<_> = outcome.diagnostics().collect();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[1].severity, Severity::Warning);
        assert_eq!(diags[1].message, "caf\u{FFFD} symbol");
    }
}
