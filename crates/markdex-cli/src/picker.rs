//! Fuzzy selection through an external `fzf`-compatible process.
//!
//! Each bookmark becomes one tab-separated line on the picker's stdin:
//! `index  short-hash  title  tags  description`. The picker echoes the
//! chosen lines on stdout and the leading index maps them back.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use anyhow::{bail, Context, Result};
use tracing::debug;

use markdex_core::{Bookmark, FilterQuery, MarkdexError, MarkdexResult};

use crate::display::{sanitize_field, truncate, truncate_ascii};
use crate::library::Library;

pub const DEFAULT_PROGRAM: &str = "fzf";
const INSTALL_HINT: &str = "install: https://github.com/junegunn/fzf";

/// fzf exit status when nothing matched.
pub const EXIT_NO_MATCH: i32 = 1;
/// fzf exit status when the user pressed Esc / Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

const TITLE_WIDTH: usize = 40;
const DESCRIPTION_LIMIT: usize = 300;
const PREVIEW: &str = "echo TITLE: {3}; echo TAGS: {4}; echo HASH: {2}; echo; echo DESCRIPTION:; echo {5}";

/// Render the candidate line for `bookmark` at position `index`.
pub fn render_line(index: usize, bookmark: &Bookmark) -> String {
    let title = sanitize_field(&truncate(&bookmark.title, TITLE_WIDTH));
    format!(
        "{index}\t{}\t{title:<width$}\t{}\t{}",
        sanitize_field(bookmark.short_hash()),
        sanitize_field(&bookmark.tags.join(",")),
        sanitize_field(&truncate_ascii(&bookmark.description, DESCRIPTION_LIMIT)),
        width = TITLE_WIDTH,
    )
}

pub fn render_lines(items: &[Bookmark]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, b)| render_line(i, b))
        .collect()
}

/// Index encoded in the first column of a picker output line, if it is in range.
pub fn parse_index(line: &str, len: usize) -> Option<usize> {
    let field = line.split('\t').next()?;
    let idx: usize = field.trim().parse().ok()?;
    (idx < len).then_some(idx)
}

#[derive(Debug, Default, Clone)]
pub struct PickOptions {
    /// Seeds the fuzzy filter (client-side only).
    pub initial_query: Option<String>,
    pub multi: bool,
}

/// Command-line arguments for fzf.
pub fn fzf_args(options: &PickOptions) -> Vec<String> {
    let mut args: Vec<String> = [
        "--with-nth", "2,3,4", "--delimiter", "\t", "--ansi", "--prompt", "markdex> ",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if let Some(q) = options.initial_query.as_deref().filter(|q| !q.is_empty()) {
        args.push("--query".into());
        args.push(q.into());
    }
    if options.multi {
        args.push("--multi".into());
    }
    args.push("--preview".into());
    args.push(PREVIEW.into());
    args
}

pub struct Picker {
    program: PathBuf,
    args: Vec<String>,
}

impl Picker {
    /// Resolve `program` on PATH and prepare it with fzf arguments.
    pub fn locate(program: &str, options: &PickOptions) -> MarkdexResult<Self> {
        let path = which::which(program).map_err(|_| MarkdexError::ToolMissing {
            tool: program.to_string(),
            hint: INSTALL_HINT.into(),
        })?;
        Ok(Self::with_args(path, fzf_args(options)))
    }

    pub fn with_args(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Feed `lines` to the picker and return the selected indices in output
    /// order. Indices at or beyond `len` are dropped. A "no match" or
    /// "interrupted" exit yields an empty selection.
    pub fn select(&self, lines: &[String], len: usize) -> Result<Vec<usize>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        let stdin = child.stdin.take().context("picker stdin not captured")?;
        let stdout = child.stdout.take().context("picker stdout not captured")?;

        // The picker may write before it has read everything, so feeding and
        // draining run concurrently and are joined before the exit status.
        let drained = thread::scope(|scope| {
            let feeder = scope.spawn(move || feed(stdin, lines));
            let drained = drain(stdout, len);
            match feeder.join() {
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                    debug!("picker input closed early: {e}");
                }
                Ok(_) => {}
                Err(_) => debug!("picker feeder panicked"),
            }
            drained
        });

        // Reap the child before surfacing a read error.
        let status = child.wait().context("waiting for picker")?;
        debug!("picker exited with {status}");
        let selected = drained.context("reading picker output")?;
        match status.code() {
            Some(0) => Ok(selected),
            Some(EXIT_NO_MATCH) | Some(EXIT_INTERRUPTED) => Ok(Vec::new()),
            _ => bail!("{} exited with {status}", self.program.display()),
        }
    }
}

/// Retrieve bookmarks for `filter`, let the user choose, and record usage
/// for every chosen bookmark. Returns the chosen bookmarks in picker order,
/// or `None` when there was nothing to pick from. A cancelled picker gives
/// an empty vector.
pub fn pick(
    library: &Library,
    picker: &Picker,
    filter: &FilterQuery,
    no_cache: bool,
    user_id: &str,
) -> Result<Option<Vec<Bookmark>>> {
    let items = library.list(filter, no_cache)?;
    if items.is_empty() {
        return Ok(None);
    }
    let selected = picker.select(&render_lines(&items), items.len())?;
    let chosen: Vec<Bookmark> = selected.into_iter().map(|i| items[i].clone()).collect();
    for bookmark in &chosen {
        library.record_usage(bookmark, user_id);
    }
    Ok(Some(chosen))
}

fn feed(stdin: ChildStdin, lines: &[String]) -> io::Result<()> {
    let mut writer = BufWriter::new(stdin);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
    // dropping the writer closes stdin
}

fn drain(stdout: impl io::Read, len: usize) -> io::Result<Vec<usize>> {
    let mut selected = Vec::new();
    for line in BufReader::new(stdout).lines() {
        if let Some(idx) = parse_index(&line?, len) {
            selected.push(idx);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DiskCache, DEFAULT_TTL};
    use crate::library::tests::FakeSource;

    fn bookmark(title: &str, hash: &str, tags: &[&str], description: &str) -> Bookmark {
        let mut b = Bookmark::new(title, "https://example.com");
        b.hash = hash.into();
        b.tags = tags.iter().map(|t| t.to_string()).collect();
        b.description = description.into();
        b
    }

    #[test]
    fn test_render_line_columns() {
        let b = bookmark("Rust Book", "abcdef0123", &["rust", "docs"], "The\tbook");
        let line = render_line(3, &b);
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 5);
        assert_eq!(cols[0], "3");
        assert_eq!(cols[1], "abcdef0");
        assert_eq!(cols[2].chars().count(), 40);
        assert_eq!(cols[2].trim_end(), "Rust Book");
        assert_eq!(cols[3], "rust,docs");
        assert_eq!(cols[4], "The book");
    }

    #[test]
    fn test_render_line_truncates_long_fields() {
        let b = bookmark(&"t".repeat(60), "", &[], &"d".repeat(400));
        let line = render_line(0, &b);
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols[2].chars().count(), 40);
        assert!(cols[2].ends_with('…'));
        assert_eq!(cols[4].chars().count(), 300);
        assert!(cols[4].ends_with("..."));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("2\tabc\ttitle", 5), Some(2));
        assert_eq!(parse_index("5\tabc", 5), None);
        assert_eq!(parse_index("-1\tabc", 5), None);
        assert_eq!(parse_index("garbage", 5), None);
        assert_eq!(parse_index("", 5), None);
    }

    #[test]
    fn test_fzf_args() {
        let args = fzf_args(&PickOptions {
            initial_query: Some("rust".into()),
            multi: true,
        });
        assert!(args.windows(2).any(|w| w[0] == "--query" && w[1] == "rust"));
        assert!(args.contains(&"--multi".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--with-nth" && w[1] == "2,3,4"));

        let args = fzf_args(&PickOptions::default());
        assert!(!args.contains(&"--query".to_string()));
        assert!(!args.contains(&"--multi".to_string()));
    }

    #[test]
    fn test_locate_missing_tool() {
        let err = Picker::locate("definitely-not-a-real-picker-binary", &PickOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, MarkdexError::ToolMissing { .. }));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Picker {
        Picker::with_args(PathBuf::from("sh"), vec!["-c".into(), script.into()])
    }

    #[cfg(unix)]
    #[test]
    fn test_select_echo_all() {
        let items = vec![bookmark("a", "h1", &[], ""), bookmark("b", "h2", &[], "")];
        let picker = Picker::with_args(PathBuf::from("cat"), Vec::new());
        let selected = picker.select(&render_lines(&items), items.len()).unwrap();
        assert_eq!(selected, vec![0, 1]);
    }

    #[cfg(unix)]
    #[test]
    fn test_select_keeps_output_order_and_drops_out_of_range() {
        let picker = sh("cat >/dev/null; printf '2\\tx\\n9\\ty\\n0\\tz\\n'");
        let lines: Vec<String> = (0..3).map(|i| format!("{i}\tline")).collect();
        assert_eq!(picker.select(&lines, 3).unwrap(), vec![2, 0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_select_large_input_does_not_deadlock() {
        let items: Vec<Bookmark> = (0..20_000)
            .map(|i| bookmark(&format!("bookmark {i}"), "abcdef0", &["tag"], &"d".repeat(80)))
            .collect();
        let picker = Picker::with_args(PathBuf::from("cat"), Vec::new());
        let selected = picker.select(&render_lines(&items), items.len()).unwrap();
        assert_eq!(selected.len(), items.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_interrupted_is_empty_selection() {
        let picker = sh("cat >/dev/null; exit 130");
        let lines = vec!["0\ta".to_string()];
        assert!(picker.select(&lines, 1).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_no_match_ignores_printed_lines() {
        let picker = sh("cat; exit 1");
        let lines = vec!["0\ta".to_string()];
        assert!(picker.select(&lines, 1).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_output_is_error() {
        let picker = sh("cat >/dev/null; printf '0\\377\\n'");
        let lines = vec!["0\ta".to_string()];
        let err = picker.select(&lines, 1).unwrap_err();
        assert!(format!("{err:#}").contains("reading picker output"));
    }

    #[cfg(unix)]
    #[test]
    fn test_other_exit_is_error() {
        let picker = sh("exit 2");
        let lines = vec!["0\ta".to_string()];
        assert!(picker.select(&lines, 1).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_pick_cancelled_has_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::at(dir.path().join("bookmarks.json"), DEFAULT_TTL);
        let source = FakeSource::with_items(vec![bookmark("a", "abc1234", &[], "")]);
        let library = Library::new(&source, &cache);

        let picker = sh("cat >/dev/null; exit 130");
        let chosen = pick(&library, &picker, &FilterQuery::unfiltered(), false, "me").unwrap();
        assert_eq!(chosen, Some(Vec::new()));
        assert!(source.usage_calls.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_pick_records_usage_for_hashed_selections() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::at(dir.path().join("bookmarks.json"), DEFAULT_TTL);
        let source = FakeSource::with_items(vec![
            bookmark("b", "", &[], ""),
            bookmark("a", "abc1234", &[], ""),
        ]);
        let library = Library::new(&source, &cache);

        let picker = Picker::with_args(PathBuf::from("cat"), Vec::new());
        let chosen = pick(&library, &picker, &FilterQuery::unfiltered(), false, "me")
            .unwrap()
            .unwrap();
        let titles: Vec<&str> = chosen.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(
            source.usage_calls.borrow().as_slice(),
            &[("abc1234".to_string(), "me".to_string())]
        );
    }

    #[test]
    fn test_pick_empty_listing_skips_picker() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::at(dir.path().join("bookmarks.json"), DEFAULT_TTL);
        let source = FakeSource::default();
        let library = Library::new(&source, &cache);

        let picker = Picker::with_args(
            PathBuf::from("definitely-not-a-real-picker-binary"),
            Vec::new(),
        );
        let chosen = pick(&library, &picker, &FilterQuery::unfiltered(), false, "me").unwrap();
        assert!(chosen.is_none());
    }
}
