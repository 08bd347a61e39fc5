//! OS integration: default browser and clipboard.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::warn;

use markdex_core::{Bookmark, MarkdexError};

/// Outcome of acting on a picked selection.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Nothing,
    Copied(String),
    Opened { opened: usize, failed: usize },
}

/// Copy the first chosen URL, or open every chosen URL.
///
/// A failing opener is logged and the remaining URLs are still opened. A
/// clipboard failure is returned to the caller.
pub fn deliver<O, C>(
    chosen: &[Bookmark],
    copy: bool,
    mut open: O,
    copy_text: C,
) -> Result<Delivery>
where
    O: FnMut(&str) -> Result<()>,
    C: FnOnce(&str) -> Result<()>,
{
    let Some(first) = chosen.first() else {
        return Ok(Delivery::Nothing);
    };

    if copy {
        copy_text(&first.url)?;
        return Ok(Delivery::Copied(first.url.clone()));
    }

    let mut failed = 0;
    for b in chosen {
        if let Err(e) = open(&b.url) {
            warn!("{e:#}");
            failed += 1;
        }
    }
    Ok(Delivery::Opened {
        opened: chosen.len() - failed,
        failed,
    })
}

/// Open `url` in the default browser. The opener is spawned, not awaited.
pub fn open_url(url: &str) -> Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("rundll32");
        c.arg("url.dll,FileProtocolHandler");
        c
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn()
        .with_context(|| format!("failed to launch browser for {url}"))?;
    Ok(())
}

const NO_ARGS: &[&str] = &[];
const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];
const XSEL_ARGS: &[&str] = &["--clipboard", "--input"];

/// Clipboard writers to try, in order, for the current platform.
fn clipboard_candidates() -> Vec<(&'static str, &'static [&'static str])> {
    if cfg!(target_os = "macos") {
        vec![("pbcopy", NO_ARGS)]
    } else if cfg!(target_os = "windows") {
        vec![("clip", NO_ARGS)]
    } else {
        vec![
            ("wl-copy", NO_ARGS),
            ("xclip", XCLIP_ARGS),
            ("xsel", XSEL_ARGS),
        ]
    }
}

/// Copy `text` to the system clipboard via the first available tool.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let Some((tool, args)) = clipboard_candidates()
        .into_iter()
        .find(|(tool, _)| which::which(tool).is_ok())
    else {
        return Err(MarkdexError::ToolMissing {
            tool: "clipboard utility".into(),
            hint: "install wl-clipboard, xclip or xsel".into(),
        }
        .into());
    };

    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {tool}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("failed writing to {tool}"))?;
    }
    let status = child
        .wait()
        .with_context(|| format!("failed waiting for {tool}"))?;
    if !status.success() {
        bail!("{tool} exited with {status}");
    }
    Ok(())
}
