//! Parser for the `.patch` unit format.
//!
//! ```text
//! # name: register-hw-encoder
//! # anchor: factories_.push_back(std::make_unique<webrtc::InternalEncoderFactory>());
//! # description: add the hardware encoder to the factory chain
//! --- a/webrtc-sys/src/video_encoder_factory.cpp
//! +++ b/webrtc-sys/src/video_encoder_factory.cpp
//! @@ -40,3 +40,4 @@
//!  ...context...
//! +...inserted...
//!  ...context...
//! ```
//!
//! Hunk line numbers are read only to know where each hunk ends; matching
//! against the target file is done by content.

use std::path::PathBuf;

use super::{anchor_occurrences, Block, Hunk, ModificationUnit};
use crate::error::{Error, Result};

const NO_NEWLINE_MARKER: char = '\\';

/// Shortest default anchor taken without a warning.
const MIN_DEFAULT_ANCHOR_LEN: usize = 4;

/// Which side(s) of a hunk the previous diff line belonged to.
#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
    Both,
}

#[derive(Default)]
struct Header {
    name: Option<String>,
    anchor: Option<String>,
    description: Option<String>,
}

/// Parses one unit from its file contents.
///
/// `default_name` is used when the file carries no `# name:` header.
///
/// # Errors
///
/// Returns [`Error::Configuration`] describing the first malformed line, or
/// any invariant violation reported by [`ModificationUnit::new`].
pub fn parse_unit(index: usize, default_name: &str, text: &str) -> Result<ModificationUnit> {
    let err = |msg: String| Error::config(format!("{default_name}: {msg}"));

    let mut header = Header::default();
    let mut old_path: Option<String> = None;
    let mut new_path: Option<String> = None;
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut body = String::new();

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if hunks.is_empty() && old_path.is_none() {
            if let Some(rest) = line.strip_prefix('#') {
                read_header_line(rest, &mut header);
                i += 1;
                continue;
            }
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if old_path.is_some() {
                return Err(err(format!(
                    "line {}: a unit may only modify one file; found a second file header",
                    i + 1
                )));
            }
            old_path = Some(strip_path(path));
            body.push_str(line);
            body.push('\n');
            i += 1;
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            if old_path.is_none() || new_path.is_some() {
                return Err(err(format!("line {}: unexpected '+++' header", i + 1)));
            }
            new_path = Some(strip_path(path));
            body.push_str(line);
            body.push('\n');
            i += 1;
            continue;
        }

        if line.starts_with("@@") {
            if new_path.is_none() {
                return Err(err(format!("line {}: hunk before file headers", i + 1)));
            }
            let (before_len, after_len) = parse_hunk_header(line)
                .ok_or_else(|| err(format!("line {}: bad hunk header", i + 1)))?;
            body.push_str(line);
            body.push('\n');
            let (hunk, consumed) = read_hunk(&lines[i + 1..], before_len, after_len)
                .map_err(|msg| err(format!("hunk at line {}: {msg}", i + 1)))?;
            for raw in &lines[i + 1..=i + consumed] {
                body.push_str(raw);
                body.push('\n');
            }
            hunks.push(hunk);
            i += consumed + 1;
            continue;
        }

        if !hunks.is_empty() && line.trim_end() == "--" {
            // `git format-patch` signature separator.
            break;
        }
        if !hunks.is_empty() && !line.trim().is_empty() {
            return Err(err(format!("line {}: unexpected text after hunks: {line:?}", i + 1)));
        }
        // Preamble such as `diff --git` or `index` lines.
        i += 1;
    }

    let (Some(old_path), Some(new_path)) = (old_path, new_path) else {
        return Err(err("missing '---'/'+++' file headers".to_string()));
    };
    if old_path == "/dev/null" || new_path == "/dev/null" {
        return Err(err("units must modify an existing file, not create or delete one".into()));
    }
    if old_path != new_path {
        return Err(err(format!("file headers disagree: {old_path} vs {new_path}")));
    }

    let name = header.name.unwrap_or_else(|| default_name.to_string());
    let anchor = match header.anchor {
        Some(anchor) => anchor,
        None => default_anchor(&name, &hunks).unwrap_or_default(),
    };

    ModificationUnit::new(index, name, PathBuf::from(new_path), anchor, hunks, body)
        .map(|unit| unit.with_description(header.description))
}

fn read_header_line(rest: &str, header: &mut Header) {
    let Some((key, value)) = rest.split_once(':') else {
        return;
    };
    let value = value.trim().to_string();
    match key.trim() {
        "name" => header.name = Some(value),
        "anchor" => header.anchor = Some(value),
        "description" => header.description = Some(value),
        _ => {}
    }
}

/// Strips the `a/` or `b/` prefix and any trailing timestamp from a header path.
fn strip_path(raw: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    path.strip_prefix("a/").or_else(|| path.strip_prefix("b/")).unwrap_or(path).to_string()
}

/// Parses `@@ -l[,s] +l[,s] @@` into the before/after line counts.
fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let inner = line.strip_prefix("@@ ")?;
    let end = inner.find(" @@")?;
    let mut ranges = inner[..end].split_whitespace();
    let before = range_len(ranges.next()?.strip_prefix('-')?)?;
    let after = range_len(ranges.next()?.strip_prefix('+')?)?;
    Some((before, after))
}

fn range_len(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((start, len)) => {
            start.parse::<usize>().ok()?;
            len.parse().ok()
        }
        None => {
            range.parse::<usize>().ok()?;
            Some(1)
        }
    }
}

/// Reads hunk lines until both sides reach their declared lengths.
///
/// Returns the hunk and the number of input lines consumed.
fn read_hunk(
    lines: &[&str],
    before_len: usize,
    after_len: usize,
) -> std::result::Result<(Hunk, usize), String> {
    let mut before = Block::new();
    let mut after = Block::new();
    let mut last: Option<Side> = None;
    let mut consumed = 0;

    for line in lines {
        let complete = before.lines.len() == before_len && after.lines.len() == after_len;
        if line.starts_with(NO_NEWLINE_MARKER) {
            match last {
                Some(Side::Before) => before.at_eof = true,
                Some(Side::After) => after.at_eof = true,
                Some(Side::Both) => {
                    before.at_eof = true;
                    after.at_eof = true;
                }
                None => return Err("no-newline marker before any line".into()),
            }
            consumed += 1;
            continue;
        }
        if complete {
            break;
        }

        // Editors commonly strip the single space from blank context lines.
        let (tag, content) = if line.is_empty() { (' ', "") } else { split_tag(line) };
        match tag {
            ' ' => {
                before.lines.push(content.to_string());
                after.lines.push(content.to_string());
                last = Some(Side::Both);
            }
            '-' => {
                before.lines.push(content.to_string());
                last = Some(Side::Before);
            }
            '+' => {
                after.lines.push(content.to_string());
                last = Some(Side::After);
            }
            _ => return Err(format!("unexpected line {line:?}")),
        }
        if before.lines.len() > before_len || after.lines.len() > after_len {
            return Err("more lines than the hunk header declares".into());
        }
        consumed += 1;
    }

    if before.lines.len() != before_len || after.lines.len() != after_len {
        return Err(format!(
            "expected {before_len} before / {after_len} after lines, found {} / {}",
            before.lines.len(),
            after.lines.len()
        ));
    }
    Ok((Hunk { before, after }, consumed))
}

fn split_tag(line: &str) -> (char, &str) {
    let mut chars = line.chars();
    let tag = chars.next().unwrap_or(' ');
    (tag, chars.as_str())
}

/// Picks a context line of the first hunk to anchor on.
///
/// Prefers the first line of at least [`MIN_DEFAULT_ANCHOR_LEN`] characters
/// whose count the unit leaves unchanged, so lines like `}` or `#endif` are
/// passed over when something more distinctive exists.
fn default_anchor(name: &str, hunks: &[Hunk]) -> Option<String> {
    let first = hunks.first()?;
    let candidates: Vec<String> = first
        .before
        .lines
        .iter()
        .filter(|line| first.after.lines.contains(line))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let stable = |line: &&String| {
        let (before, after) = anchor_occurrences(hunks, line);
        before == after
    };
    let chosen = candidates
        .iter()
        .filter(&stable)
        .find(|line| line.chars().count() >= MIN_DEFAULT_ANCHOR_LEN)
        .or_else(|| candidates.iter().find(&stable))
        .or_else(|| candidates.first())?
        .clone();

    if chosen.chars().count() < MIN_DEFAULT_ANCHOR_LEN {
        tracing::warn!(
            unit = name,
            anchor = %chosen,
            "default anchor is short and likely ambiguous; declare one with '# anchor:'"
        );
    }
    Some(chosen)
}
