//! Content matching shared by probing and writing.
//!
//! The prober and the engine both call [`simulate`]; the buffer the engine
//! writes is the exact buffer the probe produced.

use serde::{Deserialize, Serialize};

use crate::unit::{Block, ModificationUnit};

/// Which way a unit's hunks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Before-blocks are replaced by after-blocks.
    Forward,
    /// After-blocks are replaced by before-blocks, last hunk first.
    Reverse,
}

/// Why a simulation did not apply cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The anchor text does not occur in the file.
    AnchorMissing,
    /// The anchor text occurs more than once.
    AnchorAmbiguous(usize),
    /// A hunk's expected block was not found.
    HunkMissing(usize),
    /// A hunk's expected block was found more than once.
    HunkAmbiguous {
        /// 0-based hunk index.
        hunk: usize,
        /// Number of places it matched.
        count: usize,
    },
}

/// Checks that the anchor occurs exactly once in `content`.
///
/// # Errors
///
/// Returns the anchor mismatch when it is absent or repeated.
pub fn check_anchor(content: &str, anchor: &str) -> Result<(), Mismatch> {
    match content.matches(anchor).count() {
        1 => Ok(()),
        0 => Err(Mismatch::AnchorMissing),
        n => Err(Mismatch::AnchorAmbiguous(n)),
    }
}

/// Applies `unit` to `content` in `direction` without touching any file.
///
/// # Errors
///
/// Returns the first [`Mismatch`] encountered.
pub fn simulate(
    content: &str,
    unit: &ModificationUnit,
    direction: Direction,
) -> Result<String, Mismatch> {
    check_anchor(content, unit.anchor())?;

    // Splitting on '\n' keeps a trailing "" element when the file ends with a
    // newline, so joining reproduces the input exactly.
    let mut lines: Vec<String> = content.split('\n').map(String::from).collect();

    let steps: Vec<(usize, &Block, &Block)> = match direction {
        Direction::Forward => {
            unit.hunks().iter().enumerate().map(|(i, h)| (i, &h.before, &h.after)).collect()
        }
        Direction::Reverse => {
            unit.hunks().iter().enumerate().rev().map(|(i, h)| (i, &h.after, &h.before)).collect()
        }
    };

    for (hunk, from, to) in steps {
        let matches = find_block(&lines, from, to);
        let (start, end) = match matches.as_slice() {
            [only] => *only,
            [] => return Err(Mismatch::HunkMissing(hunk)),
            many => return Err(Mismatch::HunkAmbiguous { hunk, count: many.len() }),
        };
        let mut replacement = to.lines.clone();
        if from.at_eof && !to.at_eof {
            replacement.push(String::new());
        }
        lines.splice(start..end, replacement);
    }

    Ok(lines.join("\n"))
}

/// Returns every `(start, end)` line range where `from` matches.
///
/// `end` covers the trailing empty element when the replacement must drop the
/// final newline.
fn find_block(lines: &[String], from: &Block, to: &Block) -> Vec<(usize, usize)> {
    let n = from.lines.len();
    if n == 0 || n > lines.len() {
        return Vec::new();
    }
    (0..=lines.len() - n)
        .filter(|&start| lines[start..start + n] == from.lines[..])
        .filter_map(|start| {
            let end = start + n;
            if from.at_eof {
                // Last line of the file with no newline after it.
                (end == lines.len()).then_some((start, end))
            } else if end >= lines.len() {
                // The block's last line must be newline-terminated.
                None
            } else if to.at_eof {
                (end + 1 == lines.len() && lines[end].is_empty()).then_some((start, end + 1))
            } else {
                Some((start, end))
            }
        })
        .collect()
}
