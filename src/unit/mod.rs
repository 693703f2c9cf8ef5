//! Modification units: named, ordered, invertible edits to one target file.
//!
//! Units are immutable once loaded. Their order in the set is the only valid
//! application order; later units may anchor on text inserted by earlier ones.

pub mod loader;
pub mod parse;

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub use loader::load_units;
pub use parse::parse_unit;

/// One side of a hunk: a contiguous run of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Line contents without their trailing newline.
    pub lines: Vec<String>,
    /// `true` when the last line is the end of the file with no newline after it.
    pub at_eof: bool,
}

impl Block {
    fn new() -> Self {
        Self { lines: Vec::new(), at_eof: false }
    }

    /// Number of times `needle` occurs in the block's text.
    fn occurrences(&self, needle: &str) -> usize {
        self.lines.join("\n").matches(needle).count()
    }

    /// Returns `true` if `other`'s lines appear contiguously inside this block.
    fn contains(&self, other: &Block) -> bool {
        if other.lines.is_empty() || other.lines.len() > self.lines.len() {
            return other.lines.is_empty();
        }
        self.lines.windows(other.lines.len()).any(|w| w == other.lines.as_slice())
    }
}

/// A single `@@` hunk: the text expected before the change and after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Context plus removed lines.
    pub before: Block,
    /// Context plus added lines.
    pub after: Block,
}

/// A named, ordered textual change to one file of the target tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationUnit {
    index: usize,
    name: String,
    description: Option<String>,
    target: PathBuf,
    anchor: String,
    hunks: Vec<Hunk>,
    body: String,
}

impl ModificationUnit {
    /// Builds a unit, enforcing every load-time invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the anchor or hunks are empty, the
    /// target path escapes the tree root, or a hunk is not invertible.
    pub fn new(
        index: usize,
        name: impl Into<String>,
        target: impl Into<PathBuf>,
        anchor: impl Into<String>,
        hunks: Vec<Hunk>,
        body: impl Into<String>,
    ) -> Result<Self> {
        let unit = Self {
            index,
            name: name.into(),
            description: None,
            target: target.into(),
            anchor: anchor.into(),
            hunks,
            body: body.into(),
        };
        unit.validate()?;
        Ok(unit)
    }

    /// Attaches a free-form description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(Error::config(format!("unit #{}: invalid name {:?}", self.index, self.name)));
        }
        if self.anchor.is_empty() {
            return Err(Error::config(format!("unit {}: anchor text is empty", self.name)));
        }
        if self.hunks.is_empty() || self.body.trim().is_empty() {
            return Err(Error::config(format!("unit {}: diff body is empty", self.name)));
        }
        validate_target(&self.name, &self.target)?;
        let (before, after) = anchor_occurrences(&self.hunks, &self.anchor);
        if before != after {
            return Err(Error::config(format!(
                "unit {}: anchor {:?} occurs {before} time(s) in the replaced lines but {after} \
                 in the replacement; once applied the unit could never be probed again",
                self.name, self.anchor
            )));
        }
        for (i, hunk) in self.hunks.iter().enumerate() {
            if hunk.before.lines.is_empty() {
                return Err(Error::config(format!(
                    "unit {}: hunk {} has no context or removed lines to locate it",
                    self.name,
                    i + 1
                )));
            }
            if hunk.after.contains(&hunk.before) || hunk.before.contains(&hunk.after) {
                return Err(Error::config(format!(
                    "unit {}: hunk {} is not invertible; one side contains the other, \
                     add context on both sides of the change",
                    self.name,
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Position in the ordered set (0-based).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Stable unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional human description from the unit header.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Target file, relative to the tree root.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Text that must occur exactly once in the target file.
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Hunks in file order.
    #[must_use]
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Lines this unit adds to the target file.
    #[must_use]
    pub fn inserted_content(&self) -> Vec<&str> {
        self.hunks
            .iter()
            .flat_map(|h| {
                h.after.lines.iter().filter(|l| !h.before.lines.contains(l)).map(String::as_str)
            })
            .collect()
    }

    /// The raw diff text the unit was parsed from.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Counts `anchor` across every hunk's before and after blocks.
///
/// Equal counts mean applying the unit leaves the anchor's count in the file
/// unchanged, so it stays unique in both states.
pub(crate) fn anchor_occurrences(hunks: &[Hunk], anchor: &str) -> (usize, usize) {
    hunks.iter().fold((0, 0), |(before, after), hunk| {
        (before + hunk.before.occurrences(anchor), after + hunk.after.occurrences(anchor))
    })
}

fn validate_target(name: &str, target: &Path) -> Result<()> {
    if target.as_os_str().is_empty() {
        return Err(Error::config(format!("unit {name}: target path is empty")));
    }
    for component in target.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => {
                return Err(Error::config(format!(
                    "unit {name}: target path {} must stay inside the tree root",
                    target.display()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn block(lines: &[&str]) -> Block {
        Block { lines: lines.iter().map(|l| (*l).to_string()).collect(), at_eof: false }
    }

    pub(crate) fn hunk(before: &[&str], after: &[&str]) -> Hunk {
        Hunk { before: block(before), after: block(after) }
    }

    #[test]
    fn accepts_well_formed_unit() {
        let unit = ModificationUnit::new(
            0,
            "register-encoder",
            "webrtc-sys/src/factory.cpp",
            "factories.push_back",
            vec![hunk(&["a", "b"], &["a", "x", "b"])],
            "@@ -1,2 +1,3 @@\n a\n+x\n b\n",
        )
        .unwrap();
        assert_eq!(unit.inserted_content(), vec!["x"]);
        assert_eq!(unit.target(), Path::new("webrtc-sys/src/factory.cpp"));
    }

    #[test]
    fn rejects_empty_anchor() {
        let err = ModificationUnit::new(0, "u", "f.cpp", "", vec![hunk(&["a"], &["b"])], "x")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn rejects_traversal_outside_root() {
        for target in ["../outside.cpp", "/etc/passwd", "src/../../x.cpp"] {
            let result =
                ModificationUnit::new(0, "u", target, "a", vec![hunk(&["a"], &["b"])], "x");
            assert!(result.is_err(), "{target} should be rejected");
        }
    }

    #[test]
    fn rejects_insertion_without_trailing_context() {
        // After applying, the before block would still be found.
        let result = ModificationUnit::new(
            0,
            "u",
            "f.cpp",
            "a",
            vec![hunk(&["a", "b"], &["a", "b", "x"])],
            "x",
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not invertible"));
    }

    #[test]
    fn rejects_anchor_repeated_by_inserted_line() {
        let err = ModificationUnit::new(
            0,
            "register-hw",
            "f.cpp",
            "factories_.push_back(",
            vec![hunk(
                &["  factories_.push_back(std::make_unique<Sw>());", "}"],
                &[
                    "  factories_.push_back(std::make_unique<Sw>());",
                    "  factories_.push_back(std::make_unique<Hw>());",
                    "}",
                ],
            )],
            "x",
        )
        .unwrap_err()
        .to_string();
        assert!(err.contains("occurs 1 time(s) in the replaced lines but 2"), "{err}");
    }

    #[test]
    fn rejects_anchor_deleted_by_removed_line() {
        let result = ModificationUnit::new(
            0,
            "drop-legacy",
            "f.cpp",
            "legacy",
            vec![hunk(&["start", "legacy()", "end"], &["start", "end"])],
            "x",
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn accepts_anchor_outside_the_changed_lines() {
        let unit = ModificationUnit::new(
            0,
            "register-hw",
            "f.cpp",
            "Factory::Factory()",
            vec![hunk(&["  push(Sw);", "}"], &["  push(Sw);", "  push(Hw);", "}"])],
            "x",
        )
        .unwrap();
        assert_eq!(anchor_occurrences(unit.hunks(), unit.anchor()), (0, 0));
    }

    #[test]
    fn rejects_hunk_without_before_lines() {
        let result = ModificationUnit::new(0, "u", "f.cpp", "a", vec![hunk(&[], &["x"])], "x");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_name_with_whitespace() {
        let result =
            ModificationUnit::new(0, "two words", "f.cpp", "a", vec![hunk(&["a"], &["b"])], "x");
        assert!(result.is_err());
    }
}
