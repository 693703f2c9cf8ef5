//! Loads the ordered unit set from a directory of `.patch` files.

use std::collections::HashSet;
use std::path::Path;

use super::{parse_unit, ModificationUnit};
use crate::error::{Error, Result};
use crate::ports::FileSystem;

/// File extension recognized as a unit definition.
pub const UNIT_EXTENSION: &str = ".patch";

/// Loads every `*.patch` file in `dir`, ordered by file name.
///
/// The whole set is rejected if any single unit is malformed; a partial set is
/// never returned.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the directory is missing or empty, a
/// unit fails to parse, or two units share a name. Returns
/// [`Error::Environment`] if a unit file cannot be read.
pub fn load_units(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<ModificationUnit>> {
    if !fs.is_dir(dir) {
        return Err(Error::config(format!("unit directory {} does not exist", dir.display())));
    }
    let mut files: Vec<String> = fs
        .list_dir(dir)
        .map_err(|e| Error::environment(format!("listing {}", dir.display()), e))?
        .into_iter()
        .filter(|name| name.ends_with(UNIT_EXTENSION))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::config(format!("no {UNIT_EXTENSION} files in {}", dir.display())));
    }

    let mut units = Vec::with_capacity(files.len());
    let mut names = HashSet::new();
    for (index, file) in files.iter().enumerate() {
        let path = dir.join(file);
        let text = fs
            .read_to_string(&path)
            .map_err(|e| Error::environment(format!("reading {}", path.display()), e))?;
        let stem = file.strip_suffix(UNIT_EXTENSION).unwrap_or(file);
        let unit = parse_unit(index, stem, &text)?;
        if !names.insert(unit.name().to_string()) {
            return Err(Error::config(format!("{file}: duplicate unit name {}", unit.name())));
        }
        tracing::debug!(index, name = unit.name(), target = %unit.target().display(), "loaded unit");
        units.push(unit);
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemFs;

    fn unit_text(name: &str, context: &str) -> String {
        format!(
            "# name: {name}\n# anchor: line_{context}\n--- a/src/f.cpp\n+++ b/src/f.cpp\n\
             @@ -1,2 +1,3 @@\n line_{context}\n+added_{name}\n end\n"
        )
    }

    #[test]
    fn loads_in_lexicographic_order() {
        let fs = MemFs::new();
        fs.put("/units/0002-second.patch", &unit_text("second", "b"));
        fs.put("/units/0001-first.patch", &unit_text("first", "a"));
        fs.put("/units/README.md", "ignored");

        let units = load_units(&fs, Path::new("/units")).unwrap();
        let names: Vec<_> = units.iter().map(ModificationUnit::name).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(units[1].index(), 1);
    }

    #[test]
    fn one_bad_unit_rejects_the_set() {
        let fs = MemFs::new();
        fs.put("/units/0001-good.patch", &unit_text("good", "a"));
        fs.put("/units/0002-bad.patch", "# name: bad\nnot a diff\n");

        let err = load_units(&fs, Path::new("/units")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("0002-bad"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fs = MemFs::new();
        fs.put("/units/0001.patch", &unit_text("same", "a"));
        fs.put("/units/0002.patch", &unit_text("same", "b"));

        let err = load_units(&fs, Path::new("/units")).unwrap_err();
        assert!(err.to_string().contains("duplicate unit name"));
    }

    #[test]
    fn missing_or_empty_directory_is_configuration_error() {
        let fs = MemFs::new();
        assert!(matches!(
            load_units(&fs, Path::new("/nowhere")),
            Err(Error::Configuration(_))
        ));

        fs.put("/units/notes.txt", "x");
        assert!(matches!(load_units(&fs, Path::new("/units")), Err(Error::Configuration(_))));
    }
}
