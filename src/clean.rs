// src/clean.rs

use std::path::Path;

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Empty `output_root` (relative to `root`), keeping the directory itself.
///
/// A missing output root counts as already clean. Returns the number of
/// top-level entries removed.
pub fn clean_output(fs: &dyn FileSystem, root: &Path, output_root: &str) -> Result<usize> {
    let target = root.join(output_root);
    if !fs.is_dir(&target) {
        debug!(dir = %target.display(), "output root missing; nothing to clean");
        return Ok(0);
    }

    let removed = fs.remove_dir_contents(&target)?;
    info!(dir = %target.display(), removed, "cleaned output root");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn removes_every_output_and_nothing_else() {
        let fs = MockFileSystem::new();
        fs.add_file("site/build/index.html", "x");
        fs.add_file("site/build/style/main.css", "x");
        fs.add_file("site/src/index.html", "x");

        let removed = clean_output(&fs, Path::new("site"), "build").unwrap();

        assert_eq!(removed, 2);
        assert!(fs.files_under(Path::new("site/build")).is_empty());
        assert!(fs.is_dir(Path::new("site/build")));
        assert!(fs.exists(Path::new("site/src/index.html")));
    }

    #[test]
    fn missing_output_root_is_already_clean() {
        let fs = MockFileSystem::new();
        assert_eq!(clean_output(&fs, Path::new("site"), "build").unwrap(), 0);
    }
}
