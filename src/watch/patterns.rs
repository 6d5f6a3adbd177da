// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::config::model::ConfigFile;
use crate::types::AssetKind;

/// Compile one Path Table glob.
///
/// `*` does not cross directory separators; `**` does.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Leading directory of a glob that contains no wildcard, e.g. `src/img` for
/// `src/img/**/*.*`. A pattern without wildcards yields its parent directory.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let literal_len = segments
        .iter()
        .position(|segment| has_glob_meta(segment))
        .unwrap_or_else(|| segments.len().saturating_sub(1));
    segments[..literal_len]
        .iter()
        .filter(|segment| **segment != ".")
        .collect()
}

pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', ']', '{', '}'])
}

/// Compiled watch glob for a single asset kind.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths (e.g. `"src/style/_vars.sass"`) into `matches`.
#[derive(Clone)]
pub struct KindWatchProfile {
    kind: AssetKind,
    pattern: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for KindWatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindWatchProfile")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl KindWatchProfile {
    pub fn new(kind: AssetKind, pattern: &str) -> Result<Self> {
        let matcher = compile_glob(pattern)
            .with_context(|| format!("building watch glob for kind {kind}"))?;
        Ok(Self {
            kind,
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// One profile per kind, from the validated Path Table.
pub fn build_profiles_from_config(cfg: &ConfigFile) -> Result<Vec<KindWatchProfile>> {
    cfg.paths()
        .iter()
        .map(|(kind, entry)| KindWatchProfile::new(kind, &entry.watch))
        .collect()
}

/// Minimal set of existing directories that covers every watch glob.
///
/// Bases that do not exist yet are replaced by their closest existing
/// ancestor inside `root`, so files created later are still seen.
pub fn watch_roots(root: &Path, profiles: &[KindWatchProfile]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = profiles
        .iter()
        .map(|p| {
            let mut dir = root.join(glob_base(p.pattern()));
            while !dir.is_dir() && dir != root {
                match dir.parent() {
                    Some(parent) => dir = parent.to_path_buf(),
                    None => break,
                }
            }
            dir
        })
        .collect();

    dirs.sort();
    dirs.dedup();

    let mut roots: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        if !roots.iter().any(|kept| dir.starts_with(kept)) {
            roots.push(dir);
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_base_stops_at_first_wildcard() {
        assert_eq!(glob_base("src/img/**/*.*"), PathBuf::from("src/img"));
        assert_eq!(glob_base("src/*.html"), PathBuf::from("src"));
        assert_eq!(glob_base("./src/js/main.js"), PathBuf::from("src/js"));
        assert_eq!(glob_base("main.js"), PathBuf::new());
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let profile = KindWatchProfile::new(AssetKind::Html, "src/*.html").unwrap();
        assert!(profile.matches("src/index.html"));
        assert!(!profile.matches("src/partials/header.html"));
    }

    #[test]
    fn double_star_matches_nested_and_top_level() {
        let profile = KindWatchProfile::new(AssetKind::Style, "src/style/**/*.sass").unwrap();
        assert!(profile.matches("src/style/main.sass"));
        assert!(profile.matches("src/style/partials/_vars.sass"));
        assert!(!profile.matches("src/style/main.css"));
    }

    #[test]
    fn watch_roots_collapse_nested_bases() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/img")).unwrap();
        let profiles = vec![
            KindWatchProfile::new(AssetKind::Html, "src/**/*.html").unwrap(),
            KindWatchProfile::new(AssetKind::Img, "src/img/**/*.*").unwrap(),
            KindWatchProfile::new(AssetKind::Fonts, "src/fonts/**/*.*").unwrap(),
        ];

        let roots = watch_roots(dir.path(), &profiles);

        assert_eq!(roots, vec![dir.path().join("src")]);
    }
}
