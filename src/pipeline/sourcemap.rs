// src/pipeline/sourcemap.rs

//! Source-map sidecar placement and the file-granular script maps.

use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Result};
use parcel_sourcemap::{OriginalLocation, SourceMap};

use crate::watch::path_utils::to_slash;

/// Where a map for one output file goes, and how the output refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    /// `<dest>/<map_dir>/<output rel>.map`
    pub map_path: PathBuf,
    /// URL of the map relative to the output file.
    pub url: String,
}

impl Sidecar {
    pub fn new(dest: &Path, map_dir: &str, output_rel: &Path) -> Self {
        let map_rel = Path::new(map_dir).join(format!("{}.map", to_slash(output_rel)));
        let depth = output_rel
            .parent()
            .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).count())
            .unwrap_or(0);
        let url = format!("{}{}", "../".repeat(depth), to_slash(&map_rel));
        Self {
            map_path: dest.join(map_rel),
            url,
        }
    }

    pub fn css_comment(&self) -> String {
        format!("\n/*# sourceMappingURL={} */", self.url)
    }

    pub fn js_comment(&self) -> String {
        format!("\n//# sourceMappingURL={}", self.url)
    }
}

/// Map an output file to the ordered list of files it was built from.
///
/// Minification collapses everything onto one line, so the map only records
/// which sources contributed and their contents; the single mapping points
/// at the start of the entry file.
pub fn file_granular_map(sources: &[(String, String)]) -> Result<String> {
    let mut map = SourceMap::new("/");
    for (name, content) in sources {
        let index = map.add_source(name);
        map.set_source_content(index as usize, content)
            .map_err(|e| anyhow!("recording source content for {name}: {e:?}"))?;
    }
    if !sources.is_empty() {
        map.add_mapping(
            0,
            0,
            Some(OriginalLocation {
                original_line: 0,
                original_column: 0,
                source: 0,
                name: None,
            }),
        );
    }
    map.to_json(None)
        .map_err(|e| anyhow!("serialising source map: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_for_top_level_output() {
        let sidecar = Sidecar::new(Path::new("build/style"), "map", Path::new("main.css"));
        assert_eq!(sidecar.map_path, PathBuf::from("build/style/map/main.css.map"));
        assert_eq!(sidecar.url, "map/main.css.map");
        assert_eq!(sidecar.css_comment(), "\n/*# sourceMappingURL=map/main.css.map */");
    }

    #[test]
    fn sidecar_for_nested_output_climbs_back() {
        let sidecar = Sidecar::new(Path::new("build/js"), "map", Path::new("pages/about.js"));
        assert_eq!(sidecar.map_path, PathBuf::from("build/js/map/pages/about.js.map"));
        assert_eq!(sidecar.url, "../map/pages/about.js.map");
    }

    #[test]
    fn file_granular_map_lists_sources_in_order() {
        let json = file_granular_map(&[
            ("src/js/main.js".to_string(), "//= lib.js\n".to_string()),
            ("src/js/lib.js".to_string(), "var a = 1;\n".to_string()),
        ])
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let sources: Vec<&str> = value["sources"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|s| s.as_str())
            .collect();
        assert_eq!(sources.len(), 2);
        assert!(sources[0].ends_with("main.js"), "{sources:?}");
        assert!(sources[1].ends_with("lib.js"), "{sources:?}");
        assert_eq!(value["version"], 3);
        assert_eq!(value["sourcesContent"][1], "var a = 1;\n");
    }
}
