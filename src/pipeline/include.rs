// src/pipeline/include.rs

//! `//= path` include directives for HTML and JS sources.
//!
//! A line whose first non-blank characters are `//=` is replaced by the
//! contents of the named file, resolved relative to the including file.
//! Included files are expanded recursively and every inserted line keeps the
//! indentation of the directive.

use std::path::{Path, PathBuf};

use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;

const DIRECTIVE: &str = "//=";

/// Result of expanding one entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// Every file that contributed text, entry first, in inclusion order.
    pub sources: Vec<PathBuf>,
}

pub fn expand_includes(fs: &dyn FileSystem, entry: &Path) -> Result<Expanded> {
    let mut sources = Vec::new();
    let mut stack = Vec::new();
    let text = expand_file(fs, entry, &mut stack, &mut sources)?;
    Ok(Expanded { text, sources })
}

/// Target of a directive line, if it is one.
pub fn directive_target(line: &str) -> Option<&str> {
    let target = line.trim_start().strip_prefix(DIRECTIVE)?.trim();
    let target = target.trim_matches(|c| c == '"' || c == '\'');
    (!target.is_empty()).then_some(target)
}

fn expand_file(
    fs: &dyn FileSystem,
    path: &Path,
    stack: &mut Vec<PathBuf>,
    sources: &mut Vec<PathBuf>,
) -> Result<String> {
    if stack.iter().any(|p| p == path) {
        let chain: Vec<String> = stack
            .iter()
            .chain(std::iter::once(&path.to_path_buf()))
            .map(|p| p.display().to_string())
            .collect();
        return Err(include_error(
            path,
            format!("include cycle: {}", chain.join(" -> ")),
        ));
    }

    let contents = fs
        .read_to_string(path)
        .map_err(|e| include_error(path, format!("{e:#}")))?;

    if !sources.iter().any(|p| p == path) {
        sources.push(path.to_path_buf());
    }
    stack.push(path.to_path_buf());

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::with_capacity(contents.len());

    for line in contents.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        let Some(target) = directive_target(body) else {
            out.push_str(line);
            continue;
        };

        let indent = &body[..body.len() - body.trim_start().len()];
        let included_path = dir.join(target);
        if !fs.is_file(&included_path) {
            return Err(include_error(
                path,
                format!("included file not found: {}", included_path.display()),
            ));
        }

        let included = expand_file(fs, &included_path, stack, sources)?;
        for included_line in included.trim_end_matches('\n').split_inclusive('\n') {
            if !included_line.trim().is_empty() {
                out.push_str(indent);
            }
            out.push_str(included_line);
        }
        out.push_str(&line[body.len()..]);
    }

    stack.pop();
    Ok(out)
}

fn include_error(path: &Path, message: String) -> AssetpipeError {
    AssetpipeError::Include {
        path: path.display().to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn directive_is_recognised_after_indentation() {
        assert_eq!(directive_target("    //= partials/header.html"), Some("partials/header.html"));
        assert_eq!(directive_target("//= 'lib.js'"), Some("lib.js"));
        assert_eq!(directive_target("// = nope"), None);
        assert_eq!(directive_target("//="), None);
    }

    #[test]
    fn nested_includes_keep_indentation() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "src/index.html",
            "<body>\n  //= partials/header.html\n</body>\n",
        );
        fs.add_file("src/partials/header.html", "<header>\n//= logo.html\n</header>\n");
        fs.add_file("src/partials/logo.html", "<img src=\"logo.png\">\n");

        let expanded = expand_includes(&fs, Path::new("src/index.html")).unwrap();

        assert_eq!(
            expanded.text,
            "<body>\n  <header>\n  <img src=\"logo.png\">\n  </header>\n</body>\n"
        );
        assert_eq!(
            expanded.sources,
            vec![
                PathBuf::from("src/index.html"),
                PathBuf::from("src/partials/header.html"),
                PathBuf::from("src/partials/logo.html"),
            ]
        );
    }

    #[test]
    fn directive_on_last_line_without_newline() {
        let fs = MockFileSystem::new();
        fs.add_file("js/main.js", "var a = 1;\n//= lib.js");
        fs.add_file("js/lib.js", "var b = 2;\n");

        let expanded = expand_includes(&fs, Path::new("js/main.js")).unwrap();

        assert_eq!(expanded.text, "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn missing_include_names_the_including_file() {
        let fs = MockFileSystem::new();
        fs.add_file("js/main.js", "//= missing.js\n");

        let err = expand_includes(&fs, Path::new("js/main.js")).unwrap_err();

        match err {
            AssetpipeError::Include { path, message } => {
                assert_eq!(path, "js/main.js");
                assert!(message.contains("missing.js"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn include_cycle_is_an_error() {
        let fs = MockFileSystem::new();
        fs.add_file("js/a.js", "//= b.js\n");
        fs.add_file("js/b.js", "//= a.js\n");

        let err = expand_includes(&fs, Path::new("js/a.js")).unwrap_err();

        assert!(err.to_string().contains("include cycle"), "{err}");
    }
}
