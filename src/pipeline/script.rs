// src/pipeline/script.rs

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result as AnyResult};
use minify_js::{minify, Session, TopLevelMode};
use tracing::debug;

use crate::errors::Result;
use crate::pipeline::include::expand_includes;
use crate::pipeline::sourcemap::{file_granular_map, Sidecar};
use crate::pipeline::sources::expand_source_glob;
use crate::pipeline::{transform_error, CancelFlag, OutputWriter, StageContext};
use crate::types::AssetKind;
use crate::watch::path_utils::to_slash;

/// Expand includes, minify, and attach a file-granular source map.
pub fn run(ctx: &StageContext, cancel: &CancelFlag) -> Result<Vec<PathBuf>> {
    let entry = ctx.entry(AssetKind::Js);
    let dest = ctx.dest_dir(AssetKind::Js);
    let sources = expand_source_glob(ctx.fs.as_ref(), &ctx.root, &entry.src)?;
    let mut writer = OutputWriter::new(ctx.fs.as_ref(), cancel);

    for source in &sources {
        writer.ensure_live()?;

        let expanded = expand_includes(ctx.fs.as_ref(), &source.path)?;
        let mut code = minify_script(&expanded.text)
            .map_err(|e| transform_error(AssetKind::Js, &source.path, e))?;

        if let Some(map_dir) = &entry.source_maps {
            let mut contributors = Vec::with_capacity(expanded.sources.len());
            for path in &expanded.sources {
                let name = path
                    .strip_prefix(&ctx.root)
                    .map(to_slash)
                    .unwrap_or_else(|_| to_slash(path));
                contributors.push((name, ctx.fs.read_to_string(path)?));
            }
            let map = file_granular_map(&contributors)
                .map_err(|e| transform_error(AssetKind::Js, &source.path, e))?;

            let sidecar = Sidecar::new(&dest, map_dir, &source.rel);
            writer.write(&sidecar.map_path, map.as_bytes())?;
            code.push_str(&sidecar.js_comment());
        }

        debug!(
            source = %source.display,
            included = expanded.sources.len(),
            bytes = code.len(),
            "minified script"
        );
        writer.write(&dest.join(&source.rel), code.as_bytes())?;
    }

    Ok(writer.into_written())
}

fn minify_script(code: &str) -> AnyResult<String> {
    let session = Session::new();
    let mut out = Vec::with_capacity(code.len());
    minify(&session, TopLevelMode::Global, code.as_bytes(), &mut out)
        .map_err(|e| anyhow!("{e:?}"))?;
    String::from_utf8(out).context("minified script is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssetpipeError;
    use crate::pipeline::tests::mock_context;
    use crate::fs::FileSystem;

    #[test]
    fn minifier_shrinks_whitespace() {
        let source = "function add(first, second) {\n    return first + second;\n}\n\nconsole.log(add(1, 2));\n";
        let out = minify_script(source).unwrap();
        assert!(out.len() < source.len(), "{out}");
        assert!(out.contains("console.log"), "{out}");
    }

    #[test]
    fn included_library_lands_in_the_bundle() {
        let (ctx, fs) = mock_context();
        fs.add_file(
            "site/src/js/main.js",
            "//= partials/greet.js\n\nconsole.log(greet(\"site\"));\n",
        );
        fs.add_file(
            "site/src/js/partials/greet.js",
            "function greet(name) {\n    return \"hello \" + name;\n}\n",
        );

        let written = run(&ctx, &CancelFlag::new()).unwrap();

        assert_eq!(
            written,
            vec![
                PathBuf::from("site/build/js/map/main.js.map"),
                PathBuf::from("site/build/js/main.js"),
            ]
        );
        let js = String::from_utf8(fs.contents("site/build/js/main.js").unwrap()).unwrap();
        assert!(js.contains("hello "), "{js}");
        assert!(js.ends_with("//# sourceMappingURL=map/main.js.map"), "{js}");
        let map = String::from_utf8(fs.contents("site/build/js/map/main.js.map").unwrap()).unwrap();
        assert!(map.contains("greet.js"), "{map}");
    }

    #[test]
    fn syntax_error_is_a_transform_failure() {
        let (ctx, fs) = mock_context();
        fs.add_file("site/src/js/main.js", "function (\n");

        let err = run(&ctx, &CancelFlag::new()).unwrap_err();

        assert!(
            matches!(err, AssetpipeError::Transform { kind: AssetKind::Js, .. }),
            "{err:?}"
        );
        assert!(!fs.exists(std::path::Path::new("site/build/js/main.js")));
    }
}
