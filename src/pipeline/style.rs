// src/pipeline/style.rs

//! Sass compile, vendor prefixing and minification.
//!
//! `grass` turns each non-partial sass/scss entry into CSS; `lightningcss`
//! then adds the prefixes required by `[style].browsers` and minifies. The
//! source map lists the entry and every file it imported.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result as AnyResult};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::errors::Result;
use crate::fs::{FileSystem, SassFs};
use crate::pipeline::sourcemap::{file_granular_map, Sidecar};
use crate::pipeline::sources::expand_source_glob;
use crate::pipeline::{transform_error, CancelFlag, OutputWriter, StageContext};
use crate::types::AssetKind;
use crate::watch::path_utils::to_slash;

pub fn run(ctx: &StageContext, cancel: &CancelFlag) -> Result<Vec<PathBuf>> {
    let entry = ctx.entry(AssetKind::Style);
    let dest = ctx.dest_dir(AssetKind::Style);
    let targets = browser_targets(&ctx.config.style().browsers)?;
    let sources = expand_source_glob(ctx.fs.as_ref(), &ctx.root, &entry.src)?;
    let mut writer = OutputWriter::new(ctx.fs.as_ref(), cancel);

    for source in sources.iter().filter(|s| !is_partial(&s.path)) {
        writer.ensure_live()?;

        let compiled = compile_sass(ctx.fs.as_ref(), &source.path)
            .map_err(|e| transform_error(AssetKind::Style, &source.path, e))?;

        let output_rel = source.rel.with_extension("css");
        let label = Path::new(&source.display).with_extension("css");
        let mut code = prefix_and_minify(&compiled.css, &label.to_string_lossy(), targets)
            .map_err(|e| transform_error(AssetKind::Style, &source.path, e))?;

        if let Some(map_dir) = &entry.source_maps {
            let mut contributors = Vec::with_capacity(compiled.sources.len());
            for path in &compiled.sources {
                let name = path
                    .strip_prefix(&ctx.root)
                    .map(to_slash)
                    .unwrap_or_else(|_| to_slash(path));
                contributors.push((name, ctx.fs.read_to_string(path)?));
            }
            let map = file_granular_map(&contributors)
                .map_err(|e| transform_error(AssetKind::Style, &source.path, e))?;

            let sidecar = Sidecar::new(&dest, map_dir, &output_rel);
            writer.write(&sidecar.map_path, map.as_bytes())?;
            code.push_str(&sidecar.css_comment());
        }

        debug!(
            source = %source.display,
            imports = compiled.sources.len().saturating_sub(1),
            bytes = code.len(),
            "compiled stylesheet"
        );
        writer.write(&dest.join(&output_rel), code.as_bytes())?;
    }

    Ok(writer.into_written())
}

/// Compile browserslist queries into lightningcss targets.
pub fn browser_targets(queries: &[String]) -> AnyResult<Targets> {
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| anyhow!("invalid browserslist query {queries:?}: {e}"))?;
    Ok(browsers.map(Targets::from).unwrap_or_default())
}

/// Sass partials (`_name.sass`) are only compiled through imports.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('_'))
}

#[derive(Debug)]
struct Compiled {
    css: String,
    /// Entry first, then every imported file in first-read order.
    sources: Vec<PathBuf>,
}

fn compile_sass(fs: &dyn FileSystem, path: &Path) -> AnyResult<Compiled> {
    let sass_fs = SassFs::new(fs);
    let syntax = match path.extension().and_then(OsStr::to_str) {
        Some("sass") => grass::InputSyntax::Sass,
        Some("css") => grass::InputSyntax::Css,
        _ => grass::InputSyntax::Scss,
    };
    let css = {
        let options = grass::Options::default()
            .fs(&sass_fs)
            .style(grass::OutputStyle::Expanded)
            .input_syntax(syntax);
        grass::from_path(path, &options).map_err(|e| anyhow!("{e}"))?
    };

    let mut sources = vec![path.to_path_buf()];
    sources.extend(sass_fs.into_reads().into_iter().filter(|p| p != path));
    Ok(Compiled { css, sources })
}

fn prefix_and_minify(css: &str, filename: &str, targets: Targets) -> AnyResult<String> {
    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("parsing compiled css: {e}"))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("minifying css: {e}"))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("printing css: {e}"))?;

    Ok(result.code)
}
