// src/pipeline/html.rs

use std::path::PathBuf;

use tracing::debug;

use crate::errors::Result;
use crate::pipeline::include::expand_includes;
use crate::pipeline::sources::expand_source_glob;
use crate::pipeline::{CancelFlag, OutputWriter, StageContext};
use crate::types::AssetKind;

/// Expand include directives in every page and write it unchanged otherwise.
pub fn run(ctx: &StageContext, cancel: &CancelFlag) -> Result<Vec<PathBuf>> {
    let entry = ctx.entry(AssetKind::Html);
    let dest = ctx.dest_dir(AssetKind::Html);
    let sources = expand_source_glob(ctx.fs.as_ref(), &ctx.root, &entry.src)?;
    let mut writer = OutputWriter::new(ctx.fs.as_ref(), cancel);

    for source in &sources {
        writer.ensure_live()?;
        let expanded = expand_includes(ctx.fs.as_ref(), &source.path)?;
        debug!(
            page = %source.display,
            partials = expanded.sources.len() - 1,
            "expanded html page"
        );
        writer.write(&dest.join(&source.rel), expanded.text.as_bytes())?;
    }

    Ok(writer.into_written())
}
