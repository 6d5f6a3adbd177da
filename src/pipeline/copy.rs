// src/pipeline/copy.rs

use std::path::PathBuf;

use crate::errors::Result;
use crate::pipeline::sources::expand_source_glob;
use crate::pipeline::{CancelFlag, OutputWriter, StageContext};
use crate::types::AssetKind;

/// Byte-for-byte copy; used for `fonts` and `static`.
pub fn run(ctx: &StageContext, kind: AssetKind, cancel: &CancelFlag) -> Result<Vec<PathBuf>> {
    let entry = ctx.entry(kind);
    let dest = ctx.dest_dir(kind);
    let sources = expand_source_glob(ctx.fs.as_ref(), &ctx.root, &entry.src)?;
    let mut writer = OutputWriter::new(ctx.fs.as_ref(), cancel);

    for source in &sources {
        writer.ensure_live()?;
        let bytes = ctx.fs.read(&source.path)?;
        writer.write(&dest.join(&source.rel), &bytes)?;
    }

    Ok(writer.into_written())
}
