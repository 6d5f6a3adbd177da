// src/pipeline/images.rs

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::optimize::ImageFormat;
use crate::pipeline::sources::expand_source_glob;
use crate::pipeline::{transform_error, CancelFlag, OutputWriter, StageContext};
use crate::types::AssetKind;

/// Optimise every recognised image through the cache; copy the rest.
///
/// After a complete run, cache entries no source used are pruned.
pub fn run(ctx: &StageContext, cancel: &CancelFlag) -> Result<Vec<PathBuf>> {
    let entry = ctx.entry(AssetKind::Img);
    let dest = ctx.dest_dir(AssetKind::Img);
    let sources = expand_source_glob(ctx.fs.as_ref(), &ctx.root, &entry.src)?;
    let mut writer = OutputWriter::new(ctx.fs.as_ref(), cancel);
    let optimizer = ctx.optimizer.as_ref();
    ctx.cache.begin_sweep();

    for source in &sources {
        writer.ensure_live()?;
        let input = ctx.fs.read(&source.path)?;

        let output = match ImageFormat::from_path(&source.path) {
            Some(format) => ctx
                .cache
                .get_or_compute(&source.display, &input, optimizer.params_tag(), |bytes| {
                    optimizer.optimize(format, bytes)
                })
                .map_err(|e| transform_error(AssetKind::Img, &source.path, format!("{e:#}")))?,
            None => {
                debug!(image = %source.display, "unrecognised image format; copying as-is");
                input
            }
        };

        writer.write(&dest.join(&source.rel), &output)?;
    }

    writer.ensure_live()?;
    match ctx.cache.prune_untouched() {
        Ok(0) => {}
        Ok(pruned) => debug!(pruned, "pruned stale image cache entries"),
        Err(e) => warn!(error = %e, "failed to prune image cache"),
    }

    let stats = ctx.cache.stats();
    debug!(hits = stats.hits, misses = stats.misses, "image cache totals");
    Ok(writer.into_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::errors::AssetpipeError;
    use crate::pipeline::tests::mock_context;

    const SVG: &str = "<?xml version=\"1.0\"?>\n<!-- editor -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\" viewBox=\"0 0 10 10\">\n  <rect id=\"box\" width=\"10\" height=\"10\"/>\n</svg>\n";

    #[test]
    fn second_run_is_served_from_cache() {
        let (ctx, fs) = mock_context();
        fs.add_file("site/src/img/icons/box.svg", SVG);

        let first = run(&ctx, &CancelFlag::new()).unwrap();
        let first_bytes = fs.contents("site/build/img/icons/box.svg").unwrap();
        let second = run(&ctx, &CancelFlag::new()).unwrap();

        assert_eq!(first, vec![PathBuf::from("site/build/img/icons/box.svg")]);
        assert_eq!(first, second);
        assert_eq!(fs.contents("site/build/img/icons/box.svg").unwrap(), first_bytes);
        assert_eq!(ctx.cache.stats(), CacheStats { hits: 1, misses: 1 });

        let svg = String::from_utf8(first_bytes).unwrap();
        assert!(svg.contains("id=\"box\""), "{svg}");
        assert!(!svg.contains("editor"), "{svg}");
    }

    #[test]
    fn entries_for_changed_and_deleted_images_are_pruned() {
        use crate::cache::ImageCache;
        use crate::fs::FileSystem;
        use std::path::Path;
        use std::sync::Arc;

        let (mut ctx, fs) = mock_context();
        ctx.cache = Arc::new(ImageCache::persistent(Arc::new(fs.clone()), PathBuf::from("site/.cache")));
        fs.add_file("site/src/img/a.svg", SVG);
        fs.add_file("site/src/img/b.svg", SVG.replace("box", "other"));

        run(&ctx, &CancelFlag::new()).unwrap();
        let entries = |fs: &crate::fs::mock::MockFileSystem| fs.read_dir(Path::new("site/.cache")).unwrap().len();
        assert_eq!(entries(&fs), 2);

        fs.add_file("site/src/img/a.svg", SVG.replace("10", "12"));
        fs.remove_file(Path::new("site/src/img/b.svg")).unwrap();
        run(&ctx, &CancelFlag::new()).unwrap();

        assert_eq!(entries(&fs), 1);
    }

    #[test]
    fn unknown_formats_are_copied() {
        let (ctx, fs) = mock_context();
        fs.add_file("site/src/img/photo.webp", b"RIFFwebp".to_vec());

        run(&ctx, &CancelFlag::new()).unwrap();

        assert_eq!(fs.contents("site/build/img/photo.webp").unwrap(), b"RIFFwebp".to_vec());
        assert_eq!(ctx.cache.stats(), CacheStats::default());
    }

    #[test]
    fn corrupt_image_fails_the_stage() {
        let (ctx, fs) = mock_context();
        fs.add_file("site/src/img/broken.png", b"not a png".to_vec());

        let err = run(&ctx, &CancelFlag::new()).unwrap_err();

        assert!(matches!(err, AssetpipeError::Transform { kind: AssetKind::Img, .. }), "{err:?}");
    }
}
