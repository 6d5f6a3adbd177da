// src/optimize/mod.rs

//! Lossless image optimisers for the `img` stage.
//!
//! | format | treatment                              |
//! |--------|----------------------------------------|
//! | GIF    | rewritten interlaced                   |
//! | JPEG   | kept byte for byte after a structure check |
//! | PNG    | recompressed at oxipng preset 5        |
//! | SVG    | markup cleanup, `id`s kept, redundant `viewBox` dropped |
//!
//! An optimised result is never larger than its input; when it would be,
//! the original bytes are kept.

use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;

use anyhow::Result;

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod svg;

/// Version tag of the optimiser parameters. Part of every cache key, so
/// changing any parameter below must change this string.
pub const OPTIMIZER_PARAMS: &str = "gif:interlace;jpeg:lossless;png:o5;svg:keep-ids,viewbox,text;v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Svg,
}

impl ImageFormat {
    /// Detect by file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?.to_ascii_lowercase();
        match ext.as_str() {
            "gif" => Some(ImageFormat::Gif),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }
}

/// Pure bytes-to-bytes image transformer.
///
/// Implementations must be deterministic: equal input and parameters give
/// equal output, which is what makes caching sound.
pub trait ImageOptimizer: Send + Sync + Debug {
    fn optimize(&self, format: ImageFormat, input: &[u8]) -> Result<Vec<u8>>;

    /// Identifies the parameter set; mixed into cache keys.
    fn params_tag(&self) -> &str;
}

/// Production optimiser.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOptimizer;

impl ImageOptimizer for DefaultOptimizer {
    fn optimize(&self, format: ImageFormat, input: &[u8]) -> Result<Vec<u8>> {
        let optimized = match format {
            ImageFormat::Gif => gif::interlace(input)?,
            ImageFormat::Jpeg => jpeg::lossless(input)?,
            ImageFormat::Png => png::recompress(input)?,
            ImageFormat::Svg => svg::cleanup(input)?,
        };
        Ok(keep_smaller(input, optimized))
    }

    fn params_tag(&self) -> &str {
        OPTIMIZER_PARAMS
    }
}

fn keep_smaller(original: &[u8], optimized: Vec<u8>) -> Vec<u8> {
    if optimized.len() <= original.len() {
        optimized
    } else {
        original.to_vec()
    }
}
