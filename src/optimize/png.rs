// src/optimize/png.rs

use anyhow::{anyhow, Result};

/// oxipng preset; matches optipng `-o5`.
pub const PRESET: u8 = 5;

pub fn recompress(input: &[u8]) -> Result<Vec<u8>> {
    let options = oxipng::Options::from_preset(PRESET);
    oxipng::optimize_from_memory(input, &options).map_err(|e| anyhow!("optimising png: {e}"))
}
