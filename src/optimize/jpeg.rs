// src/optimize/jpeg.rs

//! JPEGs are kept byte for byte, metadata segments included. Only the
//! marker structure is checked, so a corrupt file still fails the stage.

use anyhow::{bail, Result};
use tracing::debug;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;

/// What the marker walk found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub progressive: bool,
    /// APPn segments (EXIF, ICC, JFIF ...) before the first scan.
    pub app_segments: usize,
}

/// Validate `input` and return it unchanged.
pub fn lossless(input: &[u8]) -> Result<Vec<u8>> {
    let info = inspect(input)?;
    debug!(
        progressive = info.progressive,
        app_segments = info.app_segments,
        bytes = input.len(),
        "jpeg kept as-is"
    );
    Ok(input.to_vec())
}

/// Walk the segments up to the first scan and check that the entropy-coded
/// data is terminated.
pub fn inspect(input: &[u8]) -> Result<JpegInfo> {
    if input.len() < 4 || input[0] != 0xFF || input[1] != SOI {
        bail!("not a jpeg: missing start-of-image marker");
    }

    let mut pos = 2;
    let mut frame: Option<bool> = None;
    let mut app_segments = 0;

    loop {
        if input.get(pos) != Some(&0xFF) {
            bail!("corrupt jpeg: expected a marker at byte {pos}");
        }
        // Fill bytes may precede a marker.
        while input.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = input.get(pos) else {
            bail!("corrupt jpeg: truncated marker");
        };
        pos += 1;

        match marker {
            EOI => bail!("corrupt jpeg: end of image before any scan"),
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let Some(len_bytes) = input.get(pos..pos + 2) else {
            bail!("corrupt jpeg: truncated segment length");
        };
        let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
        if len < 2 || pos + len > input.len() {
            bail!("corrupt jpeg: segment 0x{marker:02X} overruns the file");
        }

        match marker {
            0xC0 | 0xC1 | 0xC3 | 0xC5..=0xC7 | 0xC9 | 0xCB | 0xCD | 0xCF => frame = Some(false),
            0xC2 | 0xCA | 0xCE => frame = Some(true),
            0xE0..=0xEF => app_segments += 1,
            _ => {}
        }
        pos += len;

        if marker == SOS {
            let Some(progressive) = frame else {
                bail!("corrupt jpeg: scan before frame header");
            };
            if !input[pos..].windows(2).any(|w| w == [0xFF, EOI]) {
                bail!("corrupt jpeg: missing end-of-image marker");
            }
            return Ok(JpegInfo {
                progressive,
                app_segments,
            });
        }
    }
}
