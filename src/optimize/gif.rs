// src/optimize/gif.rs

use anyhow::{bail, Context, Result};
use gif::{ColorOutput, DecodeOptions, Encoder, Frame};

/// GIF interlace passes as (first row, row step).
const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Rewrite every frame interlaced, keeping palettes, timing and looping.
pub fn interlace(input: &[u8]) -> Result<Vec<u8>> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let mut decoder = options.read_info(input).context("reading gif header")?;

    let (width, height) = (decoder.width(), decoder.height());
    let global_palette = decoder.global_palette().map(<[u8]>::to_vec).unwrap_or_default();
    let repeat = decoder.repeat();

    let mut frames: Vec<Frame<'static>> = Vec::new();
    while let Some(frame) = decoder.read_next_frame().context("decoding gif frame")? {
        let mut frame = frame.clone();
        let rows = interlace_rows(&frame.buffer, usize::from(frame.width), usize::from(frame.height))?;
        frame.buffer = rows.into();
        frame.interlaced = true;
        frames.push(frame);
    }

    let mut out = Vec::with_capacity(input.len());
    {
        let mut encoder = Encoder::new(&mut out, width, height, &global_palette)
            .context("starting gif encoder")?;
        if frames.len() > 1 {
            encoder.set_repeat(repeat).context("writing gif loop count")?;
        }
        for frame in &frames {
            encoder.write_frame(frame).context("encoding gif frame")?;
        }
    }
    Ok(out)
}

/// Reorder rows from top-to-bottom into GIF interlace order.
fn interlace_rows(buffer: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if buffer.len() != width * height {
        bail!(
            "gif frame buffer has {} bytes, expected {}x{}",
            buffer.len(),
            width,
            height
        );
    }
    let mut out = Vec::with_capacity(buffer.len());
    for (start, step) in PASSES {
        for row in (start..height).step_by(step) {
            out.extend_from_slice(&buffer[row * width..(row + 1) * width]);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn striped_gif(width: u16, height: u16) -> (Vec<u8>, Vec<u8>) {
        let palette = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255];
        let pixels: Vec<u8> = (0..height)
            .flat_map(|row| std::iter::repeat_n((row % 4) as u8, usize::from(width)))
            .collect();
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, width, height, &palette).unwrap();
            let frame = Frame {
                width,
                height,
                buffer: Cow::Borrowed(&pixels),
                ..Frame::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
        (out, pixels)
    }

    #[test]
    fn row_order_follows_the_four_passes() {
        let buffer: Vec<u8> = (0..8).collect();
        let out = interlace_rows(&buffer, 1, 8).unwrap();
        assert_eq!(out, vec![0, 4, 2, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        assert!(interlace_rows(&[1, 2, 3], 2, 2).is_err());
    }

    #[test]
    fn interlaced_gif_decodes_to_same_pixels() {
        let (input, pixels) = striped_gif(6, 11);
        let output = interlace(&input).unwrap();

        let mut options = DecodeOptions::new();
        options.set_color_output(ColorOutput::Indexed);
        let mut decoder = options.read_info(output.as_slice()).unwrap();
        let frame = decoder.read_next_frame().unwrap().unwrap();

        assert!(frame.interlaced);
        assert_eq!(frame.buffer.as_ref(), pixels.as_slice());
    }
}
