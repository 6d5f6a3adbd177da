#![allow(dead_code)]

use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assetpipe::optimize::{DefaultOptimizer, ImageFormat, ImageOptimizer};
use tempfile::TempDir;

/// A throwaway site on disk with one source of every kind.
///
/// ```text
/// src/index.html            includes partials/nav.html
/// src/style/main.sass       imports _vars.scss
/// src/js/main.js            includes lib/util.js
/// src/img/{logo.png, photo.jpg, anim.gif, icon.svg}
/// src/fonts/site.woff2
/// src/static/robots.txt
/// ```
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let fixture = Self { dir };

        fixture.write(
            "src/index.html",
            "<html>\n<head><link rel=\"stylesheet\" href=\"style/main.css\"></head>\n<body>\n  //= partials/nav.html\n  <script src=\"js/main.js\"></script>\n</body>\n</html>\n",
        );
        fixture.write("src/partials/nav.html", "<nav><a href=\"/\">home</a></nav>\n");

        fixture.write("src/style/main.sass", "@import 'vars'\n\nbody\n  color: $brand\n  user-select: none\n");
        fixture.write("src/style/_vars.scss", "$brand: #336699;\n");

        fixture.write("src/js/main.js", "//= lib/util.js\nfunction main() {\n  return increment(41);\n}\nmain();\n");
        fixture.write("src/js/lib/util.js", "function increment(value) {\n  return value + 1;\n}\n");

        fixture.write_bytes("src/img/logo.png", &sample_png());
        fixture.write_bytes("src/img/photo.jpg", &sample_jpeg());
        fixture.write_bytes("src/img/anim.gif", &sample_gif());
        fixture.write(
            "src/img/icon.svg",
            "<?xml version=\"1.0\"?>\n<!-- exported -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"8\" height=\"8\" viewBox=\"0 0 8 8\">\n  <circle id=\"dot\" cx=\"4\" cy=\"4\" r=\"3\"/>\n</svg>\n",
        );

        fixture.write_bytes("src/fonts/site.woff2", b"wOF2 fixture font");
        fixture.write("src/static/robots.txt", "User-agent: *\n");

        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        self.write_bytes(rel, contents.as_bytes());
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture parent dir");
        }
        fs::write(&path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every file below `rel` with its contents, keyed by path relative to
    /// `rel`, sorted.
    pub fn snapshot(&self, rel: &str) -> Vec<(String, Vec<u8>)> {
        let base = self.path(rel);
        let mut out = Vec::new();
        collect_files(&base, &base, &mut out);
        out.sort();
        out
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, out);
        } else {
            let rel = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push((rel, fs::read(&path).unwrap_or_default()));
        }
    }
}

/// `DefaultOptimizer` that counts how often it is invoked.
#[derive(Debug, Clone, Default)]
pub struct CountingOptimizer {
    inner: DefaultOptimizer,
    calls: Arc<AtomicUsize>,
}

impl CountingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageOptimizer for CountingOptimizer {
    fn optimize(&self, format: ImageFormat, input: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.optimize(format, input)
    }

    fn params_tag(&self) -> &str {
        self.inner.params_tag()
    }
}

pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode fixture png");
    out.into_inner()
}

pub fn sample_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(32, 24, |x, y| image::Rgb([(x * 8) as u8, (y * 10) as u8, 64]));
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .encode_image(&img)
        .expect("encode fixture jpeg");
    out
}

pub fn sample_gif() -> Vec<u8> {
    let (width, height) = (8u16, 8u16);
    let palette = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255];
    let pixels: Vec<u8> = (0..width * height).map(|i| ((i / width) % 4) as u8).collect();
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &palette).expect("start fixture gif");
        let frame = gif::Frame {
            width,
            height,
            buffer: Cow::Borrowed(&pixels),
            ..gif::Frame::default()
        };
        encoder.write_frame(&frame).expect("encode fixture gif");
    }
    out
}
