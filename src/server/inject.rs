// src/server/inject.rs

use anyhow::{Context, Result};
use regex::Regex;

use crate::server::CLIENT_PATH;

/// Adds the live-reload client `<script>` to served HTML pages.
#[derive(Debug, Clone)]
pub struct SnippetInjector {
    body_close: Regex,
    snippet: String,
}

impl SnippetInjector {
    pub fn new() -> Result<Self> {
        let body_close = Regex::new(r"(?i)</body\s*>").context("compiling </body> matcher")?;
        Ok(Self {
            body_close,
            snippet: format!(r#"<script src="{CLIENT_PATH}" async></script>"#),
        })
    }

    /// Insert the snippet before the last `</body>`, or append it when the
    /// page has none.
    pub fn inject(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len() + self.snippet.len());
        match self.body_close.find_iter(html).last() {
            Some(m) => {
                out.push_str(&html[..m.start()]);
                out.push_str(&self.snippet);
                out.push_str(&html[m.start()..]);
            }
            None => {
                out.push_str(html);
                out.push_str(&self.snippet);
            }
        }
        out
    }
}

/// Browser side of the live-reload protocol.
pub const CLIENT_JS: &str = r#"(function () {
  if (!window.EventSource) { return; }
  var source = new EventSource("/__assetpipe/events");
  function refreshStyles(paths) {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var stamp = Date.now();
    links.forEach(function (link) {
      var url = new URL(link.href, location.href);
      if (url.origin !== location.origin) { return; }
      if (paths.length && paths.indexOf(url.pathname) === -1) { return; }
      url.searchParams.set("assetpipe", stamp);
      link.href = url.toString();
    });
  }
  source.addEventListener("css", function (e) {
    refreshStyles(JSON.parse(e.data).paths || []);
  });
  source.addEventListener("reload", function () {
    location.reload();
  });
})();
"#;
