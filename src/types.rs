// src/types.rs

use std::fmt;

use serde::Deserialize;

/// Logical category of source asset.
///
/// The set is closed: every kind has exactly one Path Table entry and one
/// stage runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Html,
    Style,
    Js,
    Img,
    Static,
    Fonts,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Html,
        AssetKind::Style,
        AssetKind::Js,
        AssetKind::Img,
        AssetKind::Static,
        AssetKind::Fonts,
    ];

    /// Stable position of the kind inside [`AssetKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            AssetKind::Html => 0,
            AssetKind::Style => 1,
            AssetKind::Js => 2,
            AssetKind::Img => 3,
            AssetKind::Static => 4,
            AssetKind::Fonts => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Html => "html",
            AssetKind::Style => "style",
            AssetKind::Js => "js",
            AssetKind::Img => "img",
            AssetKind::Static => "static",
            AssetKind::Fonts => "fonts",
        }
    }

    /// Name of the single-stage task for this kind, as typed on the command line.
    pub fn task_name(self) -> &'static str {
        match self {
            AssetKind::Html => "html:build",
            AssetKind::Style => "style:build",
            AssetKind::Js => "script:build",
            AssetKind::Img => "images:build",
            AssetKind::Static => "other:build",
            AssetKind::Fonts => "fonts:build",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour when a change arrives for a kind whose stage is already running.
///
/// - `Queue`: let the running invocation finish, then run once more. Any
///   number of changes during the run collapse into that single rerun
///   (default behaviour).
/// - `Cancel`: stop the running invocation from writing any further outputs
///   and start a fresh one immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}
