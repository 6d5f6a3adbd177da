// src/dag/task.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::AssetpipeError;
use crate::types::AssetKind;

/// Entry points accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskName {
    Clean,
    Clear,
    Watch,
    /// One stage runner (`html:build`, `style:build`, ...).
    Stage(AssetKind),
    /// `clean`, then all six stages concurrently.
    Build,
    /// `build`, then `watch`.
    Dev,
    /// `watch` alone, assuming a previous build.
    Default,
}

impl TaskName {
    pub fn all() -> Vec<TaskName> {
        let mut names = vec![TaskName::Clean, TaskName::Clear, TaskName::Watch];
        names.extend(AssetKind::ALL.into_iter().map(TaskName::Stage));
        names.extend([TaskName::Build, TaskName::Dev, TaskName::Default]);
        names
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::Clean => "clean",
            TaskName::Clear => "clear",
            TaskName::Watch => "watch",
            TaskName::Stage(kind) => kind.task_name(),
            TaskName::Build => "build",
            TaskName::Dev => "dev",
            TaskName::Default => "default",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = AssetpipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TaskName::all()
            .into_iter()
            .find(|task| task.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = TaskName::all().into_iter().map(TaskName::as_str).collect();
                AssetpipeError::UnknownTask(format!("{wanted} (expected one of: {})", valid.join(", ")))
            })
    }
}

/// Unit of work inside a [`TaskGraph`](crate::dag::TaskGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    Clean,
    Clear,
    Stage(AssetKind),
    Watch,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Clean => f.write_str("clean"),
            Node::Clear => f.write_str("clear"),
            Node::Stage(kind) => f.write_str(kind.task_name()),
            Node::Watch => f.write_str("watch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_name_parses_back() {
        for task in TaskName::all() {
            assert_eq!(task.as_str().parse::<TaskName>().unwrap(), task);
        }
        assert_eq!(TaskName::all().len(), 12);
    }

    #[test]
    fn stage_names_follow_the_command_surface() {
        assert_eq!("script:build".parse::<TaskName>().unwrap(), TaskName::Stage(AssetKind::Js));
        assert_eq!("other:build".parse::<TaskName>().unwrap(), TaskName::Stage(AssetKind::Static));
        assert_eq!("images:build".parse::<TaskName>().unwrap(), TaskName::Stage(AssetKind::Img));
    }

    #[test]
    fn unknown_task_lists_valid_names() {
        let err = "deploy".parse::<TaskName>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("deploy"), "{message}");
        assert!(message.contains("style:build"), "{message}");
    }
}
