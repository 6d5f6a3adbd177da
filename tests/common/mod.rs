#![allow(dead_code, unused_imports)]

pub use assetpipe_test_utils::builders::ConfigFileBuilder;
pub use assetpipe_test_utils::fixtures::{CountingOptimizer, ProjectFixture};
pub use assetpipe_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
