use std::path::Path;

use proptest::prelude::*;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::pipeline::include::expand_includes;

proptest! {
    #[test]
    fn text_without_directives_is_unchanged(
        lines in proptest::collection::vec("[a-zA-Z0-9 <>/=\"{};.]{0,40}", 0..20),
    ) {
        let text: String = lines
            .iter()
            .filter(|l| !l.trim_start().starts_with("//="))
            .map(|l| format!("{l}\n"))
            .collect();

        let fs = MockFileSystem::new();
        fs.add_file("src/page.html", text.clone());

        let expanded = expand_includes(&fs, Path::new("src/page.html")).unwrap();
        prop_assert_eq!(expanded.text, text);
        prop_assert_eq!(expanded.sources.len(), 1);
    }

    #[test]
    fn included_body_appears_verbatim_at_top_level(
        body in proptest::collection::vec("[a-z0-9 ;(){}]{1,30}", 1..8),
    ) {
        let body: Vec<String> = body.into_iter().filter(|l| !l.trim().is_empty()).collect();
        prop_assume!(!body.is_empty());
        let partial: String = body.iter().map(|l| format!("{l}\n")).collect();

        let fs = MockFileSystem::new();
        fs.add_file("src/main.js", "before();\n//= lib/part.js\nafter();\n");
        fs.add_file("src/lib/part.js", partial.clone());

        let expanded = expand_includes(&fs, Path::new("src/main.js")).unwrap();
        prop_assert_eq!(expanded.text, format!("before();\n{partial}after();\n"));
    }
}
