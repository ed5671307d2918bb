//! End-to-end batch edits over real tree-sitter grammars.

use proptest::prelude::*;
use std::path::Path;
use tree_patcher::{
    edit_all, find_hits, zap_all_matches, BatchOptions, EditPolicy, FileError, InMemoryProject,
    PathEngine, PatternEvaluator, ReplacementOptions, SupportLang, TreeSitterParser,
};

const DECLARATION: &str = "const x: number = 10;";
const ANNOTATION_TOKENS: &str = "//variable_declarator/type_annotation/*";
const COLON_AND_FOLLOWING: &str =
    "//variable_declarator//':'/following-sibling::* | //variable_declarator//':'";

fn typescript() -> TreeSitterParser {
    TreeSitterParser::for_language(SupportLang::TypeScript).unwrap()
}

fn zap_annotation(query: &str, cleanup: ReplacementOptions) -> String {
    let mut project = InMemoryProject::of([("src/decl.ts", DECLARATION)]);
    let report = zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/**/*.ts",
        query,
        BatchOptions::default().with_cleanup(cleanup),
    )
    .unwrap();
    assert!(report.is_clean());
    assert_eq!(project.write_count("src/decl.ts"), 1);
    project.content("src/decl.ts").unwrap().to_string()
}

#[test]
fn zap_annotation_tokens() {
    assert_eq!(
        zap_annotation(ANNOTATION_TOKENS, ReplacementOptions::default()),
        "const x  = 10;"
    );
}

#[test]
fn zap_colon_and_following_sibling() {
    assert_eq!(
        zap_annotation(COLON_AND_FOLLOWING, ReplacementOptions::default()),
        "const x  = 10;"
    );
    assert_eq!(
        zap_annotation(COLON_AND_FOLLOWING, ReplacementOptions::collapse_trailing_whitespace()),
        "const x = 10;"
    );
}

#[test]
fn zap_annotation_tokens_and_trailing_whitespace() {
    assert_eq!(
        zap_annotation(ANNOTATION_TOKENS, ReplacementOptions::zap_trailing_whitespace()),
        "const x= 10;"
    );
}

#[test]
fn zap_annotation_tokens_collapsing_whitespace() {
    assert_eq!(
        zap_annotation(ANNOTATION_TOKENS, ReplacementOptions::collapse_trailing_whitespace()),
        "const x = 10;"
    );
}

#[test]
fn parse_failure_skips_only_that_file() {
    let mut project = InMemoryProject::of([
        ("src/a.ts", "let a: string = 'a';\n"),
        ("src/b.ts", "let b: = ;\n"),
        ("src/c.ts", "let c: boolean = true;\n"),
    ]);

    let report = zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/*.ts",
        "//type_annotation",
        BatchOptions::default(),
    )
    .unwrap();

    assert_eq!(report.modified.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, Path::new("src/b.ts"));
    assert!(matches!(report.failures[0].error, FileError::Parse(_)));

    assert_eq!(project.content("src/a.ts"), Some("let a = 'a';\n"));
    assert_eq!(project.content("src/b.ts"), Some("let b: = ;\n"));
    assert_eq!(project.content("src/c.ts"), Some("let c = true;\n"));
    assert_eq!(project.write_count("src/b.ts"), 0);
}

#[test]
fn deeply_nested_expression_is_edited() {
    let terms = vec!["1"; 30_000].join("+");
    let deep = format!("const total: number = {terms};\n");
    let mut project = InMemoryProject::of([
        ("src/deep.ts", deep.as_str()),
        ("src/small.ts", "let s: string = 's';\n"),
    ]);

    let report = zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/*.ts",
        "//type_annotation",
        BatchOptions::default(),
    )
    .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.modified.len(), 2);
    assert_eq!(
        project.content("src/deep.ts"),
        Some(format!("const total = {terms};\n").as_str())
    );
    assert_eq!(project.content("src/small.ts"), Some("let s = 's';\n"));
}

#[test]
fn zero_matches_leave_files_unwritten() {
    let mut project = InMemoryProject::of([("src/a.ts", "let a = 1;\n")]);
    let report = zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/*.ts",
        "//type_annotation",
        BatchOptions::default(),
    )
    .unwrap();

    assert!(report.matched.is_empty());
    assert_eq!(project.write_count("src/a.ts"), 0);
}

#[test]
fn unknown_node_name_rejected_up_front() {
    let mut project = InMemoryProject::of([("src/a.ts", "let a = 1;\n")]);
    let result = zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/*.ts",
        "//no_such_production",
        BatchOptions::default(),
    );
    assert!(result.is_err());
    assert_eq!(project.write_count("src/a.ts"), 0);
}

#[test]
fn pattern_engine_replaces_calls() {
    let source = "console.log(a);\nlet y = 1;\nconsole.log(b, c);\n";
    let mut project = InMemoryProject::of([("app.js", source)]);

    let report = edit_all(
        &mut project,
        &TreeSitterParser::for_language(SupportLang::JavaScript).unwrap(),
        &PatternEvaluator::new(SupportLang::JavaScript),
        "*.js",
        "console.log($$$ARGS)",
        EditPolicy::Replace("trace()".into()),
        BatchOptions::default(),
    )
    .unwrap();

    assert_eq!(report.modified.len(), 1);
    assert_eq!(
        project.content("app.js"),
        Some("trace();\nlet y = 1;\ntrace();\n")
    );
}

#[test]
fn nested_queries_flush_with_parent() {
    let mut project = InMemoryProject::of([("src/decl.ts", DECLARATION)]);
    let parser = typescript();

    let mut hit = find_hits(
        &project,
        &parser,
        &PathEngine,
        Path::new("src/decl.ts"),
        "//lexical_declaration",
    )
    .unwrap()
    .unwrap();

    for m in hit.matches_mut() {
        m.prepend("export ").unwrap();
        for mut ident in m.evaluate_expression(&PathEngine, "//identifier").unwrap() {
            ident.append("_renamed").unwrap();
        }
    }
    assert_eq!(hit.pending_updates(), 2);

    assert!(hit.flush(&mut project).unwrap().is_written());
    assert_eq!(
        project.content("src/decl.ts"),
        Some("export const x_renamed: number = 10;")
    );
}

#[test]
fn multibyte_text_keeps_byte_offsets() {
    let mut project = InMemoryProject::of([("src/a.ts", "let s: string = 'héllo';\nlet n: number = 1;\n")]);
    zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "src/*.ts",
        "//type_annotation",
        BatchOptions::default(),
    )
    .unwrap();
    assert_eq!(
        project.content("src/a.ts"),
        Some("let s = 'héllo';\nlet n = 1;\n")
    );
}

fn declarations(n: usize) -> String {
    (0..n).map(|i| format!("let a{i}: T{i} = {i};\n")).collect()
}

fn zap_annotation_of(source: &str, index: usize) -> String {
    let mut project = InMemoryProject::of([("m.ts", source)]);
    let query = format!("//type_annotation[@value=': T{index}']");
    zap_all_matches(
        &mut project,
        &typescript(),
        &PathEngine,
        "m.ts",
        &query,
        BatchOptions::default(),
    )
    .unwrap();
    project.content("m.ts").unwrap().to_string()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Zapping a set of annotations in one flush matches zapping them one
    /// file rewrite at a time, in any order.
    #[test]
    fn deletions_commute(
        (n, selected, order) in (1usize..7).prop_flat_map(|n| (
            Just(n),
            proptest::collection::vec(any::<bool>(), n),
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        ))
    ) {
        let source = declarations(n);
        let chosen: Vec<usize> = (0..n).filter(|&i| selected[i]).collect();

        let mut project = InMemoryProject::of([("m.ts", source.as_str())]);
        if let Some(mut hit) = find_hits(&project, &typescript(), &PathEngine, Path::new("m.ts"), "//type_annotation").unwrap() {
            for m in hit.matches_mut() {
                let index: usize = m.value().trim_start_matches(": T").parse().unwrap();
                if chosen.contains(&index) {
                    m.zap(&ReplacementOptions::default()).unwrap();
                }
            }
            let _outcome = hit.flush(&mut project).unwrap();
        }
        let at_once = project.content("m.ts").unwrap().to_string();

        let mut one_by_one = source.clone();
        for &i in order.iter().filter(|i| chosen.contains(*i)) {
            one_by_one = zap_annotation_of(&one_by_one, i);
        }

        prop_assert_eq!(at_once, one_by_one);
    }
}
