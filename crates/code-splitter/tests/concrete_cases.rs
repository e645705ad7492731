use context_code_splitter::{
    ChunkOrigin, ChunkPart, ChunkType, FallbackReason, Granularity, LanguageRegistry,
    LanguageSpec, SharedRegistry, SplitResult, Splitter, SplitterConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const BANK_ONE_LINE: &str =
    "contract Bank { function deposit() {} modifier onlyOwner() {} event Deposit(); struct Tx {} }\n";

const BANK: &str = r"pragma solidity ^0.8.0;

contract Bank {
    event Deposit();

    struct Tx {
        uint256 amount;
    }

    modifier onlyOwner() {
        _;
    }

    function deposit() public {
        emit Deposit();
    }
}
";

fn solidity_like_registry() -> Arc<SharedRegistry> {
    let mut registry = LanguageRegistry::new();
    registry
        .register(LanguageSpec {
            identifier: "solidity".to_string(),
            aliases: vec!["sol".to_string()],
            extensions: vec![".sol".to_string()],
            boundary_node_types: [
                "contract_declaration",
                "function_definition",
                "modifier_definition",
                "event_definition",
                "struct_declaration",
            ]
            .iter()
            .map(|t| (*t).to_string())
            .collect(),
            grammar: None,
        })
        .expect("register solidity");
    Arc::new(SharedRegistry::new(registry))
}

fn splitter_with(config: SplitterConfig, registry: Arc<SharedRegistry>) -> Splitter {
    Splitter::with_registry(config, registry).expect("valid config")
}

fn layout(result: &SplitResult) -> Vec<(usize, usize, Option<&str>, ChunkOrigin)> {
    result
        .iter()
        .map(|c| {
            (
                c.start_line,
                c.end_line,
                c.metadata.node_type.as_deref(),
                c.metadata.origin,
            )
        })
        .collect()
}

#[test]
fn solidity_bank_contract_keeps_every_member() {
    let splitter = splitter_with(SplitterConfig::default(), solidity_like_registry());
    let result = splitter.split(BANK_ONE_LINE, Some("solidity"), None);

    assert!(result.used_syntax(), "fell back: {:?}", result.fallback);
    assert_eq!(result.language, "solidity");
    assert_eq!(
        layout(&result),
        vec![(1, 1, Some("contract_declaration"), ChunkOrigin::Declaration)]
    );

    let contract = &result[0];
    assert_eq!(contract.metadata.chunk_type, Some(ChunkType::Contract));
    assert!(contract.content.contains("contract Bank"));
    for member in [
        "function deposit",
        "modifier onlyOwner",
        "event Deposit",
        "struct Tx",
    ] {
        assert!(contract.content.contains(member), "missing {member}");
    }
    assert_eq!(result.reconstruct(), BANK_ONE_LINE);
}

#[test]
fn solidity_contract_is_one_chunk_under_outermost_granularity() {
    let splitter = splitter_with(SplitterConfig::default(), solidity_like_registry());
    let result = splitter.split(BANK, None, Some("contracts/Bank.sol"));

    assert!(result.used_syntax(), "fell back: {:?}", result.fallback);
    assert_eq!(
        layout(&result),
        vec![
            (1, 2, None, ChunkOrigin::Gap),
            (3, 17, Some("contract_declaration"), ChunkOrigin::Declaration),
        ]
    );
    assert!(result[0].content.starts_with("pragma solidity"));
    assert!(result[1].content.starts_with("contract Bank {"));
    result.verify(BANK).expect("partition");
}

#[test]
fn solidity_members_split_out_under_nested_granularity() {
    let config = SplitterConfig {
        granularity: Granularity::Nested,
        ..SplitterConfig::default()
    };
    let splitter = splitter_with(config, solidity_like_registry());
    let result = splitter.split(BANK, None, Some("contracts/Bank.sol"));

    assert!(result.used_syntax(), "fell back: {:?}", result.fallback);
    let contract = Some("contract_declaration");
    assert_eq!(
        layout(&result),
        vec![
            (1, 2, None, ChunkOrigin::Gap),
            (3, 3, contract, ChunkOrigin::Residual),
            (4, 4, Some("event_definition"), ChunkOrigin::Declaration),
            (5, 5, contract, ChunkOrigin::Residual),
            (6, 8, Some("struct_declaration"), ChunkOrigin::Declaration),
            (9, 9, contract, ChunkOrigin::Residual),
            (10, 12, Some("modifier_definition"), ChunkOrigin::Declaration),
            (13, 13, contract, ChunkOrigin::Residual),
            (14, 16, Some("function_definition"), ChunkOrigin::Declaration),
            (17, 17, contract, ChunkOrigin::Residual),
        ]
    );

    let declarations: Vec<_> = result
        .iter()
        .filter(|c| c.metadata.origin == ChunkOrigin::Declaration)
        .collect();
    for (chunk, member) in declarations.iter().zip([
        "event Deposit",
        "struct Tx",
        "modifier onlyOwner",
        "function deposit",
    ]) {
        assert!(chunk.content.contains(member), "{member} not in {chunk:?}");
    }
    assert!(result[1].content.contains("contract Bank"));
    result.verify(BANK).expect("partition");
}

#[test]
fn aliases_yield_identical_boundaries() {
    let splitter = splitter_with(SplitterConfig::default(), solidity_like_registry());
    let full = splitter.split(BANK, Some("solidity"), None);
    let short = splitter.split(BANK, Some("sol"), None);
    assert_eq!(full, short);

    let splitter = Splitter::default();
    let code = "fn a() {}\n\nstruct B;\n";
    assert_eq!(
        splitter.split(code, Some("rust"), None),
        splitter.split(code, Some("rs"), None)
    );

    let ranges = |hint: Option<&str>, path: Option<&str>| -> Vec<(usize, usize)> {
        splitter
            .split(code, hint, path)
            .iter()
            .map(|c| (c.start_line, c.end_line))
            .collect()
    };
    assert_eq!(ranges(Some("RUST"), None), ranges(None, Some("lib.rs")));
}

#[test]
fn long_declaration_is_cut_into_bounded_windows() {
    let mut code = String::from("fn long() {\n");
    for i in 0..18 {
        code.push_str(&format!("    let v{i} = {i};\n"));
    }
    code.push_str("}\n");

    let config = SplitterConfig {
        max_chunk_lines: Some(5),
        ..SplitterConfig::default()
    };
    let result = Splitter::new(config).expect("valid").split(&code, Some("rust"), None);

    let ranges: Vec<_> = result.iter().map(|c| (c.start_line, c.end_line)).collect();
    assert_eq!(ranges, vec![(1, 5), (6, 10), (11, 15), (16, 20)]);
    for (index, chunk) in result.iter().enumerate() {
        assert!(chunk.line_count() <= 5);
        assert_eq!(chunk.metadata.symbol_name.as_deref(), Some("long"));
        assert_eq!(chunk.metadata.part, Some(ChunkPart { index, count: 4 }));
    }
    assert_eq!(result.reconstruct(), code);
}

#[test]
fn unregistered_language_never_fails() {
    let text = "first line\nsecond line\nthird line";
    let result = Splitter::default().split(text, Some("not-a-real-lang"), Some("notes.xyz"));

    assert!(!result.is_empty());
    assert_eq!(result.fallback, Some(FallbackReason::UnsupportedLanguage));
    assert_eq!(result[0].start_line, 1);
    assert_eq!(result[result.len() - 1].end_line, 3);
    assert_eq!(result.reconstruct(), text);
    assert!(result
        .iter()
        .all(|c| c.file_path.as_deref() == Some("notes.xyz")));
}

#[test]
fn fallback_windows_follow_configured_size() {
    let text: String = (1..=25).map(|i| format!("line {i}\n")).collect();
    let config = SplitterConfig {
        fallback_window_lines: 10,
        ..SplitterConfig::default()
    };
    let result = Splitter::new(config).expect("valid").split(&text, None, None);

    let ranges: Vec<_> = result.iter().map(|c| (c.start_line, c.end_line)).collect();
    assert_eq!(ranges, vec![(1, 10), (11, 20), (21, 25)]);
    assert!(result
        .iter()
        .all(|c| c.metadata.origin == ChunkOrigin::Fallback));
}

#[test]
fn python_class_granularity_both_ways() {
    let code = "import os\n\nclass Greeter:\n    def hello(self):\n        return 'hi'\n\n    def bye(self):\n        return 'bye'\n";

    let outer = Splitter::default().split(code, Some("python"), None);
    let outer_ranges: Vec<_> = outer.iter().map(|c| (c.start_line, c.end_line)).collect();
    assert_eq!(outer_ranges, vec![(1, 2), (3, 8)]);

    let nested = Splitter::new(SplitterConfig::fine_grained())
        .expect("valid")
        .split(code, Some("python"), None);
    let names: Vec<_> = nested
        .iter()
        .filter(|c| c.metadata.origin == ChunkOrigin::Declaration)
        .filter_map(|c| c.metadata.symbol_name.as_deref())
        .collect();
    assert_eq!(names, vec!["hello", "bye"]);
    nested.verify(code).expect("partition");
}
