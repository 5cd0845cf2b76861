// Command-line interface for mdblocks
//
// This binary converts Markdown to and from the mdblocks block model, normalizes Markdown,
// inspects the parsed block tree and turns clipboard dumps into tables.
//
// The core capabilities live in the mdblocks-babel crate. This crate only reads files, layers
// configuration (mdblocks-config) and prints results.
//
// Converting:
//
// The conversion needs a to and from pair. The from is auto-detected from the file extension, while
// being overwrittable by an explicit --from flag.
// Usage:
//  mdblocks <input> --to <format> [--from <format>] [--output <file>]  - Convert between formats (default)
//  mdblocks convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above (explicit)
//  mdblocks format <input>                     - Re-serialize Markdown with the configured style
//  mdblocks inspect <path> [<transform>]       - Execute a transform (defaults to "blocks-tree")
//  mdblocks table [<text>] [--html <file>] [--into <doc>] - Build or paste a table from a clipboard dump
//  mdblocks --list-transforms                  - List available transforms
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the format/transform.
// Example:
//  mdblocks format notes.md --extra-bullet-char '*' --extra-list-indent 4

mod transforms;

use clap::{Arg, ArgAction, Command, ValueHint};
use mdblocks_babel::clipboard::{
    looks_like_table_data, merge_into_table_block, parse_clipboard_data, ClipboardPayload,
};
use mdblocks_babel::formats::MarkdownFormat;
use mdblocks_babel::model::{Block, BlockType, Document, ParsedTableData};
use mdblocks_babel::FormatRegistry;
use mdblocks_config::{Loader, MdblocksConfig};
use std::collections::HashMap;
use std::fs;

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = if let Some(key) = arg.strip_prefix("--extra-") {
            Some(key)
        } else {
            arg.strip_prefix("--extras-")
        };

        if let Some(key) = key_opt {
            // A following bare word is the value; a flag or the end makes this a boolean
            let has_value = args
                .get(i + 1)
                .is_some_and(|next| !next.starts_with("--") && next != "-v" && next != "-vv");

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

const SUBCOMMANDS: &[&str] = &["convert", "format", "inspect", "table", "help"];

fn build_cli() -> Command {
    Command::new("mdblocks")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown to and from block documents")
        .long_about(
            "mdblocks is a command-line tool for moving content between Markdown and a\n\
            block-structured rich-text model.\n\n\
            Commands:\n  \
            - convert: Transform between document formats (markdown, json)\n  \
            - format:  Re-serialize Markdown with the configured style\n  \
            - inspect: View the parsed block tree, warnings and side tables\n  \
            - table:   Turn a clipboard dump (HTML, TSV, CSV, pipe table) into a table\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            mdblocks notes.md --to json                    # Blocks as JSON (stdout)\n  \
            mdblocks blocks.json --to markdown -o out.md   # Back to Markdown\n  \
            mdblocks inspect notes.md                      # Block tree\n  \
            mdblocks format notes.md --extra-bullet-char '*'",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-transforms")
                .long("list-transforms")
                .help("List available transforms")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a mdblocks.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log pipeline details to stderr (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Inspect the block tree of a Markdown file")
                .long_about(
                    "View the blocks a Markdown file parses into.\n\n\
                    Transforms:\n  \
                    - blocks-tree:    Block tree visualization (default)\n  \
                    - blocks-json:    The document as JSON\n  \
                    - warnings:       Parse warnings with positions\n  \
                    - footnotes-json: Footnote definitions\n  \
                    - links-json:     Link reference definitions\n\n\
                    Extra Parameters:\n  \
                    --extra-show-ids         Print block ids in the tree\n  \
                    --extra-max-text <n>     Characters of text shown per block\n\n\
                    Examples:\n  \
                    mdblocks inspect notes.md               # Tree visualization (default)\n  \
                    mdblocks inspect notes.md warnings      # What the parser recovered from",
                )
                .arg(
                    Arg::new("path")
                        .help("Path to the Markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply. Defaults to 'blocks-tree'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            transforms::AVAILABLE_TRANSFORMS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between different formats.\n\n\
                    Supported formats:\n  \
                    - markdown: Markdown (.md, .markdown)\n  \
                    - json:     The block model as JSON (.json)\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default, or use -o to specify a file.\n\n\
                    Examples:\n  \
                    mdblocks convert notes.md --to json             # Blocks as JSON (stdout)\n  \
                    mdblocks convert blocks.json --to markdown      # Blocks to Markdown\n  \
                    mdblocks notes.md --to json                     # 'convert' is optional",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("format")
                .about("Format a Markdown file")
                .long_about(
                    "Parse a Markdown file and serialize it again with the configured style\n\
                    (bullet char, emphasis delimiters, list indent, escaping).\n\n\
                    Output is always written to stdout.\n\n\
                    Examples:\n  \
                    mdblocks format notes.md                       # Format to stdout\n  \
                    mdblocks format notes.md --extra-list-indent 4",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("table")
                .about("Build a table from clipboard contents")
                .long_about(
                    "Parse a clipboard dump into a table block.\n\n\
                    The HTML flavor is preferred when it holds a table; otherwise the text\n\
                    is read as TSV, CSV or a Markdown pipe table, in that order.\n\
                    With --into, the table is pasted into the first table of an existing\n\
                    Markdown document at --row/--col (0-based), growing it as needed.\n\n\
                    Examples:\n  \
                    mdblocks table copied.tsv                      # New table as Markdown\n  \
                    mdblocks table --html copied.html --to json    # From the HTML flavor\n  \
                    mdblocks table copied.csv --into doc.md --row 1 --col 0",
                )
                .arg(
                    Arg::new("text")
                        .help("File holding the plain-text clipboard flavor")
                        .required_unless_present("html")
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .value_name("PATH")
                        .help("File holding the HTML clipboard flavor")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("into")
                        .long("into")
                        .value_name("PATH")
                        .help("Markdown document whose first table receives the paste")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("row")
                        .long("row")
                        .help("Row of the paste origin (0-based)")
                        .default_value("0")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("col")
                        .long("col")
                        .help("Column of the paste origin (0-based)")
                        .default_value("0")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Output format")
                        .default_value("markdown")
                        .value_hint(ValueHint::Other),
                )
                .arg(output_arg()),
        )
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Output file path (defaults to stdout)")
        .value_hint(ValueHint::FilePath)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A bare file as first argument means the default "convert" subcommand
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);
                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_tracing(matches.get_count("verbose"));

    if matches.get_flag("list-transforms") {
        handle_list_transforms_command();
        return;
    }

    let mut config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    apply_config_overrides(&mut config, &mut extra_params);

    match matches.subcommand() {
        Some(("inspect", sub_matches)) => {
            let path = required(sub_matches, "path");
            let transform = sub_matches
                .get_one::<String>("transform")
                .map(|s| s.as_str())
                .unwrap_or(transforms::DEFAULT_TRANSFORM);
            handle_inspect_command(path, transform, &extra_params, &config);
        }
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches, "input");
            let to = required(sub_matches, "to");
            let from = match sub_matches.get_one::<String>("from") {
                Some(f) => f.to_string(),
                None => detect_format(input),
            };
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(input, &from, to, output, &extra_params, &config);
        }
        Some(("format", sub_matches)) => {
            let input = required(sub_matches, "input");
            handle_convert_command(input, "markdown", "markdown", None, &extra_params, &config);
        }
        Some(("table", sub_matches)) => {
            let request = TableRequest {
                text: sub_matches.get_one::<String>("text").map(|s| s.as_str()),
                html: sub_matches.get_one::<String>("html").map(|s| s.as_str()),
                into: sub_matches.get_one::<String>("into").map(|s| s.as_str()),
                row: *sub_matches.get_one::<usize>("row").unwrap_or(&0),
                col: *sub_matches.get_one::<usize>("col").unwrap_or(&0),
                to: required(sub_matches, "to"),
                output: sub_matches.get_one::<String>("output").map(|s| s.as_str()),
            };
            handle_table_command(&request, &extra_params, &config);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn required<'a>(matches: &'a clap::ArgMatches, name: &str) -> &'a str {
    match matches.get_one::<String>(name) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: missing required argument '{name}'");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn detect_format(input: &str) -> String {
    match FormatRegistry::default().detect_format_from_filename(input) {
        Some(detected) => detected,
        None => {
            eprintln!("Error: Could not detect format from filename '{input}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        }
    }
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

fn write_output(output: Option<&str>, text: &str) {
    match output {
        Some(path) => fs::write(path, text).unwrap_or_else(|e| {
            eprintln!("Error writing file '{path}': {e}");
            std::process::exit(1);
        }),
        None => print!("{text}"),
    }
}

/// Registry whose Markdown format carries the configured dialect and style.
fn registry_from_config(config: &MdblocksConfig) -> FormatRegistry {
    let mut registry = FormatRegistry::default();
    registry.register(MarkdownFormat::new(
        config.parse.into(),
        (&config.serialize).into(),
    ));
    registry
}

/// Handle the inspect command
fn handle_inspect_command(
    path: &str,
    transform: &str,
    extra_params: &HashMap<String, String>,
    config: &MdblocksConfig,
) {
    let source = read_file(path);
    let params = build_inspect_params(config, extra_params);
    let output = transforms::execute_transform(&source, transform, &config.parse.into(), &params)
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });
    print!("{output}");
}

/// Handle the convert command
fn handle_convert_command(
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
    config: &MdblocksConfig,
) {
    let registry = registry_from_config(config);

    for name in [from, to] {
        if let Err(e) = registry.get(name) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let source = read_file(input);
    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });
    tracing::debug!(blocks = doc.blocks.len(), from, to, "parsed input");

    let text = serialize_or_exit(&registry, &doc, to, extra_params);
    write_output(output, &text);
}

fn serialize_or_exit(
    registry: &FormatRegistry,
    doc: &Document,
    to: &str,
    extra_params: &HashMap<String, String>,
) -> String {
    registry
        .serialize_with_options(doc, to, extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        })
}

struct TableRequest<'a> {
    text: Option<&'a str>,
    html: Option<&'a str>,
    into: Option<&'a str>,
    row: usize,
    col: usize,
    to: &'a str,
    output: Option<&'a str>,
}

/// Handle the table command
fn handle_table_command(
    request: &TableRequest,
    extra_params: &HashMap<String, String>,
    config: &MdblocksConfig,
) {
    let text = request.text.map(read_file);
    let html = request.html.map(read_file);
    let payload = ClipboardPayload {
        html: html.as_deref(),
        text: text.as_deref(),
    };
    if !looks_like_table_data(&payload) {
        tracing::debug!("clipboard payload does not look like a table, parsing anyway");
    }
    let Some(parsed) = parse_clipboard_data(&payload) else {
        eprintln!("Error: No table data found in clipboard input");
        std::process::exit(1);
    };

    let registry = registry_from_config(config);
    let doc = match request.into {
        Some(path) => {
            let mut doc = registry.parse(&read_file(path), "markdown").unwrap_or_else(|e| {
                eprintln!("Parse error: {e}");
                std::process::exit(1);
            });
            if !paste_into_first_table(&mut doc.blocks, &parsed, request.row, request.col) {
                eprintln!("Error: '{path}' has no table to paste into");
                std::process::exit(1);
            }
            doc
        }
        None => Document::from_blocks(vec![parsed.to_table_block()]),
    };

    let text = serialize_or_exit(&registry, &doc, request.to, extra_params);
    write_output(request.output, &text);
}

/// Replaces the first table found (depth first) with the pasted result.
fn paste_into_first_table(
    blocks: &mut [Block],
    parsed: &ParsedTableData,
    row: usize,
    col: usize,
) -> bool {
    for block in blocks.iter_mut() {
        if block.block_type == BlockType::Table {
            *block = merge_into_table_block(block, parsed, row, col);
            return true;
        }
        if paste_into_first_table(&mut block.children, parsed, row, col) {
            return true;
        }
    }
    false
}

/// Handle the list-transforms command
fn handle_list_transforms_command() {
    println!("Available transforms:\n");
    for transform_name in transforms::AVAILABLE_TRANSFORMS {
        println!("  {transform_name}");
    }

    println!("\nConversion formats:");
    let registry = FormatRegistry::default();
    for format_name in registry.list_formats() {
        println!("  {format_name}");
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> MdblocksConfig {
    let loader = Loader::new().with_optional_file("mdblocks.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// Moves the parse dialect and inspect switches out of the extras into the
/// config. What is left goes to the serializer or the transform.
fn apply_config_overrides(
    config: &mut MdblocksConfig,
    extra_params: &mut HashMap<String, String>,
) {
    if let Some(raw) = extra_params.remove("gfm") {
        config.parse.gfm = parse_bool_arg("gfm", &raw);
    }
    if let Some(raw) = extra_params.remove("math") {
        config.parse.math = parse_bool_arg("math", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["containers", "directives"]) {
        config.parse.containers = parse_bool_arg("containers", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["show-ids", "ids"]) {
        config.inspect.show_ids = parse_bool_arg("show-ids", &raw);
    }
}

fn build_inspect_params(
    config: &MdblocksConfig,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("show-ids".to_string(), config.inspect.show_ids.to_string());
    for (key, value) in overrides {
        params.insert(key.clone(), value.clone());
    }
    params
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = map.remove(*key) {
            return Some(value);
        }
    }
    None
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_extra_args_empty() {
        let args = args(&["mdblocks", "inspect", "notes.md"]);
        let (cleaned, extra) = parse_extra_args(&args);

        assert_eq!(cleaned, args);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_parse_extra_args_mixed_with_regular_args() {
        let (cleaned, extra) = parse_extra_args(&args(&[
            "mdblocks",
            "convert",
            "notes.md",
            "--to",
            "markdown",
            "--extra-list-indent",
            "4",
            "--from",
            "markdown",
        ]));

        assert_eq!(
            cleaned,
            args(&["mdblocks", "convert", "notes.md", "--to", "markdown", "--from", "markdown"])
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("list-indent"), Some(&"4".to_string()));
    }

    #[test]
    fn test_parse_extra_args_boolean_flags() {
        let (cleaned, extra) = parse_extra_args(&args(&[
            "mdblocks",
            "inspect",
            "notes.md",
            "--extra-show-ids",
            "--extras-max-text",
            "10",
            "--extra-link-references",
        ]));

        assert_eq!(cleaned, args(&["mdblocks", "inspect", "notes.md"]));
        assert_eq!(extra.get("show-ids"), Some(&"true".to_string()));
        assert_eq!(extra.get("max-text"), Some(&"10".to_string()));
        assert_eq!(extra.get("link-references"), Some(&"true".to_string()));
    }

    #[test]
    fn test_parse_extra_args_keeps_dash_values() {
        let (_, extra) = parse_extra_args(&args(&[
            "mdblocks",
            "format",
            "notes.md",
            "--extra-bullet-char",
            "-",
        ]));
        assert_eq!(extra.get("bullet-char"), Some(&"-".to_string()));
    }

    #[test]
    fn apply_config_overrides_moves_parse_switches() {
        let mut config = load_cli_config(None);
        let mut extras = HashMap::new();
        extras.insert("containers".to_string(), "false".to_string());
        extras.insert("show-ids".to_string(), "true".to_string());
        extras.insert("bullet-char".to_string(), "*".to_string());

        apply_config_overrides(&mut config, &mut extras);

        assert!(!config.parse.containers);
        assert!(config.inspect.show_ids);
        assert_eq!(extras.len(), 1);
        assert!(extras.contains_key("bullet-char"));
    }

    #[test]
    fn inspect_params_include_configured_defaults() {
        let config = load_cli_config(None);
        let mut overrides = HashMap::new();
        overrides.insert("max-text".to_string(), "12".to_string());

        let params = build_inspect_params(&config, &overrides);
        assert_eq!(params.get("show-ids"), Some(&"false".to_string()));
        assert_eq!(params.get("max-text"), Some(&"12".to_string()));
    }

    #[test]
    fn paste_finds_nested_tables() {
        let table = ParsedTableData {
            rows: vec![vec!["a".to_string()]],
            format: mdblocks_babel::model::TableFormat::Tsv,
            has_header: false,
        }
        .to_table_block();
        let mut blocks = vec![
            Block::paragraph("intro"),
            Block::new(BlockType::Toggle, "more").with_children(vec![table]),
        ];
        let parsed = ParsedTableData {
            rows: vec![vec!["b".to_string()]],
            format: mdblocks_babel::model::TableFormat::Tsv,
            has_header: false,
        };

        assert!(paste_into_first_table(&mut blocks, &parsed, 0, 1));
        let rows = blocks[1].children[0].meta.rows.clone().unwrap();
        assert_eq!(rows[0][1].content.text, "b");
        assert!(!paste_into_first_table(&mut blocks[..1], &parsed, 0, 0));
    }
}
