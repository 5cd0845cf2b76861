use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the transforms from src/transforms.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_TRANSFORMS: &[&str] = &[
    "blocks-tree",
    "blocks-json",
    "warnings",
    "footnotes-json",
    "links-json",
];

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("mdblocks")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown to and from block documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("list-transforms")
                .long("list-transforms")
                .help("List available transforms")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a mdblocks.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
        .subcommand(
            Command::new("inspect")
                .arg(file_arg("path", "Path to the Markdown file"))
                .arg(
                    Arg::new("transform")
                        .help("Transform to apply")
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            AVAILABLE_TRANSFORMS,
                        ))
                        .index(2),
                ),
        )
        .subcommand(
            Command::new("convert")
                .arg(file_arg("input", "Input file path"))
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(["markdown", "json"]),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(["markdown", "json"]),
                ),
        )
        .subcommand(Command::new("format").arg(file_arg("input", "Input file path")))
        .subcommand(
            Command::new("table")
                .arg(file_arg("text", "File holding the plain-text clipboard flavor"))
                .arg(
                    Arg::new("html")
                        .long("html")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("into")
                        .long("into")
                        .value_hint(ValueHint::FilePath),
                ),
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "mdblocks", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "mdblocks", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "mdblocks", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
