//! Command line interface: convert a Markdown document to HTML, a
//! serialized AST, or reformatted Markdown.
//!
//! Reads from stdin when no document is given. Exit codes: 0 on success,
//! 2 on argument errors (raised by clap), 1 on any other failure.

use clap::{Arg, ArgAction, Command};
use std::fs;
use std::io::Read;
use std::process;
use vellum::{ExtensionOptions, Markdown, RendererChoice};

fn build_cli() -> Command {
    Command::new("vellum")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown documents")
        .arg(
            Arg::new("parser")
                .short('p')
                .long("parser")
                .value_name("PARSER")
                .default_value("commonmark")
                .help("Logical name of the parser"),
        )
        .arg(
            Arg::new("renderer")
                .short('r')
                .long("renderer")
                .value_name("RENDERER")
                .default_value("html")
                .help("Logical name of the renderer: html, ast or markdown"),
        )
        .arg(
            Arg::new("extension")
                .short('e')
                .long("extension")
                .value_name("EXT")
                .action(ArgAction::Append)
                .help("Register an extension by name; may be repeated"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT")
                .help("Write the result to a file instead of stdout"),
        )
        .arg(Arg::new("document").value_name("document").index(1))
}

/// Resolve a logical name by its last dotted segment, case-insensitively.
fn logical_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_ascii_lowercase()
}

fn renderer_choice(name: &str) -> Option<RendererChoice> {
    match logical_name(name).as_str() {
        "html" | "htmlrenderer" => Some(RendererChoice::Html),
        "ast" | "astrenderer" => Some(RendererChoice::Ast),
        "markdown" | "markdownrenderer" | "md" => Some(RendererChoice::Markdown),
        _ => None,
    }
}

fn run(matches: &clap::ArgMatches) -> Result<(), String> {
    let parser_name = matches.get_one::<String>("parser").expect("has default");
    if !matches!(logical_name(parser_name).as_str(), "commonmark" | "parser") {
        return Err(format!("unknown parser '{}'", parser_name));
    }
    let renderer_name = matches.get_one::<String>("renderer").expect("has default");
    let renderer = renderer_choice(renderer_name)
        .ok_or_else(|| format!("unknown renderer '{}'", renderer_name))?;

    let mut engine = Markdown::with_renderer(renderer);
    if let Some(extensions) = matches.get_many::<String>("extension") {
        for name in extensions {
            engine
                .use_by_name(name, &ExtensionOptions::new())
                .map_err(|error| format!("{}", error))?;
        }
    }

    let input = match matches.get_one::<String>("document") {
        Some(path) => fs::read_to_string(path).map_err(|error| format!("{}: {}", path, error))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|error| format!("stdin: {}", error))?;
            buffer
        }
    };

    let output = engine.convert(&input).map_err(|error| format!("{}", error))?;
    match matches.get_one::<String>("output") {
        Some(path) => fs::write(path, output).map_err(|error| format!("{}: {}", path, error))?,
        None => print!("{}", output),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = build_cli().get_matches();
    if let Err(message) = run(&matches) {
        eprintln!("vellum: {}", message);
        process::exit(1);
    }
}
