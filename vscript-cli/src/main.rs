//! Command-line interface for the VScript front end
//! This binary tokenizes Squirrel script files for inspection: the full
//! token stream with its lexical diagnostics, or the single token covering
//! a byte offset.
//!
//! Usage:
//!   vscript `<path>`                      - Print the token stream
//!   vscript `<path>` --format json        - Print the tokenization as JSON
//!   vscript `<path>` --at `<offset>`      - Print the token at a byte offset

use clap::{Arg, Command};
use vscript_parser::{tokenize, Severity, Token, Tokenization};

fn main() {
    let matches = Command::new("vscript")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting tokenized VScript Squirrel files")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the script file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: 'text' or 'json'")
                .default_value("text"),
        )
        .arg(
            Arg::new("at")
                .long("at")
                .help("Print only the token covering this byte offset")
                .value_parser(clap::value_parser!(usize)),
        )
        .get_matches();

    let path = matches
        .get_one::<String>("path")
        .expect("path is required");
    let format = matches.get_one::<String>("format").expect("has a default");
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read '{}': {}", path, e);
        std::process::exit(1);
    });

    let tokenization = tokenize(&text);
    match matches.get_one::<usize>("at").copied() {
        Some(offset) => handle_at_command(&tokenization, offset, format),
        None => handle_tokens_command(&tokenization, format),
    }
}

/// Print the whole token stream, diagnostics last
fn handle_tokens_command(tokenization: &Tokenization, format: &str) {
    match format {
        "json" => print_json(tokenization),
        "text" => {
            for token in &tokenization.tokens {
                print_token(token);
            }
            for diagnostic in &tokenization.diagnostics {
                let severity = match diagnostic.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                eprintln!(
                    "{} [{}..{}]: {}",
                    severity, diagnostic.start, diagnostic.end, diagnostic.message
                );
            }
        }
        other => {
            eprintln!("Format '{}' not supported", other);
            eprintln!("Available formats: text, json");
            std::process::exit(1);
        }
    }
}

/// Print the token covering a byte offset, descending into embedded scripts
fn handle_at_command(tokenization: &Tokenization, offset: usize, format: &str) {
    let token = tokenization.find_token_at_position(offset).unwrap_or_else(|| {
        eprintln!("No token at offset {}", offset);
        std::process::exit(1);
    });
    match format {
        "json" => print_json(token),
        "text" => print_token(token),
        other => {
            eprintln!("Format '{}' not supported", other);
            eprintln!("Available formats: text, json");
            std::process::exit(1);
        }
    }
}

fn print_token(token: &Token) {
    match token.value.as_deref() {
        Some(value) => println!("{:?} [{}..{}] {:?}", token.kind, token.start, token.end, value),
        None => println!("{:?} [{}..{}]", token.kind, token.start, token.end),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let formatted = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error formatting output: {}", e);
        std::process::exit(1);
    });
    println!("{}", formatted);
}
