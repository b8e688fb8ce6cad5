use std::env;
use std::fs;
use std::io::{self, Read, Write};

use laxdata::{parse_json, DuplicateKeyPolicy, RepairConfig, Schema, Validator};

/// Lenient by default: the CLI's whole purpose is turning "almost JSON"
/// from an LLM into valid JSON, so every text-level repair pass is on.
fn lenient_repair_config() -> RepairConfig {
    RepairConfig {
        fix_smart_quotes: true,
        strip_json_comments: true,
        replace_python_literals: true,
        convert_kv_object_to_json: true,
        quote_unquoted_keys: true,
        drop_trailing_commas: true,
        allow_single_quotes: true,
        duplicate_key_policy: DuplicateKeyPolicy::FirstWins,
    }
}

fn print_help(program: &str) {
    eprintln!(
        "Usage: {prog} [OPTIONS] [INPUT]\n\
         \n\
         INPUT: optional input file. When omitted, reads from stdin.\n\
         \n\
         Options:\n\
           -o, --output FILE    Write output to FILE (default stdout)\n\
               --schema FILE    Validate the repaired value against a schema file\n\
               --pretty         Pretty-print the repaired JSON\n\
           -h, --help           Show this help\n",
        prog = program
    );
}

struct CliMode {
    input: Option<String>,
    output: Option<String>,
    schema: Option<String>,
    pretty: bool,
}

fn parse_args() -> CliMode {
    let mut args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "laxdata".to_string());
    args.remove(0);

    let mut input = None;
    let mut output = None;
    let mut schema = None;
    let mut pretty = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help(&program);
                std::process::exit(0);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Missing FILE for --output");
                    std::process::exit(2);
                }
                output = Some(args[i].clone());
            }
            "--schema" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Missing FILE for --schema");
                    std::process::exit(2);
                }
                schema = Some(args[i].clone());
            }
            "--pretty" => pretty = true,
            s if s.starts_with('-') => {
                eprintln!("Unknown option: {}", s);
                std::process::exit(2);
            }
            path => input = Some(path.to_string()),
        }
        i += 1;
    }

    CliMode { input, output, schema, pretty }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let mode = parse_args();
    let cfg = lenient_repair_config();

    let content = match &mode.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            content
        }
    };

    let value = parse_json(&content, &cfg)?;

    if let Some(schema_path) = &mode.schema {
        let schema_text = fs::read_to_string(schema_path)?;
        let schema_value = parse_json(&schema_text, &cfg)?;
        let schema = Schema::new(schema_value);
        let validator = Validator::new();
        let errors = validator.validate_all(&value, &schema);
        if !errors.is_empty() {
            for err in &errors {
                eprintln!("{}", err);
            }
            std::process::exit(1);
        }
    }

    let rendered = if mode.pretty { value.to_json_string_pretty() } else { value.to_json_string() };

    let mut out: Box<dyn Write> = match &mode.output {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(io::stdout()),
    };
    out.write_all(rendered.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}
