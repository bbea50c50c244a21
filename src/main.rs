use std::process::ExitCode;

use typeface::{parse, ParseOptions};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: typeface <font-file> [characters]");
        return ExitCode::FAILURE;
    };

    let options = ParseOptions {
        characters: args.next().map(|chars| chars.chars().collect()),
        ..ParseOptions::default()
    };

    match convert(&path, &options) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn convert(path: &str, options: &ParseOptions) -> anyhow::Result<String> {
    let data = std::fs::read(path)?;
    let record = parse(&data, options)?;

    Ok(serde_json::to_string_pretty(&record)?)
}
