use std::io::Read;

use anyhow::{Context, Result};
use clap::{App, Arg};
use tracing_subscriber::EnvFilter;

use reisp::ast::parser::Parser;
use reisp::ast::source::LineBuffer;
use reisp::ExecutionSession;

const HISTORY_FILE: &str = "history.txt";

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("reisp")
        .about("A statically typed, interpreted, custom flavor of Lisp")
        .arg(Arg::new("file").help("Script to run instead of starting the console"))
        .get_matches();

    let mut es = ExecutionSession::new();

    if let Some(path) = matches.value_of("file") {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path))?;
        return es.run_file(&text);
    }

    if !atty::is(atty::Stream::Stdin) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("unable to read stdin")?;
        return es.run_file(&text);
    }

    repl(&mut es)
}

fn repl(es: &mut ExecutionSession) -> Result<()> {
    let mut rl = rustyline::Editor::<()>::new();
    let _ = rl.load_history(HISTORY_FILE);

    let lines = std::iter::from_fn(move || match rl.readline("> ") {
        Ok(line) => {
            rl.add_history_entry(line.as_str());
            Some(line)
        }
        Err(_) => {
            if let Err(err) = rl.save_history(HISTORY_FILE) {
                tracing::warn!("unable to save history: {}", err);
            }
            None
        }
    });

    let mut parser = Parser::new(LineBuffer::new(lines));
    let stdout = std::io::stdout();
    es.run_repl(&mut parser, &mut stdout.lock())
        .context("unable to write to stdout")?;
    println!("\nExiting...");
    Ok(())
}
