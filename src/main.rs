use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use tinylang::ast_printer::AstPrinter;
use tinylang::diagnostics::Diagnostics;
use tinylang::parser::Parser;
use tinylang::runner::{Outcome, Session};
use tinylang::scanner::{self, Scanner};
use tinylang::token::Token;

/// Exit status for a missing, unreadable or non‑`.tl` input file.
const EXIT_BAD_INPUT: i32 = 66;

#[derive(ClapParser, Debug)]
#[command(version, about = "TinyLang interpreter", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Program to run; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a .tl program
    Run { filename: PathBuf },

    /// Starts the interactive prompt
    Repl,

    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints every statement's AST
    Parse { filename: PathBuf },
}

/// Reads a source file as UTF‑8 through a memory map.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero‑length files cannot be mapped on every platform.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once and dropped before returning; the file is
    // not expected to be truncated while we read it.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&map)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn read_or_exit(filename: &Path) -> String {
    match read_file(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_BAD_INPUT);
        }
    }
}

fn is_tl_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "tl").unwrap_or(false) && path.is_file()
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("tinylang::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn run_file(filename: &Path) {
    info!("Running file {:?}", filename);

    if !is_tl_file(filename) {
        eprintln!("Invalid path: {}", filename.display());
        std::process::exit(EXIT_BAD_INPUT);
    }

    let source = read_or_exit(filename);
    let outcome = Session::new().run(&source);

    if outcome != Outcome::Completed {
        debug!("Run finished with {:?}", outcome);
        std::process::exit(outcome.exit_code());
    }

    info!("Program executed successfully");
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_or_exit(filename);

    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if json {
        let text = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", text);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");

        std::process::exit(Outcome::CompileError.exit_code());
    }

    info!("Tokenization completed successfully");

    Ok(())
}

fn parse(filename: &Path) {
    let source = read_or_exit(filename);

    let mut diagnostics = Diagnostics::new();
    let tokens = scanner::scan(&source, &mut diagnostics);
    let statements = Parser::new(tokens).parse(&mut diagnostics);

    if diagnostics.had_error() {
        debug!("Parse failed, exiting with code 65");

        std::process::exit(Outcome::CompileError.exit_code());
    }

    let ast_str = AstPrinter::print_program(&statements);
    debug!("AST: {}", ast_str);
    println!("{}", ast_str);
}

fn repl() -> Result<()> {
    let stdin = io::stdin();
    Session::new()
        .repl(stdin.lock(), io::stdout())
        .context("REPL I/O failure")
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match (args.command, args.file) {
        (Some(Commands::Run { filename }), _) | (None, Some(filename)) => run_file(&filename),

        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json)?,

        (Some(Commands::Parse { filename }), _) => parse(&filename),

        (Some(Commands::Repl), _) | (None, None) => repl()?,
    }

    Ok(())
}
