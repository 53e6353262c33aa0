use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use gris::ast_printer::AstPrinter;
use gris::error::GrisError;

#[derive(ClapParser, Debug)]
#[command(version, about = "Gris language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its AST
    Parse { filename: PathBuf },

    /// Resolves and type-checks a file without running it
    Check { filename: PathBuf },

    /// Runs a file as a Gris program
    Run { filename: PathBuf },
}

/// Reads a source file through a read-only memory map.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // Mapping a zero-length file fails on some platforms.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // the contents are copied out immediately.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let source = gris::decode(mmap.to_vec())
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("gris::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every error to stderr and exit with the code of the first one.
fn fail(errors: &[GrisError]) -> ! {
    for e in errors {
        debug!("Reporting error: {:?}", e);
        eprintln!("{}", e);
    }

    let code = errors.first().map_or(65, GrisError::exit_code);
    debug!("Exiting with code {}", code);

    std::process::exit(code);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            let source = read_file(&filename)?;

            let mut tokens = Vec::new();
            let mut errors = Vec::new();

            for token in gris::scanner::Scanner::new(&source) {
                match token {
                    Ok(token) => {
                        if !json {
                            println!("{}", token);
                        }
                        tokens.push(token);
                    }
                    Err(e) => errors.push(e.with_source(&source)),
                }
            }

            if json {
                let rendered = serde_json::to_string_pretty(&tokens)
                    .context("Failed to serialize tokens")?;
                println!("{}", rendered);
            }

            if !errors.is_empty() {
                fail(&errors);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let source = read_file(&filename)?;

            match gris::parse(&source) {
                Ok(statements) => {
                    for stmt in &statements {
                        let rendered = AstPrinter::print_stmt(stmt);
                        debug!("AST: {}", rendered);
                        println!("{}", rendered);
                    }
                }
                Err(errors) => fail(&errors),
            }

            info!("Parse subcommand completed");
        }

        Commands::Check { filename } => {
            info!("Running Check subcommand");
            let source = read_file(&filename)?;

            match gris::check(&source) {
                Ok(_) => println!("ok"),
                Err(errors) => fail(&errors),
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_file(&filename)?;
            info!("Provided input:\n {}", source);

            if let Err(errors) = gris::run(&source, Box::new(io::stdout())) {
                fail(&errors);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
