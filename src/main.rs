use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use rayon::prelude::*;
use rulechk::cli::output::{self, FixChoice, OutputFormat};
use rulechk::config::Overrides;
use rulechk::rules::manager;
use rulechk::{cli, CheckOptions, CheckResult, Config, RuleEngine, RuleLoader, RuleType, SpellService};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "rulechk")]
#[command(version, about = "A rule-based spelling and style checker", long_about = None)]
struct Cli {
    /// Files or directories to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Apply corrections in place
    #[arg(short, long)]
    fix: bool,

    /// Confirm each correction interactively
    #[arg(long, requires = "fix")]
    interactive: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Only check rules in this category (repeatable)
    #[arg(short, long = "category", value_name = "KEY")]
    categories: Vec<String>,

    /// Match wrong forms case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Strict mode (reserved, currently no effect)
    #[arg(long)]
    strict: bool,

    /// Local rule database (JSON, optionally gzipped)
    #[arg(long, value_name = "PATH", env = "RULECHK_RULES")]
    rules: Option<PathBuf>,

    /// Remote rule database, tried before the local one
    #[arg(long, value_name = "URL", env = "RULECHK_RULES_URL")]
    rules_url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Rule database management
    Rules {
        #[command(subcommand)]
        action: RulesCommands,
    },
}

#[derive(Parser, Debug)]
enum RulesCommands {
    /// List rule categories
    List,
    /// Show rule database info
    Info,
    /// Show the rules of one category
    Show {
        /// Category key (e.g., it_terms)
        category: String,
        /// Only show rules of this type
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<RuleType>,
    },
    /// Download the configured rule database
    Update,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "rulechk", &mut io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let use_color = !cli.no_color && console::Term::stdout().is_term();
    if !use_color {
        colored::control::set_override(false);
    }

    let config = Config::load(Overrides {
        rules_url: cli.rules_url.clone(),
        rules_path: cli.rules.clone(),
        categories: cli.categories.clone(),
        ignore_case: cli.ignore_case,
        strict_mode: cli.strict,
    })?;

    let service = SpellService::new(RuleLoader::from_config(&config));

    if let Some(command) = cli.command {
        return handle_command(command, &config, &service).await;
    }

    if cli.files.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let files = cli::files::collect_files(&cli.files)?;
    let engine = service.engine().await?;
    let options = config.check_options();

    if cli.fix {
        let (total_fixed, files_fixed) = fix_files(&engine, &options, &files, cli.interactive, use_color)?;
        output::print_fix_summary(total_fixed, files_fixed, use_color);
        return Ok(());
    }

    let (total_errors, files_flagged) = check_files(&engine, &options, &files, use_color, &cli.format);
    if matches!(cli.format, OutputFormat::Text) {
        output::print_check_summary(total_errors, files_flagged, files.len(), use_color);
    }

    if total_errors > 0 && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = match verbose {
        0 => "warn,rulechk=info",
        1 => "info,rulechk=debug",
        _ => "debug,rulechk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

async fn handle_command(command: Commands, config: &Config, service: &SpellService) -> Result<()> {
    match command {
        Commands::Rules { action } => match action {
            RulesCommands::List => manager::list_categories(&*service.engine().await?)?,
            RulesCommands::Info => manager::show_info(&*service.engine().await?)?,
            RulesCommands::Show { category, kind } => {
                manager::show_category(&*service.engine().await?, &category, kind)?
            }
            RulesCommands::Update => manager::update_rules(config).await?,
        },
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Check files in parallel, then report them in command-line order.
/// Returns the total match count and the number of files with matches.
fn check_files(
    engine: &RuleEngine,
    options: &CheckOptions,
    files: &[PathBuf],
    colored: bool,
    format: &OutputFormat,
) -> (usize, usize) {
    let results: Vec<Result<(String, CheckResult)>> = files
        .par_iter()
        .map(|path| -> Result<(String, CheckResult)> {
            let content = read_file(path)?;
            let result = engine.check_text(&content, options);
            Ok((content, result))
        })
        .collect();

    let mut total_errors = 0;
    let mut files_flagged = 0;
    for (path, outcome) in files.iter().zip(results) {
        match outcome {
            Ok((content, result)) => {
                output::print_matches(path, &content, &result, colored, format);
                total_errors += result.total_errors;
                if result.total_errors > 0 {
                    files_flagged += 1;
                }
            }
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }
    (total_errors, files_flagged)
}

fn fix_files(
    engine: &RuleEngine,
    options: &CheckOptions,
    files: &[PathBuf],
    interactive: bool,
    colored: bool,
) -> Result<(usize, usize)> {
    let mut total_fixed = 0;
    let mut files_fixed = 0;

    for path in files {
        let content = match read_file(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                continue;
            }
        };

        let result = engine.check_text(&content, options);
        let mut quit = false;

        let accepted = if interactive {
            let mut accepted = Vec::new();
            for m in result.matches {
                match output::prompt_correction(&content, &m, colored) {
                    FixChoice::Apply => accepted.push(m),
                    FixChoice::Skip => {}
                    FixChoice::Quit => {
                        quit = true;
                        break;
                    }
                }
            }
            accepted
        } else {
            result.matches
        };

        if !accepted.is_empty() {
            let corrected = engine.apply_corrections(&content, &accepted);
            fs::write(path, corrected)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            total_fixed += accepted.len();
            files_fixed += 1;
        }

        if quit {
            break;
        }
    }

    Ok((total_fixed, files_fixed))
}
