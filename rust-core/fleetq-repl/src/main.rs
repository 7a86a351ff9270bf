// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//!
//! fleetq shell: build device-fleet filters interactively and run them
//! against an inventory service.
//!
//! Provides a readline-based shell with:
//! - Tab completion for commands, filter types, and condition tags
//! - Table, JSON, and CSV output
//! - Saved query templates
//! - Persistent command history

mod command;
mod completer;
mod formatter;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use fleetq_client::{Auth, FleetqClient};
use fleetq_filter::normalize::split_tokens;
use fleetq_filter::{
    BlockPatch, FilterConfig, FilterType, FilterValue, GroupPatch, TemplateDraft, WarmRequest,
};
use fleetq_session::{Collaborators, FilterSession};
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline_derive::{Completer, Helper, Highlighter, Hinter, Validator};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use command::{Attr, Command, Target};
use formatter::{format_devices, format_templates, format_tree, OutputFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// fleetq: interactive device-fleet query shell.
#[derive(Parser, Debug)]
#[command(name = "fleetq", version = VERSION, about = "Interactive device-fleet query shell")]
struct Cli {
    /// Hostname or IP of the inventory service.
    #[arg(long, env = "FLEETQ_HOST", default_value = "localhost")]
    host: String,

    /// Port of the inventory service.
    #[arg(long, env = "FLEETQ_PORT", default_value_t = 8080)]
    port: u16,

    /// Full base URL; overrides --host and --port.
    #[arg(long, env = "FLEETQ_URL")]
    url: Option<String>,

    /// API key sent as `X-API-Key`.
    #[arg(long, env = "FLEETQ_API_KEY")]
    api_key: Option<String>,

    /// Default output format.
    #[arg(long, default_value = "table")]
    format: String,

    /// Results per page for `run`.
    #[arg(long, default_value_t = 20)]
    page_size: u32,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[derive(Helper, Highlighter, Completer, Hinter, Validator)]
struct FleetqHelper {
    #[rustyline(Completer)]
    completer: completer::FleetqCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

/// Mutable shell state.
struct Shell {
    runtime: Runtime,
    client: Arc<FleetqClient>,
    session: FilterSession,
    format: OutputFormat,
    show_timing: bool,
}

impl Shell {
    fn connect(cli: &Cli, format: OutputFormat) -> Result<Self> {
        let base_url = cli
            .url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", cli.host, cli.port));
        let auth = match &cli.api_key {
            Some(key) => Auth::ApiKey(key.clone()),
            None => Auth::None,
        };
        let mut client = FleetqClient::build(&base_url, auth)
            .with_context(|| format!("cannot use {base_url} as the inventory service"))?;
        client.set_timeout(Duration::from_secs(cli.timeout));
        let client = Arc::new(client);

        let config = FilterConfig {
            default_page_size: cli.page_size,
            ..FilterConfig::default()
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        Ok(Self {
            runtime,
            session: FilterSession::new(Collaborators::shared(client.clone()), config),
            client,
            format,
            show_timing: false,
        })
    }

    fn group_id(&self, group: usize) -> Result<String> {
        self.session
            .tree()
            .groups()
            .get(group - 1)
            .map(|g| g.id.clone())
            .ok_or_else(|| anyhow!("no group {group}"))
    }

    fn block_ids(&self, group: usize, block: usize) -> Result<(String, String)> {
        let group_id = self.group_id(group)?;
        let block_id = self
            .session
            .tree()
            .group(&group_id)
            .and_then(|g| g.blocks.get(block - 1))
            .map(|b| b.id.clone())
            .ok_or_else(|| anyhow!("no block {group}.{block}"))?;
        Ok((group_id, block_id))
    }

    /// Fetch value catalogs requested by the last edits.
    fn warm(&mut self) {
        self.runtime.block_on(self.session.flush_warm());
    }

    fn show(&self) -> Result<()> {
        let catalog = self.session.catalog().catalog()?;
        println!("{}", format_tree(self.session.tree(), &catalog));
        if !self.session.tree().is_empty() {
            println!("{} {}", "Query:".dimmed(), self.session.summary());
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Show => return self.show(),
            Command::AddGroup => {
                self.session.add_group();
            }
            Command::AddBlock { group, filter_type } => {
                let group_id = self.group_id(group)?;
                self.session.add_block(&group_id, filter_type)?;
            }
            Command::SetOperator { group, operator } => {
                let group_id = self.group_id(group)?;
                self.session.update_group(&group_id, &GroupPatch::operator(operator));
            }
            Command::Set { group, block, attr } => {
                let (group_id, block_id) = self.block_ids(group, block)?;
                let patch = match attr {
                    Attr::Field(field) => BlockPatch::field(field),
                    Attr::Condition(condition) => BlockPatch::condition(condition),
                    Attr::Value(text) => BlockPatch::value(parse_value(&text)),
                    Attr::Type(filter_type) => BlockPatch {
                        filter_type: Some(filter_type),
                        ..BlockPatch::default()
                    },
                };
                self.session.update_block(&group_id, &block_id, patch);
            }
            Command::Activate { group, block, active } => {
                let (group_id, block_id) = self.block_ids(group, block)?;
                self.session.update_block(&group_id, &block_id, BlockPatch::active(active));
            }
            Command::Remove(Target::Group(group)) => {
                let group_id = self.group_id(group)?;
                self.session.remove_group(&group_id);
            }
            Command::Remove(Target::Block(group, block)) => {
                let (group_id, block_id) = self.block_ids(group, block)?;
                self.session.remove_block(&group_id, &block_id);
            }
            Command::Clear(group) => {
                let group_id = self.group_id(group)?;
                self.session.remove_all_blocks_in_group(&group_id);
            }
            Command::Reset => self.session.reset_all(),
            Command::Catalog => return self.catalog(),
            Command::Values { group, block } => return self.values(group, block),
            Command::Run { page } => return self.run(page),
            Command::Save { name, description } => {
                let draft = TemplateDraft::new(name).with_description(description);
                let saved = self.runtime.block_on(self.session.save_template(&draft))?;
                println!("Saved template {} ({})", saved.id, saved.name);
                return Ok(());
            }
            Command::Templates { page } => {
                let listing = self.runtime.block_on(self.session.list_templates(page))?;
                println!("{}", format_templates(&listing, self.format));
                return Ok(());
            }
            Command::Load(id) => {
                let loaded = self.runtime.block_on(self.session.load_template(id))?;
                println!("Loaded template {id} ({})", loaded.name);
                self.warm();
                return self.show();
            }
            Command::Delete(id) => {
                self.runtime.block_on(self.session.delete_template(id))?;
                println!("Deleted template {id}");
                return Ok(());
            }
        }

        self.warm();
        self.show()
    }

    fn run(&self, page: u32) -> Result<()> {
        let start = Instant::now();
        let outcome = self.runtime.block_on(self.session.run(page, None))?;
        let elapsed = start.elapsed();

        println!("{} {}", "Query:".dimmed(), outcome.summary);
        println!("{}", format_devices(&outcome.page, self.format));
        if self.show_timing {
            println!("{}", format!("Time: {:.3}ms", elapsed.as_secs_f64() * 1000.0).dimmed());
        }
        Ok(())
    }

    fn catalog(&mut self) -> Result<()> {
        let catalog = self.runtime.block_on(self.session.refresh_catalog())?;
        self.warm();
        for filter_type in FilterType::ALL {
            let options = catalog.options(filter_type);
            let names: Vec<String> = options
                .iter()
                .map(|o| {
                    if o.label == o.value {
                        o.value.clone()
                    } else {
                        format!("{} ({})", o.value, o.label)
                    }
                })
                .collect();
            println!(
                "{} {}",
                format!("{filter_type}:").bright_cyan(),
                if names.is_empty() { "(none)".to_string() } else { names.join(", ") }
            );
        }
        Ok(())
    }

    fn values(&self, group: usize, block: usize) -> Result<()> {
        let (group_id, block_id) = self.block_ids(group, block)?;
        let entry = self
            .session
            .tree()
            .block(&group_id, &block_id)
            .ok_or_else(|| anyhow!("no block {group}.{block}"))?;
        if entry.field.is_empty() {
            return Err(anyhow!("block {group}.{block} has no field yet"));
        }

        let cache = self.session.catalog();
        let values = match cache.values(entry.filter_type, &entry.field)? {
            Some(values) => values,
            None => {
                let request = WarmRequest {
                    filter_type: entry.filter_type,
                    field: entry.field.clone(),
                };
                self.runtime.block_on(cache.warm(&request))?
            }
        };
        if values.is_empty() {
            println!("(no known values for {})", entry.field);
        } else {
            println!("{}", values.join(", "));
        }
        Ok(())
    }

    fn status(&self) {
        match self.runtime.block_on(self.client.health()) {
            Ok(true) => println!("{} is {}", self.client.base_url(), "healthy".green()),
            Ok(false) => println!("{} is {}", self.client.base_url(), "unhealthy".yellow()),
            Err(e) => eprintln!(
                "{} Server at {} is unreachable: {e}",
                "Error:".red().bold(),
                self.client.base_url()
            ),
        }
    }
}

/// Several comma-separated entries become a list; anything else stays a
/// single value.
fn parse_value(text: &str) -> FilterValue {
    if text.contains(',') {
        FilterValue::List(split_tokens(text).map(str::to_string).collect())
    } else {
        FilterValue::from(text)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format: OutputFormat = cli.format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {e}. Defaulting to table format.");
        OutputFormat::Table
    });

    let mut shell = Shell::connect(&cli, format)?;
    print_banner(&shell);

    if let Err(e) = shell.runtime.block_on(shell.session.refresh_catalog()) {
        eprintln!("{} could not load the filter catalog: {e}", "Warning:".yellow().bold());
    }
    shell.warm();

    let helper = FleetqHelper {
        completer: completer::FleetqCompleter,
        hinter: HistoryHinter::new(),
    };
    let mut editor = rustyline::Editor::<FleetqHelper, DefaultHistory>::new()
        .context("failed to create readline editor")?;
    editor.set_helper(Some(helper));
    editor.set_auto_add_history(true);

    let history_path = history_file_path();
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = format!("{} ", "fleetq>".bright_green().bold());

        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.starts_with('\\') {
                    if handle_meta_command(&mut shell, trimmed) {
                        break;
                    }
                    continue;
                }
                let outcome = trimmed
                    .parse::<Command>()
                    .map_err(|e| anyhow!(e))
                    .and_then(|command| shell.execute(command));
                if let Err(e) = outcome {
                    eprintln!("{} {e:#}", "Error:".red().bold());
                }
            }
            Err(ReadlineError::Interrupted) => println!("Use \\quit or Ctrl-D to exit."),
            Err(ReadlineError::Eof) => {
                println!("Goodbye.");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    let _ = editor.save_history(&history_path);
    Ok(())
}

/// Returns `true` if the shell should exit.
fn handle_meta_command(shell: &mut Shell, line: &str) -> bool {
    let (cmd, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let arg = arg.trim();

    match cmd {
        "\\quit" | "\\q" => {
            println!("Goodbye.");
            return true;
        }
        "\\help" | "\\h" | "\\?" => print_help(),
        "\\timing" => {
            shell.show_timing = !shell.show_timing;
            println!("Timing display: {}", if shell.show_timing { "on" } else { "off" });
        }
        "\\format" if arg.is_empty() => {
            println!("Current format: {}", shell.format);
            println!("Usage: \\format <table|json|csv>");
        }
        "\\format" => match arg.parse::<OutputFormat>() {
            Ok(format) => {
                shell.format = format;
                println!("Output format: {}", shell.format);
            }
            Err(e) => eprintln!("{} {e}", "Error:".red().bold()),
        },
        "\\status" => shell.status(),
        _ => eprintln!(
            "{} Unknown command: {cmd}. Type \\help for available commands.",
            "Error:".red().bold()
        ),
    }

    false
}

fn history_file_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".fleetq_history")
}

fn print_banner(shell: &Shell) {
    println!();
    println!("{}", "  fleetq".bright_cyan().bold());
    println!("  {} {}", "Version:".dimmed(), VERSION);
    println!("  {} {}", "Server: ".dimmed(), shell.client.base_url());
    println!("  {} {}", "Format: ".dimmed(), shell.format);
    println!();
    println!(
        "  Type {} for help, {} to exit.",
        "\\help".bright_yellow(),
        "\\quit".bright_yellow()
    );
    println!();
}

fn print_help() {
    let section = |title: &str, rows: &[(&str, &str)]| {
        println!();
        println!("{}", format!("  {title}").bright_cyan().bold());
        println!();
        for (usage, text) in rows {
            println!("  {}  {text}", format!("{usage:<34}").bright_yellow());
        }
    };

    section(
        "Building filters",
        &[
            ("show", "Show groups and blocks with their positions"),
            ("group", "Add a group"),
            ("block <g> [device|label|taint]", "Add a block to group g"),
            ("op <g> <and|or>", "Set the operator of group g"),
            ("set <g.b> field <name>", "Set the field (key) of a block"),
            ("set <g.b> cond <condition>", "Set the condition (equal, in, exists, ...)"),
            ("set <g.b> value <v>[, <v>...]", "Set the value; commas make a list"),
            ("set <g.b> type <type>", "Change the filter type of a block"),
            ("on <g.b> / off <g.b>", "Include or exclude a block"),
            ("rm <g> / rm <g.b>", "Remove a group or a block"),
            ("clear <g>", "Remove every block in group g"),
            ("reset", "Remove everything"),
        ],
    );
    section(
        "Catalogs and queries",
        &[
            ("catalog", "Reload filterable fields"),
            ("values <g.b>", "Known values for a block's field"),
            ("run [page]", "Run the query"),
        ],
    );
    section(
        "Templates",
        &[
            ("save <name> [description]", "Save the active blocks as a template"),
            ("templates [page]", "List saved templates"),
            ("load <id>", "Replace the filter with a saved template"),
            ("delete <id>", "Delete a saved template"),
        ],
    );
    section(
        "Meta-commands",
        &[
            ("\\format <table|json|csv>", "Set output format"),
            ("\\timing", "Toggle query timing display"),
            ("\\status", "Show server health"),
            ("\\help", "Show this help message"),
            ("\\quit / \\q", "Exit"),
        ],
    );
    println!();
}
