//! weave CLI binary: run the ReAct agent from the command line.
//!
//! Subcommands: `run` (default), `interactive`, `config`, `session`,
//! `memory`, `tools`, `mcp`, `init`, `version` (spec.md §6). `run` and
//! `tools` are wired fully into the library crates; the rest are
//! documented stubs — this spec scopes the ReAct execution core, not a
//! full CLI product surface.

mod logging;
mod runtime;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use weave_react_core::{EventCallback, ReactConfig, ReactCore, RunRequest};
use weave_stream_event::{ChunkKind, StreamChunk};

#[derive(Parser, Debug)]
#[command(name = "weave")]
#[command(about = "weave — run the ReAct agent from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// User message (or pass as trailing positional args)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Working directory file tools resolve paths against; default: cwd
    #[arg(short = 'd', long, value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Session id for cache continuity; default: a fresh one per process
    #[arg(long, value_name = "ID")]
    session_id: Option<String>,

    /// Run without the high-risk-tool confirmation gate
    #[arg(long)]
    sandbox: bool,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Emit each stream chunk as a JSON line instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one turn and exit (the default when no subcommand is given)
    Run,
    /// Run turns in a loop, reading further messages from stdin
    Interactive,
    /// Inspect or edit persisted configuration
    Config(ConfigArgs),
    /// Inspect saved sessions
    Session(SessionArgs),
    /// Inspect or clear the project memory file
    Memory(MemoryArgs),
    /// List or describe registered tools
    Tools(ToolsArgs),
    /// Inspect or restart external MCP-style tool servers
    Mcp(McpArgs),
    /// Write a starter project memory file in the working directory
    Init,
    /// Print the binary's version
    Version,
}

#[derive(clap::Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    sub: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Set { key: String, value: String },
    List,
    Validate,
    Reset,
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    #[command(subcommand)]
    sub: SessionCommand,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    List,
    Resume { id: String },
}

#[derive(clap::Args, Debug)]
struct MemoryArgs {
    #[command(subcommand)]
    sub: MemoryCommand,
}

#[derive(Subcommand, Debug)]
enum MemoryCommand {
    List,
    Stats,
    Clear,
}

#[derive(clap::Args, Debug)]
struct ToolsArgs {
    #[command(subcommand)]
    sub: ToolsCommand,
}

#[derive(Subcommand, Debug)]
enum ToolsCommand {
    List,
    Show { name: String },
}

#[derive(clap::Args, Debug)]
struct McpArgs {
    #[command(subcommand)]
    sub: McpCommand,
}

#[derive(Subcommand, Debug)]
enum McpCommand {
    Status,
    Restart { server: Option<String> },
}

fn generate_session_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("session-{}", nanos)
}

fn print_chunk(chunk: &StreamChunk, json: bool) {
    if json {
        println!("{}", serde_json::to_string(chunk).unwrap_or_default());
        let _ = std::io::stdout().flush();
        return;
    }
    match chunk.kind {
        ChunkKind::LlmContent => {
            print!("{}", chunk.text);
            let _ = std::io::stdout().flush();
        }
        ChunkKind::ToolStart => {
            let name = chunk.metadata.as_ref().and_then(|m| m.tool_name.clone()).unwrap_or_default();
            eprintln!("\n[tool] {} ...", name);
        }
        ChunkKind::ToolResult => {
            eprintln!("[tool] ok ({} chars)", chunk.text.len());
        }
        ChunkKind::ToolError => {
            eprintln!("[tool] error: {}", chunk.text);
        }
        ChunkKind::FinalAnswer => {
            println!();
        }
        ChunkKind::MaxIterations => {
            eprintln!("\n[weave] maximum iterations reached without a final answer");
        }
        ChunkKind::Error => {
            eprintln!("\n[weave] error: {}", chunk.text);
        }
        _ => {}
    }
}

async fn run_turn(rt: &runtime::Runtime, working_dir: PathBuf, session_id: &str, message: String, json: bool) -> weave_react_core::RunOutcome {
    let core = ReactCore::new(rt.lm.clone(), rt.registry.clone(), rt.orchestrator.clone(), rt.session_cache.clone(), ReactConfig::default());
    let request = RunRequest::new(session_id, working_dir, message);
    let on_event: EventCallback = Arc::new(move |chunk| print_chunk(&chunk, json));
    core.run(request, on_event).await
}

fn resolve_message(args: &Cli) -> Option<String> {
    args.message.clone().or_else(|| {
        if args.rest.is_empty() {
            None
        } else {
            Some(args.rest.join(" "))
        }
    })
}

fn handle_config(cmd: &ConfigCommand) {
    match cmd {
        ConfigCommand::Show => println!("config show: not yet implemented (see WEAVE_LLM_* / WEAVE_MCP_CONFIG env vars)"),
        ConfigCommand::Set { key, value } => println!("config set: not yet implemented ({} = {})", key, value),
        ConfigCommand::List => println!("config list: not yet implemented"),
        ConfigCommand::Validate => println!("config validate: not yet implemented"),
        ConfigCommand::Reset => println!("config reset: not yet implemented"),
    }
}

fn handle_session(cmd: &SessionCommand) {
    match cmd {
        SessionCommand::List => println!("session list: not yet implemented (sessions are in-memory and process-scoped)"),
        SessionCommand::Resume { id } => println!("session resume: not yet implemented (requested id: {})", id),
    }
}

fn handle_memory(cmd: &MemoryCommand, working_dir: &PathBuf) {
    let file_name = std::env::var("WEAVE_MEMORY_FILE").unwrap_or_else(|_| "AGENTS.md".to_string());
    let path = working_dir.join(&file_name);
    match cmd {
        MemoryCommand::List => {
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!("no project memory file at {}", path.display());
            }
        }
        MemoryCommand::Stats => match std::fs::metadata(&path) {
            Ok(meta) => println!("{}: {} bytes", path.display(), meta.len()),
            Err(_) => println!("no project memory file at {}", path.display()),
        },
        MemoryCommand::Clear => match std::fs::remove_file(&path) {
            Ok(()) => println!("removed {}", path.display()),
            Err(e) => println!("nothing to clear at {}: {}", path.display(), e),
        },
    }
}

async fn handle_tools(cmd: &ToolsCommand, rt: &runtime::Runtime) {
    match cmd {
        ToolsCommand::List => {
            for schema in rt.registry.list().await {
                println!("{}\t{}\t{:?}", schema.name, schema.description, schema.risk_class);
            }
        }
        ToolsCommand::Show { name } => match rt.registry.lookup(name).await {
            Some(tool) => {
                let schema = tool.schema();
                println!("{}", serde_json::to_string_pretty(&schema).unwrap_or_default());
            }
            None => {
                eprintln!("no such tool: {}", name);
                std::process::exit(1);
            }
        },
    }
}

fn handle_mcp(cmd: &McpCommand) {
    match cmd {
        McpCommand::Status => println!(
            "mcp status: not yet implemented (servers are bootstrapped per-run from WEAVE_MCP_CONFIG, not supervised across invocations)"
        ),
        McpCommand::Restart { server } => {
            let label = server.clone().unwrap_or_else(|| "all".to_string());
            println!("mcp restart: not yet implemented (requested: {})", label);
        }
    }
}

fn handle_init(working_dir: &PathBuf) {
    let path = working_dir.join("AGENTS.md");
    if path.exists() {
        println!("{} already exists", path.display());
        return;
    }
    let starter = "# Project memory\n\nNotes the agent should remember about this project go here.\n";
    match std::fs::write(&path, starter) {
        Ok(()) => println!("wrote {}", path.display()),
        Err(e) => {
            eprintln!("failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    weave_config::load_and_apply("weave", None::<&std::path::Path>).ok();

    let args = Cli::parse();
    logging::init(args.verbose);

    let working_dir = args.working_dir.clone().unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let session_id = args.session_id.clone().unwrap_or_else(generate_session_id);

    match &args.command {
        Some(Command::Config(c)) => {
            handle_config(&c.sub);
            return;
        }
        Some(Command::Session(s)) => {
            handle_session(&s.sub);
            return;
        }
        Some(Command::Memory(m)) => {
            handle_memory(&m.sub, &working_dir);
            return;
        }
        Some(Command::Mcp(m)) => {
            handle_mcp(&m.sub);
            return;
        }
        Some(Command::Init) => {
            handle_init(&working_dir);
            return;
        }
        Some(Command::Version) => {
            println!("weave {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {}
    }

    let rt = runtime::build(working_dir.clone(), args.sandbox).await;

    if let Some(Command::Tools(t)) = &args.command {
        handle_tools(&t.sub, &rt).await;
        return;
    }

    let interactive = matches!(args.command, Some(Command::Interactive));
    let message = resolve_message(&args);

    if !interactive {
        let Some(message) = message else {
            eprintln!("weave: provide a message via -m/--message or trailing positional args");
            std::process::exit(1);
        };
        let outcome = run_turn(&rt, working_dir, &session_id, message, args.json).await;
        if !args.json && outcome.final_answer.is_none() && !outcome.cancelled {
            std::process::exit(1);
        }
        return;
    }

    if let Some(message) = message {
        if !message.trim().is_empty() {
            run_turn(&rt, working_dir.clone(), &session_id, message, args.json).await;
        }
    }

    let stdin = std::io::stdin();
    loop {
        eprint!("> ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        let read = stdin.read_line(&mut line).unwrap_or(0);
        if read == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }
        run_turn(&rt, working_dir.clone(), &session_id, line.to_string(), args.json).await;
    }
}
