use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use showcase_contracts::api::Route;
use showcase_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS};
use showcase_contracts::events::EventWriter;
use showcase_contracts::form::{FormField, Photo};
use showcase_contracts::workflow::{OverlapPolicy, WorkflowOutcome};
use showcase_engine::{
    default_api_registry, new_session_id, CreatePostSession, GalleryConfig, Navigator,
    SessionSnapshot,
};

#[derive(Debug, Parser)]
#[command(
    name = "showcase-rs",
    version,
    about = "Generate images from prompts and share them with the community showcase"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill the create-post form interactively.
    Create(CreateArgs),
    /// Generate one image and optionally save it.
    Generate(GenerateArgs),
    /// Generate an image and share it in one go.
    Share(ShareArgs),
}

#[derive(Debug, Args)]
struct GalleryArgs {
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    backend: Option<String>,
    #[arg(long, value_parser = parse_overlap)]
    overlap: Option<OverlapPolicy>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[command(flatten)]
    gallery: GalleryArgs,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    prompt: Option<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    gallery: GalleryArgs,
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ShareArgs {
    #[command(flatten)]
    gallery: GalleryArgs,
    #[arg(long)]
    name: String,
    #[arg(long, conflicts_with = "surprise")]
    prompt: Option<String>,
    #[arg(long)]
    surprise: bool,
    #[arg(long)]
    out: Option<PathBuf>,
}

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("showcase-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Create(args) => {
            run_create(args)?;
            Ok(0)
        }
        Command::Generate(args) => run_generate(args),
        Command::Share(args) => run_share(args),
    }
}

fn parse_overlap(raw: &str) -> Result<OverlapPolicy, String> {
    raw.parse()
}

/// Prints where the client would go and remembers that it got there.
#[derive(Debug, Default)]
struct ConsoleNavigator {
    arrived_home: AtomicBool,
}

impl ConsoleNavigator {
    fn arrived_home(&self) -> bool {
        self.arrived_home.load(Ordering::SeqCst)
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        println!("Navigating to {}", route.path());
        if route == Route::Home {
            self.arrived_home.store(true, Ordering::SeqCst);
        }
    }
}

fn build_session(
    args: &GalleryArgs,
    navigator: Arc<ConsoleNavigator>,
) -> Result<CreatePostSession> {
    let config = GalleryConfig::from_env()?.with_overrides(
        args.api_base.clone(),
        args.backend.clone(),
        args.overlap,
    );
    let api = default_api_registry(&config)?.resolve(&config.backend)?;
    let mut session = CreatePostSession::new(api, navigator).with_overlap(config.overlap);
    if let Some(path) = &args.events {
        let events = EventWriter::open(path, new_session_id())?;
        eprintln!(
            "Logging {} to {}",
            events.session_id(),
            events.path().display()
        );
        session = session.with_events(events);
    }
    Ok(session)
}

fn run_create(args: CreateArgs) -> Result<()> {
    let navigator = Arc::new(ConsoleNavigator::default());
    let session = Arc::new(build_session(&args.gallery, navigator.clone())?);
    navigator.navigate(Route::CreatePost);
    if let Some(name) = args.name {
        session.set_field(FormField::Name, name);
    }
    if let Some(prompt) = args.prompt {
        session.set_field(FormField::Prompt, prompt);
    }

    let lines = spawn_stdin_reader()?;
    let mut workers: Vec<thread::JoinHandle<()>> = Vec::new();

    println!(
        "Create a post ({} backend). Type /help for commands.",
        session.backend_name()
    );
    print_prompt()?;

    loop {
        if navigator.arrived_home() {
            println!("Post shared with the community.");
            break;
        }
        let line = match lines.recv_timeout(INPUT_POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let intent = parse_intent(&line);
        match intent.action.as_str() {
            "noop" => {}
            "help" => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
                println!("Any other text sets the prompt and generates.");
            }
            "set_name" | "set_prompt" | "set_photo" => {
                let field = match intent.action.as_str() {
                    "set_name" => FormField::Name,
                    "set_prompt" => FormField::Prompt,
                    _ => FormField::Photo,
                };
                let value = intent.arg_str("value").unwrap_or_default().to_string();
                session.set_field(field, value);
                println!("{field} updated");
            }
            "surprise_me" => {
                let prompt = session.surprise_me();
                println!("Prompt set to {prompt}");
            }
            "generate" => {
                if let Some(prompt) = intent.prompt.clone() {
                    session.set_field(FormField::Prompt, prompt);
                }
                if session.is_generating() {
                    println!("Generating... (a previous request is still running)");
                } else {
                    println!("Generating...");
                }
                spawn_workflow(&mut workers, "showcase-generate", {
                    let session = Arc::clone(&session);
                    move || println!("{}", describe_generate_outcome(&session.generate()))
                });
            }
            "submit" => {
                println!("Sharing...");
                spawn_workflow(&mut workers, "showcase-submit", {
                    let session = Arc::clone(&session);
                    move || println!("{}", describe_submit_outcome(&session.submit()))
                });
            }
            "show" => {
                print!("{}", render_snapshot(&session.snapshot()));
            }
            "save_photo" => {
                let path = intent.arg_str("path").unwrap_or_default();
                if path.is_empty() {
                    println!("/save requires a path");
                } else {
                    match session.form().photo {
                        Some(photo) => match save_photo(&photo, Path::new(path)) {
                            Ok((width, height)) => {
                                println!("Saved {width}x{height} image to {path}")
                            }
                            Err(err) => println!("Save failed: {err:#}"),
                        },
                        None => println!("No photo yet. /generate one first."),
                    }
                }
            }
            "wait" => {
                join_workers(&mut workers);
            }
            "quit" => break,
            _ => {
                let command = intent.arg_str("command").unwrap_or_default();
                println!("Unknown command /{command}. Type /help for commands.");
            }
        }
        workers.retain(|worker| !worker.is_finished());
        if !navigator.arrived_home() {
            print_prompt()?;
        }
    }

    join_workers(&mut workers);
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let navigator = Arc::new(ConsoleNavigator::default());
    let session = build_session(&args.gallery, navigator)?;
    session.set_field(FormField::Prompt, args.prompt);

    let outcome = session.generate();
    println!("{}", describe_generate_outcome(&outcome));
    let WorkflowOutcome::Completed(photo) = outcome else {
        return Ok(1);
    };
    if let Some(out) = args.out {
        let (width, height) = save_photo(&photo, &out)?;
        println!("Saved {width}x{height} image to {}", out.display());
    }
    Ok(0)
}

fn run_share(args: ShareArgs) -> Result<i32> {
    if args.prompt.is_none() && !args.surprise {
        bail!("share needs --prompt or --surprise");
    }
    let navigator = Arc::new(ConsoleNavigator::default());
    let session = build_session(&args.gallery, navigator.clone())?;
    session.set_field(FormField::Name, args.name);
    match args.prompt {
        Some(prompt) => session.set_field(FormField::Prompt, prompt),
        None => {
            let prompt = session.surprise_me();
            println!("Prompt: {prompt}");
        }
    }

    let generated = session.generate();
    println!("{}", describe_generate_outcome(&generated));
    let WorkflowOutcome::Completed(photo) = generated else {
        return Ok(1);
    };
    if let Some(out) = &args.out {
        let (width, height) = save_photo(&photo, out)?;
        println!("Saved {width}x{height} image to {}", out.display());
    }

    let shared = session.submit();
    println!("{}", describe_submit_outcome(&shared));
    Ok(if shared.is_completed() && navigator.arrived_home() {
        0
    } else {
        1
    })
}

fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("showcase-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("stdin reader thread spawn failed")?;
    Ok(rx)
}

fn spawn_workflow<F>(workers: &mut Vec<thread::JoinHandle<()>>, name: &str, job: F)
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.to_string()).spawn(job) {
        Ok(handle) => workers.push(handle),
        Err(err) => println!("Could not start {name}: {err}"),
    }
}

fn join_workers(workers: &mut Vec<thread::JoinHandle<()>>) {
    for worker in workers.drain(..) {
        let _ = worker.join();
    }
}

fn print_prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn describe_generate_outcome(outcome: &WorkflowOutcome<Photo>) -> String {
    match outcome {
        WorkflowOutcome::Completed(photo) => format!(
            "Image ready ({}). /save <path> keeps a copy.",
            describe_photo(photo)
        ),
        WorkflowOutcome::Superseded(token) => {
            format!("Discarded image from request {token}; a newer request is pending.")
        }
        WorkflowOutcome::Rejected(_) | WorkflowOutcome::Failed(_) => {
            format!("Error: {}", outcome.error_message().unwrap_or_default())
        }
    }
}

fn describe_submit_outcome(outcome: &WorkflowOutcome<Value>) -> String {
    match outcome {
        WorkflowOutcome::Completed(reply) => {
            match reply
                .get("data")
                .and_then(|data| data.get("_id"))
                .and_then(Value::as_str)
            {
                Some(id) => format!("Shared post {id}."),
                None => "Shared.".to_string(),
            }
        }
        WorkflowOutcome::Superseded(token) => {
            format!("Ignored reply to share request {token}; a newer share is pending.")
        }
        WorkflowOutcome::Rejected(_) | WorkflowOutcome::Failed(_) => {
            format!("Error: {}", outcome.error_message().unwrap_or_default())
        }
    }
}

fn describe_photo(photo: &Photo) -> String {
    let media_type = photo.media_type().unwrap_or("unknown");
    match photo.decode() {
        Ok(bytes) => format!("{media_type}, {} bytes", bytes.len()),
        Err(_) => format!("{media_type}, not decodable"),
    }
}

fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let form = &snapshot.form;
    let photo = form
        .photo
        .as_ref()
        .map(describe_photo)
        .unwrap_or_else(|| "none".to_string());
    let mut out = String::new();
    out.push_str(&format!("name:     {}\n", form.name));
    out.push_str(&format!("prompt:   {}\n", form.prompt));
    out.push_str(&format!("photo:    {photo}\n"));
    out.push_str(&format!("generate: {}\n", snapshot.generate.label()));
    out.push_str(&format!("share:    {}\n", snapshot.submit.label()));
    if let Some(banner) = &snapshot.error {
        out.push_str(&format!("error:    {} ({})\n", banner.message, banner.source));
    }
    out
}

/// Writes the decoded photo and returns its dimensions.
fn save_photo(photo: &Photo, path: &Path) -> Result<(u32, u32)> {
    let bytes = photo.decode()?;
    let image = image::load_from_memory(&bytes).context("photo is not a readable image")?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &bytes).with_context(|| format!("failed writing {}", path.display()))?;
    Ok((image.width(), image.height()))
}
