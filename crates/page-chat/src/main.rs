//! A terminal client for chatting about the content of a webpage.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use page_chat::{Session, SessionBuilder};
use page_chat_core::notice::SUGGESTIONS_FAILED;
use page_chat_core::{
    ActorDeadError, ContextSource, ControllerEvent, NoticeLevel, RejectReason,
    SubmitOutcome,
};
use page_chat_http_service::DEFAULT_BASE_URL;
use page_chat_model::{Message, Role};
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const HISTORY_FILE: &str = "history.json";
/// The popup only showed this many suggestions.
const HIGHLIGHTED_SUGGESTIONS: usize = 3;

const HELP: &str = "\
/open <url>   open a page
/suggest      list suggested questions
/<n>          ask suggested question number n
/clear        clear the history of this page
/history      print the history of this page
/dismiss      dismiss all notices
/help         print this help
/quit         exit
Anything else is asked as a question about the page.";

/// Chat about the content of a webpage.
#[derive(Debug, Parser)]
#[command(name = "page-chat")]
#[command(version)]
struct Args {
    /// Page to open at start
    url: Option<String>,

    /// Base URL of the question-answering service
    #[arg(long, env = "PAGE_CHAT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory to save chat history in
    #[arg(long, env = "PAGE_CHAT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// What to send to the service as context
    #[arg(long, value_enum, default_value_t = ContextArg::Content)]
    context: ContextArg,

    /// Don't download pages, use their URL as context
    #[arg(long)]
    no_extract: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ContextArg {
    /// The page text, or the URL if the page can't be read
    Content,
    /// Always the URL
    Identity,
}

impl From<ContextArg> for ContextSource {
    fn from(arg: ContextArg) -> Self {
        match arg {
            ContextArg::Content => ContextSource::PreferContent,
            ContextArg::Identity => ContextSource::IdentityOnly,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Open(String),
    Suggest,
    Pick(usize),
    Clear,
    History,
    Dismiss,
    Help,
    Quit,
    Ask(String),
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Self::Ask(line.to_owned());
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name {
            "open" => Self::Open(arg.to_owned()),
            "suggest" => Self::Suggest,
            "clear" => Self::Clear,
            "history" => Self::History,
            "dismiss" => Self::Dismiss,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => match name.parse() {
                Ok(n) => Self::Pick(n),
                Err(_) => Self::Unknown(name.to_owned()),
            },
        }
    }
}

/// Renders controller events as they arrive.
#[derive(Default)]
struct View {
    printed: usize,
    suggestions: Vec<String>,
}

impl View {
    fn render(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Activated { identity } => {
                println!("{}📄 {}", BAR_CHAR.bright_green(), identity.bold());
                self.printed = 0;
            }
            ControllerEvent::TranscriptChanged(transcript) => {
                if transcript.len() < self.printed {
                    self.printed = 0;
                }
                // Questions typed in this session are on screen already.
                let restoring = self.printed == 0;
                for message in &transcript.messages()[self.printed..] {
                    if restoring || message.role() == Role::Assistant {
                        print_message(message);
                    }
                }
                self.printed = transcript.len();
            }
            ControllerEvent::SuggestionsChanged(suggestions) => {
                self.suggestions = suggestions.clone();
                print_suggestions(&self.suggestions);
            }
            ControllerEvent::Notice(notice) => {
                let bar = match notice.level() {
                    NoticeLevel::Warning => {
                        BAR_CHAR.bright_yellow().to_string()
                    }
                    NoticeLevel::Error => BAR_CHAR.bright_red().to_string(),
                };
                println!(
                    "{bar}⚠️  {}: {}",
                    notice.title().bold(),
                    notice.description()
                );
            }
            ControllerEvent::Idle => {}
        }
    }
}

fn print_message(message: &Message) {
    match message.role() {
        Role::User => {
            println!("{}🧑 {}", BAR_CHAR.bright_blue(), message.content());
        }
        Role::Assistant => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                message.content().bright_white()
            );
        }
    }
}

fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!("{}💡 Suggested questions:", BAR_CHAR.bright_magenta());
    for (i, question) in suggestions.iter().enumerate() {
        let line = format!("/{} {question}", i + 1);
        if i < HIGHLIGHTED_SUGGESTIONS {
            println!("{}   {}", BAR_CHAR.bright_magenta(), line.bright_white());
        } else {
            println!("{}   {}", BAR_CHAR.bright_magenta(), line.dimmed());
        }
    }
}

struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                error!("error reading input: {err}");
                None
            }
        }
    }
}

/// Renders events with a spinner until `done` accepts one. Returns `false`
/// if the controller has stopped.
async fn wait_until(
    event_rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    view: &mut View,
    message: &'static str,
    mut done: impl FnMut(&ControllerEvent) -> bool,
) -> bool {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut progress_bar = None;

    loop {
        // Create a new progress bar if it has been finished.
        progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(progress_style.clone());
                progress_bar.set_message(message);
                progress_bar
            })
            .inc(1);

        let sleep = sleep(Duration::from_millis(100));
        let event = select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return false;
                };
                event
            },
            _ = sleep => {
                continue;
            }
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        let finished = done(&event);
        view.render(&event);
        if finished {
            return true;
        }
    }
}

/// Waits until the page is ready and its suggestions have settled.
async fn open(
    session: &Session,
    event_rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    view: &mut View,
    url: &str,
) -> Result<bool, ActorDeadError> {
    session.open(url)?;
    let mut activated = false;
    Ok(wait_until(event_rx, view, "📄 Reading the page...", |event| {
        match event {
            ControllerEvent::Activated { .. } => {
                activated = true;
                false
            }
            ControllerEvent::SuggestionsChanged(_) => activated,
            ControllerEvent::Notice(notice) => {
                notice.level() == NoticeLevel::Error
                    || (activated && notice.description() == SUGGESTIONS_FAILED)
            }
            _ => false,
        }
    })
    .await)
}

async fn ask(
    session: &Session,
    event_rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    view: &mut View,
    question: &str,
) -> Result<bool, ActorDeadError> {
    match session.ask(question).await? {
        SubmitOutcome::Accepted => Ok(wait_until(
            event_rx,
            view,
            "🤔 Thinking...",
            |event| *event == ControllerEvent::Idle,
        )
        .await),
        SubmitOutcome::Rejected(RejectReason::Empty) => Ok(true),
        SubmitOutcome::Rejected(RejectReason::InFlight) => {
            println!("Still waiting for the previous answer.");
            Ok(true)
        }
        SubmitOutcome::Rejected(RejectReason::NotReady) => {
            println!("Open a page first with /open <url>.");
            Ok(true)
        }
    }
}

async fn run(
    session: Session,
    mut event_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    initial_url: Option<String>,
) -> Result<(), ActorDeadError> {
    let mut view = View::default();
    let mut input = Input::new();

    if let Some(url) = initial_url {
        if !open(&session, &mut event_rx, &mut view, &url).await? {
            return Ok(());
        }
    } else {
        println!("Open a page with /open <url>, or type /help.");
    }

    loop {
        // Render whatever arrived while waiting for input.
        while let Ok(event) = event_rx.try_recv() {
            view.render(&event);
        }

        print!("> ");
        std::io::stdout().flush().ok();
        let Some(line) = input.read_line().await else {
            break;
        };

        let running = match Command::parse(&line) {
            Command::Open(url) => {
                open(&session, &mut event_rx, &mut view, &url).await?
            }
            Command::Ask(question) => {
                ask(&session, &mut event_rx, &mut view, &question).await?
            }
            Command::Pick(n) => {
                let picked = n
                    .checked_sub(1)
                    .and_then(|i| view.suggestions.get(i))
                    .cloned();
                if let Some(question) = picked {
                    println!("{}🧑 {question}", BAR_CHAR.bright_blue());
                    ask(&session, &mut event_rx, &mut view, &question).await?
                } else {
                    println!("There is no suggestion number {n}.");
                    true
                }
            }
            Command::Suggest => {
                let suggestions = session.snapshot().await?.suggestions;
                if suggestions.is_empty() {
                    println!("No suggested questions.");
                }
                print_suggestions(&suggestions);
                true
            }
            Command::Clear => {
                session.clear_history()?;
                println!("History cleared.");
                true
            }
            Command::History => {
                let snapshot = session.snapshot().await?;
                for message in &snapshot.transcript {
                    print_message(message);
                }
                true
            }
            Command::Dismiss => {
                let dismissed = session.dismiss_notices().await?;
                println!("Dismissed {dismissed} notice(s).");
                true
            }
            Command::Help => {
                println!("{HELP}");
                true
            }
            Command::Quit => false,
            Command::Unknown(name) => {
                println!("Unknown command /{name}, type /help.");
                true
            }
        };
        if !running {
            break;
        }
    }
    Ok(())
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("page-chat"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!("starting with {args:?}");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut builder = SessionBuilder::new()
        .with_base_url(args.base_url)
        .with_context_source(args.context.into())
        .on_event(move |event| {
            event_tx.send(event).ok();
        });
    if args.no_extract {
        builder = builder.without_page_reader();
    }
    match args.data_dir.or_else(default_data_dir) {
        Some(dir) => {
            builder = builder.with_history_file(dir.join(HISTORY_FILE));
        }
        None => warn!("no data directory found, history will not be saved"),
    }

    let session = match builder.build() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("failed to open chat history: {err}");
            return;
        }
    };

    if let Err(err) = run(session, event_rx, args.url).await {
        eprintln!("{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            Command::parse("/open https://a.test\n"),
            Command::Open("https://a.test".to_owned())
        );
        assert_eq!(Command::parse("/open"), Command::Open(String::new()));
        assert_eq!(Command::parse("/2"), Command::Pick(2));
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(
            Command::parse("/nope"),
            Command::Unknown("nope".to_owned())
        );
        assert_eq!(
            Command::parse("  What is this page about? "),
            Command::Ask("What is this page about?".to_owned())
        );
    }

    #[test]
    fn test_args() {
        let args =
            Args::try_parse_from(["page-chat", "--context", "identity"])
                .unwrap();
        assert_eq!(args.url, None);
        assert_eq!(
            ContextSource::from(args.context),
            ContextSource::IdentityOnly
        );
        assert!(!args.no_extract);
    }
}
