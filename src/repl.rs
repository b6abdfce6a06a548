//! Line-oriented terminal front end
//!
//! Reads commands from stdin, forwards them to the controller and prints
//! session events as they are broadcast.

use crate::assistant::AssistantService;
use crate::identity::IdentityProvider;
use crate::runtime::{InteractionController, QuickAction, SessionEvent};
use crate::session::{ContextTag, Mode, Role, SessionSnapshot};
use crate::state_machine::{InteractionError, InteractionState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

const WELCOME: &str = r#"Ready to Code!

I'm your AI coding assistant. Ask me anything about programming,
code review, debugging, or development best practices.

  "Help me debug this React component"
  "Explain this JavaScript concept"
  "Review my code for best practices""#;

const HELP: &str = "Commands:
  /chat           switch to conversation mode
  /code           switch to code analysis mode
  /send           send the draft of the current mode
  /analyze        send the code buffer for analysis
  /clear          empty the code buffer
  /retry          ask again after a failed reply
  /new            start a new conversation
  /review <code>  review a snippet
  /fix <code>     find and fix a bug in a snippet
  /whoami         show the signed-in user
  /signout        sign out and exit
  /quit           exit
  /help           show this list

In conversation mode a line is sent as a message. In code mode lines are
collected in the code buffer until /analyze.";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat,
    Code,
    Send,
    Analyze,
    Clear,
    Retry,
    New,
    Review(String),
    Fix(String),
    WhoAmI,
    SignOut,
    Quit,
    Help,
    /// Input that is not a command
    Text(String),
    Unknown(String),
}

/// Parse one input line. Only known command names are commands; in code
/// mode every other line, including ones starting with `/`, is code.
pub fn parse_command(line: &str, mode: Mode) -> Command {
    let text = || Command::Text(line.to_string());
    let Some(rest) = line.trim().strip_prefix('/') else {
        return text();
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

    match name {
        "chat" => Command::Chat,
        "code" => Command::Code,
        "send" => Command::Send,
        "analyze" => Command::Analyze,
        "clear" => Command::Clear,
        "retry" => Command::Retry,
        "new" => Command::New,
        "review" => Command::Review(arg.to_string()),
        "fix" => Command::Fix(arg.to_string()),
        "whoami" => Command::WhoAmI,
        "signout" => Command::SignOut,
        "quit" | "exit" => Command::Quit,
        "help" => Command::Help,
        _ if mode == Mode::Conversation
            && !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            Command::Unknown(name.to_string())
        }
        _ => text(),
    }
}

/// Format a session event for the terminal. Events with nothing worth
/// printing return `None`.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Message { message } => {
            let speaker = match (message.role(), message.context()) {
                (Role::User, ContextTag::Conversation) => "you",
                (Role::User, ContextTag::CodeAnalysis) => "you (code)",
                (Role::Assistant, _) => "assistant",
            };
            Some(format!("{speaker}> {}", message.content().trim_end()))
        }
        SessionEvent::StateChange {
            state: InteractionState::AwaitingResponse { .. },
        } => Some("... waiting for the assistant".to_string()),
        SessionEvent::ModeChange { mode } => Some(match mode {
            Mode::Conversation => "Conversation mode. Type a message and press Enter.".to_string(),
            Mode::CodeAnalysis => {
                "Code analysis mode. Paste code, then /analyze. /clear empties the buffer."
                    .to_string()
            }
        }),
        SessionEvent::Failure { failure } => {
            let error = InteractionError::AssistantUnavailable(failure.message.clone());
            if failure.retryable {
                Some(format!("{error}. Type /retry to try again."))
            } else {
                Some(error.to_string())
            }
        }
        SessionEvent::SessionReset { .. } => {
            Some(format!("Started a new conversation.\n\n{WELCOME}"))
        }
        SessionEvent::SessionEnded => Some("Signed out. Goodbye.".to_string()),
        // Rejections are reported where the command was handled
        SessionEvent::StateChange { .. }
        | SessionEvent::DraftChange { .. }
        | SessionEvent::Error { .. } => None,
    }
}

fn describe_rejection(error: &InteractionError) -> String {
    match error {
        InteractionError::ResponsePending => {
            "Still waiting for the assistant; sending is disabled until it replies.".to_string()
        }
        other => other.to_string(),
    }
}

fn header(snapshot: &SessionSnapshot) -> String {
    let user = snapshot
        .user_email
        .as_deref()
        .map_or_else(|| "Not signed in".to_string(), |e| format!("Signed in as {e}"));
    let mut text = format!(
        "AI Coding Assistant ({user}, {} mode)",
        snapshot.mode.label()
    );
    if snapshot.transcript.is_empty() {
        text.push_str("\n\n");
        text.push_str(WELCOME);
    }
    text.push_str("\n\nType /help for commands.");
    text
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn handle_line<A, I>(controller: &mut InteractionController<A, I>, line: &str) -> Flow
where
    A: AssistantService + 'static,
    I: IdentityProvider + 'static,
{
    let command = parse_command(line, controller.mode());
    match execute(controller, command).await {
        Ok(flow) => flow,
        Err(e) => {
            println!("{}", describe_rejection(&e));
            Flow::Continue
        }
    }
}

async fn execute<A, I>(
    controller: &mut InteractionController<A, I>,
    command: Command,
) -> Result<Flow, InteractionError>
where
    A: AssistantService + 'static,
    I: IdentityProvider + 'static,
{
    match command {
        Command::Chat => controller.switch_mode(Mode::Conversation),
        Command::Code => controller.switch_mode(Mode::CodeAnalysis),
        Command::Send => controller.submit_message().map(|_| ()),
        Command::Analyze => controller.request_code_analysis().map(|_| ()),
        Command::Clear => controller
            .clear_code_buffer()
            .map(|()| println!("Code buffer cleared.")),
        Command::Retry => controller.retry_failed_exchange(),
        Command::New => controller.new_conversation(),
        Command::Review(code) => controller
            .quick_action(QuickAction::Review, &code)
            .map(|_| ()),
        Command::Fix(code) => controller
            .quick_action(QuickAction::QuickFix, &code)
            .map(|_| ()),
        Command::WhoAmI => {
            match controller.current_user() {
                Some(user) => println!("Signed in as {}", user.email),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Command::SignOut => return controller.sign_out().await.map(|()| Flow::Quit),
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        // Enter on an empty line does nothing
        Command::Text(text)
            if text.trim().is_empty() && controller.mode() == Mode::Conversation =>
        {
            Ok(())
        }
        Command::Text(text) => match controller.mode() {
            Mode::Conversation => controller
                .edit_draft(text)
                .and_then(|()| controller.submit_message().map(|_| ())),
            Mode::CodeAnalysis => controller.append_draft_line(Mode::CodeAnalysis, &text),
        },
        Command::Unknown(name) => {
            println!("Unknown command /{name}. Type /help for the list.");
            Ok(())
        }
    }?;
    Ok(Flow::Continue)
}

/// Run the terminal loop until stdin closes or the user quits
pub async fn run<A, I>(mut controller: InteractionController<A, I>) -> std::io::Result<()>
where
    A: AssistantService + 'static,
    I: IdentityProvider + 'static,
{
    let mut events = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", header(&controller.snapshot()));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if handle_line(&mut controller, &line).await == Flow::Quit {
                    break;
                }
            }

            // Output is rendered from the broadcast events below
            Some(_) = controller.next_resolution() => {}

            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{text}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Terminal fell behind session events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Flush whatever the last command produced
    while let Ok(event) = events.try_recv() {
        if let Some(text) = render_event(&event) {
            println!("{text}");
        }
    }
    Ok(())
}
