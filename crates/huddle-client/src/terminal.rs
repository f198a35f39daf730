//! Line-oriented terminal front end.
//!
//! Plain lines are sent as chat messages; lines starting with `/` are
//! commands. The view is reprinted whenever a chat event changes it.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use huddle_shared::MeetingId;

use crate::api::HttpApi;
use crate::auth::AuthContext;
use crate::chat::{ChatConfig, ChatInterface, ChatView};
use crate::config::ClientConfig;
use crate::events::{self, ChatEvent, NoticeKind};

const HELP: &str = "commands: /slot <1-3>  /confirm  /cancel  /available <meeting_id> yes|no  /reload  /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    /// Zero-based slot index.
    Slot(usize),
    Confirm,
    Cancel,
    Available {
        meeting_id: MeetingId,
        is_available: bool,
    },
    Reload,
    Help,
    Quit,
    Invalid(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let cmd = match parts.next().unwrap_or("") {
        "slot" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n @ 1..=3) => Command::Slot(n - 1),
            _ => Command::Invalid("usage: /slot <1-3>".into()),
        },
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        "available" => {
            let id = parts.next().and_then(|id| id.parse::<i64>().ok());
            let answer = match parts.next() {
                Some("yes") | Some("y") => Some(true),
                Some("no") | Some("n") => Some(false),
                _ => None,
            };
            match (id, answer) {
                (Some(id), Some(is_available)) => Command::Available {
                    meeting_id: MeetingId(id),
                    is_available,
                },
                _ => Command::Invalid("usage: /available <meeting_id> yes|no".into()),
            }
        }
        "reload" => Command::Reload,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command /{other}")),
    };
    Some(cmd)
}

pub async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let api = Arc::new(HttpApi::new(
        &config.server_url,
        config.token.clone(),
        config.request_timeout,
    )?);
    let auth = AuthContext::new(config.current_user.clone());
    let (tx, mut rx) = events::channel();

    let chat = ChatInterface::new(api, auth, ChatConfig::from(&config), tx);
    chat.mount();

    let mut screen = Screen::default();
    screen.refresh(&chat);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(cmd) = parse_command(&line) else { continue };
                if !dispatch(&chat, cmd) {
                    break;
                }
            }
            Some(event) = rx.recv() => {
                if let ChatEvent::Notice(ref notice) = event {
                    let tag = match notice.kind {
                        NoticeKind::Info => "notice",
                        NoticeKind::Failure => "error",
                    };
                    println!("!! [{tag}] {}", notice.text);
                }
                screen.refresh(&chat);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    chat.unmount();
    Ok(())
}

/// Run one command. Returns `false` when the user asked to quit.
fn dispatch(chat: &ChatInterface, cmd: Command) -> bool {
    match cmd {
        Command::Say(text) => {
            let chat = chat.clone();
            tokio::spawn(async move {
                // Failures are logged and surfaced as notices by the chat view.
                if let Ok(None) = chat.send_text(text).await {
                    println!("!! message not sent: {}", unsent_reason(&chat.render()));
                }
            });
        }
        Command::Slot(index) => {
            if let Err(e) = chat.select_slot_index(index) {
                println!("!! {e}");
            }
        }
        Command::Confirm => {
            let chat = chat.clone();
            tokio::spawn(async move {
                let _ = chat.confirm_meeting().await;
            });
        }
        Command::Cancel => {
            if let Err(e) = chat.cancel_meeting() {
                println!("!! {e}");
            }
        }
        Command::Available {
            meeting_id,
            is_available,
        } => {
            let chat = chat.clone();
            tokio::spawn(async move {
                match chat.update_availability(meeting_id, is_available).await {
                    Ok(()) => println!("availability for meeting {meeting_id} saved"),
                    Err(e) => println!("!! {e}"),
                }
            });
        }
        Command::Reload => chat.reload_group(),
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
        Command::Invalid(msg) => {
            warn!(%msg, "Invalid command");
            println!("!! {msg}");
        }
    }
    true
}

/// Why a non-blank line produced no request.
fn unsent_reason(view: &ChatView) -> &'static str {
    match view {
        ChatView::Loading => "group not loaded yet",
        ChatView::Ready(view) if view.input.disabled => "still sending the previous message",
        ChatView::Ready(_) => "view is not mounted",
    }
}

/// Reprints the view only when its text changed.
#[derive(Default)]
struct Screen {
    last: String,
}

impl Screen {
    fn refresh(&mut self, chat: &ChatInterface) {
        let text = chat.render().to_string();
        if text != self.last {
            println!("\n{text}");
            self.last = text;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{InputView, ReadyView};

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(parse_command("hello there\n"), Some(Command::Say("hello there".into())));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_slot_is_one_based() {
        assert_eq!(parse_command("/slot 2"), Some(Command::Slot(1)));
        assert!(matches!(parse_command("/slot 4"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("/slot"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_availability_command() {
        assert_eq!(
            parse_command("/available 9 no"),
            Some(Command::Available {
                meeting_id: MeetingId(9),
                is_available: false,
            })
        );
        assert!(matches!(parse_command("/available nine yes"), Some(Command::Invalid(_))));
    }

    #[test]
    fn test_unsent_reason() {
        let mut view = ReadyView {
            header: "Group: Team".into(),
            members: "Members: a".into(),
            messages: Vec::new(),
            scheduler: None,
            input: InputView {
                draft: "hi".into(),
                disabled: true,
                button_label: "Sending…",
            },
        };
        assert_eq!(
            unsent_reason(&ChatView::Ready(view.clone())),
            "still sending the previous message"
        );

        view.input.disabled = false;
        assert_eq!(unsent_reason(&ChatView::Ready(view)), "view is not mounted");
        assert_eq!(unsent_reason(&ChatView::Loading), "group not loaded yet");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/confirm"), Some(Command::Confirm));
        assert_eq!(parse_command("/cancel"), Some(Command::Cancel));
        assert_eq!(parse_command("/quit"), Some(Command::Quit));
        assert!(matches!(parse_command("/dance"), Some(Command::Invalid(_))));
    }
}
