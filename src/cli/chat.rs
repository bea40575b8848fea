//! Line-oriented chat loop plus the one-shot `send` and `show` commands.

use std::error::Error;

use crate::auth::ui::prompt_line;
use crate::auth::TokenStore;
use crate::cli::format::{format_agents, format_conversations, format_reply, format_transcript};
use crate::core::app::App;
use crate::core::error::Failure;

const CHAT_HELP: &str = "\
Commands:
  /new           Start a new conversation
  /agent [id]    Select an agent, or list agents
  /open <id>     Switch to an existing conversation
  /history       List recent conversations
  /show          Reprint the active conversation
  /help          Show this help
  /logout        Forget the stored token and cached data, then leave
  /quit          Leave chat
Anything else is sent as a message.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    New,
    Agent(Option<String>),
    Open(String),
    History,
    Show,
    Help,
    Logout,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim()).filter(|rest| !rest.is_empty())),
        None => (command, None),
    };

    match (name.to_ascii_lowercase().as_str(), argument) {
        ("new", _) => ChatInput::New,
        ("agent", argument) => ChatInput::Agent(argument.map(str::to_string)),
        ("open", Some(id)) => ChatInput::Open(id.to_string()),
        ("history", _) => ChatInput::History,
        ("show", _) => ChatInput::Show,
        ("help", _) => ChatInput::Help,
        ("logout", _) => ChatInput::Logout,
        ("quit" | "exit", _) => ChatInput::Quit,
        _ => ChatInput::Unknown(trimmed.to_string()),
    }
}

fn prompt_for(app: &App) -> String {
    let selection = app.session().selection();
    match (selection.conversation_id, selection.agent_id) {
        (Some(conversation), _) => format!("[{conversation}] > "),
        (None, Some(agent)) => format!("[new with {agent}] > "),
        (None, None) => "[no agent] > ".to_string(),
    }
}

async fn print_active_transcript(app: &App) -> Result<(), Failure> {
    match app.active_transcript().await? {
        Some(detail) => print!("{}", format_transcript(&detail)),
        None => println!("No active conversation."),
    }
    Ok(())
}

async fn select_agent(app: &App, agent_id: Option<String>) -> Result<(), Failure> {
    let agents = app.agents().await?;
    let Some(agent_id) = agent_id else {
        print!(
            "{}",
            format_agents(&agents, app.session().selected_agent().as_deref())
        );
        return Ok(());
    };

    match agents.iter().find(|agent| agent.id == agent_id) {
        Some(agent) => {
            app.session().select_agent(agent.id.clone());
            println!("Selected agent {} ({}).", agent.name, agent.id);
        }
        None => println!("No active agent with id {agent_id}."),
    }
    Ok(())
}

/// Run one parsed input. Returns `false` when the loop should stop.
async fn handle_input(app: &App, input: ChatInput) -> Result<bool, Failure> {
    match input {
        ChatInput::Empty => {}
        ChatInput::Quit | ChatInput::Logout => return Ok(false),
        ChatInput::Help => println!("{CHAT_HELP}"),
        ChatInput::Unknown(command) => {
            println!("Unknown command: {command}. Type /help for a list.")
        }
        ChatInput::New => {
            app.new_conversation();
            println!("Started a new conversation.");
        }
        ChatInput::Agent(agent_id) => select_agent(app, agent_id).await?,
        ChatInput::Open(id) => {
            app.open_conversation(&id);
            print_active_transcript(app).await?;
        }
        ChatInput::History => print!("{}", format_conversations(&app.recent_conversations().await?)),
        ChatInput::Show => print_active_transcript(app).await?,
        ChatInput::Message(text) => {
            let outcome = app.send(&text).await?;
            print!("{}", format_reply(&outcome));
            app.refresh().await;
        }
    }
    Ok(true)
}

fn logout(app: &App, tokens: &TokenStore, server_url: &str) {
    match tokens.remove(server_url) {
        Ok(true) => println!("Removed stored token for {server_url}"),
        Ok(false) => {}
        Err(err) => eprintln!("⚠️  Could not remove stored token: {err}"),
    }
    app.teardown();
    println!("Logged out.");
}

pub async fn run_chat(
    app: &App,
    tokens: &TokenStore,
    server_url: &str,
) -> Result<(), Box<dyn Error>> {
    println!("Type /help for commands, /quit to leave.");
    while let Some(line) = prompt_line(&prompt_for(app))? {
        let input = parse_chat_input(&line);
        if input == ChatInput::Logout {
            logout(app, tokens, server_url);
            break;
        }
        match handle_input(app, input).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => eprintln!("❌ {err}"),
        }
    }
    Ok(())
}

pub async fn run_send(
    app: &App,
    text: &str,
    agent: Option<String>,
    conversation: Option<String>,
) -> Result<(), Box<dyn Error>> {
    if let Some(agent) = agent {
        app.session().select_agent(agent);
    }
    if let Some(conversation) = conversation {
        app.open_conversation(&conversation);
    }
    let outcome = app.send(text).await?;
    print!("{}", format_reply(&outcome));
    Ok(())
}

pub async fn show_conversation(app: &App, conversation_id: &str) -> Result<(), Box<dyn Error>> {
    app.open_conversation(conversation_id);
    print_active_transcript(app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;

    #[test]
    fn plain_text_is_sent_untouched() {
        assert_eq!(
            parse_chat_input("  hello there "),
            ChatInput::Message("  hello there ".to_string())
        );
        assert_eq!(parse_chat_input("   "), ChatInput::Empty);
    }

    #[test]
    fn slash_commands_parse_with_arguments() {
        assert_eq!(parse_chat_input("/new"), ChatInput::New);
        assert_eq!(parse_chat_input("/agent"), ChatInput::Agent(None));
        assert_eq!(
            parse_chat_input("/agent  a1 "),
            ChatInput::Agent(Some("a1".to_string()))
        );
        assert_eq!(parse_chat_input("/OPEN c1"), ChatInput::Open("c1".to_string()));
        assert_eq!(parse_chat_input("/exit"), ChatInput::Quit);
        assert_eq!(parse_chat_input("/logout"), ChatInput::Logout);
    }

    #[test]
    fn open_without_id_is_unknown() {
        assert_eq!(parse_chat_input("/open"), ChatInput::Unknown("/open".to_string()));
        assert_eq!(
            parse_chat_input("/bogus arg"),
            ChatInput::Unknown("/bogus arg".to_string())
        );
    }

    #[tokio::test]
    async fn chat_inputs_drive_the_session() {
        let (app, remote) = create_test_app();

        assert!(handle_input(&app, ChatInput::Agent(Some("a1".to_string())))
            .await
            .unwrap());
        assert!(handle_input(&app, ChatInput::Message("hi".to_string()))
            .await
            .unwrap());

        let active = app.session().active_conversation();
        assert!(active.is_some());
        assert_eq!(remote.sent_requests().len(), 1);

        assert!(handle_input(&app, ChatInput::New).await.unwrap());
        assert_eq!(app.session().active_conversation(), None);

        assert!(!handle_input(&app, ChatInput::Quit).await.unwrap());
    }

    #[tokio::test]
    async fn logout_clears_cache_and_selection() {
        let (app, remote) = create_test_app();
        remote.add_conversation("c1", "Earlier");
        app.open_conversation("c1");
        app.active_transcript().await.unwrap();
        assert!(!app.cache().is_empty());

        logout(&app, &TokenStore::new_with_keyring(false), "http://localhost:8000");

        assert!(app.cache().is_empty());
        assert_eq!(app.session().active_conversation(), None);
    }

    #[tokio::test]
    async fn unknown_agent_is_not_selected() {
        let (app, _remote) = create_test_app();
        app.session().clear_agent();

        handle_input(&app, ChatInput::Agent(Some("ghost".to_string())))
            .await
            .unwrap();
        assert_eq!(app.session().selected_agent(), None);
    }
}
