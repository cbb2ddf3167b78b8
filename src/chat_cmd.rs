//! Chat commands: one-shot `dc ask` and the interactive `dc chat` session.
//!
//! The interactive session holds the application state for its lifetime —
//! assistant registry, selection, and per-assistant message logs — which
//! all evaporate when the process exits. Only the auth session survives.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::auth::{advise, client_for};
use crate::chat::ChatStore;
use crate::client::ApiClient;
use crate::config::Config;
use crate::models::Message;
use crate::registry::AssistantRegistry;

/// Ask one question and print the answer with its source pages.
pub async fn run_ask(config: &Config, assistant_id: i64, query: &str) -> Result<()> {
    let client = client_for(config)?;
    let mut registry = AssistantRegistry::new();
    registry
        .refresh(&client)
        .await
        .map_err(|e| advise(config, e))?;
    registry.select(Some(assistant_id))?;

    let mut store = ChatStore::new(config.chat.history_depth);
    let reply = store.send(&client, assistant_id, query).await;
    print_reply(&reply);
    Ok(())
}

/// Interactive chat loop. Lines starting with `/` are commands; anything
/// else is sent to the selected assistant.
pub async fn run_chat(config: &Config, assistant: Option<i64>) -> Result<()> {
    let client = client_for(config)?;
    let mut registry = AssistantRegistry::new();
    registry
        .refresh(&client)
        .await
        .map_err(|e| advise(config, e))?;

    if registry.assistants().is_empty() {
        println!("No assistants. Create one with `dc assistants create <file.pdf> --name <name>`.");
        return Ok(());
    }

    match assistant {
        Some(id) => registry.select(Some(id))?,
        // With a single assistant there is nothing to choose.
        None if registry.assistants().len() == 1 => {
            let id = registry.assistants()[0].id;
            registry.select(Some(id))?;
        }
        None => {}
    }

    let mut store = ChatStore::new(config.chat.history_depth);

    print_list(&registry);
    if let Some(a) = registry.selected() {
        println!("Chatting with '{}'. /help for commands.", a.name);
    } else {
        println!("Select an assistant with /use <id>. /help for commands.");
    }

    let stdin = std::io::stdin();
    loop {
        prompt(&registry);
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &client, &mut registry, &mut store).await? {
                break;
            }
            continue;
        }

        let assistant_id = match registry.selected_id() {
            Some(id) => id,
            None => {
                println!("No assistant selected. Use /use <id>.");
                continue;
            }
        };

        let reply = store.send(&client, assistant_id, line).await;
        print_reply(&reply);
    }

    Ok(())
}

/// Returns `false` when the session should end.
async fn handle_command(
    command: &str,
    client: &ApiClient,
    registry: &mut AssistantRegistry,
    store: &mut ChatStore,
) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or("");
    let arg = parts.next();

    match verb {
        "quit" | "exit" => return Ok(false),
        "help" => {
            println!("/list          show assistants");
            println!("/use <id>      switch assistant");
            println!("/clear         drop the current assistant's log");
            println!("/delete <id>   delete an assistant");
            println!("/quit          leave");
        }
        "list" => print_list(registry),
        "use" => match arg.and_then(|a| a.parse::<i64>().ok()) {
            Some(id) => match registry.select(Some(id)) {
                Ok(()) => {
                    if let Some(a) = registry.selected() {
                        println!("Chatting with '{}'.", a.name);
                    }
                }
                Err(e) => println!("{}", e),
            },
            None => println!("Usage: /use <id>"),
        },
        "clear" => match registry.selected_id() {
            Some(id) => {
                store.clear(id);
                println!("Cleared.");
            }
            None => println!("No assistant selected."),
        },
        "delete" => match arg.and_then(|a| a.parse::<i64>().ok()) {
            Some(id) => match registry.delete(client, id).await {
                Ok(()) => {
                    // Messages die with their assistant.
                    store.clear(id);
                    println!("deleted assistant: {}", id);
                }
                Err(e) => println!("{}", e),
            },
            None => println!("Usage: /delete <id>"),
        },
        other => println!("Unknown command: /{} (try /help)", other),
    }

    Ok(true)
}

fn prompt(registry: &AssistantRegistry) {
    let name = registry
        .selected()
        .map(|a| a.name.as_str())
        .unwrap_or("-");
    print!("[{}]> ", name);
    let _ = std::io::stdout().flush();
}

fn print_list(registry: &AssistantRegistry) {
    for a in registry.assistants() {
        let marker = if registry.selected_id() == Some(a.id) {
            "*"
        } else {
            " "
        };
        println!("{} [{}] {} ({})", marker, a.id, a.name, a.file_name);
    }
}

fn print_reply(reply: &Message) {
    println!("{}", reply.content);
    if let Some(sources) = &reply.sources {
        let pages: Vec<String> = sources.iter().map(|p| p.to_string()).collect();
        println!("  sources: pages {}", pages.join(", "));
    }
}
