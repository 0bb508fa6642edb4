//! Courier - a terminal client for SellUp messaging
//!
//! A thin adapter over the messaging core: it owns the real timer and the
//! terminal, and drives a `MessagingSession` the same way the graphical
//! screens do.

use log::error;

mod commands;

const USAGE: &str = "\
Usage: courier <command>

Commands:
  login <token>          store the API token
  logout                 clear the stored token
  conversations          list conversations, newest first
  watch <peer-id>        follow a thread live; typed lines are sent,
                         /quit leaves
  send <peer-id> <text>  send a single message";

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

    let result = match arg_refs.as_slice() {
        ["login", token] => commands::login(token),
        ["logout"] => commands::logout(),
        ["conversations"] => commands::conversations(),
        ["watch", peer] => commands::watch(peer),
        ["send", peer, text @ ..] if !text.is_empty() => commands::send(peer, &text.join(" ")),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
