//! Command implementations for the courier binary

use anyhow::{Context, Result, bail};
use chrono::Local;
use log::info;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use messaging::{
    ApiClient, ClientConfig, CredentialStore, FileTokenStore, Message, MessagingSession,
    SessionEvent, UserId,
};

/// Build the API client against the configured endpoint
fn make_client() -> Result<(Arc<ApiClient>, Arc<FileTokenStore>)> {
    let config = ClientConfig::load()?;
    let credentials = Arc::new(FileTokenStore::new()?);
    let client = Arc::new(ApiClient::new(
        config.api_url,
        Arc::clone(&credentials) as Arc<dyn CredentialStore>,
    ));
    Ok((client, credentials))
}

fn parse_peer(peer: &str) -> Result<UserId> {
    let id: i64 = peer
        .parse()
        .with_context(|| format!("'{}' is not a numeric peer id", peer))?;
    Ok(UserId::new(id))
}

/// Store the API token obtained from the login flow
pub fn login(token: &str) -> Result<()> {
    let credentials = FileTokenStore::new()?;
    credentials.set(token)?;
    info!("Token stored");
    Ok(())
}

/// Forget the stored token
pub fn logout() -> Result<()> {
    let credentials = FileTokenStore::new()?;
    credentials.clear()?;
    info!("Token cleared");
    Ok(())
}

/// Print the conversation list, newest first
pub fn conversations() -> Result<()> {
    let (client, _) = make_client()?;

    let conversations = client
        .fetch_conversations()
        .map_err(auth_hint)
        .context("Failed to fetch conversations")?;

    if conversations.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    for conv in &conversations {
        let at = conv
            .last_message
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");
        println!(
            "{:>6}  {:<20} {}  {}",
            conv.peer.id,
            conv.peer.username,
            at,
            conv.last_message.content
        );
    }
    Ok(())
}

/// Send a single message and exit
pub fn send(peer: &str, text: &str) -> Result<()> {
    let peer = parse_peer(peer)?;
    let (client, _) = make_client()?;

    let message = client
        .send_message(peer, text)
        .map_err(auth_hint)
        .context("Failed to send message")?;

    println!("Sent #{} to {}", message.id.as_i64(), peer);
    Ok(())
}

/// Follow a thread live: poll at the session's cadence, print arrivals,
/// send typed lines.
pub fn watch(peer: &str) -> Result<()> {
    let peer = parse_peer(peer)?;
    let (client, credentials) = make_client()?;

    // The current user's id attributes message sides in the printout
    let me = client
        .fetch_profile()
        .map_err(auth_hint)
        .context("Failed to fetch profile")?;

    let mut session = MessagingSession::new(
        Arc::clone(&client) as _,
        Arc::clone(&credentials) as Arc<dyn CredentialStore>,
    );

    let events = session.open(Some(peer), Instant::now());
    if events.contains(&SessionEvent::AuthRequired) {
        bail!("Not logged in. Run: courier login <token>");
    }

    println!("Watching thread with peer {} (type to send, /quit to leave)", peer);

    // Terminal input arrives on its own thread; the session itself stays
    // on this one.
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut last_printed: Option<(chrono::DateTime<chrono::Utc>, messaging::MessageId)> = None;

    loop {
        let now = Instant::now();
        for event in session.tick(now) {
            match event {
                SessionEvent::AuthRequired => {
                    bail!("Session expired. Run: courier login <token>");
                }
                SessionEvent::SendFailed(reason) => {
                    eprintln!("!! send failed ({}); your draft is kept", reason);
                }
                // Rendering is the thread printout below; a real screen
                // would also honor the scroll command here
                SessionEvent::ThreadChanged(_)
                | SessionEvent::ConversationsChanged
                | SessionEvent::MessageSent(_) => {}
            }
        }

        print_new_messages(&session, me.id, &mut last_printed);

        if !session.poll().is_running() {
            bail!("Polling stopped. Run: courier login <token>");
        }

        // Sleep until the next cycle, waking early for typed input
        let timeout = session
            .poll()
            .next_due()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_millis(100));

        match rx.recv_timeout(timeout) {
            Ok(line) => {
                if line.trim() == "/quit" {
                    session.close();
                    return Ok(());
                }
                session.set_draft(line);
                let now = Instant::now();
                for event in session.send(now) {
                    match event {
                        SessionEvent::SendFailed(reason) => {
                            eprintln!("!! send failed ({}); your draft is kept", reason)
                        }
                        SessionEvent::AuthRequired => {
                            bail!("Session expired. Run: courier login <token>")
                        }
                        _ => {}
                    }
                }
                print_new_messages(&session, me.id, &mut last_printed);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // stdin closed (piped input ran out); keep watching
                std::thread::sleep(timeout);
            }
        }
    }
}

/// Print messages newer than the last one printed
fn print_new_messages(
    session: &MessagingSession,
    me: UserId,
    last_printed: &mut Option<(chrono::DateTime<chrono::Utc>, messaging::MessageId)>,
) {
    for message in session.store().thread() {
        if last_printed.is_some_and(|last| message.sort_key() <= last) {
            continue;
        }
        print_message(session, me, message);
        *last_printed = Some(message.sort_key());
    }
}

fn print_message(session: &MessagingSession, me: UserId, message: &Message) {
    let who = if message.sender == me {
        "you".to_string()
    } else {
        session
            .store()
            .conversations()
            .iter()
            .find(|c| c.peer.id == message.sender)
            .map(|c| c.peer.username.clone())
            .unwrap_or_else(|| format!("peer {}", message.sender))
    };
    let at = message.created_at.with_timezone(&Local).format("%H:%M");
    println!("[{}] {}: {}", at, who, message.content);
}

/// Attach a login hint to auth failures so the CLI error is actionable
fn auth_hint(e: messaging::ApiError) -> anyhow::Error {
    if e.is_auth_failure() {
        anyhow::anyhow!("{}. Run: courier login <token>", e)
    } else {
        anyhow::anyhow!(e)
    }
}
