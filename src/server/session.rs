//! Per-connection chat session and its protocol state machine.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::{
    parse_input, prompt_for, ChatCommand, ChatEvent, ChatInput, Registry, RegistryError,
    SessionHandle, RENAME_USAGE,
};

/// Welcome banner sent on connect, before the name prompt.
pub const WELCOME_BANNER: &str = r#"Welcome to TCP-Chat!
         _nnnn_
        dGGGGMMb
       @p~qp~~qMb
       M|@||@) M|
       @,----.JM|
      JS^\__/  qKL
     dZP        qKRb
    dZP          qKKb
   fZP            SMMb
   HZM            MMMM
   FqM            MMMM
 __| ".        |\dS"qML
 |    '.       | ' \Zq
_)      \.___.,|     .'
\____   )MMMMMP|   .'
	 '-'       '--'
"#;

/// Prompt asking the client for its display name.
pub const NAME_PROMPT: &str = "[ENTER YOUR NAME]:";

/// Reply when the requested name is held by another session.
pub const NAME_TAKEN: &str = "[USER EXISTS]";

/// Reply when a rename collides with a registered name.
pub const RENAME_CONFLICT: &str = "\nName is already taken";

/// Rejection notice for connections arriving at capacity.
pub const CHAT_FULL: &str = "Sorry, chat is filled";

/// Session state representing the current phase of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Transport open, nothing sent yet.
    #[default]
    Connecting,
    /// Awaiting a valid, unique display name.
    Naming,
    /// Name held, exchanging messages.
    Active,
    /// Terminal; transport released, name removed from the registry.
    Closed,
}

/// A connected client for the lifetime of its connection.
///
/// The session task owns the read half of the stream; the write half is
/// shared with the registry so broadcasts from other sessions can reach
/// this client.
pub struct ChatSession {
    id: Uuid,
    peer_addr: SocketAddr,
    reader: BufReader<OwnedReadHalf>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    registry: Arc<Registry>,
    state: SessionState,
    name: Option<String>,
}

impl ChatSession {
    /// Create a new session from an accepted TCP stream.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, registry: Arc<Registry>) -> Self {
        let id = Uuid::new_v4();
        debug!("Created session {} for {}", id, peer_addr);

        let (read_half, write_half) = stream.into_split();
        Self {
            id,
            peer_addr,
            reader: BufReader::new(read_half),
            writer: Arc::new(Mutex::new(write_half)),
            registry,
            state: SessionState::Connecting,
            name: None,
        }
    }

    /// The session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The remote peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The display name, once negotiation has completed.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Drive the session to completion.
    ///
    /// All transport errors end here: a failed read or write is a normal
    /// disconnect and never propagates to other sessions.
    pub async fn run(mut self) {
        if let Err(e) = self.drive().await {
            debug!("Session {} transport closed: {}", self.id, e);
        }
        self.close().await;
    }

    async fn drive(&mut self) -> std::io::Result<()> {
        self.state = SessionState::Naming;
        self.send(WELCOME_BANNER).await?;
        self.send(NAME_PROMPT).await?;

        if !self.negotiate_name().await? {
            return Ok(());
        }
        self.state = SessionState::Active;

        while let Some(line) = self.read_line().await? {
            self.handle_line(&line).await?;
        }
        Ok(())
    }

    /// Name negotiation loop.
    ///
    /// Returns true once a unique name is registered, false if the peer
    /// went away (or the chat filled up) first.
    async fn negotiate_name(&mut self) -> std::io::Result<bool> {
        while let Some(line) = self.read_line().await? {
            let name = line.as_str();
            if name.is_empty() {
                self.send(NAME_PROMPT).await?;
                continue;
            }

            let handle = SessionHandle::new(self.id, Arc::clone(&self.writer));
            match self.registry.register(name, handle).await {
                Ok(history) => {
                    // The registry slot is held from this point on. The name
                    // must be recorded before any write that can fail, so
                    // close() releases the entry even if the peer is already
                    // gone.
                    self.name = Some(name.to_string());

                    // Replay the snapshot and the first prompt in one write.
                    // A broadcast published between registration and this
                    // write can still reach the wire ahead of the replay;
                    // the snapshot itself remains prefix-consistent.
                    let mut replay = String::new();
                    for entry in &history {
                        replay.push_str(entry);
                        replay.push('\n');
                    }
                    replay.push_str(&prompt_for(name));
                    self.send(&replay).await?;

                    info!("Session {} joined as {:?}", self.id, name);
                    self.registry.publish(&ChatEvent::joined(name)).await;
                    return Ok(true);
                }
                Err(RegistryError::NameTaken(_)) => {
                    self.send(NAME_TAKEN).await?;
                    self.send(NAME_PROMPT).await?;
                }
                Err(RegistryError::CapacityFull(_)) => {
                    // The listener rejects at the cap before a session is
                    // created; this covers names racing for the last slot.
                    self.send(CHAT_FULL).await?;
                    self.send("\n").await?;
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }

    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        let Some(name) = self.name.clone() else {
            return Ok(());
        };

        match parse_input(line) {
            ChatInput::Empty => self.send(&prompt_for(&name)).await,
            ChatInput::Message(body) => {
                self.registry.publish(&ChatEvent::message(&name, body)).await;
                self.send(&prompt_for(&name)).await
            }
            ChatInput::Command(ChatCommand::Rename(new_name)) => {
                match self.registry.rename(&name, &new_name).await {
                    Ok(()) => {
                        info!(
                            "Session {} renamed {:?} -> {:?}",
                            self.id, name, new_name
                        );
                        self.registry
                            .publish(&ChatEvent::renamed(&name, &new_name))
                            .await;
                        self.name = Some(new_name.clone());
                        self.send(&prompt_for(&new_name)).await
                    }
                    Err(_) => self.send(RENAME_CONFLICT).await,
                }
            }
            ChatInput::Command(ChatCommand::Malformed) => {
                self.send(&format!("\n{}\n{}", RENAME_USAGE, prompt_for(&name)))
                    .await
            }
        }
    }

    /// Departure: broadcast the leave notice to the remaining sessions,
    /// then give up the registry slot.
    async fn close(&mut self) {
        self.state = SessionState::Closed;
        if let Some(name) = self.name.take() {
            self.registry.publish(&ChatEvent::left(&name)).await;
            self.registry.remove(&name).await;
            info!("Session {} ({:?}) disconnected", self.id, name);
        } else {
            debug!("Session {} disconnected before naming", self.id);
        }
    }

    /// Read the next line, with the trailing line ending stripped.
    ///
    /// Returns None on EOF.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    async fn send(&self, text: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn create_test_session(registry: Arc<Registry>) -> (ChatSession, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer_addr) = listener.accept().await.unwrap();

        (ChatSession::new(stream, peer_addr, registry), client)
    }

    /// Read from `client` until `needle` appears, consuming through the end
    /// of the needle. `pending` carries bytes read past the needle over to
    /// the next call, so two needles arriving in one TCP segment are both
    /// observed.
    async fn read_until(client: &mut TcpStream, pending: &mut String, needle: &str) -> String {
        let mut buf = vec![0u8; 4096];
        loop {
            if let Some(pos) = pending.find(needle) {
                let rest = pending.split_off(pos + needle.len());
                return std::mem::replace(pending, rest);
            }
            let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
                .await
                .expect("read timed out")
                .unwrap();
            assert!(n > 0, "stream closed while waiting for {needle:?}");
            pending.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    }

    #[tokio::test]
    async fn test_session_initial_state() {
        let registry = Arc::new(Registry::new(10));
        let (session, _client) = create_test_session(registry).await;

        assert_eq!(session.state(), SessionState::Connecting);
        assert!(session.name().is_none());
    }

    #[tokio::test]
    async fn test_banner_text() {
        assert!(WELCOME_BANNER.starts_with("Welcome to TCP-Chat!\n"));
        assert!(WELCOME_BANNER.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_session_name_negotiation_and_chat() {
        let registry = Arc::new(Registry::new(10));
        let (session, mut client) = create_test_session(Arc::clone(&registry)).await;
        tokio::spawn(session.run());
        let mut pending = String::new();

        // Banner then name prompt.
        let greeting = read_until(&mut client, &mut pending, NAME_PROMPT).await;
        assert!(greeting.starts_with("Welcome to TCP-Chat!"));

        // Empty input re-prompts without registering.
        client.write_all(b"\n").await.unwrap();
        read_until(&mut client, &mut pending, NAME_PROMPT).await;
        assert_eq!(registry.count().await, 0);

        // A name registers and yields the chat prompt.
        client.write_all(b"Alice\n").await.unwrap();
        let prompt = read_until(&mut client, &mut pending, "[Alice]:").await;
        assert!(!prompt.contains(NAME_TAKEN));
        assert_eq!(registry.count().await, 1);

        // A message appends to history and re-prompts the sender.
        client.write_all(b"hi all\n").await.unwrap();
        read_until(&mut client, &mut pending, "[Alice]:").await;
        let history = registry.history().await;
        assert!(history.iter().any(|line| line.ends_with("[Alice]:hi all")));
    }

    #[tokio::test]
    async fn test_session_removed_on_disconnect() {
        let registry = Arc::new(Registry::new(10));
        let (session, mut client) = create_test_session(Arc::clone(&registry)).await;
        let task = tokio::spawn(session.run());
        let mut pending = String::new();

        read_until(&mut client, &mut pending, NAME_PROMPT).await;
        client.write_all(b"Alice\n").await.unwrap();
        read_until(&mut client, &mut pending, "[Alice]:").await;

        drop(client);
        task.await.unwrap();

        assert_eq!(registry.count().await, 0);
        let history = registry.history().await;
        assert!(history.contains(&"Alice has left our chat...".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_rename_gets_usage() {
        let registry = Arc::new(Registry::new(10));
        let (session, mut client) = create_test_session(Arc::clone(&registry)).await;
        tokio::spawn(session.run());
        let mut pending = String::new();

        read_until(&mut client, &mut pending, NAME_PROMPT).await;
        client.write_all(b"Alice\n").await.unwrap();
        read_until(&mut client, &mut pending, "[Alice]:").await;

        client.write_all(b"\\change_name Bob Smith\n").await.unwrap();
        let reply = read_until(&mut client, &mut pending, RENAME_USAGE).await;
        // Followed by a fresh prompt; nothing was broadcast or recorded.
        read_until(&mut client, &mut pending, "[Alice]:").await;
        assert!(!reply.contains("changed name"));
        assert!(registry.history().await.iter().all(|l| !l.contains("changed name")));
    }
}
