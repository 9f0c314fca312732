use std::{net::SocketAddr, time::Duration};

use anyhow::Result;
use line_chat::{serve, Config};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const PROMPT: &str = "[info] Enter your Username:";

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let config = Config::default();
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            let _ = serve(listener, &config, shutdown).await;
        });

        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        assert_eq!(client.recv().await?, PROMPT);
        Ok(client)
    }

    /// Connect and pick a username
    async fn join(addr: SocketAddr, username: &str) -> Result<Self> {
        let mut client = Self::connect(addr).await?;
        client.send(username).await?;
        assert_eq!(client.recv().await?, format!("[info] Ohai, {username}"));
        Ok(client)
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(format!("{line}\n").as_bytes()).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        timeout(Duration::from_secs(1), self.lines.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("connection closed"))
    }

    /// Next line, or None once the server closed the connection
    async fn recv_or_eof(&mut self) -> Result<Option<String>> {
        Ok(timeout(Duration::from_secs(1), self.lines.next_line()).await??)
    }

    /// Assert nothing arrives within a short window
    async fn expect_silence(&mut self) {
        let result = timeout(Duration::from_millis(100), self.lines.next_line()).await;
        assert!(result.is_err(), "unexpected line: {result:?}");
    }
}

/// Ask for status until the room has `expected` people
async fn wait_for_count(client: &mut TestClient, expected: usize) -> Result<()> {
    let suffix = format!(" and there are {expected} people in the room");
    for _ in 0..20 {
        client.send("status").await?;
        if client.recv().await?.ends_with(&suffix) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("room never reached {expected} people")
}

#[tokio::test]
async fn blank_username_is_refused() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::connect(server.addr).await?;

    alice.send("").await?;
    assert_eq!(alice.recv().await?, "Blank usernames are not allowed. Try again.");
    assert_eq!(alice.recv().await?, PROMPT);

    alice.send("  alice  ").await?;
    assert_eq!(alice.recv().await?, "[info] Ohai, alice");

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn join_is_announced_to_peers() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let mut bob = TestClient::join(server.addr, "bob").await?;

    assert_eq!(alice.recv().await?, "bob has joined the room");
    bob.expect_silence().await;

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn broadcast_reaches_everyone() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let mut bob = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");

    alice.send("hello bob").await?;
    assert_eq!(alice.recv().await?, "alice: hello bob");
    assert_eq!(bob.recv().await?, "alice: hello bob");

    // Whitespace-only lines produce nothing
    bob.send("   ").await?;
    alice.expect_silence().await;
    bob.expect_silence().await;

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn direct_message_is_private() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let mut bob = TestClient::join(server.addr, "bob").await?;
    let mut carol = TestClient::join(server.addr, "carol").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");
    assert_eq!(alice.recv().await?, "carol has joined the room");
    assert_eq!(bob.recv().await?, "carol has joined the room");

    alice.send("@bob hey").await?;
    assert_eq!(bob.recv().await?, "[dm] @alice: hey");

    alice.send("@carol: psst").await?;
    assert_eq!(carol.recv().await?, "[dm] @alice: psst");

    alice.expect_silence().await;
    bob.expect_silence().await;

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn direct_message_to_missing_user_lists_room() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let mut bob = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");

    alice.send("@dave: are you there").await?;
    assert_eq!(
        alice.recv().await?,
        "alice is not in the room. Here's who is: alice, bob"
    );
    bob.expect_silence().await;

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn status_reports_room_size() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let _bob = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");

    // Clients still picking a name are not counted
    let _pending = TestClient::connect(server.addr).await?;

    alice.send("STATUS").await?;
    let reply = alice.recv().await?;
    let time = reply
        .strip_prefix("[chat server] It's ")
        .and_then(|rest| rest.strip_suffix(" and there are 2 people in the room"))
        .expect("status line format");
    assert_eq!(time.len(), 5);
    assert_eq!(&time[2..3], ":");

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn exit_closes_connection_and_leaves_room() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let mut bob = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");

    bob.send("ok I'm done, exit").await?;
    assert_eq!(bob.recv_or_eof().await?, None);

    alice.send("status").await?;
    assert!(alice
        .recv()
        .await?
        .ends_with(" and there are 1 people in the room"));

    alice.send("@bob you there?").await?;
    assert_eq!(
        alice.recv().await?,
        "alice is not in the room. Here's who is: alice"
    );

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn hang_up_leaves_room() -> Result<()> {
    let server = TestServer::start().await?;
    let mut alice = TestClient::join(server.addr, "alice").await?;
    let bob = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");

    drop(bob);
    wait_for_count(&mut alice, 1).await?;

    // A name freed by a hang-up can be taken again
    let mut bob_again = TestClient::join(server.addr, "bob").await?;
    assert_eq!(alice.recv().await?, "bob has joined the room");
    alice.send("@bob welcome back").await?;
    assert_eq!(bob_again.recv().await?, "[dm] @alice: welcome back");

    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn crlf_lines_are_accepted() -> Result<()> {
    let server = TestServer::start().await?;
    let stream = TcpStream::connect(server.addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    assert_eq!(lines.next_line().await?.as_deref(), Some(PROMPT));
    writer.write_all(b"alice\r\n").await?;
    assert_eq!(
        lines.next_line().await?.as_deref(),
        Some("[info] Ohai, alice")
    );

    server.stop().await;
    Ok(())
}
