//! Single WebSocket connection with auto-reconnect and ping keep-alive.
//!
//! Each `WsConnection` runs as a tokio task that:
//! 1. Connects to the endpoint (TLS).
//! 2. Sends the handshake messages (auth, subscribe), freshly generated on
//!    every connect because signed auth payloads expire.
//! 3. Reads text frames and forwards them to a callback.
//! 4. Sends periodic pings and recycles the connection when nothing has been
//!    received within the ping timeout after a ping.
//! 5. Reconnects with exponential backoff up to a configured ceiling.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Callback invoked for each received text message.
///
/// Parameters: `(connection_id, message_text)`
pub type OnMessageCallback = Arc<dyn Fn(usize, &str) + Send + Sync>;

/// Produces the messages to send right after each (re)connect.
pub type HandshakeFn = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// Configuration for a single WebSocket connection.
#[derive(Clone)]
pub struct WsConnConfig {
    /// Full WebSocket URL (e.g. `wss://stream.bybit.com/v5/private`).
    pub url: String,
    /// Messages sent immediately after connecting, in order.
    pub handshake: Option<HandshakeFn>,
    pub ping_interval: Duration,
    /// How long after an unanswered ping the connection is considered dead.
    pub ping_timeout: Duration,
    /// Sent as a text frame every `ping_interval` (e.g. Bybit `{"op":"ping"}`).
    pub ping_payload: serde_json::Value,
    /// First reconnect delay; doubles on each consecutive failure.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Connection identifier used in log lines.
    pub id: usize,
}

/// A single WebSocket connection managed by a background tokio task.
pub struct WsConnection {
    config: WsConnConfig,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl WsConnection {
    /// Create a new (not yet started) connection.
    pub fn new(config: WsConnConfig) -> Self {
        Self {
            config,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Start the connection task. Text frames are forwarded to `on_text`.
    pub fn start(&mut self, on_text: OnMessageCallback) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            connection_loop(config, on_text, shutdown_rx).await;
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Stop the connection and wait for the task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Why the read loop ended.
enum Exit {
    Shutdown,
    Reconnect,
}

/// Main connection loop: connects, handshakes, reads, pings, reconnects.
async fn connection_loop(config: WsConnConfig, on_text: OnMessageCallback, mut shutdown_rx: watch::Receiver<bool>) {
    let mut backoff = config.initial_backoff;
    let conn_id = config.id;

    loop {
        if *shutdown_rx.borrow() {
            info!("[ws-{conn_id}] shutdown requested");
            return;
        }

        info!("[ws-{conn_id}] connecting to {}", config.url);

        match run_session(&config, &on_text, &mut shutdown_rx).await {
            Ok(Exit::Shutdown) => return,
            Ok(Exit::Reconnect) => {
                // The session was up, so the next attempt starts from the floor.
                backoff = config.initial_backoff;
                warn!("[ws-{conn_id}] disconnected, reconnecting in {backoff:?}");
            }
            Err(e) => {
                error!("[ws-{conn_id}] session failed: {e}, retrying in {backoff:?}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(backoff) => {},
            _ = shutdown_rx.changed() => return,
        }
        backoff = next_backoff(backoff, config.max_backoff);
    }
}

/// One connected session. `Err` means we never got as far as reading.
async fn run_session(
    config: &WsConnConfig,
    on_text: &OnMessageCallback,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> anyhow::Result<Exit> {
    let conn_id = config.id;
    let ws_stream = connect_ws(config).await?;
    info!("[ws-{conn_id}] connected");

    let (mut ws_write, mut ws_read) = ws_stream.split();

    if let Some(handshake) = &config.handshake {
        for msg in handshake() {
            debug!("[ws-{conn_id}] handshake: {}", redact_auth(&msg));
            ws_write.send(Message::Text(msg.into())).await?;
        }
    }

    let mut ping_tick = tokio::time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    // Set when a ping goes out, cleared by any inbound frame.
    let mut awaiting_since: Option<Instant> = None;

    loop {
        let deadline = awaiting_since.map(|t| t + config.ping_timeout);

        tokio::select! {
            _ = shutdown_rx.changed() => {
                info!("[ws-{conn_id}] shutdown signal received");
                let _ = ws_write.close().await;
                return Ok(Exit::Shutdown);
            }

            msg = ws_read.next() => {
                awaiting_since = None;
                match msg {
                    Some(Ok(Message::Text(text))) => on_text(conn_id, &text),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!("[ws-{conn_id}] received close frame: {frame:?}");
                        return Ok(Exit::Reconnect);
                    }
                    Some(Err(e)) => {
                        error!("[ws-{conn_id}] read error: {e}");
                        return Ok(Exit::Reconnect);
                    }
                    None => {
                        warn!("[ws-{conn_id}] stream ended");
                        return Ok(Exit::Reconnect);
                    }
                    _ => {} // Binary, Pong, Frame
                }
            }

            _ = ping_tick.tick() => {
                let ping_msg = Message::Text(config.ping_payload.to_string().into());
                if let Err(e) = ws_write.send(ping_msg).await {
                    error!("[ws-{conn_id}] ping send error: {e}");
                    return Ok(Exit::Reconnect);
                }
                awaiting_since.get_or_insert_with(Instant::now);
            }

            _ = sleep_until_opt(deadline) => {
                warn!("[ws-{conn_id}] no response within {:?} of ping", config.ping_timeout);
                let _ = ws_write.close().await;
                return Ok(Exit::Reconnect);
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

/// Hide the signature part of auth messages in debug logs.
fn redact_auth(msg: &str) -> &str {
    if msg.contains("\"auth\"") { "{\"op\":\"auth\",...}" } else { msg }
}

/// Establish a WebSocket connection (TLS for `wss://`).
async fn connect_ws(
    config: &WsConnConfig,
) -> anyhow::Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
> {
    let (stream, _response) = tokio_tungstenite::connect_async(config.url.as_str()).await?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;
    use tokio_tungstenite::WebSocketStream;

    use super::*;

    async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(t))) => return t.as_str().to_string(),
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (tcp, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(tcp).await.unwrap()
    }

    #[tokio::test]
    async fn silent_server_is_recycled_with_fresh_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connects = Arc::new(AtomicUsize::new(0));
        let counter = connects.clone();
        let handshake: HandshakeFn = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            vec![format!("auth-{n}"), "subscribe".to_string()]
        });
        let ping_timeout = Duration::from_millis(150);
        let mut conn = WsConnection::new(WsConnConfig {
            url: format!("ws://127.0.0.1:{port}"),
            handshake: Some(handshake),
            ping_interval: Duration::from_millis(50),
            ping_timeout,
            ping_payload: serde_json::json!({"op": "ping"}),
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
            id: 7,
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        conn.start(Arc::new(move |conn_id: usize, text: &str| {
            let _ = tx.send((conn_id, text.to_string()));
        }));

        tokio::time::timeout(Duration::from_secs(5), async {
            let mut first = accept(&listener).await;
            assert_eq!(next_text(&mut first).await, "auth-0");
            assert_eq!(next_text(&mut first).await, "subscribe");
            assert_eq!(next_text(&mut first).await, r#"{"op":"ping"}"#);
            let pinged_at = Instant::now();

            // `first` stays open but never answers
            let mut second = accept(&listener).await;
            assert!(pinged_at.elapsed() >= ping_timeout - Duration::from_millis(60));
            assert_eq!(next_text(&mut second).await, "auth-1");
            assert_eq!(next_text(&mut second).await, "subscribe");

            second.send(Message::Text("hello".into())).await.unwrap();
            assert_eq!(rx.recv().await, Some((7, "hello".to_string())));
            drop(first);
        })
        .await
        .expect("reconnect cycle timed out");

        conn.stop().await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let max = Duration::from_secs(60);
        let mut b = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..8 {
            b = next_backoff(b, max);
            seen.push(b.as_secs());
        }
        assert_eq!(seen, vec![2, 4, 8, 16, 32, 60, 60, 60]);
    }

    #[test]
    fn auth_messages_are_redacted() {
        assert_eq!(redact_auth(r#"{"op":"auth","args":["k","1","sig"]}"#), "{\"op\":\"auth\",...}");
        assert_eq!(redact_auth(r#"{"op":"subscribe"}"#), r#"{"op":"subscribe"}"#);
    }
}
