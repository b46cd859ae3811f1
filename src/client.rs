//! Connection lifecycle: dial, register, run, tear down.
//!
//! [`Client::connect`] performs the blocking part of the lifecycle —
//! TCP (and optionally TLS) setup plus the registration handshake —
//! and returns once the server accepts us with numeric 001. Two tasks
//! then own the connection: the sender drains the outbound queues, the
//! receiver reads lines, dispatches them, and is the only task that
//! ever touches the [`Session`]. Teardown runs in the receiver exactly
//! once, whatever ended the session: remote close, a read or write
//! failure, a KILL aimed at us, or [`Client::disconnect`].
//!
//! [`Session`]: crate::state::Session

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::ctcp::CtcpReplies;
use crate::error::ConnectError;
use crate::events::{Dispatcher, Flow};
use crate::handler::{Context, EventHandler};
use crate::message::Message;
use crate::response::Response;
use crate::state::Session;
use crate::transport::{self, LineCodec, Sender, Shutdown};

/// Everything needed to reach and register with a server.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    /// Server password, sent as PASS before registration.
    pub password: Option<String>,
    pub nickname: String,
    pub username: String,
    pub realname: String,
    /// Pause between paced outbound lines, in milliseconds. Zero
    /// disables pacing.
    pub send_delay_ms: u64,
    pub ctcp: CtcpReplies,
}

impl Config {
    /// A plaintext connection on the standard port, with username and
    /// realname defaulting to the nickname.
    pub fn new(host: impl Into<String>, nickname: impl Into<String>) -> Config {
        let nickname = nickname.into();
        Config {
            host: host.into(),
            port: 6667,
            use_tls: false,
            password: None,
            username: nickname.clone(),
            realname: nickname.clone(),
            nickname,
            send_delay_ms: 1000,
            ctcp: CtcpReplies::default(),
        }
    }
}

enum Transport {
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(s) => Pin::new(s).poll_flush(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

async fn dial(config: &Config) -> Result<Transport, ConnectError> {
    let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
    enable_keepalive(&stream)?;

    if !config.use_tls {
        return Ok(Transport::Tcp(stream));
    }

    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(tls_config));
    let name = ServerName::try_from(config.host.clone())
        .map_err(|e| ConnectError::Tls(e.to_string()))?;
    let stream = connector
        .connect(name, stream)
        .await
        .map_err(|e| ConnectError::Tls(e.to_string()))?;
    Ok(Transport::Tls(Box::new(stream)))
}

fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(60))
        .with_interval(Duration::from_secs(10));
    SockRef::from(stream).set_tcp_keepalive(&keepalive)
}

/// An IRC client connection.
///
/// Reusable: after a disconnect, [`connect`] may be called again.
///
/// [`connect`]: Client::connect
pub struct Client {
    config: Config,
    sender: Option<Sender>,
    shutdown: Option<Shutdown>,
    live: Arc<AtomicBool>,
    receiver_task: Option<JoinHandle<()>>,
    sender_task: Option<JoinHandle<()>>,
}

impl Client {
    pub fn new(config: Config) -> Client {
        Client {
            config,
            sender: None,
            shutdown: None,
            live: Arc::new(AtomicBool::new(false)),
            receiver_task: None,
            sender_task: None,
        }
    }

    /// Whether a registered session is currently live.
    pub fn is_connected(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Handle for sending lines on the live session, if any.
    pub fn sender(&self) -> Option<Sender> {
        if self.is_connected() {
            self.sender.clone()
        } else {
            None
        }
    }

    /// Dial the server, register, and start the session duties.
    ///
    /// Returns once registration completed; traffic is then delivered
    /// to `handler` until the session ends. A nick collision during
    /// registration retries with an underscore appended.
    pub async fn connect<H>(&mut self, handler: H) -> Result<(), ConnectError>
    where
        H: EventHandler + 'static,
    {
        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }

        let transport = dial(&self.config).await?;
        let mut framed = Framed::new(transport, LineCodec);
        let nick = register(&mut framed, &self.config).await?;
        info!("registered as {} on {}:{}", nick, self.config.host, self.config.port);

        let session = Session::new(nick);
        let dispatcher = Dispatcher::new(self.config.ctcp.clone());
        let (sender, queues) = Sender::new();
        let shutdown = Shutdown::new();
        // Subscribe before spawning so no trigger can be missed.
        let shutdown_rx = shutdown.subscribe();
        let (sink, stream) = framed.split();

        self.live.store(true, Ordering::SeqCst);
        self.sender_task = Some(tokio::spawn(transport::run_sender(
            sink,
            queues,
            Duration::from_millis(self.config.send_delay_ms),
            shutdown.clone(),
        )));
        self.receiver_task = Some(tokio::spawn(run_receiver(
            stream,
            session,
            dispatcher,
            sender.clone(),
            shutdown_rx,
            self.live.clone(),
            handler,
        )));
        self.sender = Some(sender);
        self.shutdown = Some(shutdown);
        Ok(())
    }

    /// Announce a QUIT and tear the session down.
    pub fn disconnect(&self, message: Option<&str>) {
        if let Some(sender) = &self.sender {
            sender.quit(message);
        }
        if let Some(shutdown) = &self.shutdown {
            shutdown.trigger();
        }
    }

    /// Wait until the session ends (however that happens).
    pub async fn wait(&mut self) {
        if let Some(task) = self.receiver_task.take() {
            let _ = task.await;
        }
        if let Some(task) = self.sender_task.take() {
            let _ = task.await;
        }
    }
}

/// PASS/NICK/USER handshake; returns the nick the server accepted.
async fn register(
    framed: &mut Framed<Transport, LineCodec>,
    config: &Config,
) -> Result<String, ConnectError> {
    if let Some(password) = &config.password {
        framed.send(format!("PASS {password}")).await?;
    }
    let mut nick = config.nickname.clone();
    framed.send(format!("NICK {nick}")).await?;
    framed
        .send(format!("USER {} 0 * :{}", config.username, config.realname))
        .await?;

    loop {
        let line = match framed.next().await {
            Some(line) => line?,
            None => return Err(ConnectError::RegistrationAborted),
        };
        debug!("<<< {}", line);

        let msg = match Message::parse(&line) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping unparsable line during registration: {}", e);
                continue;
            }
        };
        match msg.command {
            Command::PING(token) => framed.send(format!("PONG :{token}")).await?,
            Command::Response(Response::RPL_WELCOME, _) => return Ok(nick),
            Command::Response(Response::ERR_NICKNAMEINUSE, _) => {
                nick.push('_');
                warn!("nick collision, retrying as {}", nick);
                framed.send(format!("NICK {nick}")).await?;
            }
            Command::ERROR(reason) => {
                warn!("server refused registration: {}", reason);
                return Err(ConnectError::RegistrationAborted);
            }
            _ => {}
        }
    }
}

/// The receiver duty: sole owner of the session state. Runs teardown
/// exactly once on the way out.
async fn run_receiver<H>(
    mut stream: futures_util::stream::SplitStream<Framed<Transport, LineCodec>>,
    mut session: Session,
    dispatcher: Dispatcher,
    sender: Sender,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    live: Arc<AtomicBool>,
    mut handler: H,
) where
    H: EventHandler + 'static,
{
    if let Err(e) = handler.on_connect(&mut Context {
        session: &mut session,
        sender: &sender,
    }) {
        error!("on_connect failed: {:#}", e);
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            item = stream.next() => match item {
                Some(Ok(line)) => {
                    debug!("<<< {}", line);
                    match dispatcher.dispatch(&line, &mut session, &sender, &mut handler) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Disconnect) => break,
                        Err(e) => debug!("dropping unparsable line: {}", e),
                    }
                }
                Some(Err(e)) => {
                    warn!("read failed: {}", e);
                    break;
                }
                None => {
                    info!("server closed the connection");
                    break;
                }
            },
        }
    }

    sender.stop();
    live.store(false, Ordering::SeqCst);
    if let Err(e) = handler.on_disconnect() {
        error!("on_disconnect failed: {:#}", e);
    }
}
