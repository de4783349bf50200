//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of
//! session and voice changes to subscribed clients.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::controller::Control;
use crate::events::Event;
use crate::navigation::SessionSnapshot;
use crate::voice::VoiceHandle;

use super::protocol::{Notification, Request, Response, MAX_FRAME_LEN};

/// Handles shared by every client connection
#[derive(Clone)]
struct Backend {
    control_tx: mpsc::Sender<Control>,
    voice: VoiceHandle,
    snapshots: watch::Receiver<SessionSnapshot>,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    backend: Backend,
    event_tx: broadcast::Sender<Event>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        control_tx: mpsc::Sender<Control>,
        voice: VoiceHandle,
        snapshots: watch::Receiver<SessionSnapshot>,
        event_tx: broadcast::Sender<Event>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            backend: Backend {
                control_tx,
                voice,
                snapshots,
            },
            event_tx,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let backend = self.backend.clone();
                    let event_tx = self.event_tx.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, backend, event_tx) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        stream: UnixStream,
        backend: Backend,
        event_tx: broadcast::Sender<Event>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();

        // Frames are read on their own task so a half-read frame is never
        // abandoned when a notification wins the select below
        let (frame_tx, mut frame_rx) = mpsc::channel(8);
        let reader_task = tokio::spawn(async move {
            if let Err(e) = Self::read_frames(reader, frame_tx).await {
                warn!(?e, "failed to read client frame");
            }
        });

        let mut subscription: Option<broadcast::Receiver<Event>> = None;

        loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else {
                        break;
                    };
                    let response = match serde_json::from_slice::<Request>(&frame) {
                        Ok(Request::Subscribe) => {
                            subscription = Some(event_tx.subscribe());
                            debug!("client subscribed to notifications");
                            // Current session follows the acknowledgement
                            Self::send_message(&mut writer, &Response::Subscribed).await?;
                            Self::send_latest(&mut writer, &backend).await?;
                            continue;
                        }
                        Ok(request) => {
                            debug!(?request, "received request");
                            Self::process_request(request, &backend).await
                        }
                        Err(e) => {
                            warn!(?e, "failed to parse request");
                            Response::error("bad_request", e.to_string())
                        }
                    };
                    Self::send_message(&mut writer, &response).await?;
                }
                event = Self::next_event(&mut subscription) => match event {
                    Ok(event) => {
                        Self::send_message(&mut writer, &Notification::from(event)).await?;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged, resending current session");
                        Self::send_latest(&mut writer, &backend).await?;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        subscription = None;
                    }
                },
            }
        }

        reader_task.abort();
        Ok(())
    }

    /// Read length-prefixed frames until EOF or an oversized frame
    async fn read_frames(mut reader: OwnedReadHalf, frames: mpsc::Sender<Vec<u8>>) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_FRAME_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            reader.read_exact(&mut msg_buf).await?;

            if frames.send(msg_buf).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Next event for a subscribed client; never resolves when unsubscribed
    async fn next_event(
        subscription: &mut Option<broadcast::Receiver<Event>>,
    ) -> Result<Event, broadcast::error::RecvError> {
        match subscription {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Push the current session snapshot as a notification
    async fn send_latest<W: AsyncWrite + Unpin>(writer: &mut W, backend: &Backend) -> Result<()> {
        let snapshot = Self::current(backend);
        Self::send_message(writer, &Notification::SnapshotChanged { snapshot }).await
    }

    /// Latest published session snapshot
    fn current(backend: &Backend) -> SessionSnapshot {
        backend.snapshots.borrow().clone()
    }

    /// Send a length-prefixed JSON message
    async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        T: serde::Serialize,
    {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(request: Request, backend: &Backend) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetSnapshot => Response::Snapshot {
                snapshot: Self::current(backend),
            },

            Request::ListDestinations => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if backend.control_tx.send(Control::Destinations(reply_tx)).await.is_err() {
                    return Self::unavailable();
                }
                match reply_rx.await {
                    Ok(labels) => Response::Destinations { labels },
                    Err(_) => Self::unavailable(),
                }
            }

            // Scans and destination changes answer with the resulting snapshot;
            // the controller handles messages in order
            Request::Scan { value } => {
                if backend.control_tx.send(Control::Scan(value)).await.is_err() {
                    return Self::unavailable();
                }
                Self::snapshot(backend).await
            }

            Request::SetDestination { label } => {
                info!(%label, "destination change via IPC");
                if backend.control_tx.send(Control::SetDestination(label)).await.is_err() {
                    return Self::unavailable();
                }
                Self::snapshot(backend).await
            }

            Request::SetMuted { muted } => {
                backend.voice.set_muted(muted).await;
                Response::Ack
            }

            Request::Unlock => {
                if backend.control_tx.send(Control::Gesture).await.is_err() {
                    return Self::unavailable();
                }
                Response::Ack
            }

            Request::Speak { cue } => {
                backend.voice.request(cue).await;
                Response::Ack
            }

            Request::GetVoiceStatus => match backend.voice.status().await {
                Some(status) => Response::VoiceStatus { status },
                None => Self::unavailable(),
            },

            Request::Subscribe => Response::Subscribed,
        }
    }

    async fn snapshot(backend: &Backend) -> Response {
        let (reply_tx, reply_rx) = oneshot::channel();
        if backend.control_tx.send(Control::Snapshot(reply_tx)).await.is_err() {
            return Self::unavailable();
        }
        match reply_rx.await {
            Ok(snapshot) => Response::Snapshot { snapshot },
            Err(_) => Self::unavailable(),
        }
    }

    fn unavailable() -> Response {
        Response::error("unavailable", "session controller is not running")
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
