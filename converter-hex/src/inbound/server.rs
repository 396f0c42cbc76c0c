//! IPC server: Unix domain socket, newline-delimited JSON.
//!
//! Each accepted connection gets its own task. Within a connection requests
//! are answered strictly in order, one reply line per request line.

use std::future::Future;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, instrument, warn};

use converter_types::{IpcEndpoint, ServiceError};

use super::handlers::{IpcReply, handle_line};
use crate::ConverterService;

/// Longest request line accepted, in bytes (newline excluded).
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// IPC server for the converter protocol.
pub struct IpcServer {
    service: Arc<ConverterService>,
    listener: UnixListener,
    path: PathBuf,
}

impl IpcServer {
    /// Binds the socket for `endpoint`.
    ///
    /// A leftover socket file from a previous run is removed first. If another
    /// process is still accepting on it, or the path is not a socket at all,
    /// binding fails and nothing is removed.
    pub fn bind(service: ConverterService, endpoint: &IpcEndpoint) -> anyhow::Result<Self> {
        let path = endpoint.path().to_path_buf();

        match std::fs::symlink_metadata(&path) {
            Ok(meta) => {
                if !meta.file_type().is_socket() {
                    anyhow::bail!("{endpoint} exists and is not a socket");
                }
                if std::os::unix::net::UnixStream::connect(&path).is_ok() {
                    anyhow::bail!("{endpoint} is already in use by another process");
                }
                debug!(path = %path.display(), "Removing stale socket");
                std::fs::remove_file(&path)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(&path)?;
        info!("Server listening on {}", endpoint);

        Ok(Self {
            service: Arc::new(service),
            listener,
            path,
        })
    }

    /// Socket path the server is bound to.
    pub fn local_path(&self) -> &Path {
        &self.path
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs until `shutdown` completes, then removes the socket file.
    ///
    /// Connections already in progress keep running on their own tasks.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let service = self.service.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(service, stream).await {
                                warn!(error = %e, "Connection closed with error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
            }
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(error = %e, path = %self.path.display(), "Failed to remove socket file");
        }
        info!("Server stopped");
        Ok(())
    }
}

/// One frame read from a connection.
enum Frame {
    Line(String),
    TooLong,
    Eof,
}

/// Reads up to the next newline, refusing to buffer more than
/// [`MAX_REQUEST_BYTES`]. An oversized line is consumed and discarded.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_REQUEST_BYTES as u64 + 1;

    buf.clear();
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }

    if buf.last() != Some(&b'\n') && buf.len() > MAX_REQUEST_BYTES {
        loop {
            buf.clear();
            let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            if n == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(Frame::TooLong);
    }

    Ok(Frame::Line(String::from_utf8_lossy(buf).into_owned()))
}

#[instrument(skip_all)]
async fn serve_connection(service: Arc<ConverterService>, stream: UnixStream) -> io::Result<()> {
    debug!("Client connected");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        let reply = match read_frame(&mut reader, &mut buf).await? {
            Frame::Eof => break,
            Frame::TooLong => IpcReply(Err(ServiceError::Malformed(format!(
                "request exceeds {MAX_REQUEST_BYTES} bytes"
            )))),
            Frame::Line(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                handle_line(&service, line)
            }
        };

        let mut out = reply.to_json();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
    }

    debug!("Client disconnected");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
