//! Hub connection task.
//!
//! Connects, runs the handshake and forwards every received line to the app
//! as an `Action`. After any disconnect it waits `retry_delay` and tries
//! again, until cancelled.

use std::time::Duration;

use anyhow::{Context, Result};
use jtail_protocol::line::format_auth_line;
use jtail_protocol::{HandshakeReply, MAX_LINE_LENGTH};
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::action::Action;
use crate::client::Credential;

/// Pause between reconnect attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How one session ended
enum SessionEnd {
    Cancelled,
    Closed,
    Rejected(String),
}

/// Line-protocol client with reconnect
pub struct Connection {
    addr: String,
    credential: Option<Credential>,
    retry_delay: Duration,
    record: Option<File>,
    tx: UnboundedSender<Action>,
}

impl Connection {
    pub fn new(
        addr: impl Into<String>,
        credential: Option<Credential>,
        tx: UnboundedSender<Action>,
    ) -> Self {
        Self {
            addr: addr.into(),
            credential,
            retry_delay: DEFAULT_RETRY_DELAY,
            record: None,
            tx,
        }
    }

    /// Append every received line to `file`
    pub fn with_record(mut self, file: File) -> Self {
        self.record = Some(file);
        self
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Connect and reconnect until `cancel` fires or the app goes away
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let action = match self.session(&cancel).await {
                Ok(SessionEnd::Cancelled) => break,
                Ok(SessionEnd::Closed) => Action::Disconnected("connection closed".to_string()),
                Ok(SessionEnd::Rejected(reply)) => Action::AuthFailed(reply),
                Err(e) => Action::Disconnected(format!("{:#}", e)),
            };

            if self.tx.send(action).is_err() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }

    async fn session(&mut self, cancel: &CancellationToken) -> Result<SessionEnd> {
        let stream = tokio::select! {
            _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
            stream = TcpStream::connect(&self.addr) => {
                stream.with_context(|| format!("failed to connect to {}", self.addr))?
            }
        };

        // The write half stays open for the whole session; dropping it
        // would half-close the socket
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);

        if let Some(credential) = &self.credential {
            let token = credential.token()?;
            write
                .write_all(format_auth_line(&token).as_bytes())
                .await
                .context("failed to send AUTH")?;
        }

        // The first line is the handshake reply, with or without a token
        let first = tokio::select! {
            _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
            line = read_line_capped(&mut reader) => line.context("failed to read from hub")?,
        };
        let Some(first) = first else {
            return Ok(SessionEnd::Closed);
        };

        match HandshakeReply::parse(&first) {
            Ok(HandshakeReply::Ok(_)) => self.send(Action::Connected(self.addr.clone()))?,
            Ok(HandshakeReply::Err(_)) => return Ok(SessionEnd::Rejected(first.trim().to_string())),
            Err(_) => {
                // Server without a handshake: the first line is already data
                self.send(Action::Connected(self.addr.clone()))?;
                self.deliver(first).await?;
            }
        }

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
                line = read_line_capped(&mut reader) => line.context("failed to read from hub")?,
            };

            match line {
                Some(line) => self.deliver(line).await?,
                None => return Ok(SessionEnd::Closed),
            }
        }
    }

    async fn deliver(&mut self, line: String) -> Result<()> {
        if let Some(file) = self.record.as_mut() {
            let written = async {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
                file.flush().await
            }
            .await;

            if let Err(e) = written {
                self.record = None;
                self.send(Action::RecordFailed(e.to_string()))?;
            }
        }

        self.send(Action::Line(line))
    }

    fn send(&self, action: Action) -> Result<()> {
        self.tx
            .send(action)
            .map_err(|_| anyhow::anyhow!("TUI closed"))
    }
}

/// Read one line of at most [`MAX_LINE_LENGTH`] bytes.
///
/// Invalid UTF-8 is replaced rather than failing the session, so a corrupt
/// line surfaces as a parse error. The tail of an overlong line is dropped.
/// Returns `None` at EOF.
async fn read_line_capped<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else {
        skip_rest_of_line(reader).await?;
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

async fn skip_rest_of_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
