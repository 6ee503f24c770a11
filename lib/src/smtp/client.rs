use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::reply::{self, Reply};
use crate::email::{self, OutboundMessage};
use crate::Error;

// Deadline for each protocol round trip, in line with the coarse
// client-side timeouts the portal UI applies around the whole workflow.
pub(crate) const ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(30);

// Name we introduce ourselves with in EHLO.
const CLIENT_NAME: &str = "snagmail";

/// Line-oriented SMTP client over an implicit-TLS connection.
///
/// Generic over the stream so the protocol sequence can be exercised
/// against an in-memory peer. One connection per send; the stream is
/// consumed by [`SmtpClient::send`] and dropped on every exit path.
pub struct SmtpClient<S> {
    stream: S,
    read_buf: Vec<u8>,
}

impl SmtpClient<tokio_native_tls::TlsStream<TcpStream>> {
    /// Open a TLS connection to the mail submission server (implicit TLS,
    /// not STARTTLS).
    pub async fn connect(host: &str, port: u16) -> Result<Self, Error> {
        let connector = tokio_native_tls::TlsConnector::from(native_tls::TlsConnector::new()?);

        let tcp = timeout(ROUND_TRIP_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::Transport(format!("timed out connecting to {}:{}", host, port)))??;

        let stream = timeout(ROUND_TRIP_TIMEOUT, connector.connect(host, tcp))
            .await
            .map_err(|_| Error::Transport(format!("TLS handshake with {} timed out", host)))??;

        Ok(Self::new(stream))
    }
}

impl<S> SmtpClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: Vec::with_capacity(512),
        }
    }

    /// Run the full submission sequence for a single message:
    /// greeting, EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA, body, QUIT.
    ///
    /// No pipelining: one round trip per step, each with its own deadline.
    pub async fn send(
        mut self,
        username: &str,
        password: &str,
        message: &OutboundMessage,
    ) -> Result<(), Error> {
        let greeting = self.read_reply().await?;
        if !greeting.is_positive() {
            return Err(rejected(&greeting));
        }

        let ehlo = self.command(&format!("EHLO {}", CLIENT_NAME)).await?;
        if !ehlo.is_positive() {
            return Err(rejected(&ehlo));
        }

        let auth = self.command("AUTH LOGIN").await?;
        if !auth.is_positive() {
            return Err(Error::AuthRejected(auth.message()));
        }

        let user = self.command(&BASE64.encode(username)).await?;
        if !user.is_positive() {
            return Err(Error::AuthRejected(user.message()));
        }

        let pass = self.command(&BASE64.encode(password)).await?;
        if !pass.is_positive() {
            return Err(Error::AuthRejected(pass.message()));
        }

        let mail = self.command(&format!("MAIL FROM:<{}>", message.from)).await?;
        if !mail.is_positive() {
            return Err(rejected(&mail));
        }

        let rcpt = self.command(&format!("RCPT TO:<{}>", message.to)).await?;
        if !rcpt.is_positive() {
            return Err(Error::RecipientRejected(rcpt.message()));
        }

        let data = self.command("DATA").await?;
        if !data.is_positive() {
            return Err(rejected(&data));
        }

        // Full message, then the lone-dot terminator line.
        let rendered = message.render(&email::new_boundary());
        self.write(dot_stuff(&rendered).as_bytes()).await?;
        self.write(b".\r\n").await?;

        let accepted = self.read_reply().await?;
        if !accepted.is_positive() {
            return Err(rejected(&accepted));
        }

        log::info!("message to {} accepted: {}", message.to, accepted.message());

        // Best effort; the message is already accepted.
        if let Err(e) = self.command("QUIT").await {
            log::debug!("QUIT after acceptance failed: {}", e);
        }

        Ok(())
    }

    /// Write one command line and read the server's reply.
    async fn command(&mut self, line: &str) -> Result<Reply, Error> {
        self.write(line.as_bytes()).await?;
        self.write(b"\r\n").await?;
        self.read_reply().await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        timeout(ROUND_TRIP_TIMEOUT, async {
            self.stream.write_all(bytes).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| Error::Transport("timed out writing to SMTP server".to_string()))??;

        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply, Error> {
        timeout(
            ROUND_TRIP_TIMEOUT,
            reply::read(&mut self.stream, &mut self.read_buf),
        )
        .await
        .map_err(|_| Error::Transport("timed out waiting for SMTP reply".to_string()))?
    }
}

/// RFC 5321 transparency: a body line starting with `.` gets an extra
/// leading dot so it cannot terminate DATA early.
fn dot_stuff(body: &str) -> String {
    let stuffed = body.replace("\r\n.", "\r\n..");
    match stuffed.strip_prefix('.') {
        Some(rest) => format!("..{}", rest),
        None => stuffed,
    }
}

fn rejected(reply: &Reply) -> Error {
    Error::Rejected {
        code: reply.code,
        message: reply.message(),
    }
}
