use tokio::io::{AsyncRead, AsyncReadExt};

use crate::Error;

/// Parsed SMTP reply: the 3-digit code plus one text line per reply line.
#[derive(Clone, Debug)]
pub struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    /// 2xx and 3xx replies are positive: 3xx covers the intermediate
    /// replies this client depends on (334 after AUTH LOGIN, 354 after
    /// DATA).
    pub fn is_positive(&self) -> bool {
        (200..400).contains(&self.code)
    }

    pub fn message(&self) -> String {
        self.lines.join(" ")
    }
}

/// Read one complete reply, following `250-...` continuation lines until
/// the final `250 ...` line.
pub async fn read<S>(stream: &mut S, buf: &mut Vec<u8>) -> Result<Reply, Error>
where
    S: AsyncRead + Unpin,
{
    let mut lines = Vec::new();

    loop {
        let line = read_line(stream, buf).await?;

        if line.len() < 3 {
            return Err(Error::Transport(format!("malformed SMTP reply: {:?}", line)));
        }

        let code: u16 = line
            .get(..3)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::Transport(format!("malformed SMTP reply: {:?}", line)))?;
        let continuation = line.as_bytes().get(3) == Some(&b'-');
        let text = line.get(4..).unwrap_or("").trim().to_string();
        lines.push(text);

        if !continuation {
            return Ok(Reply { code, lines });
        }
    }
}

/// Read a single CRLF-terminated line (CRLF stripped).
async fn read_line<S>(stream: &mut S, buf: &mut Vec<u8>) -> Result<String, Error>
where
    S: AsyncRead + Unpin,
{
    buf.clear();

    loop {
        let mut byte = [0u8; 1];
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(Error::Transport(
                "connection closed by SMTP server".to_string(),
            ));
        }

        buf.push(byte[0]);
        if buf.ends_with(b"\r\n") {
            let line = String::from_utf8_lossy(&buf[..buf.len() - 2]).to_string();
            return Ok(line);
        }
    }
}
