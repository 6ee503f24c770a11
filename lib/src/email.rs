//! Outbound message and MIME construction.
//!
//! The message renders to the exact byte sequence written after the SMTP
//! `DATA` command: CRLF line endings, multipart/mixed with a random
//! boundary, HTML part first, optional base64 PDF attachment part second.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use uuid::Uuid;

use crate::Error;

/// A PDF attachment whose content is base64-encoded exactly once, at
/// construction. The encoded form is what gets logged, sized, and sent;
/// it is never re-encoded.
#[derive(Clone, Debug)]
pub struct PdfAttachment {
    pub filename: String,
    content: String,
}

impl PdfAttachment {
    pub fn from_bytes(filename: impl Into<String>, data: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content: BASE64.encode(data),
        }
    }

    /// Accepts an already-encoded payload (as received on the wire) after
    /// validating that it actually decodes.
    pub fn from_base64(filename: impl Into<String>, content: impl Into<String>) -> Result<Self, Error> {
        let content = content.into();
        BASE64.decode(content.as_bytes())?;

        Ok(Self {
            filename: filename.into(),
            content,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment: Option<PdfAttachment>,
}

impl OutboundMessage {
    /// Render the full message (headers + MIME body) with the given
    /// boundary token. The terminating `.` line is the SMTP client's
    /// responsibility, not part of the message.
    pub fn render(&self, boundary: &str) -> String {
        let mut msg = String::new();

        msg.push_str(&format!("From: {}\r\n", self.from));
        msg.push_str(&format!("To: {}\r\n", self.to));
        msg.push_str(&format!("Subject: {}\r\n", self.subject));
        msg.push_str("MIME-Version: 1.0\r\n");
        msg.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        ));

        msg.push_str(&format!("--{}\r\n", boundary));
        msg.push_str("Content-Type: text/html; charset=UTF-8\r\n\r\n");
        msg.push_str(&self.html);
        msg.push_str("\r\n");

        if let Some(ref attachment) = self.attachment {
            msg.push_str(&format!("--{}\r\n", boundary));
            msg.push_str(&format!(
                "Content-Type: application/pdf; name=\"{}\"\r\n",
                attachment.filename
            ));
            msg.push_str("Content-Transfer-Encoding: base64\r\n");
            msg.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                attachment.filename
            ));
            // Pre-encoded payload, verbatim. No 76-column wrapping; modern
            // submission servers accept long base64 lines.
            msg.push_str(&attachment.content);
            msg.push_str("\r\n");
        }

        msg.push_str(&format!("--{}--\r\n", boundary));
        msg
    }
}

/// Random boundary token. Random hex rather than a timestamp, so rapid
/// concurrent sends cannot collide.
pub fn new_boundary() -> String {
    format!("----=_Part_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(attachment: Option<PdfAttachment>) -> OutboundMessage {
        OutboundMessage {
            from: "portal@example.com".to_string(),
            to: "ops@example.com".to_string(),
            subject: "Test".to_string(),
            html: "<p>hi</p>".to_string(),
            attachment,
        }
    }

    #[test]
    fn single_part_without_attachment() {
        let rendered = message(None).render("bnd");

        assert_eq!(rendered.matches("--bnd\r\n").count(), 1);
        assert!(rendered.ends_with("--bnd--\r\n"));
        assert!(rendered.contains("Content-Type: text/html; charset=UTF-8\r\n"));
        assert!(!rendered.contains("Content-Disposition"));
    }

    #[test]
    fn two_parts_with_attachment() {
        let attachment = PdfAttachment::from_bytes("report.pdf", b"%PDF-1.4 test");
        let rendered = message(Some(attachment)).render("bnd");

        assert_eq!(rendered.matches("--bnd\r\n").count(), 2);
        assert!(rendered.ends_with("--bnd--\r\n"));
        assert!(rendered.contains("Content-Type: application/pdf; name=\"report.pdf\"\r\n"));
        assert!(rendered.contains("Content-Transfer-Encoding: base64\r\n"));
        assert!(rendered.contains("Content-Disposition: attachment; filename=\"report.pdf\"\r\n"));
    }

    #[test]
    fn attachment_payload_is_not_reencoded() {
        let attachment = PdfAttachment::from_base64("report.pdf", "JVBERi0xLjQ=").unwrap();
        let rendered = message(Some(attachment)).render("bnd");

        assert!(rendered.contains("\r\n\r\nJVBERi0xLjQ=\r\n"));
    }

    #[test]
    fn invalid_base64_attachment_is_rejected() {
        let err = PdfAttachment::from_base64("report.pdf", "not base64!!").unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn empty_html_body_still_renders_valid_single_part() {
        let mut msg = message(None);
        msg.html = String::new();
        let rendered = msg.render("bnd");

        assert!(rendered.contains("Content-Type: text/html; charset=UTF-8\r\n\r\n\r\n"));
        assert!(rendered.ends_with("--bnd--\r\n"));
        // Every line is CRLF-terminated.
        assert!(!rendered.replace("\r\n", "").contains('\r'));
    }

    #[test]
    fn boundary_tokens_are_unique() {
        let a = new_boundary();
        let b = new_boundary();
        assert_ne!(a, b);
        assert!(a.starts_with("----=_Part_"));
    }
}
