use std::convert::Infallible;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use warp::reply::Reply;

use snagmail::drive::DriveClient;
use snagmail::email::PdfAttachment;
use snagmail::notify::Defect;
use snagmail::smtp::Mailer;

use super::config;

/// Shared handler state. Either side may be absent: an endpoint whose
/// credentials are not configured fails that operation only.
#[derive(Clone)]
pub struct AppState {
    pub mailer: Option<Mailer>,
    pub drive: Option<Arc<DriveClient>>,
}

#[derive(Debug, Deserialize)]
pub struct SendReportRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
    #[serde(rename = "pdfBase64")]
    pub pdf_base64: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadDriveRequest {
    pub filename: Option<String>,
    #[serde(rename = "pdfBase64")]
    pub pdf_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyDefectRequest {
    pub defect: Defect,
    pub recipients: Vec<String>,
}

fn failure(error: impl std::fmt::Display) -> warp::reply::Json {
    warp::reply::json(&json!({ "success": false, "error": error.to_string() }))
}

/// POST /send-report-email
pub async fn send_report_email(
    req: SendReportRequest,
    state: AppState,
) -> Result<impl Reply, Infallible> {
    let (to, subject, html) = match (req.to, req.subject, req.html) {
        (Some(to), Some(subject), Some(html)) => (to, subject, html),
        _ => return Ok(failure("Missing to, subject, or html")),
    };

    let mailer = match state.mailer {
        Some(ref m) => m,
        None => return Ok(failure("Mail credentials not configured")),
    };

    log::info!(
        "sending report email to {} (pdf: {})",
        to,
        req.pdf_base64.is_some()
    );

    // Attachment only when both pieces arrived together.
    let attachment = match (req.pdf_base64, req.filename) {
        (Some(content), Some(filename)) => {
            match PdfAttachment::from_base64(filename, content) {
                Ok(a) => Some(a),
                Err(e) => return Ok(failure(e)),
            }
        }
        _ => None,
    };

    let message = mailer.message(to, subject, html, attachment);

    match mailer.send(&message).await {
        Ok(()) => Ok(warp::reply::json(&json!({
            "success": true,
            "message": "Email sent successfully",
        }))),
        Err(e) => {
            log::error!("report email failed: {}", e);
            Ok(failure(e))
        }
    }
}

/// POST /upload-drive
pub async fn upload_drive(
    req: UploadDriveRequest,
    state: AppState,
) -> Result<impl Reply, Infallible> {
    let (filename, pdf_base64) = match (req.filename, req.pdf_base64) {
        (Some(f), Some(p)) => (f, p),
        _ => return Ok(failure("Missing filename or pdfBase64")),
    };

    let drive = match state.drive {
        Some(ref d) => d,
        None => return Ok(failure("Drive credentials not configured")),
    };

    match drive.upload_base64(&filename, &pdf_base64).await {
        Ok(result) => Ok(warp::reply::json(&json!({
            "success": true,
            "id": result.id,
            "webViewLink": result.web_view_link.unwrap_or_default(),
        }))),
        Err(e) => {
            log::error!("Drive upload failed: {}", e);
            Ok(failure(e))
        }
    }
}

/// POST /notify-defect
///
/// Delivers the notification to every recipient with bounded
/// concurrency. One recipient's failure never aborts the rest; the
/// reply reports per-recipient counts.
pub async fn notify_defect(
    req: NotifyDefectRequest,
    state: AppState,
) -> Result<impl Reply, Infallible> {
    let mailer = match state.mailer {
        Some(ref m) => m,
        None => return Ok(failure("Mail credentials not configured")),
    };

    if req.recipients.is_empty() {
        return Ok(warp::reply::json(&json!({
            "success": true,
            "message": "No admins to notify",
        })));
    }

    let defect = req.defect;
    log::info!(
        "notifying {} recipients about defect {} (priority {})",
        req.recipients.len(),
        defect.id,
        defect.priority
    );

    let subject = defect.subject();
    let html = defect.html_body();
    let total = req.recipients.len();

    let results: Vec<(String, Result<(), snagmail::Error>)> = stream::iter(req.recipients)
        .map(|to| {
            let mailer = mailer.clone();
            let message = mailer.message(to.clone(), subject.clone(), html.clone(), None);
            async move {
                let result = mailer.send(&message).await;
                (to, result)
            }
        })
        .buffer_unordered(config::NOTIFY_CONCURRENCY)
        .collect()
        .await;

    let mut sent = 0;
    let mut failed = 0;
    for (to, result) in results {
        match result {
            Ok(()) => {
                log::info!("notification sent to {}", to);
                sent += 1;
            }
            Err(e) => {
                log::error!("failed to notify {}: {}", to, e);
                failed += 1;
            }
        }
    }

    Ok(warp::reply::json(&json!({
        "success": true,
        "sent": sent,
        "failed": failed,
        "total": total,
    })))
}
