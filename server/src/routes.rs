use std::convert::Infallible;

use warp::{reply::Reply, Filter, Rejection};

use super::config;
use super::controllers::{self, AppState};
use super::errors;

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn index() -> impl Filter<Extract = (&'static str,), Error = Rejection> + Clone {
    warp::path::end().map(|| "Welcome to snagmail!")
}

/// Route for /send-report-email
pub fn send_report_email(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("send-report-email")
        .and(warp::path::end())
        .and(warp::body::content_length_limit(config::MAX_BODY_SIZE))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(controllers::send_report_email)
}

/// Route for /upload-drive
pub fn upload_drive(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("upload-drive")
        .and(warp::path::end())
        .and(warp::body::content_length_limit(config::MAX_BODY_SIZE))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(controllers::upload_drive)
}

/// Route for /notify-defect
pub fn notify_defect(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("notify-defect")
        .and(warp::path::end())
        .and(warp::body::content_length_limit(config::MAX_BODY_SIZE))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(controllers::notify_defect)
}

/// Preflight OPTIONS requests get a bare 200 for any path.
pub fn preflight() -> impl Filter<Extract = (&'static str,), Error = Rejection> + Clone {
    warp::options().map(|| "ok")
}

/// Everything the portal calls, in one router.
pub fn router(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let get = warp::get().and(index());
    let post = warp::post().and(
        send_report_email(state.clone())
            .or(upload_drive(state.clone()))
            .or(notify_defect(state)),
    );

    get.or(post).or(preflight())
}

/// Full service: router, rejection recovery, and the permissive CORS
/// headers the portal expects on every response. The origin is the
/// literal `*`, not an echo of the request's origin.
pub fn service(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    router(state)
        .recover(errors::handle_rejection)
        .with(warp::reply::with::header(
            "access-control-allow-origin",
            "*",
        ))
        .with(warp::reply::with::header(
            "access-control-allow-headers",
            "authorization, x-client-info, apikey, content-type",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_state() -> AppState {
        AppState {
            mailer: None,
            drive: None,
        }
    }

    fn body_json(resp: &warp::http::Response<impl AsRef<[u8]>>) -> serde_json::Value {
        serde_json::from_slice(resp.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn index_banner() {
        let resp = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body(), "Welcome to snagmail!");
    }

    #[tokio::test]
    async fn missing_upload_fields_reply_200_with_error_envelope() {
        let resp = warp::test::request()
            .method("POST")
            .path("/upload-drive")
            .json(&serde_json::json!({ "filename": "report.pdf" }))
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 200);
        let body = body_json(&resp);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing filename or pdfBase64");
    }

    #[tokio::test]
    async fn unconfigured_mail_fails_only_that_operation() {
        let resp = warp::test::request()
            .method("POST")
            .path("/send-report-email")
            .json(&serde_json::json!({
                "to": "ops@example.com",
                "subject": "Test",
                "html": "<p>hi</p>",
            }))
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 200);
        let body = body_json(&resp);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Mail credentials not configured");
    }

    #[tokio::test]
    async fn notify_with_no_recipients_is_a_success_noop() {
        let state = AppState {
            mailer: Some(snagmail::smtp::Mailer::new(snagmail::config::MailConfig {
                host: "smtp.example.com".to_string(),
                port: 465,
                username: "portal@example.com".to_string(),
                app_password: "secret".to_string(),
            })),
            drive: None,
        };

        let resp = warp::test::request()
            .method("POST")
            .path("/notify-defect")
            .json(&serde_json::json!({
                "defect": {
                    "id": "D-1",
                    "title": "t",
                    "description": "d",
                    "asset": "a",
                    "category": "c",
                    "priority": 3,
                    "status": "open",
                    "submitted_by": "s",
                },
                "recipients": [],
            }))
            .reply(&service(state))
            .await;

        assert_eq!(resp.status(), 200);
        let body = body_json(&resp);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "No admins to notify");
    }

    #[tokio::test]
    async fn notify_isolates_failing_recipients_and_reports_counts() {
        // Nothing listens on the discard port; every delivery fails,
        // but each failure is isolated and counted.
        let state = AppState {
            mailer: Some(snagmail::smtp::Mailer::new(snagmail::config::MailConfig {
                host: "127.0.0.1".to_string(),
                port: 9,
                username: "portal@example.com".to_string(),
                app_password: "secret".to_string(),
            })),
            drive: None,
        };

        let resp = warp::test::request()
            .method("POST")
            .path("/notify-defect")
            .json(&serde_json::json!({
                "defect": {
                    "id": "D-2",
                    "title": "t",
                    "description": "d",
                    "asset": "a",
                    "category": "c",
                    "priority": 1,
                    "status": "open",
                    "submitted_by": "s",
                },
                "recipients": ["a@example.com", "b@example.com", "c@example.com"],
            }))
            .reply(&service(state))
            .await;

        assert_eq!(resp.status(), 200);
        let body = body_json(&resp);
        assert_eq!(body["success"], true);
        assert_eq!(body["sent"], 0);
        assert_eq!(body["failed"], 3);
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn preflight_options_returns_200() {
        let resp = warp::test::request()
            .method("OPTIONS")
            .path("/upload-drive")
            .header("origin", "https://portal.example")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body(), "ok");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-headers"],
            "authorization, x-client-info, apikey, content-type"
        );
    }

    #[tokio::test]
    async fn every_response_carries_the_wildcard_origin() {
        let resp = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&service(empty_state()))
            .await;

        // The literal `*`, not an echo of the request's origin.
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let resp = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn wrong_method_on_a_post_route_is_404() {
        let resp = warp::test::request()
            .method("GET")
            .path("/upload-drive")
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn malformed_json_body_is_400() {
        let resp = warp::test::request()
            .method("POST")
            .path("/upload-drive")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&service(empty_state()))
            .await;

        assert_eq!(resp.status(), 400);
    }
}
