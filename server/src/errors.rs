use std::convert::Infallible;

use warp::{http::StatusCode, Rejection, Reply};

/// Handler-level failures never reach here: every endpoint answers
/// HTTP 200 with `{success:false, error}` so the portal UI can render
/// the message. This covers transport-level rejections only.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if err.is_not_found() {
        Ok(warp::reply::with_status(
            "NOT FOUND".to_string(),
            StatusCode::NOT_FOUND,
        ))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        Ok(warp::reply::with_status(
            "PAYLOAD TOO LARGE".to_string(),
            StatusCode::PAYLOAD_TOO_LARGE,
        ))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        Ok(warp::reply::with_status(
            e.to_string(),
            StatusCode::BAD_REQUEST,
        ))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        // Every route is method-specific, so a method mismatch means no
        // route matched the request path.
        Ok(warp::reply::with_status(
            "NOT FOUND".to_string(),
            StatusCode::NOT_FOUND,
        ))
    } else {
        log::error!("unhandled rejection: {:?}", err);
        Ok(warp::reply::with_status(
            "INTERNAL SERVER ERROR".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}
