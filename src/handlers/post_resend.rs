use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;

/// Manual resend. Unlike the lifecycle events this is an operator action, so
/// a broken store is reported instead of swallowed.
pub(crate) async fn handler(
    post_id: i64,
    state: Arc<crate::State>,
    auth: Option<String>,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    if post_id <= 0 {
        return Ok(util::json_error(StatusCode::BAD_REQUEST, "invalid post id"));
    }

    crate::warp_try_err_500!(crate::dispatch::resend(&state, post_id).await);

    Ok(util::json_reply(
        StatusCode::OK,
        &json!({ "success": true, "message": "post sent to network" }),
    ))
}
