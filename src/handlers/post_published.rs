use ::log::error;
use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::dispatch::PostEvent;
use crate::handlers::util;

/// Host adapter entry for the publish transition. Distribution problems are
/// contained here: the publishing author always sees success.
pub(crate) async fn handler(
    state: Arc<crate::State>,
    auth: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let request: util::EventRequest = match util::parse_json(&body) {
        Ok(request) => request,
        Err(reply) => return Ok(reply),
    };

    if request.post_id <= 0 {
        return Ok(util::json_error(StatusCode::BAD_REQUEST, "invalid post id"));
    }

    if let Err(err) = crate::dispatch::handle_event(
        &state,
        PostEvent::Published {
            post_id: request.post_id,
        },
    )
    .await
    {
        error!("distribution of post {} failed: {}", request.post_id, err);
    }

    Ok(util::json_reply(StatusCode::OK, &json!({ "success": true })))
}
