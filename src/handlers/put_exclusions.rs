use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;
use crate::model::ExclusionSet;

pub(crate) async fn handler(
    state: Arc<crate::State>,
    auth: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    // replaced wholesale, never merged
    let exclusions: ExclusionSet = match util::parse_json(&body) {
        Ok(exclusions) => exclusions,
        Err(reply) => return Ok(reply),
    };

    crate::warp_try_err_500!(state.registry.save_exclusions(&exclusions).await);

    Ok(util::json_reply(StatusCode::OK, &json!({ "success": true })))
}
