use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;

pub(crate) async fn handler(
    site_id: i64,
    state: Arc<crate::State>,
    auth: Option<String>,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let site = crate::warp_try_err_500!(state.registry.site(site_id).await);
    if site.is_none() {
        return Ok(util::json_error(StatusCode::NOT_FOUND, "unknown site id"));
    }

    let keywords = crate::warp_try_err_500!(state.registry.keywords(site_id).await);

    Ok(util::json_reply(
        StatusCode::OK,
        &json!({ "keywords": keywords }),
    ))
}
