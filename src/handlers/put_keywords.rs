use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;
use crate::model::KeywordsInput;

#[derive(::serde::Deserialize)]
struct KeywordsRequest {
    keywords: KeywordsInput,
}

pub(crate) async fn handler(
    site_id: i64,
    state: Arc<crate::State>,
    auth: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let request: KeywordsRequest = match util::parse_json(&body) {
        Ok(request) => request,
        Err(reply) => return Ok(reply),
    };

    let site = crate::warp_try_err_500!(state.registry.site(site_id).await);
    if site.is_none() {
        return Ok(util::json_error(StatusCode::NOT_FOUND, "unknown site id"));
    }

    let keywords = request.keywords.into_keywords();
    crate::warp_try_err_500!(state.registry.save_keywords(site_id, &keywords).await);

    Ok(util::json_reply(StatusCode::OK, &json!({ "success": true })))
}
