use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;

#[derive(::serde::Deserialize)]
struct SiteRequest {
    url: String,
    credential: String,
    #[serde(default)]
    name: String,
}

fn valid_site_url(raw: &str) -> bool {
    match ::url::Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

pub(crate) async fn handler(
    state: Arc<crate::State>,
    auth: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let request: SiteRequest = match util::parse_json(&body) {
        Ok(request) => request,
        Err(reply) => return Ok(reply),
    };

    if request.url.trim().is_empty() || !valid_site_url(request.url.trim()) {
        return Ok(util::json_error(
            StatusCode::BAD_REQUEST,
            "a valid site url is required",
        ));
    }

    if request.credential.is_empty() {
        return Ok(util::json_error(
            StatusCode::BAD_REQUEST,
            "a credential is required",
        ));
    }

    let id = crate::warp_try_err_500!(
        state
            .registry
            .add_site(&request.url, &request.credential, &request.name)
            .await
    );

    Ok(util::json_reply(StatusCode::OK, &json!({ "id": id })))
}
