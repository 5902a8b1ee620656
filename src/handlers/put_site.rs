use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;
use crate::registry::SitePatch;

pub(crate) async fn handler(
    site_id: i64,
    state: Arc<crate::State>,
    auth: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let patch: SitePatch = match util::parse_json(&body) {
        Ok(patch) => patch,
        Err(reply) => return Ok(reply),
    };

    if let Some(url) = &patch.url {
        let scheme_ok = match ::url::Url::parse(url.trim()) {
            Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
            Err(_) => false,
        };

        if !scheme_ok {
            return Ok(util::json_error(
                StatusCode::BAD_REQUEST,
                "a valid site url is required",
            ));
        }
    }

    if let Some(credential) = &patch.credential {
        if credential.is_empty() {
            return Ok(util::json_error(
                StatusCode::BAD_REQUEST,
                "credential may not be empty",
            ));
        }
    }

    let updated =
        crate::warp_try_err_500!(state.registry.update_site(site_id, &patch).await);

    if !updated {
        return Ok(util::json_error(StatusCode::NOT_FOUND, "unknown site id"));
    }

    Ok(util::json_reply(StatusCode::OK, &json!({ "success": true })))
}
