use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;

/// Fires a reachability probe at a registered peer. The probe outcome is the
/// response body; only a broken registry turns into a server error.
pub(crate) async fn handler(
    site_id: i64,
    state: Arc<crate::State>,
    auth: Option<String>,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let site = match crate::warp_try_err_500!(state.registry.site(site_id).await) {
        Some(site) => site,
        None => {
            return Ok(util::json_error(StatusCode::NOT_FOUND, "unknown site id"));
        }
    };

    if site.credential.is_empty() {
        return Ok(util::json_error(
            StatusCode::BAD_REQUEST,
            "site has no usable credential",
        ));
    }

    match state
        .client
        .test_connection(&site.url, &site.credential)
        .await
    {
        Ok(()) => Ok(util::json_reply(
            StatusCode::OK,
            &json!({ "success": true, "message": "connection successful" }),
        )),
        Err(err) => Ok(util::json_reply(
            StatusCode::OK,
            &json!({ "success": false, "message": err.to_string() }),
        )),
    }
}
