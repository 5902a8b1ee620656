use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;

pub(crate) async fn handler(
    state: Arc<crate::State>,
    auth: Option<String>,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let exclusions = crate::warp_try_err_500!(state.registry.exclusions().await);

    Ok(util::json_reply(StatusCode::OK, &exclusions))
}
