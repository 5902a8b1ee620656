use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;
use crate::model::SiteSummary;

pub(crate) async fn handler(
    state: Arc<crate::State>,
    auth: Option<String>,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    if !util::authorized_admin(&state, auth.as_deref()) {
        return Ok(util::forbidden());
    }

    let sites = crate::warp_try_err_500!(state.registry.sites().await);

    // credentials stay out of listings
    let summaries: Vec<SiteSummary> =
        sites.iter().map(SiteSummary::from).collect();

    Ok(util::json_reply(StatusCode::OK, &summaries))
}
