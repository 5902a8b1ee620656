use ::log::warn;
use ::std::collections::HashMap;
use ::std::sync::Arc;

pub mod builder;
pub mod client;
pub mod config;
pub mod content;
pub mod crypto;
pub mod dispatch;
pub mod handlers;
pub mod keywords;
pub mod model;
pub mod options;
pub mod registry;
pub mod stores;
pub mod text;
pub mod version;

/// Shared application state handed to every handler.
pub struct State {
    /// Base URL peers use to reach this instance; the declared origin of
    /// every outbound payload.
    pub site_url: String,
    pub admin_token: String,
    pub registry: crate::registry::SiteRegistry,
    pub content: Arc<dyn crate::content::ContentStore>,
    pub client: Arc<dyn crate::client::WireClient>,
    pub statsd_client: ::cadence::StatsdClient,
    /// Per-post guards serializing concurrent dispatch triggers.
    pub dispatch_locks:
        ::tokio::sync::Mutex<HashMap<i64, Arc<::tokio::sync::Mutex<()>>>>,
}

/// Early-returns a 500 reply out of a handler on Err.
#[macro_export]
macro_rules! warp_try_err_500 {
    ($expr:expr) => {
        match $expr {
            Ok(x) => x,
            Err(err) => {
                ::log::warn!("request failed: {}", err);
                return Ok(Box::new(::warp::reply::with_status(
                    err.to_string(),
                    ::warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                )));
            }
        }
    };
}

async fn handle_rejection(
    err: ::warp::Rejection,
) -> Result<impl ::warp::Reply, ::std::convert::Infallible> {
    if err.is_not_found() {
        return Ok(::warp::reply::with_status(
            "NOT_FOUND",
            ::warp::http::StatusCode::NOT_FOUND,
        ));
    }

    warn!("rejection {:?}", err);

    Ok(::warp::reply::with_status(
        "INTERNAL_SERVER_ERROR",
        ::warp::http::StatusCode::INTERNAL_SERVER_ERROR,
    ))
}

pub fn routes(
    state: Arc<State>,
) -> ::warp::filters::BoxedFilter<(Box<dyn ::warp::Reply>,)> {
    use ::warp::Filter;

    let state_filter = ::warp::any().map(move || state.clone());
    let admin_header = ::warp::header::optional::<String>("authorization");

    let receive_route = ::warp::post()
        .and(::warp::path("wire"))
        .and(::warp::path("receive"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(::warp::header::optional::<String>(
            crate::client::CREDENTIAL_HEADER,
        ))
        .and(::warp::body::bytes())
        .and_then(crate::handlers::receive::handler);

    let get_sites_route = ::warp::get()
        .and(::warp::path("sites"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::get_sites::handler);

    let post_sites_route = ::warp::post()
        .and(::warp::path("sites"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::post_sites::handler);

    let put_site_route = ::warp::put()
        .and(::warp::path!("sites" / i64))
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::put_site::handler);

    let delete_site_route = ::warp::delete()
        .and(::warp::path!("sites" / i64))
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::delete_site::handler);

    let get_keywords_route = ::warp::get()
        .and(::warp::path!("sites" / i64 / "keywords"))
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::get_keywords::handler);

    let put_keywords_route = ::warp::put()
        .and(::warp::path!("sites" / i64 / "keywords"))
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::put_keywords::handler);

    let test_site_route = ::warp::post()
        .and(::warp::path!("sites" / i64 / "test"))
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::post_test_site::handler);

    let get_exclusions_route = ::warp::get()
        .and(::warp::path("exclusions"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::get_exclusions::handler);

    let put_exclusions_route = ::warp::put()
        .and(::warp::path("exclusions"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::put_exclusions::handler);

    let published_route = ::warp::post()
        .and(::warp::path("events"))
        .and(::warp::path("published"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::post_published::handler);

    let edited_route = ::warp::post()
        .and(::warp::path("events"))
        .and(::warp::path("edited"))
        .and(::warp::path::end())
        .and(state_filter.clone())
        .and(admin_header)
        .and(::warp::body::bytes())
        .and_then(crate::handlers::post_edited::handler);

    let resend_route = ::warp::post()
        .and(::warp::path!("posts" / i64 / "resend"))
        .and(state_filter.clone())
        .and(admin_header)
        .and_then(crate::handlers::post_resend::handler);

    let health_route = ::warp::get()
        .and(::warp::path("health"))
        .and(::warp::path::end())
        .and_then(crate::handlers::get_health::handler);

    let version_route = ::warp::get()
        .and(::warp::path("version"))
        .and(::warp::path::end())
        .and_then(crate::handlers::get_version::handler);

    receive_route
        .or(get_sites_route)
        .unify()
        .or(post_sites_route)
        .unify()
        .or(put_site_route)
        .unify()
        .or(delete_site_route)
        .unify()
        .or(get_keywords_route)
        .unify()
        .or(put_keywords_route)
        .unify()
        .or(test_site_route)
        .unify()
        .or(get_exclusions_route)
        .unify()
        .or(put_exclusions_route)
        .unify()
        .or(published_route)
        .unify()
        .or(edited_route)
        .unify()
        .or(resend_route)
        .unify()
        .or(health_route)
        .unify()
        .or(version_route)
        .unify()
        .recover(handle_rejection)
        .map(|reply| Box::new(reply) as Box<dyn ::warp::Reply>)
        .boxed()
}
