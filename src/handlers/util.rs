use ::warp::http::StatusCode;

use crate::model::WireResponse;

/// Admin endpoints authenticate with a static bearer token compared in
/// constant time.
pub(crate) fn authorized_admin(state: &crate::State, header: Option<&str>) -> bool {
    let header = match header {
        Some(header) => header,
        None => return false,
    };

    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    !state.admin_token.is_empty()
        && ::constant_time_eq::constant_time_eq(
            token.as_bytes(),
            state.admin_token.as_bytes(),
        )
}

pub(crate) fn json_reply(
    status: StatusCode,
    body: &impl ::serde::Serialize,
) -> Box<dyn ::warp::Reply> {
    Box::new(::warp::reply::with_status(::warp::reply::json(body), status))
}

pub(crate) fn json_error(status: StatusCode, message: &str) -> Box<dyn ::warp::Reply> {
    json_reply(
        status,
        &WireResponse {
            success: false,
            message: Some(message.to_string()),
            ..Default::default()
        },
    )
}

pub(crate) fn forbidden() -> Box<dyn ::warp::Reply> {
    json_error(StatusCode::FORBIDDEN, "admin token required")
}

pub(crate) fn parse_json<T: ::serde::de::DeserializeOwned>(
    body: &::bytes::Bytes,
) -> Result<T, Box<dyn ::warp::Reply>> {
    ::serde_json::from_slice(body).map_err(|err| {
        json_error(
            StatusCode::BAD_REQUEST,
            &format!("malformed request body: {}", err),
        )
    })
}

#[derive(::serde::Deserialize)]
pub(crate) struct EventRequest {
    pub post_id: i64,
}
