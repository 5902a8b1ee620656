use ::cadence::Counted;
use ::log::warn;
use ::serde_json::json;
use ::std::sync::Arc;
use ::warp::http::StatusCode;

use crate::handlers::util;
use crate::model::{Author, NewPost, PostPayload, PostStatus, PostUpdate, WireResponse};

pub const META_ORIGINAL_ID: &str = "_syndicate_original_id";
pub const META_ORIGINAL_SITE: &str = "_syndicate_original_site";
pub const META_CANONICAL: &str = "_syndicate_canonical";

const FALLBACK_AUTHOR_ID: i64 = 1;

pub(crate) async fn handler(
    state: Arc<crate::State>,
    credential: Option<String>,
    body: ::bytes::Bytes,
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    // 401 for an absent credential, 403 for a wrong one; peers rely on the
    // distinction when diagnosing their configuration.
    let presented = credential.unwrap_or_default();
    if presented.is_empty() {
        return Ok(util::json_error(
            StatusCode::UNAUTHORIZED,
            "credential is required",
        ));
    }

    let own = crate::warp_try_err_500!(state.registry.own_credential().await)
        .unwrap_or_default();

    if own.is_empty()
        || !::constant_time_eq::constant_time_eq(
            presented.as_bytes(),
            own.as_bytes(),
        )
    {
        return Ok(util::json_error(StatusCode::FORBIDDEN, "invalid credential"));
    }

    let payload: PostPayload = match ::serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return Ok(util::json_error(
                StatusCode::BAD_REQUEST,
                &format!("malformed payload: {}", err),
            ));
        }
    };

    // Reachability probes carry only the test flag and are answered with 400
    // so they can never create content. Not an authentication failure.
    if payload.test {
        return Ok(util::json_error(
            StatusCode::BAD_REQUEST,
            "test request received",
        ));
    }

    match state.statsd_client.count("receive.posts", 1) {
        Ok(_) => {}
        Err(err) => {
            warn!("unable to log receive metric due to: {}", err)
        }
    };

    let keywords = crate::warp_try_err_500!(
        state.registry.keywords_for_origin(&payload.site_url).await
    );

    // An empty list means the sending site is unfiltered; the filter itself
    // is only consulted when there is something to match against.
    if !keywords.is_empty() {
        let text = crate::keywords::PostText {
            title: &payload.title,
            content: &payload.content,
            tags: &payload.tags,
            categories: &payload.categories,
        };

        if !crate::keywords::matches(&keywords, &text) {
            return Ok(util::json_reply(
                StatusCode::OK,
                &WireResponse {
                    success: true,
                    message: Some(
                        "post received but discarded (no keyword match)"
                            .to_string(),
                    ),
                    matched: Some(false),
                    post_id: None,
                },
            ));
        }
    }

    let existing = if payload.update && payload.original_post_id > 0 {
        crate::warp_try_err_500!(
            state
                .content
                .find_post_by_meta_pair(
                    (META_ORIGINAL_ID, &json!(payload.original_post_id)),
                    (META_ORIGINAL_SITE, &json!(payload.site_url)),
                )
                .await
        )
    } else {
        None
    };

    let post_id = match existing {
        Some(id) => {
            crate::warp_try_err_500!(update_cross_post(&state, id, &payload).await);
            id
        }
        // an update for a post never seen here becomes a create
        None => crate::warp_try_err_500!(create_cross_post(&state, &payload).await),
    };

    Ok(util::json_reply(
        StatusCode::OK,
        &WireResponse {
            success: true,
            message: None,
            matched: Some(true),
            post_id: Some(post_id),
        },
    ))
}

async fn create_cross_post(
    state: &Arc<crate::State>,
    payload: &PostPayload,
) -> ::anyhow::Result<i64> {
    let author = match state.content.default_author().await {
        Ok(Some(author)) => author,
        Ok(None) => Author {
            id: FALLBACK_AUTHOR_ID,
            name: String::new(),
        },
        Err(err) => {
            warn!("default author lookup failed: {}", err);
            Author {
                id: FALLBACK_AUTHOR_ID,
                name: String::new(),
            }
        }
    };

    let new_post = NewPost {
        title: payload.title.clone(),
        content: cross_post_content(payload),
        excerpt: payload.excerpt.clone(),
        status: PostStatus::Publish,
        author_id: author.id,
        author_name: author.name,
        date: payload.date.clone(),
        permalink: String::new(),
    };

    let post_id = state.content.create_post(&new_post).await?;

    if payload.post_id > 0 {
        state
            .content
            .set_meta(post_id, META_ORIGINAL_ID, json!(payload.post_id))
            .await?;
    }
    if !payload.site_url.is_empty() {
        state
            .content
            .set_meta(post_id, META_ORIGINAL_SITE, json!(payload.site_url))
            .await?;
    }
    if !payload.permalink.is_empty() {
        state
            .content
            .set_meta(post_id, META_CANONICAL, json!(payload.permalink))
            .await?;
    }

    // Featured image import is best-effort; a dead or non-image URL leaves
    // the cross-post without a thumbnail.
    if !payload.featured_image_url.is_empty() {
        match state.client.fetch_image(&payload.featured_image_url).await {
            Ok(()) => {
                if let Err(err) = state
                    .content
                    .set_thumbnail(post_id, &payload.featured_image_url)
                    .await
                {
                    warn!("storing thumbnail for post {} failed: {}", post_id, err);
                }
            }
            Err(err) => {
                warn!(
                    "featured image import skipped for post {}: {}",
                    post_id, err
                );
            }
        }
    }

    Ok(post_id)
}

async fn update_cross_post(
    state: &Arc<crate::State>,
    post_id: i64,
    payload: &PostPayload,
) -> ::anyhow::Result<()> {
    state
        .content
        .update_post(
            post_id,
            &PostUpdate {
                title: Some(payload.title.clone()),
                content: Some(cross_post_content(payload)),
                excerpt: Some(payload.excerpt.clone()),
            },
        )
        .await?;

    if !payload.permalink.is_empty() {
        state
            .content
            .set_meta(post_id, META_CANONICAL, json!(payload.permalink))
            .await?;
    }

    Ok(())
}

/// The local copy is a teaser, not a mirror: the excerpt plus a canonical
/// "Read more" link back to the origin.
fn cross_post_content(payload: &PostPayload) -> String {
    let mut content = format!("<p>{}</p>", payload.excerpt);

    if !payload.permalink.is_empty() {
        content.push_str(&format!(
            "<p><a href=\"{}\" rel=\"canonical\">Read more</a></p>",
            payload.permalink
        ));
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_post_body_is_a_teaser() {
        let payload = PostPayload {
            excerpt: "short summary".to_string(),
            permalink: "https://a.test/post/1/".to_string(),
            ..Default::default()
        };

        assert_eq!(
            cross_post_content(&payload),
            "<p>short summary</p>\
             <p><a href=\"https://a.test/post/1/\" rel=\"canonical\">Read more</a></p>"
        );
    }

    #[test]
    fn missing_permalink_drops_the_link() {
        let payload = PostPayload {
            excerpt: "short summary".to_string(),
            ..Default::default()
        };

        assert_eq!(cross_post_content(&payload), "<p>short summary</p>");
    }
}
