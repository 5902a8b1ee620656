use ::anyhow::Result;
use ::cadence::Counted;
use ::log::{debug, info, warn};
use ::serde_json::{json, Value};
use ::std::sync::Arc;

use crate::model::{ExclusionSet, Post, PostPayload, PostStatus};

pub const META_SENT: &str = "_syndicate_sent";
pub const META_SENT_SITES: &str = "_syndicate_sent_sites";

const EXCERPT_WORDS: usize = 55;
const EXCERPT_MORE: &str = "...";

/// Host lifecycle transitions, reduced to the two the dispatcher acts on.
/// The host adapter owns the reduction: an edit event is only delivered when
/// title or body actually changed and the post is still published.
#[derive(Clone, Copy, Debug)]
pub enum PostEvent {
    Published { post_id: i64 },
    Edited { post_id: i64 },
}

pub async fn handle_event(state: &Arc<crate::State>, event: PostEvent) -> Result<()> {
    match event {
        PostEvent::Published { post_id } => handle_post_published(state, post_id).await,
        PostEvent::Edited { post_id } => handle_post_edited(state, post_id).await,
    }
}

/// First-publish path. Idempotent: once a post is marked sent, later publish
/// events for it are no-ops until an edit or a manual resend.
pub async fn handle_post_published(state: &Arc<crate::State>, post_id: i64) -> Result<()> {
    let _guard = post_lock(state, post_id).await.lock_owned().await;

    if is_sent(state, post_id).await? {
        debug!("post {} already sent, skipping", post_id);
        return Ok(());
    }

    send_to_network(state, post_id).await
}

/// Manual resend: clears the distribution state, then runs the first-publish
/// path unconditionally.
pub async fn resend(state: &Arc<crate::State>, post_id: i64) -> Result<()> {
    let _guard = post_lock(state, post_id).await.lock_owned().await;

    state.content.delete_meta(post_id, META_SENT).await?;
    state.content.delete_meta(post_id, META_SENT_SITES).await?;

    send_to_network(state, post_id).await
}

async fn send_to_network(state: &Arc<crate::State>, post_id: i64) -> Result<()> {
    let post = match state.content.get_post(post_id).await? {
        Some(post) => post,
        None => {
            warn!("publish event for unknown post {}", post_id);
            return Ok(());
        }
    };

    if is_excluded(state, post_id).await {
        info!("post {} is excluded from distribution", post_id);
        return Ok(());
    }

    let payload = prepare_payload(state, &post).await;

    let mut sent_sites: Vec<i64> = vec![];

    for summary in state.registry.sites().await? {
        let site = match state.registry.site(summary.id).await? {
            Some(site) => site,
            None => continue,
        };

        if site.credential.is_empty() {
            continue;
        }

        match state
            .client
            .send_post(&site.url, &site.credential, &payload)
            .await
        {
            Ok(response) if response.success => {
                debug!(
                    "post {} accepted by {} (matched: {:?})",
                    post_id,
                    site.display_name(),
                    response.matched
                );
                sent_sites.push(site.id);
            }
            Ok(response) => {
                warn!(
                    "peer {} rejected post {}: {}",
                    site.display_name(),
                    post_id,
                    response.message.unwrap_or_default()
                );
            }
            Err(err) => {
                warn!(
                    "sending post {} to {} failed: {}",
                    post_id,
                    site.display_name(),
                    err
                );
            }
        }
    }

    match state.statsd_client.count("dispatch.sent", sent_sites.len() as i64) {
        Ok(_) => {}
        Err(err) => {
            warn!("unable to log dispatch metric due to: {}", err)
        }
    };

    if !sent_sites.is_empty() {
        state
            .content
            .set_meta(post_id, META_SENT, Value::Bool(true))
            .await?;
        state
            .content
            .set_meta(post_id, META_SENT_SITES, json!(sent_sites))
            .await?;
    }

    Ok(())
}

/// Update path. Only peers that accepted the original send receive the
/// update; their responses are ignored.
pub async fn handle_post_edited(state: &Arc<crate::State>, post_id: i64) -> Result<()> {
    let _guard = post_lock(state, post_id).await.lock_owned().await;

    let post = match state.content.get_post(post_id).await? {
        Some(post) => post,
        None => return Ok(()),
    };

    if post.status != PostStatus::Publish {
        return Ok(());
    }

    let sent_sites = sent_site_ids(state, post_id).await?;
    if sent_sites.is_empty() {
        return Ok(());
    }

    let mut payload = prepare_payload(state, &post).await;
    payload.update = true;
    payload.original_post_id = post_id;

    for summary in state.registry.sites().await? {
        if !sent_sites.contains(&summary.id) {
            continue;
        }

        let site = match state.registry.site(summary.id).await? {
            Some(site) => site,
            None => continue,
        };

        if site.credential.is_empty() {
            continue;
        }

        if let Err(err) = state
            .client
            .send_post(&site.url, &site.credential, &payload)
            .await
        {
            debug!(
                "update of post {} to {} failed: {}",
                post_id,
                site.display_name(),
                err
            );
        }
    }

    Ok(())
}

async fn is_sent(state: &Arc<crate::State>, post_id: i64) -> Result<bool> {
    Ok(matches!(
        state.content.get_meta(post_id, META_SENT).await?,
        Some(Value::Bool(true))
    ))
}

pub async fn sent_site_ids(state: &Arc<crate::State>, post_id: i64) -> Result<Vec<i64>> {
    match state.content.get_meta(post_id, META_SENT_SITES).await? {
        Some(value) => Ok(::serde_json::from_value(value).unwrap_or_default()),
        None => Ok(vec![]),
    }
}

/// Taxonomy-based exclusion. Lookup failures on either dimension are logged
/// and treated as no match on that dimension; a broken taxonomy never blocks
/// a post.
async fn is_excluded(state: &Arc<crate::State>, post_id: i64) -> bool {
    let exclusions = match state.registry.exclusions().await {
        Ok(exclusions) => exclusions,
        Err(err) => {
            warn!("exclusion lookup failed: {}", err);
            ExclusionSet::default()
        }
    };

    if exclusions.is_empty() {
        return false;
    }

    let category_ids = match state.content.category_ids_of(post_id).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!("category lookup failed for post {}: {}", post_id, err);
            vec![]
        }
    };

    let tag_ids = match state.content.tag_ids_of(post_id).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!("tag lookup failed for post {}: {}", post_id, err);
            vec![]
        }
    };

    excluded_by_terms(&category_ids, &tag_ids, &exclusions)
}

pub fn excluded_by_terms(
    category_ids: &[i64],
    tag_ids: &[i64],
    exclusions: &ExclusionSet,
) -> bool {
    category_ids
        .iter()
        .any(|id| exclusions.categories.contains(id))
        || tag_ids.iter().any(|id| exclusions.tags.contains(id))
}

async fn prepare_payload(state: &Arc<crate::State>, post: &Post) -> PostPayload {
    let content = crate::builder::post_content(state.content.as_ref(), post).await;

    let excerpt = if post.excerpt.is_empty() {
        crate::text::trim_words(
            &crate::text::strip_tags(&content),
            EXCERPT_WORDS,
            EXCERPT_MORE,
        )
    } else {
        post.excerpt.clone()
    };

    PostPayload {
        title: post.title.clone(),
        content,
        excerpt,
        permalink: post.permalink.clone(),
        post_id: post.id,
        site_url: state.site_url.clone(),
        tags: post.tags.clone(),
        categories: post.categories.clone(),
        featured_image_url: post.thumbnail_url.clone().unwrap_or_default(),
        author: post.author_name.clone(),
        date: post.date.clone(),
        ..Default::default()
    }
}

/// Serializes concurrent triggers for the same post. The host can fire a
/// publish hook and a bulk status transition back to back; without this the
/// check-then-act on the sent flag could double-send.
async fn post_lock(
    state: &Arc<crate::State>,
    post_id: i64,
) -> Arc<::tokio::sync::Mutex<()>> {
    let mut locks = state.dispatch_locks.lock().await;
    locks
        .entry(post_id)
        .or_insert_with(|| Arc::new(::tokio::sync::Mutex::new(())))
        .clone()
}
