use ::anyhow::Result;
use ::serde_json::Value;

use crate::model::{Author, NewPost, Post, PostUpdate};

/// The host blog engine's content storage, as consumed by the dispatcher and
/// the receiver. Two providers exist: postgres for deployments sharing the
/// host's database, memory for tests and development.
#[::async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;

    async fn create_post(&self, new_post: &NewPost) -> Result<i64>;

    /// Applies the non-None fields of `update` to an existing post.
    async fn update_post(&self, id: i64, update: &PostUpdate) -> Result<()>;

    async fn get_meta(&self, post_id: i64, name: &str) -> Result<Option<Value>>;

    async fn set_meta(&self, post_id: i64, name: &str, value: Value) -> Result<()>;

    async fn delete_meta(&self, post_id: i64, name: &str) -> Result<()>;

    /// Post carrying both metadata entries, if any. Used to locate a
    /// cross-post by its (original post id, origin site) identity; the lookup
    /// returning at most one row is what keeps that pair unique.
    async fn find_post_by_meta_pair(
        &self,
        first: (&str, &Value),
        second: (&str, &Value),
    ) -> Result<Option<i64>>;

    async fn category_ids_of(&self, post_id: i64) -> Result<Vec<i64>>;

    async fn tag_ids_of(&self, post_id: i64) -> Result<Vec<i64>>;

    async fn set_thumbnail(&self, post_id: i64, url: &str) -> Result<()>;

    /// First user holding the administrator role, by id.
    async fn default_author(&self) -> Result<Option<Author>>;
}
