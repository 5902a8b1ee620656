use ::anyhow::{anyhow, Result};
use ::serde_json::Value;
use ::std::collections::HashMap;

use crate::content::interface;
use crate::model::{Author, NewPost, Post, PostStatus, PostUpdate, TermKind};

struct StoredPost {
    title: String,
    content: String,
    excerpt: String,
    status: PostStatus,
    author_id: i64,
    author_name: String,
    date: String,
    permalink: String,
    thumbnail_url: Option<String>,
}

struct StoredTerm {
    kind: TermKind,
    name: String,
}

struct StoredUser {
    id: i64,
    name: String,
    role: String,
}

#[derive(Default)]
struct Inner {
    next_post_id: i64,
    next_term_id: i64,
    next_user_id: i64,
    posts: HashMap<i64, StoredPost>,
    meta: HashMap<(i64, String), Value>,
    terms: HashMap<i64, StoredTerm>,
    post_terms: Vec<(i64, i64)>,
    users: Vec<StoredUser>,
}

impl Inner {
    fn term_names_of(&self, post_id: i64, kind: TermKind) -> Vec<String> {
        self.term_ids_of(post_id, kind)
            .into_iter()
            .filter_map(|term_id| {
                self.terms.get(&term_id).map(|term| term.name.clone())
            })
            .collect()
    }

    fn term_ids_of(&self, post_id: i64, kind: TermKind) -> Vec<i64> {
        self.post_terms
            .iter()
            .filter(|(candidate, term_id)| {
                *candidate == post_id
                    && self
                        .terms
                        .get(term_id)
                        .map(|term| term.kind == kind)
                        .unwrap_or(false)
            })
            .map(|(_, term_id)| *term_id)
            .collect()
    }
}

/// In-memory content store used by the test suite and the `memory` store
/// interface. The `seed_*` helpers stand in for the host engine writing
/// content.
#[derive(Default)]
pub struct MemoryContentStore {
    inner: ::tokio::sync::Mutex<Inner>,
}

impl MemoryContentStore {
    pub fn new() -> MemoryContentStore {
        MemoryContentStore::default()
    }

    pub async fn seed_user(&self, name: &str, role: &str) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.push(StoredUser {
            id,
            name: name.to_string(),
            role: role.to_string(),
        });
        id
    }

    pub async fn seed_term(&self, kind: TermKind, name: &str) -> i64 {
        let mut inner = self.inner.lock().await;
        inner.next_term_id += 1;
        let id = inner.next_term_id;
        inner.terms.insert(
            id,
            StoredTerm {
                kind,
                name: name.to_string(),
            },
        );
        id
    }

    pub async fn assign_term(&self, post_id: i64, term_id: i64) {
        let mut inner = self.inner.lock().await;
        inner.post_terms.push((post_id, term_id));
    }

    pub async fn post_count(&self) -> usize {
        self.inner.lock().await.posts.len()
    }
}

#[::async_trait::async_trait]
impl interface::ContentStore for MemoryContentStore {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let inner = self.inner.lock().await;

        let stored = match inner.posts.get(&id) {
            Some(stored) => stored,
            None => return Ok(None),
        };

        Ok(Some(Post {
            id,
            title: stored.title.clone(),
            content: stored.content.clone(),
            excerpt: stored.excerpt.clone(),
            status: stored.status,
            author_id: stored.author_id,
            author_name: stored.author_name.clone(),
            date: stored.date.clone(),
            permalink: stored.permalink.clone(),
            thumbnail_url: stored.thumbnail_url.clone(),
            tags: inner.term_names_of(id, TermKind::Tag),
            categories: inner.term_names_of(id, TermKind::Category),
        }))
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<i64> {
        let mut inner = self.inner.lock().await;
        inner.next_post_id += 1;
        let id = inner.next_post_id;

        inner.posts.insert(
            id,
            StoredPost {
                title: new_post.title.clone(),
                content: new_post.content.clone(),
                excerpt: new_post.excerpt.clone(),
                status: new_post.status,
                author_id: new_post.author_id,
                author_name: new_post.author_name.clone(),
                date: new_post.date.clone(),
                permalink: new_post.permalink.clone(),
                thumbnail_url: None,
            },
        );

        Ok(id)
    }

    async fn update_post(&self, id: i64, update: &PostUpdate) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let stored = inner
            .posts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no post with id {}", id))?;

        if let Some(title) = &update.title {
            stored.title = title.clone();
        }
        if let Some(content) = &update.content {
            stored.content = content.clone();
        }
        if let Some(excerpt) = &update.excerpt {
            stored.excerpt = excerpt.clone();
        }

        Ok(())
    }

    async fn get_meta(&self, post_id: i64, name: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock().await;
        Ok(inner.meta.get(&(post_id, name.to_string())).cloned())
    }

    async fn set_meta(&self, post_id: i64, name: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.meta.insert((post_id, name.to_string()), value);
        Ok(())
    }

    async fn delete_meta(&self, post_id: i64, name: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.meta.remove(&(post_id, name.to_string()));
        Ok(())
    }

    async fn find_post_by_meta_pair(
        &self,
        first: (&str, &Value),
        second: (&str, &Value),
    ) -> Result<Option<i64>> {
        let inner = self.inner.lock().await;

        let mut matches: Vec<i64> = inner
            .posts
            .keys()
            .filter(|post_id| {
                inner.meta.get(&(**post_id, first.0.to_string())) == Some(first.1)
                    && inner.meta.get(&(**post_id, second.0.to_string()))
                        == Some(second.1)
            })
            .copied()
            .collect();

        matches.sort_unstable();
        Ok(matches.first().copied())
    }

    async fn category_ids_of(&self, post_id: i64) -> Result<Vec<i64>> {
        let inner = self.inner.lock().await;
        Ok(inner.term_ids_of(post_id, TermKind::Category))
    }

    async fn tag_ids_of(&self, post_id: i64) -> Result<Vec<i64>> {
        let inner = self.inner.lock().await;
        Ok(inner.term_ids_of(post_id, TermKind::Tag))
    }

    async fn set_thumbnail(&self, post_id: i64, url: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let stored = inner
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| anyhow!("no post with id {}", post_id))?;

        stored.thumbnail_url = Some(url.to_string());
        Ok(())
    }

    async fn default_author(&self) -> Result<Option<Author>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .users
            .iter()
            .filter(|user| user.role == "administrator")
            .min_by_key(|user| user.id)
            .map(|user| Author {
                id: user.id,
                name: user.name.clone(),
            }))
    }
}
