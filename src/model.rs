use ::serde::{Deserialize, Serialize};

/// A registered peer site. The credential field holds the encrypted blob as
/// stored; [`crate::registry::SiteRegistry::site`] returns a copy with the
/// credential decrypted for point-of-use consumption.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Site {
    pub id: i64,
    pub url: String,
    pub credential: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_unix: u64,
}

impl Site {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Subset of a site safe to expose over the admin surface.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SiteSummary {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub created_unix: u64,
}

impl From<&Site> for SiteSummary {
    fn from(site: &Site) -> SiteSummary {
        SiteSummary {
            id: site.id,
            url: site.url.clone(),
            name: site.name.clone(),
            created_unix: site.created_unix,
        }
    }
}

/// Term ids whose presence on a post blocks outbound distribution entirely.
/// Global, replaced wholesale on save.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ExclusionSet {
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<i64>,
}

impl ExclusionSet {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tags.is_empty()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Wire representation of a post exchanged between sites. The update and test
/// markers are omitted from serialization when unset so that first-publish
/// payloads stay identical to older peers' expectations.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub post_id: i64,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub featured_image_url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub update: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub original_post_id: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub test: bool,
}

/// Body of every wire response, and of admin error replies.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WireResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
        }
    }

    pub fn parse(value: &str) -> ::anyhow::Result<PostStatus> {
        match value {
            "publish" => Ok(PostStatus::Publish),
            "draft" => Ok(PostStatus::Draft),
            other => Err(::anyhow::anyhow!("unknown post status: {}", other)),
        }
    }
}

impl Default for PostStatus {
    fn default() -> PostStatus {
        PostStatus::Draft
    }
}

/// A post as read back from the content store. Tag and category fields carry
/// term names; term ids are looked up separately where needed.
#[derive(Clone, Debug)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub author_id: i64,
    pub author_name: String,
    pub date: String,
    pub permalink: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub author_id: i64,
    pub author_name: String,
    pub date: String,
    pub permalink: String,
}

/// Partial update applied to an existing post; None leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
    Category,
    Tag,
}

impl TermKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermKind::Category => "category",
            TermKind::Tag => "tag",
        }
    }
}

/// Keyword lists arrive from the admin surface either as a JSON array or as a
/// single comma-separated string.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum KeywordsInput {
    List(Vec<String>),
    Csv(String),
}

impl KeywordsInput {
    pub fn into_keywords(self) -> Vec<String> {
        let raw = match self {
            KeywordsInput::List(list) => list,
            KeywordsInput::Csv(csv) => {
                csv.split(',').map(|part| part.to_string()).collect()
            }
        };

        raw.iter()
            .map(|keyword| keyword.trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect()
    }
}

/// Site URLs compare equal on their trailing-slash form, so
/// `https://a.test` and `https://a.test/` identify the same peer.
pub fn trailing_slashed(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}

pub fn urls_equal(left: &str, right: &str) -> bool {
    trailing_slashed(left) == trailing_slashed(right)
}
