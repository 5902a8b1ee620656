/// The text fields of a post the keyword filter looks at.
pub struct PostText<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub categories: &'a [String],
}

/// OR-semantics keyword match: true when any normalized keyword occurs as a
/// case-insensitive substring of the post's searchable text. Matching is
/// plain containment, not word-boundary aware, so "cat" matches "category".
///
/// An empty keyword list reports no match. Callers that treat an empty list
/// as "accept everything" must skip the filter entirely; that rule lives at
/// the call site, not here.
pub fn matches(keywords: &[String], post: &PostText<'_>) -> bool {
    let normalized: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();

    if normalized.is_empty() {
        return false;
    }

    let haystack = searchable_text(post).to_lowercase();

    normalized
        .iter()
        .any(|keyword| haystack.contains(keyword.as_str()))
}

/// Title, tag-stripped content, tag names and category names joined by single
/// spaces.
fn searchable_text(post: &PostText<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(post.title.to_string());
    parts.push(crate::text::strip_tags(post.content));
    parts.extend(post.tags.iter().cloned());
    parts.extend(post.categories.iter().cloned());
    parts.join(" ")
}
