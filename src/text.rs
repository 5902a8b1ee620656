use ::regex::Regex;
use ::std::sync::OnceLock;

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>")
            .expect("block pattern")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern"))
}

/// Strips markup from post content: script and style blocks go away with
/// their contents, remaining tags are removed in place, and the result is
/// trimmed. Adjacent text nodes join directly, so inline markup never splits
/// a word.
pub fn strip_tags(input: &str) -> String {
    let without_blocks = block_pattern().replace_all(input, "");
    let without_tags = tag_pattern().replace_all(&without_blocks, "");
    without_tags.trim().to_string()
}

/// First `limit` whitespace-separated words of `input`, with `more` appended
/// when anything was cut off.
pub fn trim_words(input: &str, limit: usize, more: &str) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.len() <= limit {
        return words.join(" ");
    }

    let mut trimmed = words[..limit].join(" ");
    trimmed.push_str(more);
    trimmed
}
