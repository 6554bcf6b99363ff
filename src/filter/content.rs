//! `has:` detection over server-rendered message HTML.

use crate::model::Message;
use regex::Regex;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a[\s>]").expect("link regex"));

static ATTACHMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*"/user_uploads/"#).expect("attachment regex")
});

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img regex"));

static INLINE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)class\s*=\s*"[^"]*\bmessage_inline_image\b"#).expect("inline image regex")
});

/// Any anchor element.
pub fn message_has_link(content: &str) -> bool {
    LINK.is_match(content)
}

/// An anchor pointing at an uploaded file.
pub fn message_has_attachment(content: &str) -> bool {
    ATTACHMENT.is_match(content)
}

/// An inline image preview, or an `<img>` that is not an emoji.
pub fn message_has_image(content: &str) -> bool {
    INLINE_IMAGE.is_match(content)
        || IMG_TAG
            .find_iter(content)
            .any(|tag| !tag.as_str().contains("emoji"))
}

/// Whether anyone reacted to `message`.
pub fn message_has_reaction(message: &Message) -> bool {
    !message.clean_reactions.is_empty()
}
