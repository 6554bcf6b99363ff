//! Resolved-topic marker.

/// Prefix the server adds to a topic name when it is marked resolved.
pub const RESOLVED_TOPIC_PREFIX: &str = "✔ ";

/// Whether `topic` carries the resolved marker.
pub fn is_resolved(topic: &str) -> bool {
    topic.starts_with(RESOLVED_TOPIC_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_resolved_prefix() {
        assert!(is_resolved("✔ deploy failed"));
        assert!(!is_resolved("deploy failed"));
        assert!(!is_resolved("✔deploy"));
        assert!(!is_resolved(""));
    }
}
