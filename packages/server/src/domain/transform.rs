//! Cosmetic text transform applied to every inbound chat frame.

/// Pure, stateless, total string rewrite.
pub trait TextTransform: Send + Sync {
    fn transform(&self, text: &str) -> String;
}
