//! Shortcode to emoji substitution.

use crate::domain::TextTransform;

/// Shortcodes replaced by [`EmojiTransform`], applied in this order.
pub const DEFAULT_SHORTCODES: &[(&str, &str)] = &[
    (":smile:", "😄"),
    (":heart:", "❤️"),
    (":fire:", "🔥"),
];

/// Replaces known `:shortcode:` tokens with their emoji.
#[derive(Debug, Clone)]
pub struct EmojiTransform {
    shortcodes: Vec<(String, String)>,
}

impl EmojiTransform {
    pub fn new(shortcodes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            shortcodes: shortcodes.into_iter().collect(),
        }
    }
}

impl Default for EmojiTransform {
    fn default() -> Self {
        Self::new(
            DEFAULT_SHORTCODES
                .iter()
                .map(|(code, emoji)| (code.to_string(), emoji.to_string())),
        )
    }
}

impl TextTransform for EmojiTransform {
    fn transform(&self, text: &str) -> String {
        self.shortcodes
            .iter()
            .fold(text.to_string(), |acc, (code, emoji)| acc.replace(code, emoji))
    }
}

/// Leaves text untouched; used when the emoji filter is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTransform;

impl TextTransform for PlainTransform {
    fn transform(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_known_shortcodes() {
        // テスト項目: 既知のショートコードが絵文字に置換される
        // given (前提条件):
        let transform = EmojiTransform::default();

        // when (操作):
        let result = transform.transform("hi :smile: I :heart: this :fire::fire:");

        // then (期待する結果):
        assert_eq!(result, "hi 😄 I ❤️ this 🔥🔥");
    }

    #[test]
    fn test_unknown_shortcodes_are_left_alone() {
        // テスト項目: 未知のショートコードや普通の文字列は変更されない
        // given (前提条件):
        let transform = EmojiTransform::default();

        // when (操作):
        let result = transform.transform("time is 12:30 :wave:");

        // then (期待する結果):
        assert_eq!(result, "time is 12:30 :wave:");
    }

    #[test]
    fn test_plain_transform_is_identity() {
        // テスト項目: PlainTransform は入力をそのまま返す
        // when (操作):
        let result = PlainTransform.transform("hi :smile:");

        // then (期待する結果):
        assert_eq!(result, "hi :smile:");
    }
}
