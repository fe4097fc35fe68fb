//! Cosmetic text transforms.

pub mod emoji;

pub use emoji::{EmojiTransform, PlainTransform};
