//! Invalidation targets.

use crate::cache::{normalize_tags, TagSet};

/// What an invalidation call removes.
///
/// `All` is a total reset. `Tags` removes every entry carrying at least one
/// of the tags; an empty tag set removes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    All,
    Tags(TagSet),
}

impl Invalidation {
    /// Builds a tag invalidation from any list of labels.
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invalidation::Tags(normalize_tags(tags))
    }
}

impl From<&str> for Invalidation {
    fn from(tag: &str) -> Self {
        Invalidation::tags([tag])
    }
}

impl From<String> for Invalidation {
    fn from(tag: String) -> Self {
        Invalidation::tags([tag])
    }
}

impl From<Vec<String>> for Invalidation {
    fn from(tags: Vec<String>) -> Self {
        Invalidation::tags(tags)
    }
}

impl From<&[&str]> for Invalidation {
    fn from(tags: &[&str]) -> Self {
        Invalidation::tags(tags.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Invalidation {
    fn from(tags: [&str; N]) -> Self {
        Invalidation::tags(tags)
    }
}

impl<T: Into<Invalidation>> From<Option<T>> for Invalidation {
    fn from(tags: Option<T>) -> Self {
        tags.map_or(Invalidation::All, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_means_all() {
        assert_eq!(Invalidation::from(None::<&str>), Invalidation::All);
        assert_eq!(Invalidation::from(None::<Vec<String>>), Invalidation::All);
    }

    #[test]
    fn test_single_tag() {
        assert_eq!(Invalidation::from("posts"), Invalidation::tags(["posts"]));
        assert_eq!(Invalidation::from(Some("posts")), Invalidation::tags(["posts"]));
    }

    #[test]
    fn test_empty_list_is_not_all() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(Invalidation::from(empty), Invalidation::Tags(TagSet::new()));
    }
}
