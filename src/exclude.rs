//! Hiding entries from lookups and listings.

use regex::RegexSet;

/// The patterns hidden by the `dirserve` binary unless told otherwise.
pub const DEFAULT_HIDDEN: &[&str] = &[r"^\.git", r"^\.vscode", r"^\.idea"];

/// A predicate over single path segments.
///
/// A segment is hidden when any of the patterns matches it. Hidden entries
/// are left out of directory listings and answer `404` when requested
/// directly, as if they did not exist.
#[derive(Clone, Debug)]
pub struct Exclude {
    patterns: RegexSet,
}

impl Exclude {
    /// Build a predicate from regular expressions.
    pub fn new<I, S>(patterns: I) -> Result<Exclude, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Exclude {
            patterns: RegexSet::new(patterns)?,
        })
    }

    /// A predicate that hides nothing.
    pub fn none() -> Exclude {
        Exclude {
            patterns: RegexSet::empty(),
        }
    }

    /// Hides version control and editor metadata directories.
    pub fn default_hidden() -> Exclude {
        Exclude::new(DEFAULT_HIDDEN).expect("default exclusion patterns are valid")
    }

    /// Whether a single path segment is hidden.
    pub fn is_match(&self, segment: &str) -> bool {
        self.patterns.is_match(segment)
    }

    /// Whether any segment of a cleaned path is hidden.
    pub fn hides(&self, clean: &str) -> bool {
        crate::path::segments(clean).any(|seg| self.is_match(seg))
    }
}

impl Default for Exclude {
    fn default() -> Self {
        Exclude::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hides_metadata_dirs() {
        let ex = Exclude::default_hidden();
        assert!(ex.is_match(".git"));
        assert!(ex.is_match(".gitignore"));
        assert!(ex.is_match(".vscode"));
        assert!(ex.is_match(".idea"));
        assert!(!ex.is_match("src"));
        assert!(!ex.is_match("my.git"));
    }

    #[test]
    fn hides_any_segment() {
        let ex = Exclude::default_hidden();
        assert!(ex.hides("/.git/config"));
        assert!(ex.hides("/a/b/.idea/workspace.xml"));
        assert!(!ex.hides("/a/b/c.txt"));
        assert!(!ex.hides("/"));
    }

    #[test]
    fn none_hides_nothing() {
        let ex = Exclude::none();
        assert!(!ex.is_match(".git"));
        assert!(!ex.hides("/.git"));
    }

    #[test]
    fn invalid_pattern() {
        assert!(Exclude::new(["("]).is_err());
    }
}
