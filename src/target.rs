//! Repository identifiers and watch targets
//!
//! Accepts the three spellings people paste into the config file:
//! `https://github.com/owner/repo`, `@https://github.com/owner/repo` (or
//! `@owner/repo`) and the bare `owner/repo` shorthand.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Owner/repo pair extracted from a user-supplied identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoIdentifier {
    pub owner: String,
    pub repo: String,
}

impl RepoIdentifier {
    /// Whether owner and repo can go into an API path unescaped
    pub fn has_safe_segments(&self) -> bool {
        is_safe_segment(&self.owner) && is_safe_segment(&self.repo)
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// A repository the monitor watches, with its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Display label, also the key for change tracking
    pub name: String,
    pub owner: String,
    pub repo: String,
}

impl RepositoryTarget {
    pub fn new(name: impl Into<String>, ident: RepoIdentifier) -> Self {
        Self {
            name: name.into(),
            owner: ident.owner,
            repo: ident.repo,
        }
    }

    /// owner/repo
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.owner, self.repo)
    }
}

fn patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^https?://github\.com/([^/]+)/([^/]+)",
            r"^@(?:https?://github\.com/)?([^/]+)/([^/]+)",
            r"^([^/]+)/([^/]+)",
        ]
        .map(|pattern| Regex::new(pattern).expect("static pattern is valid"))
    })
}

/// Parse a repository identifier into its owner/repo pair.
///
/// Patterns are tried in order (full URL, "@" form, shorthand) and the first
/// match wins. Anything after the repo segment is ignored, as is a trailing
/// `.git`. Returns `None` when no pattern applies; whether the repository
/// exists is left to the fetcher.
pub fn parse_repo_identifier(input: &str) -> Option<RepoIdentifier> {
    let input = input.trim();

    patterns().iter().find_map(|pattern| {
        let captures = pattern.captures(input)?;
        let owner = captures.get(1)?.as_str();
        let repo = captures.get(2)?.as_str();
        let repo = repo
            .strip_suffix(".git")
            .filter(|stripped| !stripped.is_empty())
            .unwrap_or(repo);

        Some(RepoIdentifier {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    })
}
