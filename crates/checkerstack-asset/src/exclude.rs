//! Build-context exclusion patterns.
//!
//! Patterns follow `.dockerignore` rules: components are matched with
//! `*` and `?` wildcards, a `**` component spans any number of
//! directories, and a match excludes the path and everything below it.
//! A leading `!` re-includes what earlier patterns excluded; the last
//! matching pattern wins.

use std::path::{Component, Path};

use checkerstack_common::error::{Result, StackError};

/// Ignore file read from the root of a build context.
pub const DOCKERIGNORE: &str = ".dockerignore";

/// A single exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    /// Path components, possibly with wildcards.
    parts: Vec<String>,
    /// `!pattern`: re-include on match.
    negated: bool,
}

/// Ordered set of exclusion patterns applied to build-context paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Creates a set from pattern strings. Empty patterns and `#`
    /// comments are ignored.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(patterns);
        set
    }

    /// Reads `.dockerignore` from a build context, if present, followed by
    /// `extra` patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore file exists but cannot be read.
    pub fn for_context<I, S>(context_dir: &Path, extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = context_dir.join(DOCKERIGNORE);
        let mut set = Self::default();
        if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|e| StackError::Io {
                path: path.clone(),
                source: e,
            })?;
            set.extend(content.lines());
            tracing::debug!(path = %path.display(), patterns = set.len(), "loaded ignore file");
        }
        set.extend(extra);
        Ok(set)
    }

    /// Appends patterns after the existing ones.
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.patterns
            .extend(patterns.into_iter().filter_map(|p| parse_pattern(p.as_ref())));
    }

    /// Returns true if the relative path is excluded by the last pattern
    /// that matches it.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        self.patterns
            .iter()
            .rev()
            .find(|pattern| matches_prefix(&pattern.parts, &parts))
            .is_some_and(|pattern| !pattern.negated)
    }

    /// Returns the number of patterns in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the set has no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn parse_pattern(raw: &str) -> Option<Pattern> {
    let raw = raw.trim();
    if raw.starts_with('#') {
        return None;
    }
    let (negated, body) = raw
        .strip_prefix('!')
        .map_or((false, raw), |rest| (true, rest.trim()));
    let parts: Vec<String> = body
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(Pattern { parts, negated })
}

/// True if `pattern` matches a leading run of `path` components.
fn matches_prefix(pattern: &[String], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => true,
        Some((first, rest)) if first == "**" => {
            matches_prefix(rest, path)
                || path
                    .split_first()
                    .is_some_and(|(_, tail)| matches_prefix(pattern, tail))
        }
        Some((first, rest)) => path.split_first().is_some_and(|(head, tail)| {
            component_matches(first.as_bytes(), head.as_bytes()) && matches_prefix(rest, tail)
        }),
    }
}

/// Wildcard match of one component: `*` spans any run, `?` one byte.
fn component_matches(pattern: &[u8], name: &[u8]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((b'*', rest)) => (0..=name.len()).any(|skip| component_matches(rest, &name[skip..])),
        Some((b'?', rest)) => name
            .split_first()
            .is_some_and(|(_, tail)| component_matches(rest, tail)),
        Some((c, rest)) => name
            .split_first()
            .is_some_and(|(n, tail)| n == c && component_matches(rest, tail)),
    }
}
