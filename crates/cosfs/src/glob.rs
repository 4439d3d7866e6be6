//! Wildcard matching of paths, walking only the directories a pattern needs

use crate::{ObjectPath, Result};
use async_trait::async_trait;
use tracing::debug;

/// The directory view a glob walk needs
#[async_trait]
pub trait DirectoryTree: Send + Sync {
    /// Names of the immediate children of `dir`
    async fn children(&self, dir: &ObjectPath) -> Result<Vec<String>>;

    /// Check if anything exists at `path`
    async fn exists(&self, path: &ObjectPath) -> Result<bool>;
}

/// One element of a wildcard component
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `*`: any run of characters
    Any,
    /// `?`: exactly one character
    One,
    /// `[...]`: one character from a set of ranges
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
    Char(char),
}

/// A `/`-separated component of a glob pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternComponent {
    /// A component with no wildcard characters
    Literal(String),
    /// A component matched token by token
    Wildcard(Vec<Token>),
}

impl PatternComponent {
    pub(crate) fn parse(component: &str) -> Self {
        if !has_wildcard(component) {
            return PatternComponent::Literal(component.to_string());
        }

        let chars: Vec<char> = component.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '*' => {
                    if tokens.last() != Some(&Token::Any) {
                        tokens.push(Token::Any);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::One);
                    i += 1;
                }
                '[' => match parse_class(&chars[i + 1..]) {
                    Some((token, consumed)) => {
                        tokens.push(token);
                        i += 1 + consumed;
                    }
                    // Unterminated class: a literal bracket
                    None => {
                        tokens.push(Token::Char('['));
                        i += 1;
                    }
                },
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Char(chars[i + 1]));
                    i += 2;
                }
                c => {
                    tokens.push(Token::Char(c));
                    i += 1;
                }
            }
        }
        PatternComponent::Wildcard(tokens)
    }

    /// Check if this component matches a whole name
    pub(crate) fn matches(&self, name: &str) -> bool {
        match self {
            PatternComponent::Literal(literal) => literal == name,
            PatternComponent::Wildcard(tokens) => {
                let name: Vec<char> = name.chars().collect();
                match_tokens(tokens, &name)
            }
        }
    }
}

/// Check if a pattern string contains glob metacharacters
pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Parse the body of a class after `[`, returning it and the chars consumed
fn parse_class(chars: &[char]) -> Option<(Token, usize)> {
    let mut i = 0;
    let negated = matches!(chars.first(), Some('!' | '^'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    while i < chars.len() {
        let c = chars[i];
        if c == ']' && !first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        first = false;
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] != ']' {
            ranges.push((c, chars[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
    None
}

fn match_tokens(tokens: &[Token], name: &[char]) -> bool {
    match tokens.split_first() {
        None => name.is_empty(),
        Some((Token::Any, rest)) => (0..=name.len()).any(|skip| match_tokens(rest, &name[skip..])),
        Some((token, rest)) => match name.split_first() {
            Some((c, remaining)) => token_matches(token, *c) && match_tokens(rest, remaining),
            None => false,
        },
    }
}

fn token_matches(token: &Token, c: char) -> bool {
    match token {
        Token::Any | Token::One => true,
        Token::Char(expected) => *expected == c,
        Token::Class { negated, ranges } => {
            let hit = ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c));
            hit != *negated
        }
    }
}

/// Paths matching `pattern`, as sorted `cos://` URIs.
///
/// The literal components before the first wildcard fix the walk root. Each
/// further component filters the children of the directories matched so far.
/// A pattern without wildcards matches itself when it exists.
pub async fn get_matching_paths(tree: &dyn DirectoryTree, pattern: &str) -> Result<Vec<String>> {
    let pattern_path = ObjectPath::parse(pattern, true)?;
    if !has_wildcard(pattern_path.key()) {
        return Ok(if tree.exists(&pattern_path).await? {
            vec![pattern_path.to_string()]
        } else {
            Vec::new()
        });
    }

    let components: Vec<&str> = pattern_path
        .key()
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();
    let literal_len = components
        .iter()
        .position(|c| has_wildcard(c))
        .unwrap_or(components.len());

    let root = components[..literal_len]
        .iter()
        .fold(pattern_path.bucket_root(), |dir, name| dir.join(name));
    let remaining: Vec<PatternComponent> = components[literal_len..]
        .iter()
        .map(|c| PatternComponent::parse(c))
        .collect();
    debug!(root = %root, levels = remaining.len(), "glob walk");

    let mut frontier = vec![root];
    let mut matches = Vec::new();
    for (depth, component) in remaining.iter().enumerate() {
        let last = depth + 1 == remaining.len();
        let mut next = Vec::new();
        for dir in &frontier {
            for name in tree.children(dir).await? {
                if !component.matches(&name) {
                    continue;
                }
                let child = dir.join(&name);
                if last {
                    matches.push(child.to_string());
                } else {
                    next.push(child);
                }
            }
        }
        frontier = next;
    }

    matches.sort();
    matches.dedup();
    Ok(matches)
}
