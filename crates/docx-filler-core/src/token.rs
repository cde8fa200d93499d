use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Bracketing style of placeholder tokens in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TokenStyle {
    /// `{Key}`
    #[default]
    Braces,
    /// `[Key]`
    Brackets,
    /// `<Key>`
    Angles,
    /// `_Key_`
    Underscores,
    /// Any of the styles above.
    Any,
}

impl TokenStyle {
    const BRACKETED: [TokenStyle; 4] = [
        TokenStyle::Braces,
        TokenStyle::Brackets,
        TokenStyle::Angles,
        TokenStyle::Underscores,
    ];

    /// The literal token for `key`. `Any` renders in the default style.
    pub fn wrap(&self, key: &str) -> String {
        match self {
            TokenStyle::Braces | TokenStyle::Any => format!("{{{}}}", key),
            TokenStyle::Brackets => format!("[{}]", key),
            TokenStyle::Angles => format!("<{}>", key),
            TokenStyle::Underscores => format!("_{}_", key),
        }
    }

    /// Regex source matching the literal token(s) for `key`.
    fn pattern(&self, key: &str) -> String {
        match self {
            TokenStyle::Any => Self::BRACKETED
                .iter()
                .map(|style| regex::escape(&style.wrap(key)))
                .collect::<Vec<_>>()
                .join("|"),
            style => regex::escape(&style.wrap(key)),
        }
    }
}

impl fmt::Display for TokenStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenStyle::Braces => "{token}",
            TokenStyle::Brackets => "[token]",
            TokenStyle::Angles => "<token>",
            TokenStyle::Underscores => "_token_",
            TokenStyle::Any => "any",
        };
        f.write_str(s)
    }
}

impl FromStr for TokenStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "{token}" | "braces" => Ok(TokenStyle::Braces),
            "[token]" | r"\[token\]" | "brackets" => Ok(TokenStyle::Brackets),
            "<token>" | "angles" => Ok(TokenStyle::Angles),
            "_token_" | "underscores" => Ok(TokenStyle::Underscores),
            "any" | "*" => Ok(TokenStyle::Any),
            other => Err(format!(
                "unknown token style '{}', expected one of {{token}}, [token], <token>, _token_, any",
                other
            )),
        }
    }
}

impl TryFrom<String> for TokenStyle {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenStyle> for String {
    fn from(style: TokenStyle) -> Self {
        style.to_string()
    }
}

/// Finds the literal token of one field key in collection text.
///
/// The key is escaped, so characters such as `.` or `*` only match
/// themselves, and the brackets are part of the match: `{Name}` never
/// matches inside `{Name2}`.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    regex: Regex,
}

impl TokenMatcher {
    pub fn new(style: TokenStyle, key: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(&style.pattern(key))?,
        })
    }

    /// First match starting at or after byte offset `from`.
    pub fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        if from > text.len() {
            return None;
        }
        self.regex.find_at(text, from).map(|m| m.range())
    }

    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        self.find_at(text, 0)
    }
}
