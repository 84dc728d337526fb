//! Version ordering and constraint evaluation.
//!
//! Versions are split into numeric and alphabetic runs. Numeric runs compare
//! as if zero-padded to a common width, so `9 < 10`. Alphabetic runs are
//! ranked: development and pre-release markers (`dev`, `a`, `b`, `rc`) sort
//! before the bare release, post-release markers sort after it. Trailing zero
//! release components are insignificant, which gives constraint literals the
//! implicit right-padding that makes `>=1` match `1.2.3`.

use crate::error::ResolveError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Width numeric runs are padded to in [`Version::normalized`].
const PAD_WIDTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(String),
    Alpha(String),
}

/// Position of an element in the total order used for comparison.
///
/// A missing element (`End`) sorts after pre-release markers and before
/// post-release markers and numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    PreRelease,
    End,
    PostRelease,
    Number,
}

fn alpha_rank(tag: &str) -> u8 {
    match tag {
        "dev" => 0,
        "a" | "alpha" => 1,
        "b" | "beta" => 2,
        "c" | "rc" | "pre" | "preview" => 3,
        "post" | "rev" | "r" => 5,
        _ => 4,
    }
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_element(a: Option<&Token>, b: Option<&Token>) -> Ordering {
    fn class(t: Option<&Token>) -> Class {
        match t {
            None => Class::End,
            Some(Token::Num(_)) => Class::Number,
            Some(Token::Alpha(s)) if alpha_rank(s) <= 3 => Class::PreRelease,
            Some(Token::Alpha(_)) => Class::PostRelease,
        }
    }

    class(a).cmp(&class(b)).then_with(|| match (a, b) {
        (Some(Token::Num(x)), Some(Token::Num(y))) => cmp_numeric(x, y),
        (Some(Token::Alpha(x)), Some(Token::Alpha(y))) => alpha_rank(x)
            .cmp(&alpha_rank(y))
            .then_with(|| x.cmp(y)),
        _ => Ordering::Equal,
    })
}

/// A parsed version string.
///
/// Parsing never fails: any string is tokenized into numeric and alphabetic
/// runs, with everything else treated as a separator.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    tokens: Vec<Token>,
    release: Vec<String>,
}

impl Version {
    /// Parse a version string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let body = lowered.strip_prefix('v').unwrap_or(&lowered);

        let mut tokens = Vec::new();
        let mut chars = body.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                let mut run = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    run.push(d);
                    chars.next();
                }
                let stripped = run.trim_start_matches('0');
                tokens.push(Token::Num(if stripped.is_empty() {
                    "0".to_string()
                } else {
                    stripped.to_string()
                }));
            } else if c.is_ascii_alphabetic() {
                let mut run = String::new();
                while let Some(&a) = chars.peek().filter(|a| a.is_ascii_alphabetic()) {
                    run.push(a);
                    chars.next();
                }
                tokens.push(Token::Alpha(run));
            } else {
                chars.next();
            }
        }

        let release_len = tokens
            .iter()
            .take_while(|t| matches!(t, Token::Num(_)))
            .count();
        let release: Vec<String> = tokens[..release_len]
            .iter()
            .filter_map(|t| match t {
                Token::Num(n) => Some(n.clone()),
                Token::Alpha(_) => None,
            })
            .collect();

        let significant = release
            .iter()
            .rposition(|n| n != "0")
            .map_or(0, |last| last + 1);
        tokens.drain(significant..release_len);

        Self {
            raw: trimmed.to_string(),
            tokens,
            release,
        }
    }

    /// The version as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// A version is stable when it has no alphabetic component.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Num(_)))
    }

    /// Leading numeric components, without trailing-zero trimming.
    #[must_use]
    pub fn release(&self) -> &[String] {
        &self.release
    }

    /// Zero-padded string form; lexicographic order of two normalized forms
    /// agrees with numeric order of their release components.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Num(n) => format!("{n:0>width$}", width = PAD_WIDTH),
                Token::Alpha(a) => format!(".{a}."),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn release_component(&self, index: usize) -> &str {
        self.release.get(index).map_or("0", String::as_str)
    }

    /// Whether the leading release components equal `prefix`, padding with zeros.
    fn starts_with_release(&self, prefix: &[String]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, part)| self.release_component(i) == part.as_str())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        (0..len)
            .map(|i| cmp_element(self.tokens.get(i), other.tokens.get(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Compare two version strings.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    Version::parse(a).cmp(&Version::parse(b))
}

/// Options controlling which constraint forms are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintOptions {
    /// Accept the `!=` operator.
    pub allow_not_equal: bool,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            allow_not_equal: true,
        }
    }
}

/// Constraint operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `===`, literal string equality.
    Arbitrary,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `~=`
    Compatible,
    /// `>=`
    GreaterEq,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `<`
    Less,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "===" => Self::Arbitrary,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "~=" => Self::Compatible,
            ">=" => Self::GreaterEq,
            "<=" => Self::LessEq,
            ">" => Self::Greater,
            "<" => Self::Less,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
struct Clause {
    op: Operator,
    literal: String,
    version: Version,
    wildcard: bool,
}

impl Clause {
    fn matches(&self, v: &Version) -> bool {
        match self.op {
            Operator::Arbitrary => v.as_str().eq_ignore_ascii_case(&self.literal),
            Operator::Equal if self.wildcard => v.starts_with_release(self.version.release()),
            Operator::NotEqual if self.wildcard => !v.starts_with_release(self.version.release()),
            Operator::Equal => *v == self.version,
            Operator::NotEqual => *v != self.version,
            Operator::GreaterEq => *v >= self.version,
            Operator::LessEq => *v <= self.version,
            Operator::Greater => *v > self.version,
            Operator::Less => *v < self.version,
            Operator::Compatible => {
                let release = self.version.release();
                let prefix = &release[..release.len().saturating_sub(1)];
                *v >= self.version && v.starts_with_release(prefix)
            }
        }
    }
}

static CLAUSE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^(===|==|!=|~=|>=|<=|>|<|=)?\s*(.*)$").unwrap()
});

static LITERAL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.!+\-]*?(\.\*)?$").unwrap()
});

/// A comma-separated conjunction of version clauses, e.g. `>=1.0,<2.0`.
#[derive(Debug, Clone)]
pub struct Constraint {
    raw: String,
    clauses: Vec<Clause>,
}

impl Constraint {
    /// Parse a constraint expression.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidConstraintSyntax`] for the legacy `=`
    /// operator, a missing operator, a malformed literal, a misplaced
    /// wildcard, or `!=` when disabled by `options`.
    pub fn parse(text: &str, options: ConstraintOptions) -> Result<Self, ResolveError> {
        let raw = text.trim().to_string();
        let mut clauses = Vec::new();

        for clause in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let invalid = |message: String| ResolveError::InvalidConstraintSyntax {
                constraint: clause.to_string(),
                message,
            };

            let caps = CLAUSE
                .captures(clause)
                .ok_or_else(|| invalid(format!("Invalid requirement: '{clause}'")))?;
            let symbol = caps.get(1).map_or("", |m| m.as_str());
            let literal = caps.get(2).map_or("", |m| m.as_str().trim());

            let op = match symbol {
                "=" => {
                    return Err(invalid(format!(
                        "Invalid requirement: '{clause}': Hint: = is not a valid operator. Did you mean == ?"
                    )));
                }
                "" => {
                    return Err(invalid(format!(
                        "Invalid requirement: '{clause}': Hint: missing operator. Did you mean =={literal} ?"
                    )));
                }
                other => Operator::from_symbol(other)
                    .ok_or_else(|| invalid(format!("Invalid requirement: '{clause}'")))?,
            };

            if op == Operator::NotEqual && !options.allow_not_equal {
                return Err(invalid(format!(
                    "Invalid requirement: '{clause}': the != operator is disabled"
                )));
            }

            let literal_caps = LITERAL.captures(literal).ok_or_else(|| {
                invalid(format!(
                    "Invalid requirement: '{clause}': '{literal}' is not a valid version"
                ))
            })?;
            let wildcard = literal_caps.get(1).is_some();
            if wildcard && !matches!(op, Operator::Equal | Operator::NotEqual) {
                return Err(invalid(format!(
                    "Invalid requirement: '{clause}': wildcards are only allowed with == and !="
                )));
            }
            let base = literal.strip_suffix(".*").unwrap_or(literal);

            clauses.push(Clause {
                op,
                literal: literal.to_string(),
                version: Version::parse(base),
                wildcard,
            });
        }

        Ok(Self { raw, clauses })
    }

    /// The constraint as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the constraint has no clauses and accepts every version.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check if a version satisfies every clause.
    #[must_use]
    pub fn satisfies(&self, version: &Version) -> bool {
        self.clauses.iter().all(|c| c.matches(version))
    }

    /// Check a version string.
    #[must_use]
    pub fn satisfies_str(&self, version: &str) -> bool {
        self.satisfies(&Version::parse(version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Pick the best version satisfying `constraint`.
///
/// The highest stable match wins; the highest unstable match is used only when
/// no stable version matches.
#[must_use]
pub fn select_best<'a, I>(versions: I, constraint: Option<&Constraint>) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best_stable: Option<(Version, &'a str)> = None;
    let mut best_any: Option<(Version, &'a str)> = None;

    for raw in versions {
        let version = Version::parse(raw);
        if constraint.is_some_and(|c| !c.satisfies(&version)) {
            continue;
        }
        let slot = if version.is_stable() {
            &mut best_stable
        } else {
            &mut best_any
        };
        if slot.as_ref().is_none_or(|(best, _)| version > *best) {
            *slot = Some((version, raw));
        }
    }

    best_stable.or(best_any).map(|(_, raw)| raw)
}
