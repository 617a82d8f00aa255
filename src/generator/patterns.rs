//! Regex-guided string synthesis
//!
//! Derives a literal matching a pattern facet instead of rejection-sampling
//! random strings, which is not guaranteed to terminate against restrictive
//! patterns like `[0-9]{1,18}\.[0-9]{2}`. Covers the regex subset ISO 20022
//! schemas use: literals, character classes, `.`, groups, alternation and
//! the `? * + {n} {n,} {n,m}` quantifiers.
//!
//! Unbounded quantifiers emit the minimum plus a small random surplus, so
//! synthesis always terminates.

use rand::Rng;
use std::fmt;

/// Extra repetitions added on top of a quantifier's minimum
const UNBOUNDED_SURPLUS: u32 = 2;

/// Draws per pattern source when searching a facet intersection
const SEARCH_DRAWS: usize = 16;

/// Synthesis failure: the pattern uses a construct outside the supported
/// subset, or is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError(String);

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern synthesis failed: {}", self.0)
    }
}

impl std::error::Error for PatternError {}

/// Produce a literal string matching the given pattern source
pub fn synthesize(pattern: &str, rng: &mut impl Rng) -> Result<String, PatternError> {
    let node = Parser::new(pattern).parse()?;
    let mut out = String::new();
    emit(&node, rng, &mut out);
    Ok(out)
}

/// Produce the shortest-expansion literal for a pattern: minimum repetition
/// counts, first alternation branch, lowest class member. Used when a random
/// draw collides with a co-declared length facet.
pub fn synthesize_minimal(pattern: &str) -> Result<String, PatternError> {
    let node = Parser::new(pattern).parse()?;
    let mut out = String::new();
    emit_minimal(&node, &mut out);
    Ok(out)
}

/// Search for a literal that one of the pattern sources produces and the
/// caller's full constraint check accepts
///
/// Facet sets merged through a restriction chain carry several patterns
/// that must all match, so a candidate drawn from one source is checked
/// against the whole set by `accept`. The number of draws is bounded and
/// the minimal expansions are tried last, so the search always terminates.
pub fn synthesize_where(
    sources: &[&str],
    accept: impl Fn(&str) -> bool,
    rng: &mut impl Rng,
) -> Option<String> {
    for source in sources {
        for _ in 0..SEARCH_DRAWS {
            if let Ok(value) = synthesize(source, rng) {
                if accept(&value) {
                    return Some(value);
                }
            }
        }
    }
    for source in sources {
        if let Ok(value) = synthesize_minimal(source) {
            if accept(&value) {
                return Some(value);
            }
        }
    }
    None
}

fn emit_minimal(node: &Node, out: &mut String) {
    match node {
        Node::Empty => {}
        Node::Literal(c) => out.push(*c),
        Node::Class { ranges, negated } => {
            if *negated {
                let c = ('0'..='9')
                    .chain('A'..='Z')
                    .chain('a'..='z')
                    .find(|c| !ranges.iter().any(|(lo, hi)| c >= lo && c <= hi))
                    .unwrap_or('~');
                out.push(c);
            } else {
                out.push(ranges.first().map(|(lo, _)| *lo).unwrap_or('a'));
            }
        }
        Node::Concat(nodes) => {
            for n in nodes {
                emit_minimal(n, out);
            }
        }
        Node::Alternate(branches) => {
            if let Some(first) = branches.first() {
                emit_minimal(first, out);
            }
        }
        Node::Repeat { node, min, .. } => {
            for _ in 0..*min {
                emit_minimal(node, out);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Empty,
    Literal(char),
    /// Character class as inclusive ranges; negated classes pick from
    /// printable ASCII outside the ranges
    Class {
        ranges: Vec<(char, char)>,
        negated: bool,
    },
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    Repeat {
        node: Box<Node>,
        min: u32,
        max: Option<u32>,
    },
}

fn emit(node: &Node, rng: &mut impl Rng, out: &mut String) {
    match node {
        Node::Empty => {}
        Node::Literal(c) => out.push(*c),
        Node::Class { ranges, negated } => out.push(pick_from_class(ranges, *negated, rng)),
        Node::Concat(nodes) => {
            for n in nodes {
                emit(n, rng, out);
            }
        }
        Node::Alternate(branches) => {
            let idx = rng.gen_range(0..branches.len());
            emit(&branches[idx], rng, out);
        }
        Node::Repeat { node, min, max } => {
            let count = match max {
                Some(max) if max == min => *min,
                Some(max) => rng.gen_range(*min..=*max),
                None => rng.gen_range(*min..=min + UNBOUNDED_SURPLUS),
            };
            for _ in 0..count {
                emit(node, rng, out);
            }
        }
    }
}

fn pick_from_class(ranges: &[(char, char)], negated: bool, rng: &mut impl Rng) -> char {
    if negated {
        // printable ASCII letters/digits outside the excluded ranges
        let candidates: Vec<char> = ('0'..='9')
            .chain('A'..='Z')
            .chain('a'..='z')
            .filter(|c| !ranges.iter().any(|(lo, hi)| c >= lo && c <= hi))
            .collect();
        if candidates.is_empty() {
            return '~';
        }
        return candidates[rng.gen_range(0..candidates.len())];
    }

    let total: u32 = ranges
        .iter()
        .map(|(lo, hi)| *hi as u32 - *lo as u32 + 1)
        .sum();
    let mut index = rng.gen_range(0..total.max(1));
    for (lo, hi) in ranges {
        let span = *hi as u32 - *lo as u32 + 1;
        if index < span {
            return char::from_u32(*lo as u32 + index).unwrap_or(*lo);
        }
        index -= span;
    }
    ranges.first().map(|(lo, _)| *lo).unwrap_or('a')
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            chars: pattern.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<Node, PatternError> {
        let node = self.parse_alternation()?;
        if self.chars.peek().is_some() {
            return Err(PatternError("unbalanced ')'".into()));
        }
        Ok(node)
    }

    fn parse_alternation(&mut self) -> Result<Node, PatternError> {
        let mut branches = vec![self.parse_concat()?];
        while self.chars.peek() == Some(&'|') {
            self.chars.next();
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Node::Alternate(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Node, PatternError> {
        let mut nodes = Vec::new();
        while let Some(&c) = self.chars.peek() {
            if c == '|' || c == ')' {
                break;
            }
            nodes.push(self.parse_quantified()?);
        }
        match nodes.len() {
            0 => Ok(Node::Empty),
            1 => Ok(nodes.pop().unwrap()),
            _ => Ok(Node::Concat(nodes)),
        }
    }

    fn parse_quantified(&mut self) -> Result<Node, PatternError> {
        let atom = self.parse_atom()?;
        match self.chars.peek() {
            Some('?') => {
                self.chars.next();
                Ok(Node::Repeat {
                    node: Box::new(atom),
                    min: 0,
                    max: Some(1),
                })
            }
            Some('*') => {
                self.chars.next();
                Ok(Node::Repeat {
                    node: Box::new(atom),
                    min: 0,
                    max: None,
                })
            }
            Some('+') => {
                self.chars.next();
                Ok(Node::Repeat {
                    node: Box::new(atom),
                    min: 1,
                    max: None,
                })
            }
            Some('{') => {
                self.chars.next();
                let (min, max) = self.parse_bounds()?;
                Ok(Node::Repeat {
                    node: Box::new(atom),
                    min,
                    max,
                })
            }
            _ => Ok(atom),
        }
    }

    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>), PatternError> {
        let mut bounds_text = String::new();
        for c in self.chars.by_ref() {
            if c == '}' {
                let (min_str, max_str) = match bounds_text.split_once(',') {
                    Some((min, max)) => (min.to_string(), Some(max.to_string())),
                    None => (bounds_text.clone(), None),
                };
                let min = min_str
                    .parse::<u32>()
                    .map_err(|_| PatternError(format!("bad quantifier '{{{}}}'", bounds_text)))?;
                let max = match max_str.as_deref() {
                    None => Some(min),       // {n}
                    Some("") => None,        // {n,}
                    Some(s) => Some(s.parse::<u32>().map_err(|_| {
                        PatternError(format!("bad quantifier '{{{}}}'", bounds_text))
                    })?),
                };
                if let Some(max) = max {
                    if min > max {
                        return Err(PatternError(format!("bad quantifier '{{{}}}'", bounds_text)));
                    }
                }
                return Ok((min, max));
            }
            bounds_text.push(c);
        }
        Err(PatternError("unterminated quantifier".into()))
    }

    fn parse_atom(&mut self) -> Result<Node, PatternError> {
        match self.chars.next() {
            Some('(') => {
                // non-capturing marker is irrelevant for synthesis
                if self.chars.peek() == Some(&'?') {
                    self.chars.next();
                    if self.chars.peek() == Some(&':') {
                        self.chars.next();
                    } else {
                        return Err(PatternError("unsupported group modifier".into()));
                    }
                }
                let inner = self.parse_alternation()?;
                match self.chars.next() {
                    Some(')') => Ok(inner),
                    _ => Err(PatternError("unbalanced '('".into())),
                }
            }
            Some('[') => self.parse_class(),
            Some('.') => Ok(Node::Class {
                ranges: vec![('0', '9'), ('A', 'Z'), ('a', 'z')],
                negated: false,
            }),
            // XSD patterns are implicitly anchored; explicit anchors are
            // redundant and simply skipped
            Some('^') | Some('$') => Ok(Node::Empty),
            Some('\\') => self.parse_escape(),
            Some(c) if c == '*' || c == '+' || c == '?' => {
                Err(PatternError(format!("dangling quantifier '{}'", c)))
            }
            Some(c) => Ok(Node::Literal(c)),
            None => Err(PatternError("unexpected end of pattern".into())),
        }
    }

    fn parse_escape(&mut self) -> Result<Node, PatternError> {
        match self.chars.next() {
            Some('d') => Ok(Node::Class {
                ranges: vec![('0', '9')],
                negated: false,
            }),
            Some('w') => Ok(Node::Class {
                ranges: vec![('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')],
                negated: false,
            }),
            Some('s') => Ok(Node::Literal(' ')),
            Some('n') => Ok(Node::Literal('\n')),
            Some('t') => Ok(Node::Literal('\t')),
            Some(c) if !c.is_alphanumeric() => Ok(Node::Literal(c)),
            Some(c) => Err(PatternError(format!("unsupported escape '\\{}'", c))),
            None => Err(PatternError("trailing backslash".into())),
        }
    }

    fn parse_class(&mut self) -> Result<Node, PatternError> {
        let mut ranges = Vec::new();
        let negated = if self.chars.peek() == Some(&'^') {
            self.chars.next();
            true
        } else {
            false
        };

        loop {
            let c = match self.chars.next() {
                Some(']') => {
                    if ranges.is_empty() {
                        return Err(PatternError("empty character class".into()));
                    }
                    return Ok(Node::Class { ranges, negated });
                }
                Some('\\') => match self.chars.next() {
                    Some('d') => {
                        ranges.push(('0', '9'));
                        continue;
                    }
                    Some('w') => {
                        ranges.extend([('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')]);
                        continue;
                    }
                    Some(c) if !c.is_alphanumeric() => c,
                    Some(c) => return Err(PatternError(format!("unsupported escape '\\{}'", c))),
                    None => return Err(PatternError("trailing backslash".into())),
                },
                Some(c) => c,
                None => return Err(PatternError("unterminated character class".into())),
            };

            // range like a-z, unless '-' is the last char before ']'
            if self.chars.peek() == Some(&'-') {
                self.chars.next();
                match self.chars.peek() {
                    Some(']') | None => {
                        ranges.push((c, c));
                        ranges.push(('-', '-'));
                    }
                    Some(&hi) => {
                        self.chars.next();
                        if hi < c {
                            return Err(PatternError(format!("invalid range {}-{}", c, hi)));
                        }
                        ranges.push((c, hi));
                    }
                }
            } else {
                ranges.push((c, c));
            }
        }
    }
}
