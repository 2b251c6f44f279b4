//! The match tree produced by a parse.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::RuleName;

/// Half-open byte range into the parsed input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// One rule application in the match tree.
///
/// Children appear in the order their rules matched, left to right. Rules
/// that did not match contribute no node. The text of a node is borrowed from
/// the input, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'i> {
    pub(crate) rule: RuleName,
    pub(crate) span: Span,
    pub(crate) input: &'i str,
    pub(crate) children: Vec<Match<'i>>,
}

impl<'i> Match<'i> {
    pub fn rule(&self) -> RuleName {
        self.rule
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// The covered text.
    pub fn as_str(&self) -> &'i str {
        &self.input[self.span.start..self.span.end]
    }

    /// The whole input this match was taken from.
    pub fn input(&self) -> &'i str {
        self.input
    }

    pub fn children(&self) -> &[Match<'i>] {
        &self.children
    }

    /// First direct child produced by `rule`.
    pub fn child(&self, rule: RuleName) -> Option<&Match<'i>> {
        self.children.iter().find(|child| child.rule == rule)
    }

    /// All direct children produced by `rule`.
    pub fn children_named(&self, rule: RuleName) -> impl Iterator<Item = &Match<'i>> + '_ {
        self.children.iter().filter(move |child| child.rule == rule)
    }

    /// Depth-first search through the descendants, not including `self`.
    pub fn find(&self, rule: RuleName) -> Option<&Match<'i>> {
        self.children.iter().find_map(|child| {
            if child.rule == rule {
                Some(child)
            } else {
                child.find(rule)
            }
        })
    }

    /// Every descendant produced by `rule`, in pre-order.
    pub fn find_all(&self, rule: RuleName) -> Vec<&Match<'i>> {
        let mut found = Vec::new();
        self.collect_named(rule, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, rule: RuleName, found: &mut Vec<&'a Match<'i>>) {
        for child in &self.children {
            if child.rule == rule {
                found.push(child);
            }
            child.collect_named(rule, found);
        }
    }

    /// Number of levels in this tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Match::depth).max().unwrap_or(0)
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} {:?}", "", self.rule, self.as_str(), indent = indent * 2)?;
        for child in &self.children {
            child.write_outline(f, indent + 1)?;
        }
        Ok(())
    }
}

/// Indented outline, one node per line.
impl fmt::Display for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

impl Serialize for Match<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("Match", 4)?;
        node.serialize_field("rule", &self.rule)?;
        node.serialize_field("span", &self.span)?;
        node.serialize_field("text", self.as_str())?;
        node.serialize_field("children", &self.children)?;
        node.end()
    }
}
