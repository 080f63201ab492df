//! Grouped boolean predicates for `where` and `having`.

use std::fmt;

/// How the parts of a [`CompositeBuilder`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    And,
    Or,
}

impl CompositeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeKind::And => "AND",
            CompositeKind::Or => "OR",
        }
    }
}

/// A predicate stored in a scalar part slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Raw(String),
    Composite(CompositeBuilder),
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Raw(s) => s.trim().is_empty(),
            Condition::Composite(c) => c.is_empty(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Raw(s) => f.write_str(s),
            Condition::Composite(c) => write!(f, "{c}"),
        }
    }
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::Raw(s.to_string())
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::Raw(s)
    }
}

impl From<CompositeBuilder> for Condition {
    fn from(c: CompositeBuilder) -> Self {
        Condition::Composite(c)
    }
}

/// An AND/OR group of conditions.
///
/// A single part renders bare, several render as `(a) AND (b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeBuilder {
    kind: CompositeKind,
    parts: Vec<Condition>,
}

impl CompositeBuilder {
    pub fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            parts: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(CompositeKind::And)
    }

    pub fn or() -> Self {
        Self::new(CompositeKind::Or)
    }

    /// Build a group from `parts`, skipping empty ones.
    pub fn with_parts(kind: CompositeKind, parts: impl IntoIterator<Item = Condition>) -> Self {
        let mut group = Self::new(kind);
        group.add_parts(parts);
        group
    }

    /// Add a condition. Empty conditions are ignored.
    pub fn add(&mut self, part: impl Into<Condition>) -> &mut Self {
        let part = part.into();
        if !part.is_empty() {
            self.parts.push(part);
        }
        self
    }

    pub fn add_parts(&mut self, parts: impl IntoIterator<Item = Condition>) -> &mut Self {
        for part in parts {
            self.add(part);
        }
        self
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn parts(&self) -> &[Condition] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Display for CompositeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{only}"),
            parts => {
                let sep = format!(") {} (", self.kind.as_str());
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(&sep)?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Merge `condition` into `existing` the way `andWhere`/`orWhere` do.
///
/// A composite of the same kind absorbs the new condition; anything else is
/// wrapped into a fresh group `[existing, condition]`.
pub(crate) fn combine(
    existing: Option<Condition>,
    condition: Condition,
    kind: CompositeKind,
) -> Condition {
    match existing {
        Some(Condition::Composite(mut group)) if group.kind() == kind => {
            group.add(condition);
            Condition::Composite(group)
        }
        existing => {
            let parts = existing.into_iter().chain(std::iter::once(condition));
            Condition::Composite(CompositeBuilder::with_parts(kind, parts))
        }
    }
}
