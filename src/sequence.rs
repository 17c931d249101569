use crate::error::ProgressError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref COURSE_SCOPE_REGEX: Regex = Regex::new(r"^course:([A-Za-z0-9_.\-]+)$").unwrap();
    static ref LEVEL_SCOPE_REGEX: Regex =
        Regex::new(r"^level:([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+)$").unwrap();
    static ref ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

/// Whether `id` is usable as a course, level or sub-module identifier.
pub fn is_valid_id(id: &str) -> bool {
    ID_REGEX.is_match(id)
}

/// Ordered list of entity ids defining unlock precedence.
///
/// Built once from static curriculum data and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedSequence {
    ids: Vec<String>,
}

impl OrderedSequence {
    pub fn new<I, S>(ids: I) -> Result<Self, ProgressError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(ProgressError::DuplicateEntity(id.clone()));
            }
        }
        Ok(OrderedSequence { ids })
    }

    pub fn empty() -> Self {
        OrderedSequence { ids: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    pub fn successor(&self, id: &str) -> Option<&str> {
        self.position(id).and_then(|i| self.get(i + 1))
    }

    pub fn last(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Identifies which completion record a query or write refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeId {
    /// The level sequence of a course.
    Course(String),
    /// The sub-module sequence of one level.
    Level { course: String, level: String },
}

impl ScopeId {
    pub fn course(course: impl Into<String>) -> Self {
        ScopeId::Course(course.into())
    }

    pub fn level(course: impl Into<String>, level: impl Into<String>) -> Self {
        ScopeId::Level {
            course: course.into(),
            level: level.into(),
        }
    }

    pub fn course_id(&self) -> &str {
        match self {
            ScopeId::Course(course) => course,
            ScopeId::Level { course, .. } => course,
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Course(course) => write!(f, "course:{}", course),
            ScopeId::Level { course, level } => write!(f, "level:{}/{}", course, level),
        }
    }
}

impl FromStr for ScopeId {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = COURSE_SCOPE_REGEX.captures(s) {
            return Ok(ScopeId::Course(caps[1].to_string()));
        }
        if let Some(caps) = LEVEL_SCOPE_REGEX.captures(s) {
            return Ok(ScopeId::Level {
                course: caps[1].to_string(),
                level: caps[2].to_string(),
            });
        }
        Err(ProgressError::InvalidScope(s.to_string()))
    }
}

impl Serialize for ScopeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScopeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
