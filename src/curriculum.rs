use crate::error::ProgressError;
use crate::quiz::Quiz;
use crate::sequence::{OrderedSequence, ScopeId, is_valid_id};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SubModule {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Level {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub submodules: Vec<SubModule>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub levels: Vec<Level>,
}

/// A hit from [`Course::search`].
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub level: String,
    pub submodule: Option<String>,
    pub title: String,
}

impl Level {
    pub fn submodule_sequence(&self) -> OrderedSequence {
        // uniqueness is checked by Catalog::validate
        OrderedSequence::new(self.submodules.iter().map(|m| m.id.clone()))
            .unwrap_or_else(|_| OrderedSequence::empty())
    }
}

impl Course {
    pub fn level_sequence(&self) -> OrderedSequence {
        OrderedSequence::new(self.levels.iter().map(|l| l.id.clone()))
            .unwrap_or_else(|_| OrderedSequence::empty())
    }

    pub fn level(&self, level_id: &str) -> Result<&Level, ProgressError> {
        self.levels
            .iter()
            .find(|l| l.id == level_id)
            .ok_or_else(|| ProgressError::UnknownLevel {
                course: self.id.clone(),
                level: level_id.to_string(),
            })
    }

    /// Case-insensitive title search over levels and sub-modules.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for level in &self.levels {
            if level.title.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    level: level.id.clone(),
                    submodule: None,
                    title: level.title.clone(),
                });
            }
            for module in &level.submodules {
                if module.title.to_lowercase().contains(&needle) {
                    hits.push(SearchHit {
                        level: level.id.clone(),
                        submodule: Some(module.id.clone()),
                        title: module.title.clone(),
                    });
                }
            }
        }
        hits
    }

    fn validate(&self) -> Result<(), ProgressError> {
        check_id(&self.id, "course")?;
        OrderedSequence::new(self.levels.iter().map(|l| l.id.as_str()))?;
        for level in &self.levels {
            check_id(&level.id, "level")?;
            OrderedSequence::new(level.submodules.iter().map(|m| m.id.as_str()))?;
            for module in &level.submodules {
                check_id(&module.id, "sub-module")?;
            }
            // nothing could ever complete such a level
            if level.submodules.is_empty() && level.quiz.is_none() {
                return Err(ProgressError::InvalidCatalog(format!(
                    "level {}/{} has neither sub-modules nor a quiz",
                    self.id, level.id
                )));
            }
            if let Some(quiz) = &level.quiz {
                if let Some(i) = quiz.invalid_questions().first() {
                    return Err(ProgressError::InvalidCatalog(format!(
                        "question {} of level {}/{} has no such option",
                        i, self.id, level.id
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_id(id: &str, kind: &str) -> Result<(), ProgressError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ProgressError::InvalidCatalog(format!(
            "invalid {} id: {:?}",
            kind, id
        )))
    }
}

/// Static curriculum: every course with its levels and sub-modules.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Catalog {
    pub courses: Vec<Course>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, ProgressError> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| ProgressError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProgressError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProgressError::InvalidCatalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), courses = catalog.courses.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn course(&self, course_id: &str) -> Result<&Course, ProgressError> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| ProgressError::UnknownCourse(course_id.to_string()))
    }

    /// The ordered sequence a completion record for `scope` is measured
    /// against.
    pub fn sequence_for(&self, scope: &ScopeId) -> Result<OrderedSequence, ProgressError> {
        match scope {
            ScopeId::Course(course) => Ok(self.course(course)?.level_sequence()),
            ScopeId::Level { course, level } => {
                Ok(self.course(course)?.level(level)?.submodule_sequence())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ProgressError> {
        let mut seen = HashSet::new();
        for course in &self.courses {
            if !seen.insert(course.id.as_str()) {
                return Err(ProgressError::InvalidCatalog(format!(
                    "duplicate course id: {}",
                    course.id
                )));
            }
            course.validate()?;
        }
        Ok(())
    }
}
