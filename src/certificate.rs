use crate::curriculum::Course;
use crate::error::ProgressError;
use crate::progression::{all_completed, completion_percent};
use crate::record::CompletionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proof of course completion. Rendering it (PDF, image) happens elsewhere.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Certificate {
    pub id: Uuid,
    pub user: String,
    pub course_id: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    /// Issues a certificate if every level of `course` is completed in
    /// `course_record`.
    pub fn issue(
        user: &str,
        course: &Course,
        course_record: &CompletionRecord,
    ) -> Result<Certificate, ProgressError> {
        let levels = course.level_sequence();
        if levels.is_empty() || !all_completed(&levels, course_record) {
            // a rounded 100 would read as complete
            let percent = completion_percent(&levels, course_record).min(99);
            return Err(ProgressError::CourseIncomplete {
                course: course.id.clone(),
                percent,
            });
        }

        Ok(Certificate {
            id: Uuid::new_v4(),
            user: user.to_string(),
            course_id: course.id.clone(),
            course_title: course.title.clone(),
            issued_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Level;
    use crate::curriculum::tests::sample;
    use crate::status::EntityStatus;

    #[test]
    fn refuses_incomplete_course() {
        let catalog = sample();
        let course = catalog.course("rust-101").unwrap();
        let record: CompletionRecord = [("basics", EntityStatus::COMPLETED)].into_iter().collect();

        let err = Certificate::issue("ada", course, &record).unwrap_err();
        assert_eq!(
            err,
            ProgressError::CourseIncomplete {
                course: "rust-101".to_string(),
                percent: 33
            }
        );
    }

    #[test]
    fn refuses_course_one_level_short() {
        let catalog = sample();
        let mut course = catalog.course("rust-101").unwrap().clone();
        let template = course.levels[0].clone();
        course.levels = (0..200)
            .map(|i| Level {
                id: format!("l{i}"),
                ..template.clone()
            })
            .collect();
        let record: CompletionRecord = course.levels[..199]
            .iter()
            .map(|l| (l.id.as_str(), EntityStatus::COMPLETED))
            .collect();

        let err = Certificate::issue("ada", &course, &record).unwrap_err();
        assert_eq!(
            err,
            ProgressError::CourseIncomplete {
                course: "rust-101".to_string(),
                percent: 99
            }
        );
    }

    #[test]
    fn issues_for_complete_course() {
        let catalog = sample();
        let course = catalog.course("rust-101").unwrap();
        let record: CompletionRecord = course
            .levels
            .iter()
            .map(|l| (l.id.as_str(), EntityStatus::COMPLETED))
            .collect();

        let cert = Certificate::issue("ada", course, &record).unwrap();
        assert_eq!(cert.user, "ada");
        assert_eq!(cert.course_title, "Rust Fundamentals");
        assert!(cert.issued_at <= Utc::now());
    }
}
