use crate::curriculum::Course;
use crate::progression::{accessibility, completion_percent, current_entity};
use crate::record::CompletionRecord;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct LevelSummary {
    pub id: String,
    pub title: String,
    pub accessible: bool,
    pub completed: bool,
    /// Share of this level's sub-modules completed.
    pub percent: u8,
    pub current_submodule: Option<String>,
}

/// Everything a course overview page needs, computed from snapshots.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct CourseDashboard {
    pub course_id: String,
    pub title: String,
    /// Share of levels completed.
    pub percent: u8,
    pub current_level: Option<String>,
    pub levels: Vec<LevelSummary>,
}

impl CourseDashboard {
    /// `level_records` is keyed by level id; missing levels read as fresh.
    pub fn build(
        course: &Course,
        course_record: &CompletionRecord,
        level_records: &HashMap<String, CompletionRecord>,
    ) -> CourseDashboard {
        let levels_seq = course.level_sequence();
        let access = accessibility(&levels_seq, course_record);
        let empty = CompletionRecord::new();

        let levels = course
            .levels
            .iter()
            .zip(access)
            .map(|(level, accessible)| {
                let record = level_records.get(&level.id).unwrap_or(&empty);
                let seq = level.submodule_sequence();
                LevelSummary {
                    id: level.id.clone(),
                    title: level.title.clone(),
                    accessible,
                    completed: course_record.is_completed(&level.id),
                    percent: completion_percent(&seq, record),
                    current_submodule: if accessible {
                        current_entity(&seq, record).map(str::to_string)
                    } else {
                        None
                    },
                }
            })
            .collect();

        CourseDashboard {
            course_id: course.id.clone(),
            title: course.title.clone(),
            percent: completion_percent(&levels_seq, course_record),
            current_level: current_entity(&levels_seq, course_record).map(str::to_string),
            levels,
        }
    }
}
