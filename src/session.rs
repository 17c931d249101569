//! A learner's session: a read-through cache over the profile store.
//!
//! Every mutation goes through the progression model first, is persisted to
//! the store, and only then replaces the cached record. A failed write leaves
//! the cache as it was, so lock state shown to the learner is never ahead of
//! what the store holds.

use crate::certificate::Certificate;
use crate::curriculum::{Catalog, Course, Level};
use crate::dashboard::CourseDashboard;
use crate::error::{ProgressError, SessionError};
use crate::progression::{
    all_completed, completion_percent, current_entity, is_accessible, try_mark_completed,
};
use crate::quiz::QuizResult;
use crate::record::CompletionRecord;
use crate::sequence::ScopeId;
use crate::store::ProfileStore;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What changed after a sub-module was completed.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Share of the level's sub-modules now completed.
    pub level_percent: u8,
    pub next_submodule: Option<String>,
    /// Set when this completion also completed the level.
    pub level_completed: bool,
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct QuizOutcome {
    pub result: QuizResult,
    pub level_completed: bool,
}

pub struct ProgressSession<'a, S: ProfileStore + ?Sized> {
    user: String,
    catalog: &'a Catalog,
    store: &'a S,
    cache: HashMap<ScopeId, CompletionRecord>,
}

impl<'a, S: ProfileStore + ?Sized> ProgressSession<'a, S> {
    pub fn new(user: impl Into<String>, catalog: &'a Catalog, store: &'a S) -> Self {
        ProgressSession {
            user: user.into(),
            catalog,
            store,
            cache: HashMap::new(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Cached record for `scope`, fetched from the store on first use.
    pub fn record(&mut self, scope: &ScopeId) -> Result<&CompletionRecord, SessionError> {
        if !self.cache.contains_key(scope) {
            let record = self.store.get_completion_record(&self.user, scope)?;
            debug!(user = %self.user, %scope, entries = record.len(), "cached completion record");
            self.cache.insert(scope.clone(), record);
        }
        Ok(&self.cache[scope])
    }

    /// Drops the cached copy so the next read goes to the store.
    pub fn invalidate(&mut self, scope: &ScopeId) {
        self.cache.remove(scope);
    }

    fn persist(&mut self, scope: ScopeId, record: CompletionRecord) -> Result<(), SessionError> {
        if let Err(err) = self.store.set_completion_record(&self.user, &scope, &record) {
            warn!(user = %self.user, %scope, %err, "failed to persist completion record");
            return Err(err.into());
        }
        self.cache.insert(scope, record);
        Ok(())
    }

    fn locate(&self, course_id: &str, level_id: &str) -> Result<(&'a Course, &'a Level), ProgressError> {
        let catalog: &'a Catalog = self.catalog;
        let course = catalog.course(course_id)?;
        let level = course.level(level_id)?;
        Ok((course, level))
    }

    fn ensure_level_accessible(&mut self, course: &Course, level: &Level) -> Result<(), SessionError> {
        let levels = course.level_sequence();
        let index = levels
            .position(&level.id)
            .ok_or_else(|| ProgressError::UnknownEntity(level.id.clone()))?;
        let course_record = self.record(&ScopeId::course(&course.id))?;
        if !is_accessible(&levels, course_record, index) {
            return Err(SessionError::Locked(format!("level {}/{}", course.id, level.id)));
        }
        Ok(())
    }

    fn complete_level(&mut self, course: &Course, level: &Level) -> Result<(), SessionError> {
        let scope = ScopeId::course(&course.id);
        let current = self.record(&scope)?.clone();
        let updated = try_mark_completed(&current, &level.id, &course.level_sequence())?;
        self.persist(scope, updated)?;
        info!(user = %self.user, course = %course.id, level = %level.id, "level completed");
        Ok(())
    }

    pub fn complete_submodule(
        &mut self,
        course_id: &str,
        level_id: &str,
        submodule_id: &str,
    ) -> Result<CompletionOutcome, SessionError> {
        let (course, level) = self.locate(course_id, level_id)?;
        self.ensure_level_accessible(course, level)?;

        let submodules = level.submodule_sequence();
        let index = submodules
            .position(submodule_id)
            .ok_or_else(|| ProgressError::UnknownEntity(submodule_id.to_string()))?;

        let scope = ScopeId::level(course_id, level_id);
        let current = self.record(&scope)?.clone();
        if !is_accessible(&submodules, &current, index) {
            return Err(SessionError::Locked(format!(
                "sub-module {}/{}/{}",
                course_id, level_id, submodule_id
            )));
        }

        let updated = try_mark_completed(&current, submodule_id, &submodules)?;
        let level_percent = completion_percent(&submodules, &updated);
        let level_done = all_completed(&submodules, &updated);
        let next_submodule = current_entity(&submodules, &updated).map(str::to_string);
        self.persist(scope, updated)?;
        info!(
            user = %self.user,
            course = course_id,
            level = level_id,
            submodule = submodule_id,
            level_percent,
            "sub-module completed"
        );

        let mut level_completed = false;
        if level_done && level.quiz.is_none() {
            let already = self.record(&ScopeId::course(course_id))?.is_completed(level_id);
            if !already {
                self.complete_level(course, level)?;
                level_completed = true;
            }
        }

        Ok(CompletionOutcome {
            level_percent,
            next_submodule,
            level_completed,
        })
    }

    /// Grades a quiz submission. Passing it completes the level, provided all
    /// of the level's sub-modules are already completed.
    pub fn submit_quiz(
        &mut self,
        course_id: &str,
        level_id: &str,
        answers: &[Option<usize>],
    ) -> Result<QuizOutcome, SessionError> {
        let (course, level) = self.locate(course_id, level_id)?;
        let quiz = level.quiz.as_ref().ok_or_else(|| ProgressError::NoQuiz {
            course: course_id.to_string(),
            level: level_id.to_string(),
        })?;
        self.ensure_level_accessible(course, level)?;

        let submodules = level.submodule_sequence();
        let level_record = self.record(&ScopeId::level(course_id, level_id))?;
        if !all_completed(&submodules, level_record) {
            return Err(SessionError::Locked(format!("quiz {}/{}", course_id, level_id)));
        }

        let result = quiz.grade(answers);
        info!(
            user = %self.user,
            course = course_id,
            level = level_id,
            percent = result.percent,
            passed = result.passed,
            "quiz submitted"
        );

        let mut level_completed = false;
        if result.passed && !self.record(&ScopeId::course(course_id))?.is_completed(level_id) {
            self.complete_level(course, level)?;
            level_completed = true;
        }

        Ok(QuizOutcome {
            result,
            level_completed,
        })
    }

    pub fn dashboard(&mut self, course_id: &str) -> Result<CourseDashboard, SessionError> {
        let catalog: &'a Catalog = self.catalog;
        let course = catalog.course(course_id)?;
        let course_record = self.record(&ScopeId::course(course_id))?.clone();
        let mut level_records = HashMap::with_capacity(course.levels.len());
        for level in &course.levels {
            let record = self.record(&ScopeId::level(course_id, &level.id))?.clone();
            level_records.insert(level.id.clone(), record);
        }
        Ok(CourseDashboard::build(course, &course_record, &level_records))
    }

    pub fn certificate(&mut self, course_id: &str) -> Result<Certificate, SessionError> {
        let catalog: &'a Catalog = self.catalog;
        let course = catalog.course(course_id)?;
        let user = self.user.clone();
        let course_record = self.record(&ScopeId::course(course_id))?;
        let certificate = Certificate::issue(&user, course, course_record)?;
        info!(user = %user, course = course_id, id = %certificate.id, "certificate issued");
        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::tests::sample;
    use crate::curriculum::{Course, Level, SubModule};
    use crate::error::StoreError;
    use crate::quiz::{Question, Quiz};
    use crate::store::{MemoryStore, UserRecords};

    struct FailingStore;

    impl ProfileStore for FailingStore {
        fn get_completion_record(
            &self,
            _user: &str,
            _scope: &ScopeId,
        ) -> Result<CompletionRecord, StoreError> {
            Ok(CompletionRecord::new())
        }

        fn set_completion_record(
            &self,
            _user: &str,
            _scope: &ScopeId,
            _record: &CompletionRecord,
        ) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        fn all_records(&self, _user: &str) -> Result<UserRecords, StoreError> {
            Ok(UserRecords::new())
        }
    }

    #[test]
    fn completes_in_order_and_rolls_up_to_level() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        let out = session.complete_submodule("rust-101", "basics", "install").unwrap();
        assert_eq!(out.level_percent, 50);
        assert_eq!(out.next_submodule.as_deref(), Some("hello"));
        assert!(!out.level_completed);

        let out = session.complete_submodule("rust-101", "basics", "hello").unwrap();
        assert_eq!(out.level_percent, 100);
        assert_eq!(out.next_submodule, None);
        assert!(out.level_completed);

        let course = store
            .get_completion_record("ada", &ScopeId::course("rust-101"))
            .unwrap();
        assert!(course.is_completed("basics"));
        assert!(course.is_unlocked("ownership"));
    }

    #[test]
    fn refuses_locked_submodule_and_level() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        assert!(matches!(
            session.complete_submodule("rust-101", "basics", "hello"),
            Err(SessionError::Locked(_))
        ));
        assert!(matches!(
            session.complete_submodule("rust-101", "ownership", "moves"),
            Err(SessionError::Locked(_))
        ));
        assert!(store.all_records("ada").unwrap().is_empty());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        assert!(matches!(
            session.complete_submodule("go-101", "basics", "install"),
            Err(SessionError::Progress(ProgressError::UnknownCourse(_)))
        ));
        assert!(matches!(
            session.complete_submodule("rust-101", "basics", "nope"),
            Err(SessionError::Progress(ProgressError::UnknownEntity(_)))
        ));
    }

    #[test]
    fn quiz_gates_level_with_quiz() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);
        session.complete_submodule("rust-101", "basics", "install").unwrap();
        session.complete_submodule("rust-101", "basics", "hello").unwrap();

        // quiz before the sub-modules are done
        assert!(matches!(
            session.submit_quiz("rust-101", "ownership", &[Some(1), Some(1)]),
            Err(SessionError::Locked(_))
        ));

        for id in ["moves", "borrows", "lifetimes"] {
            let out = session.complete_submodule("rust-101", "ownership", id).unwrap();
            assert!(!out.level_completed);
        }

        let failed = session
            .submit_quiz("rust-101", "ownership", &[Some(0), Some(0)])
            .unwrap();
        assert!(!failed.result.passed);
        assert!(!failed.level_completed);

        let passed = session
            .submit_quiz("rust-101", "ownership", &[Some(1), None])
            .unwrap();
        assert_eq!(passed.result.percent, 50);
        assert!(passed.result.passed);
        assert!(passed.level_completed);

        let dash = session.dashboard("rust-101").unwrap();
        assert_eq!(dash.percent, 67);
        assert_eq!(dash.current_level.as_deref(), Some("traits"));
    }

    #[test]
    fn level_without_quiz_rejects_submission() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);
        assert!(matches!(
            session.submit_quiz("rust-101", "basics", &[]),
            Err(SessionError::Progress(ProgressError::NoQuiz { .. }))
        ));
    }

    #[test]
    fn failed_write_keeps_cache() {
        let catalog = sample();
        let store = FailingStore;
        let mut session = ProgressSession::new("ada", &catalog, &store);

        let err = session
            .complete_submodule("rust-101", "basics", "install")
            .unwrap_err();
        assert!(matches!(err, SessionError::Store(_)));

        let cached = session
            .record(&ScopeId::level("rust-101", "basics"))
            .unwrap();
        assert!(!cached.is_completed("install"));
    }

    #[test]
    fn certificate_after_full_course() {
        let catalog = sample();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        assert!(matches!(
            session.certificate("rust-101"),
            Err(SessionError::Progress(ProgressError::CourseIncomplete { percent: 0, .. }))
        ));

        for id in ["install", "hello"] {
            session.complete_submodule("rust-101", "basics", id).unwrap();
        }
        for id in ["moves", "borrows", "lifetimes"] {
            session.complete_submodule("rust-101", "ownership", id).unwrap();
        }
        session
            .submit_quiz("rust-101", "ownership", &[Some(1), Some(1)])
            .unwrap();
        let out = session
            .complete_submodule("rust-101", "traits", "defining")
            .unwrap();
        assert!(out.level_completed);

        let cert = session.certificate("rust-101").unwrap();
        assert_eq!(cert.user, "ada");
        assert_eq!(cert.course_id, "rust-101");
    }

    fn long_level_catalog(with_quiz: bool) -> Catalog {
        let submodules = (0..200)
            .map(|i| SubModule {
                id: format!("s{i}"),
                title: format!("Step {i}"),
            })
            .collect();
        let quiz = with_quiz.then(|| Quiz {
            questions: vec![Question {
                prompt: "?".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                answer: 1,
            }],
            pass_percent: 60,
        });
        Catalog {
            courses: vec![Course {
                id: "long".to_string(),
                title: "Long".to_string(),
                levels: vec![
                    Level {
                        id: "drill".to_string(),
                        title: "Drill".to_string(),
                        submodules,
                        quiz,
                    },
                    Level {
                        id: "after".to_string(),
                        title: "After".to_string(),
                        submodules: vec![SubModule {
                            id: "wrap-up".to_string(),
                            title: "Wrap-up".to_string(),
                        }],
                        quiz: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn level_needs_every_submodule_not_a_rounded_hundred() {
        let catalog = long_level_catalog(false);
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        for i in 0..198 {
            let out = session
                .complete_submodule("long", "drill", &format!("s{i}"))
                .unwrap();
            assert!(!out.level_completed, "level completed after s{i}");
        }
        // 199 of 200 already rounds to 100
        let out = session.complete_submodule("long", "drill", "s198").unwrap();
        assert_eq!(out.level_percent, 100);
        assert_eq!(out.next_submodule.as_deref(), Some("s199"));
        assert!(!out.level_completed);
        assert!(matches!(
            session.complete_submodule("long", "after", "wrap-up"),
            Err(SessionError::Locked(_))
        ));

        let out = session.complete_submodule("long", "drill", "s199").unwrap();
        assert!(out.level_completed);
        session.complete_submodule("long", "after", "wrap-up").unwrap();
    }

    #[test]
    fn quiz_needs_every_submodule_not_a_rounded_hundred() {
        let catalog = long_level_catalog(true);
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        for i in 0..199 {
            session
                .complete_submodule("long", "drill", &format!("s{i}"))
                .unwrap();
        }
        assert!(matches!(
            session.submit_quiz("long", "drill", &[Some(1)]),
            Err(SessionError::Locked(_))
        ));

        session.complete_submodule("long", "drill", "s199").unwrap();
        let out = session.submit_quiz("long", "drill", &[Some(1)]).unwrap();
        assert!(out.level_completed);
    }

    #[test]
    fn quiz_only_level_completes_on_pass() {
        let json = r#"{"courses":[{"id":"c","title":"C","levels":[
            {"id":"exam","title":"Exam","quiz":{"questions":[{"prompt":"?","options":["a","b"],"answer":1}]}},
            {"id":"next","title":"Next","submodules":[{"id":"x","title":"X"}]}
        ]}]}"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        let store = MemoryStore::new();
        let mut session = ProgressSession::new("ada", &catalog, &store);

        let out = session.submit_quiz("c", "exam", &[Some(1)]).unwrap();
        assert!(out.level_completed);
        session.complete_submodule("c", "next", "x").unwrap();
    }

    #[test]
    fn read_failure_is_reported_as_store_error() {
        let err = SessionError::from(StoreError::InvalidUser("../x".to_string()));
        assert!(err.to_string().starts_with("store error: "));
    }
}
