/*!
# learntrack

Progression backend for an e-learning platform, built in Rust.

## Overview

A course is an ordered list of levels, and each level is an ordered list of
sub-modules. A learner may open the first entity of any list; every later
entity opens once its predecessor is completed. Progress lives in a profile
store as one completion record per scope, and everything the course pages
show (lock icons, progress bars, the "continue" entry, certificates) is
derived from those records by pure functions.

## Architecture

### Progression model
- **status**: two-flag per-entity status (`unlocked`, `completed`)
- **record**: completion record for one scope, absent entries read as locked
- **sequence**: ordered entity sequences and scope identifiers
- **progression**: accessibility, completion percent, current entity, mark-completed

### Curriculum
- **curriculum**: static catalog of courses, levels and sub-modules
- **quiz**: end-of-level quiz grading
- **dashboard**: per-course overview built from record snapshots
- **certificate**: completion certificates

### Persistence
- **store**: the `ProfileStore` contract with in-memory and JSON-file stores
- **saving**: gzip + bincode profile snapshots for backup and migration
- **session**: read-through cache that persists before it reports

### Front ends
- **app** (feature `web`): axum JSON API
- `learntrack` binary: command-line access to a JSON-file store

## REST API Endpoints

- `GET  /api/catalog` - Course list
- `GET  /api/{user}/progress?scope=` - Record, lock map, percent and current entity
- `POST /api/{user}/complete` - Complete a sub-module
- `POST /api/{user}/quiz` - Submit a level quiz
- `GET  /api/{user}/dashboard/{course}` - Course overview
- `GET  /api/{user}/certificate/{course}` - Issue a certificate
*/

pub mod certificate;
pub mod config;
pub mod curriculum;
pub mod dashboard;
pub mod error;
pub mod progression;
pub mod quiz;
pub mod record;
pub mod saving;
pub mod sequence;
pub mod session;
pub mod status;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

pub use certificate::Certificate;
pub use config::Config;
pub use curriculum::{Catalog, Course, Level, SubModule};
pub use dashboard::{CourseDashboard, LevelSummary};
pub use error::{ConfigError, ProgressError, SessionError, StoreError};
pub use progression::*;
pub use quiz::{Question, Quiz, QuizResult};
pub use record::CompletionRecord;
pub use sequence::{OrderedSequence, ScopeId};
pub use session::{CompletionOutcome, ProgressSession, QuizOutcome};
pub use status::EntityStatus;
pub use store::{JsonFileStore, MemoryStore, ProfileStore};
