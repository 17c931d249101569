use serde::{Deserialize, Serialize};

/// Lock/completion flags for a single entity (a course level or a sub-module).
///
/// The only legal walk is `locked -> unlocked -> completed`. Both setters
/// keep `completed => unlocked`, so a value built through them can never
/// report a completed-but-locked entity.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntityStatus {
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub completed: bool,
}

impl EntityStatus {
    pub const LOCKED: EntityStatus = EntityStatus {
        unlocked: false,
        completed: false,
    };

    pub const UNLOCKED: EntityStatus = EntityStatus {
        unlocked: true,
        completed: false,
    };

    pub const COMPLETED: EntityStatus = EntityStatus {
        unlocked: true,
        completed: true,
    };

    pub fn unlock(&mut self) {
        self.unlocked = true;
    }

    pub fn complete(&mut self) {
        self.unlocked = true;
        self.completed = true;
    }

    /// Field-level OR. Flags never go back to `false` through a merge.
    pub fn merge(&self, other: &EntityStatus) -> EntityStatus {
        EntityStatus {
            unlocked: self.unlocked || other.unlocked,
            completed: self.completed || other.completed,
        }
    }

    /// Restores `completed => unlocked` on values read from external data.
    pub fn normalized(&self) -> EntityStatus {
        EntityStatus {
            unlocked: self.unlocked || self.completed,
            completed: self.completed,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == EntityStatus::LOCKED
    }
}
