use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::StoreError;
use crate::store::{ProfileStore, UserRecords};

/// Every completion record of one user, as written to a `.bin.gz` backup.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ProfileSnapshot {
    pub user: String,
    pub scopes: UserRecords,
}

impl ProfileSnapshot {
    pub fn capture(store: &dyn ProfileStore, user: &str) -> Result<Self, StoreError> {
        Ok(ProfileSnapshot {
            user: user.to_string(),
            scopes: store.all_records(user)?,
        })
    }

    /// Merges every scope of the snapshot into `store`.
    pub fn restore(&self, store: &dyn ProfileStore) -> Result<(), StoreError> {
        for (scope, record) in &self.scopes {
            store.set_completion_record(&self.user, scope, record)?;
        }
        info!(user = %self.user, scopes = self.scopes.len(), "restored snapshot");
        Ok(())
    }
}

pub fn save_snapshot(snapshot: &ProfileSnapshot, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let file = File::create(path.as_ref())?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, snapshot)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .finish()?;

    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<ProfileSnapshot, StoreError> {
    let file = File::open(path.as_ref())?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let snapshot: ProfileSnapshot = deserialize_from(&mut reader)?;

    Ok(snapshot)
}
