//! Core entity types consumed by the streaming engine.

use crate::ids::{UserId, VideoId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored media file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Display name of the file.
    pub name: String,
    /// Location of the media file.
    pub path: PathBuf,
    /// Owner of the file.
    pub user_id: UserId,
}

impl Resource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, user_id: UserId) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            user_id,
        }
    }

    pub fn filepath(&self) -> &Path {
        &self.path
    }
}

/// A video aggregate: metadata plus the resource it streams from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub name: String,
    pub user_id: UserId,
    pub resource: Resource,
}

impl Video {
    /// Whether the video belongs to the given user.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
