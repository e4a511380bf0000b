//! Translation between remote documents and dual-identity records.
//!
//! Both directions are pure. Reading a document never fails: absent or
//! wrongly-typed fields fall back to defaults so that one partial document
//! cannot block a whole pull. Writing projects only the fields the remote
//! schema knows; the local key never leaves the device.

use crate::document::{FieldMap, FieldValue, RemoteDocument};
use crate::identity::{Identity, RemoteId};
use crate::model::{Tag, Task, TaskTagLink};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Remote field names.
pub mod fields {
    pub const TITLE: &str = "Title";
    pub const DESCRIPTION: &str = "Description";
    pub const IS_DONE: &str = "IsDone";
    /// Older clients wrote the completion flag under this name.
    pub const IS_COMPLETE_LEGACY: &str = "IsComplete";
    pub const CREATED_AT: &str = "CreatedAt";
    pub const TAG_IDS: &str = "TagIds";
    pub const NAME: &str = "Name";
    pub const TASK_ID: &str = "TaskId";
    pub const TAG_ID: &str = "TagId";
}

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_TAG_NAME: &str = "No Name";

impl Task {
    /// Builds a record from a pulled document. Both keys are set to the
    /// document id, so the result is never pending. `now` is used when the
    /// document has no creation timestamp.
    pub fn from_document(doc: &RemoteDocument, now: DateTime<Utc>) -> Self {
        let title = string_field(doc, fields::TITLE).unwrap_or(DEFAULT_TITLE);
        let description = string_field(doc, fields::DESCRIPTION).unwrap_or_default();
        let is_complete = doc
            .get(fields::IS_DONE)
            .or_else(|| doc.get(fields::IS_COMPLETE_LEGACY))
            .and_then(FieldValue::as_bool)
            .unwrap_or(false);
        let created_at = doc
            .get(fields::CREATED_AT)
            .and_then(FieldValue::as_timestamp)
            .unwrap_or(now);
        let tag_ids: BTreeSet<RemoteId> = doc
            .get(fields::TAG_IDS)
            .and_then(FieldValue::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(FieldValue::as_str)
            .map(RemoteId::new)
            .collect();

        Self {
            identity: Identity::from_remote(doc.id.clone()),
            title: title.to_string(),
            description: description.to_string(),
            is_complete,
            created_at,
            tag_ids,
        }
    }

    /// Projects the fields the remote schema recognizes.
    pub fn to_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(fields::TITLE.into(), self.title.as_str().into());
        map.insert(fields::DESCRIPTION.into(), self.description.as_str().into());
        map.insert(fields::IS_DONE.into(), self.is_complete.into());
        map.insert(fields::CREATED_AT.into(), self.created_at.into());
        map.insert(
            fields::TAG_IDS.into(),
            FieldValue::array(self.tag_ids.iter().map(|t| t.as_str().into())),
        );
        map
    }
}

impl Tag {
    pub fn from_document(doc: &RemoteDocument) -> Self {
        Self {
            identity: Identity::from_remote(doc.id.clone()),
            name: string_field(doc, fields::NAME)
                .unwrap_or(DEFAULT_TAG_NAME)
                .to_string(),
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(fields::NAME.into(), self.name.as_str().into());
        map
    }
}

impl TaskTagLink {
    pub fn to_fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(fields::TASK_ID.into(), self.task_id.as_str().into());
        map.insert(fields::TAG_ID.into(), self.tag_id.as_str().into());
        map
    }
}

fn string_field<'a>(doc: &'a RemoteDocument, name: &str) -> Option<&'a str> {
    doc.get(name).and_then(FieldValue::as_str)
}
