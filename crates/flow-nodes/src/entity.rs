//! Entity type catalog

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Fields most entity types carry
pub const COMMON_FIELDS: [&str; 6] = ["id", "name", "code", "description", "created_at", "updated_at"];

/// Probe order used when the type of an id is unknown
pub const DETECTION_ORDER: [EntityType; 6] = [
    EntityType::Asset,
    EntityType::Shot,
    EntityType::Task,
    EntityType::Project,
    EntityType::HumanUser,
    EntityType::Sequence,
];

/// Production-tracking entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityType {
    Asset,
    Shot,
    Sequence,
    Project,
    Task,
    HumanUser,
    Note,
    Playlist,
    Version,
    /// Pipeline step a task belongs to
    Step,
    /// `CustomEntity01` ..= `CustomEntity10`
    Custom(u8),
}

impl EntityType {
    /// Every selectable type, in menu order
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut types = vec![
            Self::Asset,
            Self::Shot,
            Self::Sequence,
            Self::Project,
            Self::Task,
            Self::HumanUser,
            Self::Note,
            Self::Playlist,
            Self::Version,
            Self::Step,
        ];
        types.extend((1..=10).map(Self::Custom));
        types
    }

    /// Type name as used by the API (`"HumanUser"`)
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Asset => "Asset".into(),
            Self::Shot => "Shot".into(),
            Self::Sequence => "Sequence".into(),
            Self::Project => "Project".into(),
            Self::Task => "Task".into(),
            Self::HumanUser => "HumanUser".into(),
            Self::Note => "Note".into(),
            Self::Playlist => "Playlist".into(),
            Self::Version => "Version".into(),
            Self::Step => "Step".into(),
            Self::Custom(n) => format!("CustomEntity{n:02}"),
        }
    }

    /// REST collection segment (`assets`, `human_users`, `custom_entity_01`)
    #[must_use]
    pub fn api_segment(self) -> String {
        match self {
            Self::HumanUser => "human_users".into(),
            Self::Custom(n) => format!("custom_entity_{n:02}"),
            other => format!("{}s", other.name().to_lowercase()),
        }
    }

    /// Field list requested when the caller names none
    #[must_use]
    pub fn default_fields(self) -> Vec<&'static str> {
        let specific: &[&str] = match self {
            Self::Asset => &["sg_asset_type", "sg_status_list", "project"],
            Self::Shot => &["sg_sequence", "project", "sg_status_list"],
            Self::Sequence => &["project", "sg_status_list"],
            Self::Project => &["sg_status", "image"],
            Self::Task => &["content", "sg_status_list", "step", "task_assignees", "project", "entity"],
            Self::HumanUser => &["email", "login", "sg_status_list", "role", "firstname", "lastname"],
            Self::Version => &["project", "entity", "user"],
            Self::Note => &["subject", "note", "project", "entity", "user"],
            Self::Step => &["short_name", "entity_type"],
            Self::Playlist | Self::Custom(_) => &[],
        };

        let mut fields: Vec<&'static str> = COMMON_FIELDS.to_vec();
        for field in specific {
            if !fields.contains(field) {
                fields.push(field);
            }
        }
        fields
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for EntityType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s {
            "Asset" => Self::Asset,
            "Shot" => Self::Shot,
            "Sequence" => Self::Sequence,
            "Project" => Self::Project,
            "Task" => Self::Task,
            "HumanUser" => Self::HumanUser,
            "Note" => Self::Note,
            "Playlist" => Self::Playlist,
            "Version" => Self::Version,
            "Step" => Self::Step,
            other => other
                .strip_prefix("CustomEntity")
                .filter(|n| n.len() == 2)
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=10).contains(n))
                .map(Self::Custom)
                .ok_or_else(|| RecordError::UnknownEntityType(other.to_string()))?,
        };
        Ok(parsed)
    }
}

impl TryFrom<String> for EntityType {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.name()
    }
}

/// Entity type chosen on a node; `Unknown` asks for auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntitySelector {
    #[default]
    Unknown,
    Known(EntityType),
}

impl EntitySelector {
    /// Parse a host value; anything unrecognised counts as unknown
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.parse().map_or(Self::Unknown, Self::Known)
    }

    /// Known type, if any
    #[inline]
    #[must_use]
    pub fn known(self) -> Option<EntityType> {
        match self {
            Self::Known(t) => Some(t),
            Self::Unknown => None,
        }
    }
}

impl Display for EntitySelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Known(t) => t.fmt(f),
        }
    }
}
