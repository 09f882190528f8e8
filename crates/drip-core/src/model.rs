//! Domain types for drip content: lessons, sections, chains, and the
//! container ids a drag-and-drop UI uses to address them.

use serde::{Deserialize, Serialize};

/// Prefix of inventory section container ids (`section-<sectionId>`).
pub const SECTION_CONTAINER_PREFIX: &str = "section-";

/// Prefix of draggable lesson ids (`lesson-<lessonId>`).
pub const LESSON_DRAGGABLE_PREFIX: &str = "lesson-";

// ============================================================================
// LessonRef
// ============================================================================

/// Kind of lesson content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonType {
    /// Text lesson.
    #[default]
    Text,
    /// Video lesson.
    Video,
    /// Audio lesson.
    Audio,
    /// Test or quiz.
    Test,
}

impl std::fmt::Display for LessonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Video => write!(f, "VIDEO"),
            Self::Audio => write!(f, "AUDIO"),
            Self::Test => write!(f, "TEST"),
        }
    }
}

/// A lightweight pointer to a lesson.
///
/// Owned by the inventory; chains hold copies, so removing a chain entry
/// never touches the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRef {
    /// Lesson id as issued by the backend.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Kind of lesson.
    #[serde(rename = "type")]
    pub kind: LessonType,
}

impl LessonRef {
    /// Creates a new lesson reference.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: LessonType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
        }
    }

    /// Returns the draggable id for this lesson (`lesson-<id>`).
    #[must_use]
    pub fn draggable_id(&self) -> String {
        format!("{LESSON_DRAGGABLE_PREFIX}{}", self.id)
    }
}

// ============================================================================
// Section
// ============================================================================

/// A course section with its lessons, in course order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section id as issued by the backend.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Lessons in course order.
    #[serde(default)]
    pub lessons: Vec<LessonRef>,
}

impl Section {
    /// Creates a section with no lessons.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lessons: Vec::new(),
        }
    }

    /// Returns the drop-disabled container id for this section.
    #[must_use]
    pub fn container_id(&self) -> ContainerId {
        ContainerId::Section(self.id.clone())
    }
}

// ============================================================================
// DripChain
// ============================================================================

/// An ordered prerequisite path: `lessons[i]` must be completed before
/// `lessons[i + 1]` unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DripChain {
    /// Chain id, synthesized by the store (`drip-<n>`).
    pub id: String,
    /// Lessons in unlock order.
    pub lessons: Vec<LessonRef>,
}

impl DripChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lessons: Vec::new(),
        }
    }

    /// Returns `true` if the chain holds a lesson with the given id.
    #[must_use]
    pub fn contains(&self, lesson_id: &str) -> bool {
        self.lessons.iter().any(|l| l.id == lesson_id)
    }

    /// Returns the position of the lesson with the given id.
    #[must_use]
    pub fn position(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == lesson_id)
    }

    /// Number of lessons in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    /// Returns `true` if the chain has no lessons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Returns the lesson ids in unlock order.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<&str> {
        self.lessons.iter().map(|l| l.id.as_str()).collect()
    }

    /// Returns the container id for this chain.
    #[must_use]
    pub fn container_id(&self) -> ContainerId {
        ContainerId::Chain(self.id.clone())
    }
}

// ============================================================================
// ContainerId
// ============================================================================

/// A drag-and-drop container: an inventory section or a chain.
///
/// Serialized as the raw string the UI uses: `section-<id>` for sections,
/// the chain id otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerId {
    /// Inventory section (drop-disabled).
    Section(String),
    /// Drip chain.
    Chain(String),
}

impl ContainerId {
    /// Parses a raw container id.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix(SECTION_CONTAINER_PREFIX).map_or_else(
            || Self::Chain(raw.to_string()),
            |section_id| Self::Section(section_id.to_string()),
        )
    }

    /// Returns `true` for inventory section containers.
    #[must_use]
    pub const fn is_section(&self) -> bool {
        matches!(self, Self::Section(_))
    }

    /// Returns the chain id if this is a chain container.
    #[must_use]
    pub fn as_chain(&self) -> Option<&str> {
        match self {
            Self::Chain(id) => Some(id),
            Self::Section(_) => None,
        }
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Section(id) => write!(f, "{SECTION_CONTAINER_PREFIX}{id}"),
            Self::Chain(id) => write!(f, "{id}"),
        }
    }
}

impl From<String> for ContainerId {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.to_string()
    }
}
