use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Outcome of one optional report section.
///
/// A section whose inputs were unavailable degrades instead of failing the
/// report. Degraded sections serialise as an empty object.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Degraded { reason: String },
}

impl<T> Section<T> {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Section::Degraded {
            reason: reason.into(),
        }
    }

    /// `Ready` when the value is present, otherwise degraded with `reason`.
    pub fn from_option(value: Option<T>, reason: impl Into<String>) -> Self {
        match value {
            Some(v) => Section::Ready(v),
            None => Section::degraded(reason),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_ready()
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            Section::Degraded { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Section::Ready(_) => None,
            Section::Degraded { reason } => Some(reason),
        }
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Section::Ready(v) => v.serialize(serializer),
            Section::Degraded { .. } => serializer.serialize_map(Some(0))?.end(),
        }
    }
}
