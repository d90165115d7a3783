use serde::Deserialize;
use std::fmt;

/// A package or module to keep an eye on, tagged with where it comes from
/// (a package source such as `winget`, or a module repository such as
/// `PSGallery`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct UpdateTarget {
    #[serde(alias = "id", alias = "name")]
    pub identifier: String,
    #[serde(alias = "repository")]
    pub source: String,
}

impl UpdateTarget {
    #[must_use]
    pub fn new(identifier: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.source)
    }
}

/// A package as reported by the package manager. `available` is only set when
/// the manager advertises a different version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub id: String,
    pub version: String,
    pub available: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub identifier: String,
    pub reason: String,
}

impl UpdateNotice {
    #[must_use]
    pub fn version_mismatch(identifier: &str, installed: &str, available: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            reason: format!("installed {installed}, available {available}"),
        }
    }
}

impl fmt::Display for UpdateNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.identifier, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UpdateResult {
    #[default]
    UpToDate,
    Updates(Vec<UpdateNotice>),
}

impl UpdateResult {
    /// Collapse an empty list into [`UpdateResult::UpToDate`] so that
    /// `Updates` is never empty.
    #[must_use]
    pub fn from_notices(notices: Vec<UpdateNotice>) -> Self {
        if notices.is_empty() {
            Self::UpToDate
        } else {
            Self::Updates(notices)
        }
    }

    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Self::UpToDate)
    }

    #[must_use]
    pub fn notices(&self) -> &[UpdateNotice] {
        match self {
            Self::UpToDate => &[],
            Self::Updates(notices) => notices,
        }
    }
}
