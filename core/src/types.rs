use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct PhotoId(pub u64);

impl Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("{}", self.0))
    }
}

impl FromStr for PhotoId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size variants a photo can be backed up in. Declaration order is the
/// processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, StrumDisplay)]
pub enum RenditionKind {
    Original,
    Medium,
    Square,
}

impl RenditionKind {
    /// Suffix appended to the file stem. Part of the on-disk layout, never
    /// configurable.
    pub fn suffix(&self) -> &'static str {
        match self {
            RenditionKind::Original => "",
            RenditionKind::Medium => "_m",
            RenditionKind::Square => "_s",
        }
    }

    /// Label used by the size listing call
    pub fn size_label(&self) -> &'static str {
        match self {
            RenditionKind::Original => "Original",
            RenditionKind::Medium => "Medium",
            RenditionKind::Square => "Square",
        }
    }

    pub fn config_key(&self) -> &'static str {
        match self {
            RenditionKind::Original => "original",
            RenditionKind::Medium => "medium",
            RenditionKind::Square => "square",
        }
    }

    pub fn enabled_by_default(&self) -> bool {
        matches!(self, RenditionKind::Original)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub is_public: bool,
    pub is_family: bool,
    pub is_friend: bool,
}

impl Visibility {
    pub fn classification(&self) -> &'static str {
        if self.is_public {
            "public"
        } else if self.is_family && self.is_friend {
            "family;friend"
        } else if self.is_family {
            "family"
        } else if self.is_friend {
            "friend"
        } else {
            "private"
        }
    }
}

/// Licence document for the numeric licence identifiers of the remote service
pub fn license_uri(license: &str) -> Option<&'static str> {
    match license.trim() {
        "1" => Some("https://creativecommons.org/licenses/by-nc-sa/2.0/"),
        "2" => Some("https://creativecommons.org/licenses/by-nc/2.0/"),
        "3" => Some("https://creativecommons.org/licenses/by-nc-nd/2.0/"),
        "4" => Some("https://creativecommons.org/licenses/by/2.0/"),
        "5" => Some("https://creativecommons.org/licenses/by-sa/2.0/"),
        "6" => Some("https://creativecommons.org/licenses/by-nd/2.0/"),
        "9" => Some("https://creativecommons.org/publicdomain/zero/1.0/"),
        "10" => Some("https://creativecommons.org/publicdomain/mark/1.0/"),
        _ => None,
    }
}
