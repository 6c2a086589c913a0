//! Content type discriminator carried by every search document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of native entity a search document was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Discussion,
    Group,
    Profile,
    Site,
}

/// Returned when a content type tag is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl ContentType {
    /// Every content type, in bulk provisioning order.
    pub const ALL: [ContentType; 5] = [
        ContentType::Post,
        ContentType::Profile,
        ContentType::Group,
        ContentType::Site,
        ContentType::Discussion,
    ];

    /// The wire tag for this content type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Discussion => "discussion",
            ContentType::Group => "group",
            ContentType::Profile => "profile",
            ContentType::Site => "site",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(ContentType::Post),
            "discussion" => Ok(ContentType::Discussion),
            "group" => Ok(ContentType::Group),
            "profile" => Ok(ContentType::Profile),
            "site" => Ok(ContentType::Site),
            _ => Err(UnknownContentType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!("post".parse::<ContentType>(), Ok(ContentType::Post));
        assert_eq!(" Site ".parse::<ContentType>(), Ok(ContentType::Site));
        assert_eq!(
            "discussion".parse::<ContentType>(),
            Ok(ContentType::Discussion)
        );
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = "forum".parse::<ContentType>().unwrap_err();
        assert_eq!(err, UnknownContentType("forum".to_string()));
    }

    #[test]
    fn test_display_matches_wire_tag() {
        for content_type in ContentType::ALL {
            assert_eq!(
                content_type.to_string().parse::<ContentType>(),
                Ok(content_type)
            );
        }
    }
}
