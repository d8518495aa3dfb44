use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which metadata the model is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerateField {
    Title,
    Description,
    Tags,
    /// Title and description together.
    #[default]
    Both,
}

impl GenerateField {
    /// Anything other than the three single-field names means `Both`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("title") => GenerateField::Title,
            Some("description") => GenerateField::Description,
            Some("tags") => GenerateField::Tags,
            _ => GenerateField::Both,
        }
    }

    pub fn wants_title(self) -> bool {
        matches!(self, GenerateField::Title | GenerateField::Both)
    }

    pub fn wants_description(self) -> bool {
        matches!(self, GenerateField::Description | GenerateField::Both)
    }

    pub fn wants_tags(self) -> bool {
        self == GenerateField::Tags
    }
}

/// Request body for `POST /api/admin/generate`. Fields are loosely typed so a
/// wrong type reads as "absent" instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub field: Option<Value>,
}

impl GenerateRequest {
    pub fn image_url(&self) -> Option<&str> {
        self.image_url
            .as_ref()
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn location(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    pub fn field(&self) -> GenerateField {
        GenerateField::parse(self.field.as_ref().and_then(Value::as_str))
    }
}

/// Only the requested fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}
