use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub settings: Option<String>,
    pub location: Option<String>,
    pub film: Option<String>,
    pub tags: Option<String>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

/// Everything the caller supplies for a new record; id and timestamp are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub title: String,
    pub description: String,
    pub url: String,
    pub camera: Option<String>,
    pub lens: Option<String>,
    pub settings: Option<String>,
    pub location: Option<String>,
    pub film: Option<String>,
    pub tags: Option<String>,
    pub sort_order: i64,
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PhotoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub camera: Option<Option<String>>,
    pub lens: Option<Option<String>>,
    pub settings: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub film: Option<Option<String>>,
    pub tags: Option<Option<String>>,
    pub sort_order: Option<i64>,
}

impl PhotoUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.camera.is_none()
            && self.lens.is_none()
            && self.settings.is_none()
            && self.location.is_none()
            && self.film.is_none()
            && self.tags.is_none()
            && self.sort_order.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePhotoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub camera: Option<String>,
    #[serde(default)]
    pub lens: Option<String>,
    #[serde(default)]
    pub settings: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub film: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "lenient_sort_order")]
    pub sort_order: i64,
}

impl CreatePhotoRequest {
    pub fn into_new_photo(self) -> Result<NewPhoto, ApiError> {
        let title = self.title.filter(|t| !t.trim().is_empty());
        let url = self.url.filter(|u| !u.trim().is_empty());
        let (Some(title), Some(url)) = (title, url) else {
            return Err(ApiError::Validation(
                "Title and URL are required.".to_string(),
            ));
        };

        Ok(NewPhoto {
            title,
            description: self.description.unwrap_or_default(),
            url,
            camera: non_empty(self.camera),
            lens: non_empty(self.lens),
            settings: non_empty(self.settings),
            location: non_empty(self.location),
            film: non_empty(self.film),
            tags: non_empty(self.tags),
            sort_order: self.sort_order,
        })
    }
}

/// Body of `PUT /api/admin/photos/{id}`. Only keys present in the JSON are
/// written; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePhotoRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub camera: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub lens: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub settings: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub film: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_sort_order")]
    pub sort_order: Option<i64>,
}

impl UpdatePhotoRequest {
    pub fn into_update(self) -> Result<PhotoUpdate, ApiError> {
        let title = match self.title {
            Some(value) => Some(required(value, "Title cannot be empty.")?),
            None => None,
        };
        let url = match self.url {
            Some(value) => Some(required(value, "URL cannot be empty.")?),
            None => None,
        };

        Ok(PhotoUpdate {
            title,
            description: self.description.map(Option::unwrap_or_default),
            url,
            camera: self.camera.map(non_empty),
            lens: self.lens.map(non_empty),
            settings: self.settings.map(non_empty),
            location: self.location.map(non_empty),
            film: self.film.map(non_empty),
            tags: self.tags.map(non_empty),
            sort_order: self.sort_order,
        })
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(message.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Dashboard forms post numbers as strings; anything unparseable is 0.
fn sort_order_from_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn lenient_sort_order<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(sort_order_from_value(&value))
}

fn present_sort_order<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_sort_order(deserializer).map(Some)
}
