//! Version records returned by the production-tracking service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RecordError;

/// One "version" entity as returned by a metadata query.
///
/// The payload is kept as-is so it can be attached to the built media; the
/// accessors read the handful of attributes the pipeline needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionRecord(Value);

impl VersionRecord {
    /// Wraps a JSON payload. The payload must be an object.
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(RecordError::NotAnObject)
        }
    }

    /// Wraps a JSON object.
    pub fn from_object(object: serde_json::Map<String, Value>) -> Self {
        Self(Value::Object(object))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    /// Remote entity id.
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Display name for the media (`attributes.code`), falling back to the id.
    pub fn name(&self) -> String {
        self.attribute_str("code")
            .map(str::to_string)
            .or_else(|| self.id().map(|id| id.to_string()))
            .unwrap_or_else(|| "unnamed".to_string())
    }

    /// Project the version belongs to.
    pub fn project(&self) -> Option<&str> {
        self.attribute_str("sg_project_name")
    }

    /// Identifier used to look up supplementary sources.
    pub fn external_id(&self) -> Option<&str> {
        self.attribute_str("sg_ivy_dnuuid")
    }

    pub fn movie_path(&self) -> Option<&str> {
        self.attribute_str("sg_path_to_movie")
    }

    pub fn frames_path(&self) -> Option<&str> {
        self.attribute_str("sg_path_to_frames")
    }

    pub fn frame_range(&self) -> Option<&str> {
        self.attribute_str("frame_range")
    }

    /// Fixes records whose movie was filed as frames.
    ///
    /// When there is no movie path and the frames path has no `#` frame
    /// pattern, the frames path is really a movie and is moved over.
    pub fn normalize_media_paths(&mut self) {
        let misfiled = self.movie_path().is_none()
            && self.frames_path().is_some_and(|p| !p.contains('#'));
        if !misfiled {
            return;
        }

        if let Some(attributes) = self.0.get_mut("attributes").and_then(Value::as_object_mut) {
            let frames = attributes
                .insert("sg_path_to_frames".to_string(), Value::Null)
                .unwrap_or(Value::Null);
            attributes.insert("sg_path_to_movie".to_string(), frames);
        }
    }

    fn attribute_str(&self, key: &str) -> Option<&str> {
        self.0
            .get("attributes")
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(attributes: Value) -> VersionRecord {
        VersionRecord::from_json(json!({"id": 7, "type": "Version", "attributes": attributes}))
            .unwrap()
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            VersionRecord::from_json(json!([1, 2])),
            Err(RecordError::NotAnObject)
        ));
    }

    #[test]
    fn test_accessors() {
        let r = record(json!({
            "code": "abc_0010_comp_v012",
            "sg_project_name": "ABC",
            "sg_ivy_dnuuid": "5d1c0c52-52f8-4b8e-9a57-3c1b0b1f4c11",
            "sg_path_to_movie": "/shows/abc/movie.mov",
            "sg_path_to_frames": null,
            "frame_range": "1001-1100"
        }));

        assert_eq!(r.id(), Some(7));
        assert_eq!(r.name(), "abc_0010_comp_v012");
        assert_eq!(r.project(), Some("ABC"));
        assert!(r.external_id().is_some());
        assert_eq!(r.movie_path(), Some("/shows/abc/movie.mov"));
        assert_eq!(r.frames_path(), None);
        assert_eq!(r.frame_range(), Some("1001-1100"));
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let r = record(json!({}));
        assert_eq!(r.name(), "7");
    }

    #[test]
    fn test_normalize_moves_misfiled_movie() {
        let mut r = record(json!({
            "sg_path_to_movie": null,
            "sg_path_to_frames": "/shows/abc/review.mov"
        }));
        r.normalize_media_paths();
        assert_eq!(r.movie_path(), Some("/shows/abc/review.mov"));
        assert_eq!(r.frames_path(), None);
    }

    #[test]
    fn test_normalize_keeps_real_sequences() {
        let mut r = record(json!({
            "sg_path_to_movie": null,
            "sg_path_to_frames": "/shows/abc/comp.####.exr"
        }));
        let before = r.clone();
        r.normalize_media_paths();
        assert_eq!(r, before);
    }
}
