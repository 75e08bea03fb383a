//! Pulling version records and request context out of query payloads.

use serde_json::Value;

use super::{RecordError, VersionRecord};
use crate::media::Flag;

/// Where version lists can live in a query payload, tried in order:
/// a playlist with its versions, a plain entity list, a wrapped result.
const VERSION_LIST_POINTERS: [&str; 3] = [
    "/data/relationships/versions/data",
    "/data",
    "/result/data",
];

/// Extracts version records from a query payload.
pub fn extract_version_records(payload: &Value) -> Result<Vec<VersionRecord>, RecordError> {
    let list = VERSION_LIST_POINTERS
        .iter()
        .find_map(|pointer| payload.pointer(pointer).and_then(Value::as_array))
        .ok_or_else(|| {
            RecordError::InvalidPayload("no version list found in payload".to_string())
        })?;

    list.iter()
        .cloned()
        .map(VersionRecord::from_json)
        .collect()
}

/// Build hints a payload can carry in its `context` object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadContext {
    /// Preferred visual source names, in order.
    pub visual_sources: Vec<String>,
    /// Preferred audio source names, in order.
    pub audio_sources: Vec<String>,
    /// Flag to apply; only present when both colour and text are set.
    pub flag: Option<Flag>,
}

impl PayloadContext {
    /// Reads the `context` object of a payload. Missing fields are empty.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(context) = payload.get("context") else {
            return Self::default();
        };

        let names = |key: &str| -> Vec<String> {
            context
                .get(key)
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        let text = |key: &str| {
            context
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };

        let flag = match (text("flag_colour"), text("flag_text")) {
            (Some(colour), Some(label)) => Some(Flag::new(colour, label)),
            _ => None,
        };

        Self {
            visual_sources: names("visual_source"),
            audio_sources: names("audio_source"),
            flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(id: i64) -> Value {
        json!({"id": id, "type": "Version", "attributes": {"code": format!("v{}", id)}})
    }

    #[test]
    fn test_extract_from_playlist_payload() {
        let payload = json!({
            "data": {
                "type": "Playlist",
                "relationships": {"versions": {"data": [version(1), version(2)]}}
            }
        });
        let records = extract_version_records(&payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name(), "v2");
    }

    #[test]
    fn test_extract_from_entity_list() {
        let payload = json!({"data": [version(3)]});
        let records = extract_version_records(&payload).unwrap();
        assert_eq!(records[0].id(), Some(3));
    }

    #[test]
    fn test_extract_from_wrapped_result() {
        let payload = json!({"result": {"data": [version(4), version(5)]}});
        assert_eq!(extract_version_records(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_extract_empty_list_is_ok() {
        let payload = json!({"data": []});
        assert!(extract_version_records(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_extract_invalid_payload() {
        let payload = json!({"errors": ["nope"]});
        assert!(matches!(
            extract_version_records(&payload),
            Err(RecordError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_extract_rejects_non_object_entries() {
        let payload = json!({"data": [version(1), "oops"]});
        assert!(matches!(
            extract_version_records(&payload),
            Err(RecordError::NotAnObject)
        ));
    }

    #[test]
    fn test_context_options() {
        let payload = json!({
            "data": [],
            "context": {
                "visual_source": ["movie_dneg", "SG Frames"],
                "audio_source": ["movie_dneg"],
                "flag_colour": "#FF00FF00",
                "flag_text": "Client"
            }
        });
        let context = PayloadContext::from_payload(&payload);
        assert_eq!(context.visual_sources, vec!["movie_dneg", "SG Frames"]);
        assert_eq!(context.audio_sources, vec!["movie_dneg"]);
        assert_eq!(context.flag, Some(Flag::new("#FF00FF00", "Client")));
    }

    #[test]
    fn test_context_flag_needs_both_fields() {
        let payload = json!({"context": {"flag_colour": "#FF00FF00", "flag_text": ""}});
        assert_eq!(PayloadContext::from_payload(&payload).flag, None);
        assert_eq!(PayloadContext::from_payload(&json!({})), PayloadContext::default());
    }
}
