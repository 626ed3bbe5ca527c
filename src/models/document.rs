use serde::{ Serialize, Deserialize };
use serde_json::Value;

/// A search hit projected to the fields the prompt needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub title: String,
    pub chunk: String,
    pub locations: String,
}

impl RetrievedDocument {
    pub fn new(
        title: impl Into<String>,
        chunk: impl Into<String>,
        locations: impl Into<String>
    ) -> Self {
        Self {
            title: title.into(),
            chunk: chunk.into(),
            locations: locations.into(),
        }
    }

    /// Builds a document from a raw index hit. Collection fields are joined
    /// with ", " and missing or null fields become empty strings.
    pub fn from_hit(hit: &Value) -> Self {
        Self {
            title: field_text(hit.get("title")),
            chunk: field_text(hit.get("chunk")),
            locations: field_text(hit.get("locations")),
        }
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) =>
            items
                .iter()
                .map(|item| field_text(Some(item)))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_hit_joins_collection_fields() {
        let hit = json!({
            "@search.score": 3.2,
            "title": "Report A",
            "chunk": "X occurred on day 1",
            "locations": ["Site 1", "Site 2"]
        });

        let doc = RetrievedDocument::from_hit(&hit);
        assert_eq!(doc, RetrievedDocument::new("Report A", "X occurred on day 1", "Site 1, Site 2"));
    }

    #[test]
    fn from_hit_tolerates_missing_and_null_fields() {
        let hit = json!({ "title": null, "chunk": "only content" });

        let doc = RetrievedDocument::from_hit(&hit);
        assert_eq!(doc.title, "");
        assert_eq!(doc.chunk, "only content");
        assert_eq!(doc.locations, "");
    }

    #[test]
    fn from_hit_stringifies_scalars() {
        let hit = json!({ "title": 42, "chunk": true, "locations": "Site 9" });

        let doc = RetrievedDocument::from_hit(&hit);
        assert_eq!(doc.title, "42");
        assert_eq!(doc.chunk, "true");
        assert_eq!(doc.locations, "Site 9");
    }
}
