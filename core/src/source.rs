//! Raw model sources.
//!
//! A source turns an opaque byte stream into a [`RawModel`]. The compiler
//! never looks at bytes itself; JSON is the one format shipped here.

use crate::{CoreError, CoreResult, RawModel};

/// Produces raw model descriptors from bytes.
pub trait RawModelSource {
    fn parse(&self, bytes: &[u8]) -> CoreResult<RawModel>;
}

/// Reads descriptors written as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelSource;

impl JsonModelSource {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON string.
    pub fn parse_str(&self, text: &str) -> CoreResult<RawModel> {
        self.parse(text.as_bytes())
    }

    /// Write a descriptor back out as pretty JSON.
    pub fn to_json(&self, model: &RawModel) -> CoreResult<String> {
        serde_json::to_string_pretty(model).map_err(|e| CoreError::model_parse(e.to_string()))
    }
}

impl RawModelSource for JsonModelSource {
    fn parse(&self, bytes: &[u8]) -> CoreResult<RawModel> {
        let model: RawModel =
            serde_json::from_slice(bytes).map_err(|e| CoreError::model_parse(e.to_string()))?;
        if model.name.trim().is_empty() {
            return Err(CoreError::model_parse("model has no name"));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;
    use pretty_assertions::assert_eq;

    const MODEL_JSON: &str = r#"{
        "name": "test:model",
        "namespaces": [{ "uri": "urn:test", "prefix": "test" }],
        "imports": [{ "uri": "urn:dictionary", "prefix": "d" }],
        "types": [{
            "name": "test:base",
            "archive": true,
            "properties": [{
                "name": "test:prop1",
                "type": "d:text",
                "mandatory": true,
                "constraints": [
                    { "type": "REGEX", "parameters": [{ "name": "expression", "value": "[A-Z]*" }] },
                    { "ref": "test:list1" }
                ]
            }]
        }],
        "constraints": [{
            "name": "test:list1",
            "type": "LIST",
            "parameters": [{ "name": "allowedValues", "value": ["ABC", "DEF"] }]
        }]
    }"#;

    #[test]
    fn test_parse_json_model() {
        // GIVEN a JSON descriptor
        let source = JsonModelSource::new();

        // WHEN parsed
        let model = source.parse_str(MODEL_JSON).unwrap();

        // THEN fields land where expected, with defaults for the rest
        assert_eq!(model.name, "test:model");
        assert_eq!(model.types[0].archive, Some(true));
        let prop = &model.types[0].properties[0];
        assert_eq!(prop.type_name, "d:text");
        assert!(prop.mandatory);
        assert!(!prop.multi_valued);
        assert!(prop.index.enabled);
        assert_eq!(prop.constraints[1].reference.as_deref(), Some("test:list1"));
        assert_eq!(
            model.constraints[0].parameters[0].value,
            ParamValue::List(vec!["ABC".to_string(), "DEF".to_string()])
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let source = JsonModelSource::new();

        assert!(matches!(
            source.parse(b"not json"),
            Err(CoreError::ModelParse { .. })
        ));
        assert!(source.parse_str("{}").is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_model() {
        let source = JsonModelSource::new();
        let model = source.parse_str(MODEL_JSON).unwrap();

        let text = source.to_json(&model).unwrap();

        assert_eq!(source.parse_str(&text).unwrap(), model);
    }
}
