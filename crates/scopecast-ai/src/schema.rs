//! Response schema handed to the generation service. Mirrors
//! `scopecast_core::types::EstimateDocument` field for field.

use serde_json::{json, Value};

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn number() -> Value {
    json!({ "type": "NUMBER" })
}

fn integer() -> Value {
    json!({ "type": "INTEGER" })
}

fn level() -> Value {
    json!({ "type": "STRING", "enum": ["LOW", "MEDIUM", "HIGH"] })
}

fn range() -> Value {
    object(&[("min", number()), ("max", number())])
}

fn array(items: Value) -> Value {
    json!({ "type": "ARRAY", "items": items })
}

fn object(fields: &[(&str, Value)]) -> Value {
    let mut properties = serde_json::Map::new();
    for (name, schema) in fields {
        properties.insert((*name).to_string(), schema.clone());
    }
    let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": names,
        "propertyOrdering": names,
    })
}

pub fn estimate_schema() -> Value {
    let task = object(&[
        ("name", string()),
        ("hours", number()),
        ("role", string()),
        ("hourlyRate", number()),
    ]);
    let phase = object(&[
        ("name", string()),
        ("description", string()),
        ("complexity", level()),
        ("assignedRole", string()),
        ("tasks", array(task)),
        ("estimatedHours", number()),
        ("estimatedCost", number()),
    ]);

    object(&[
        ("projectName", string()),
        ("projectType", string()),
        ("summary", string()),
        ("currency", string()),
        ("totalCost", range()),
        ("totalHours", range()),
        ("durationWeeks", range()),
        (
            "roleRates",
            array(object(&[("role", string()), ("hourlyRate", number())])),
        ),
        (
            "costBreakdown",
            array(object(&[
                ("category", string()),
                ("amount", number()),
                ("percentage", number()),
            ])),
        ),
        (
            "roadmap",
            array(object(&[
                ("phase", string()),
                ("startWeek", integer()),
                ("endWeek", integer()),
                ("milestone", string()),
            ])),
        ),
        (
            "techStack",
            array(object(&[
                ("category", string()),
                ("technologies", array(string())),
            ])),
        ),
        ("phases", array(phase)),
        (
            "risks",
            array(object(&[
                ("title", string()),
                ("impact", level()),
                ("mitigation", string()),
            ])),
        ),
        (
            "teamComposition",
            array(object(&[
                ("role", string()),
                ("count", integer()),
                ("allocation", string()),
            ])),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopecast_core::types::fixtures::sample_document;

    #[test]
    fn schema_requires_every_top_level_field_of_the_document() {
        let schema = estimate_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        let doc = serde_json::to_value(sample_document()).unwrap();
        for key in doc.as_object().unwrap().keys() {
            assert!(required.contains(&key.as_str()), "schema missing {key}");
        }
    }

    #[test]
    fn task_schema_matches_wire_names() {
        let schema = estimate_schema();
        let task = &schema["properties"]["phases"]["items"]["properties"]["tasks"]["items"];
        for key in ["name", "hours", "role", "hourlyRate"] {
            assert!(task["properties"].get(key).is_some(), "task missing {key}");
        }
    }

    #[test]
    fn complexity_is_enumerated() {
        let schema = estimate_schema();
        let complexity = &schema["properties"]["phases"]["items"]["properties"]["complexity"];
        assert_eq!(complexity["enum"], json!(["LOW", "MEDIUM", "HIGH"]));
    }
}
