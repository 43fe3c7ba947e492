//! Response schema registry.
//!
//! One descriptor per operation kind. The descriptor is sent to Gemini as
//! `responseSchema` and is also what the gateway validates the parsed
//! response against: every declared field is required and must be non-empty.

use super::types::OperationKind;
use serde::Serialize;
use serde_json::{json, Value};

/// An output field of the generation bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Titles,
    Hashtags,
    Article,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Titles => "titles",
            Field::Hashtags => "hashtags",
            Field::Article => "article",
        }
    }

    /// Titles and hashtags are string lists; the article is a single string.
    pub fn is_list(self) -> bool {
        !matches!(self, Field::Article)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub field: Field,
    pub description: &'static str,
}

/// Required output shape for one operation kind.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

pub static FULL_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "full",
    fields: &[
        FieldSpec {
            field: Field::Titles,
            description: "Three SEO-optimized, keyword-rich headline options.",
        },
        FieldSpec {
            field: Field::Hashtags,
            description: "A list of 5-8 SEO-optimized hashtags.",
        },
        FieldSpec {
            field: Field::Article,
            description: "The full news article with a clear dateline and inverted pyramid structure.",
        },
    ],
};

pub static TITLES_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "titles",
    fields: &[FieldSpec {
        field: Field::Titles,
        description: "New SEO-optimized headline options with high search relevance, exactly as many as requested.",
    }],
};

pub static HASHTAGS_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "hashtags",
    fields: &[FieldSpec {
        field: Field::Hashtags,
        description: "A list of new SEO-optimized hashtags.",
    }],
};

pub static ARTICLE_SCHEMA: SchemaDescriptor = SchemaDescriptor {
    name: "article",
    fields: &[FieldSpec {
        field: Field::Article,
        description: "The rewritten news article, re-optimized for clarity and readability.",
    }],
};

impl SchemaDescriptor {
    pub fn for_operation(kind: OperationKind) -> &'static SchemaDescriptor {
        match kind {
            OperationKind::Full => &FULL_SCHEMA,
            OperationKind::Titles => &TITLES_SCHEMA,
            OperationKind::Hashtags => &HASHTAGS_SCHEMA,
            OperationKind::Article => &ARTICLE_SCHEMA,
        }
    }

    pub fn declares(&self, field: Field) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Render as a Gemini `responseSchema` (OpenAPI subset).
    ///
    /// `serde_json::Map` is ordered, so the rendering is deterministic.
    pub fn to_response_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for spec in self.fields {
            let property = if spec.field.is_list() {
                json!({
                    "type": "ARRAY",
                    "description": spec.description,
                    "items": { "type": "STRING" }
                })
            } else {
                json!({
                    "type": "STRING",
                    "description": spec.description
                })
            };
            properties.insert(spec.field.name().to_string(), property);
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.field.name()).collect();
        json!({
            "type": "OBJECT",
            "properties": properties,
            "required": required
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_schema_requires_all_three_fields() {
        let schema = SchemaDescriptor::for_operation(OperationKind::Full);
        assert!(schema.declares(Field::Titles));
        assert!(schema.declares(Field::Hashtags));
        assert!(schema.declares(Field::Article));

        let rendered = schema.to_response_schema();
        assert_eq!(rendered["type"], "OBJECT");
        assert_eq!(rendered["properties"]["titles"]["type"], "ARRAY");
        assert_eq!(rendered["properties"]["titles"]["items"]["type"], "STRING");
        assert_eq!(rendered["properties"]["article"]["type"], "STRING");
        assert_eq!(rendered["required"], json!(["titles", "hashtags", "article"]));
    }

    #[test]
    fn partial_schemas_declare_one_field() {
        for (kind, field) in [
            (OperationKind::Titles, Field::Titles),
            (OperationKind::Hashtags, Field::Hashtags),
            (OperationKind::Article, Field::Article),
        ] {
            let schema = SchemaDescriptor::for_operation(kind);
            assert_eq!(schema.fields.len(), 1);
            assert!(schema.declares(field));
            assert_eq!(schema.to_response_schema()["required"], json!([field.name()]));
        }
    }
}
