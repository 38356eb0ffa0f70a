/// Generate a tool input schema from a type.
///
/// Draft-07 is used since several MCP clients reject newer drafts.
#[macro_export]
macro_rules! schema_from_type {
    ($type:ty) => {{
        let settings = schemars::generate::SchemaSettings::draft07();
        let generator = settings.into_generator();
        let schema = generator.into_root_schema_for::<$type>();
        match serde_json::to_value(schema) {
            Ok(serde_json::Value::Object(schema)) => schema,
            _ => panic!("Failed to generate schema for {}", stringify!($type)),
        }
    }};
}

#[cfg(test)]
mod tests {
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(JsonSchema, Deserialize)]
    struct TestInput {
        #[allow(dead_code)]
        handle: String,

        /// Up to 250
        #[allow(dead_code)]
        #[schemars(range(min = 1, max = 250))]
        first: Option<u32>,
    }

    #[test]
    fn schema_from_type() {
        let schema = schema_from_type!(TestInput);

        assert_eq!(
            schema.get("$schema"),
            Some(&serde_json::json!("http://json-schema.org/draft-07/schema#"))
        );
        assert_eq!(schema.get("required"), Some(&serde_json::json!(["handle"])));
        assert_eq!(
            schema
                .get("properties")
                .and_then(|properties| properties.get("first"))
                .and_then(|first| first.get("maximum")),
            Some(&serde_json::json!(250))
        );
    }
}
