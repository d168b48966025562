use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("bundled schema does not compile: {0}")]
    Compile(String),
    #[error("document fails schema validation: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// included system schema
static SYSTEM_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/system.json"));

pub fn load_schema() -> Result<JSONSchema, SchemaError> {
    let schema: Value = serde_json::from_str(SYSTEM_SCHEMA).map_err(|err| SchemaError::Compile(err.to_string()))?;
    JSONSchema::compile(&schema).map_err(|err| SchemaError::Compile(err.to_string()))
}

pub fn validate(schema: &JSONSchema, document: &Value) -> Result<(), SchemaError> {
    info!("Validating raw document against JSON schema");
    let result = schema.validate(document);
    if let Err(errors) = result {
        let messages: Vec<String> = errors.map(|err| format!("{}: {}", err.instance_path, err)).collect();
        warn!("Document fails validation");
        return Err(SchemaError::Invalid(messages));
    }
    Ok(())
}
