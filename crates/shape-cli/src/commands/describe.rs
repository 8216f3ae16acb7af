use serde::Serialize;
use shape_config::ShapeConfig;
use shape_core::SchemaError;
use shape_schema::{AttributeDefinition, DefaultKind, DefaultValue, KeyMode, TypeCatalog};

use crate::cli::DescribeArgs;
use crate::output;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub mode: KeyMode,
    pub allow_dynamic_attributes: bool,
    pub ignore_nil_defaults: bool,
    pub attributes: Vec<AttributeDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDescription {
    pub key: String,
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

/// Handle `shape describe`.
pub fn handle(args: &DescribeArgs, config: &ShapeConfig) -> anyhow::Result<()> {
    let catalog = super::load_catalog(&args.schema, config)?;
    let descriptions = match args.schema.type_name.as_deref() {
        Some(name) => {
            if !catalog.contains(name) {
                return Err(SchemaError::UnknownRecordType(name.to_string()).into());
            }
            describe(&catalog)
                .into_iter()
                .filter(|description| description.name == name)
                .collect()
        }
        None => describe(&catalog),
    };
    output::output(&descriptions, &config.output)
}

/// Describe every type in declaration order.
pub fn describe(catalog: &TypeCatalog) -> Vec<TypeDescription> {
    catalog
        .names()
        .filter_map(|name| {
            let schema = catalog.schema(name)?;
            Some(TypeDescription {
                name: name.to_string(),
                parent: catalog.parent(name).map(str::to_string),
                mode: schema.mode(),
                allow_dynamic_attributes: schema.allow_dynamic_attributes(),
                ignore_nil_defaults: schema.ignore_nil_defaults(),
                attributes: schema
                    .attributes()
                    .map(|(key, definition)| AttributeDescription {
                        key: key.to_string(),
                        required: definition.required,
                        ty: definition.type_name(),
                        default: default_source(definition),
                    })
                    .collect(),
            })
        })
        .collect()
}

fn default_source(definition: &AttributeDefinition) -> Option<&'static str> {
    let explicit = definition.default.as_ref().map(DefaultValue::kind);
    match (explicit, definition.has_type_default()) {
        (Some(_), true) => Some("conflicting"),
        (Some(DefaultKind::Literal), false) => Some("literal"),
        (Some(DefaultKind::Thunk), false) => Some("thunk"),
        (Some(DefaultKind::Derived), false) => Some("derived"),
        (None, true) => Some("type"),
        (None, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shape_schema::{Propagation, RegistryPolicy, SchemaManifest};

    #[test]
    fn describes_types_and_attributes() {
        let catalog = SchemaManifest::from_toml_str(
            r#"
            [[types]]
            name = "User"
            mode = "indifferent"

            [[types.attributes]]
            key = "name"
            type = "string"
            type_default = "Yoda"

            [[types.attributes]]
            key = "role"
            required = false
            default = "guest"

            [[types]]
            name = "Admin"
            parent = "User"
            allow_dynamic_attributes = true
            "#,
        )
        .unwrap()
        .into_catalog(Propagation::Snapshot, RegistryPolicy::default())
        .unwrap();

        let descriptions = describe(&catalog);
        assert_eq!(descriptions.len(), 2);
        assert_eq!(
            descriptions[0].attributes,
            vec![
                AttributeDescription {
                    key: "name".into(),
                    required: true,
                    ty: Some("string".into()),
                    default: Some("type"),
                },
                AttributeDescription {
                    key: "role".into(),
                    required: false,
                    ty: None,
                    default: Some("literal"),
                },
            ]
        );
        assert_eq!(descriptions[1].parent.as_deref(), Some("User"));
        assert!(descriptions[1].allow_dynamic_attributes);
        assert_eq!(descriptions[1].mode, KeyMode::Indifferent);
    }
}
