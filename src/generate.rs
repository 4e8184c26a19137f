//! Drives the emitter over whole entities.

use crate::ast::{EntityDescription, Schema};
use crate::emitter::{EmitError, MappingEmitter};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Entity {entity}: {source}")]
    Entity {
        entity: String,
        #[source]
        source: EmitError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Namespace wrapping each file; `None` uses the placeholder namespace
    pub namespace: Option<String>,
    /// Emit the using directives at the top of each file
    pub usings: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            usings: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub entity: String,
    pub file_name: String,
    pub contents: String,
}

/// Render one entity as a complete configuration file.
///
/// The emitter is reset first; on failure its partial text is left in place
/// for inspection.
pub fn generate_entity(
    emitter: &mut MappingEmitter<'_>,
    entity: &EntityDescription,
    options: &GenerateOptions,
) -> Result<String, GenerateError> {
    emitter.reset();
    emit_entity(emitter, entity, options).map_err(|source| GenerateError::Entity {
        entity: entity.name.clone(),
        source,
    })?;
    Ok(emitter.render().to_string())
}

fn emit_entity(
    emitter: &mut MappingEmitter<'_>,
    entity: &EntityDescription,
    options: &GenerateOptions,
) -> Result<(), EmitError> {
    log::debug!(
        "generating {} ({} columns, {} relationships)",
        entity.name,
        entity.columns.len(),
        entity.relationships.len()
    );

    if options.usings {
        emitter.default_usings()?;
    }
    emitter
        .namespace(options.namespace.as_deref())?
        .begin(&entity.name)?
        .table_mapping(&entity.table, &entity.schema)?
        .primary_key(entity.primary_keys.as_slice())?;

    for column in &entity.columns {
        emitter.column(column)?;
    }

    if !entity.relationships.is_empty() {
        emitter.blank_line()?;
    }
    for relationship in &entity.relationships {
        emitter.relationship(relationship, entity.primary_keys.as_slice())?;
    }

    emitter.end_entity()?;
    Ok(())
}

/// Render every entity of `schema`, in declaration order.
pub fn generate_schema(
    schema: &Schema,
    options: &GenerateOptions,
) -> Result<Vec<GeneratedFile>, GenerateError> {
    let mut emitter = MappingEmitter::default();

    schema
        .entities
        .iter()
        .map(|entity| {
            let contents = generate_entity(&mut emitter, entity, options)?;
            Ok(GeneratedFile {
                entity: entity.name.clone(),
                file_name: format!("{}Configuration.cs", entity.name),
                contents,
            })
        })
        .collect()
}
