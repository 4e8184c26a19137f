//! Mapping emitter: renders one entity's fluent configuration as text.
//!
//! The emitter is an append-only text buffer with a small amount of state
//! tracking which blocks are open. Statements are appended in the order the
//! caller invokes the steps; [`generate_entity`](crate::generate::generate_entity)
//! drives them in the canonical section order (table, key, columns,
//! relationships).

use crate::ast::{
    Cardinality, ColumnDescription, DeleteBehavior, GenerationOption, RelationshipDescription,
    RelationshipEndpoint,
};
use crate::syntax::{Syntax, fill};
use std::fmt;

const CLASS_INDENT: usize = 1;
const METHOD_INDENT: usize = 2;
const STATEMENT_INDENT: usize = METHOD_INDENT + 1;
const JOIN_INDENT: usize = STATEMENT_INDENT + 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Unsupported cardinality: {0}")]
    UnsupportedCardinality(Cardinality),
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

/// Produces one optional fragment of a column statement.
pub type ColumnClause = fn(&Syntax, &ColumnDescription) -> Option<String>;

/// Column statement pipeline, in emission order.
pub const COLUMN_CLAUSES: &[ColumnClause] = &[
    property_clause,
    column_name_clause,
    column_type_clause,
    nullability_clause,
    fixed_length_clause,
    max_length_clause,
    generation_option_clause,
];

fn property_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    Some(fill(syntax.property, &[&column.property_name]))
}

fn column_name_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    Some(fill(syntax.column_name, &[&column.column_name]))
}

fn column_type_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    Some(fill(syntax.column_type, &[&column.sql_type]))
}

fn nullability_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    let clause = if column.is_nullable {
        syntax.optional
    } else {
        syntax.required
    };
    Some(clause.to_string())
}

fn fixed_length_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    (column.is_fixed_length == Some(true)).then(|| syntax.fixed_length.to_string())
}

fn max_length_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    (column.max_length > 0).then(|| fill(syntax.max_length, &[&column.max_length.to_string()]))
}

fn generation_option_clause(syntax: &Syntax, column: &ColumnDescription) -> Option<String> {
    let clause = match column.generation_option()? {
        GenerationOption::Identity => syntax.identity,
        GenerationOption::Computed => syntax.computed,
        GenerationOption::PrimaryKey => syntax.not_generated,
    };
    Some(clause.to_string())
}

#[derive(Debug, Clone, Default)]
struct State {
    namespace_open: bool,
    entity: Option<String>,
    /// Buffer offset where the open entity block starts
    entity_start: usize,
    /// Set once anything other than usings has been written
    started: bool,
}

/// Builder that accumulates mapping configuration text.
///
/// Every step returns `&mut Self` so calls can be chained with `?`:
///
/// ```
/// use fluentgen::emitter::MappingEmitter;
///
/// let mut emitter = MappingEmitter::default();
/// emitter
///     .begin("Order")?
///     .table_mapping("Orders", "dbo")?
///     .primary_key(&["Id"])?
///     .end_entity()?;
/// assert!(emitter.render().contains("HasKey(e => e.Id);"));
/// # Ok::<(), fluentgen::emitter::EmitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MappingEmitter<'s> {
    syntax: &'s Syntax,
    buf: String,
    state: State,
}

impl Default for MappingEmitter<'static> {
    fn default() -> Self {
        Self::new(&Syntax::ENTITY_FRAMEWORK)
    }
}

impl<'s> MappingEmitter<'s> {
    pub fn new(syntax: &'s Syntax) -> Self {
        Self {
            syntax,
            buf: String::new(),
            state: State::default(),
        }
    }

    pub fn syntax(&self) -> &Syntax {
        self.syntax
    }

    /// Using directives for the generated file, followed by a blank line.
    pub fn default_usings(&mut self) -> Result<&mut Self, EmitError> {
        if self.state.started {
            return Err(EmitError::InvalidState(
                "usings must precede the namespace and entity blocks",
            ));
        }

        for using in self.syntax.usings {
            self.line(0, using);
        }
        self.buf.push('\n');
        Ok(self)
    }

    /// Opens a namespace block. `None` or an empty name uses the placeholder
    /// namespace of the syntax table.
    pub fn namespace(&mut self, name: Option<&str>) -> Result<&mut Self, EmitError> {
        if self.state.namespace_open {
            return Err(EmitError::InvalidState("namespace already open"));
        }
        if self.state.entity.is_some() {
            return Err(EmitError::InvalidState(
                "namespace cannot be opened inside an entity block",
            ));
        }

        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or(self.syntax.default_namespace);
        self.line(0, &fill(self.syntax.namespace_open, &[name]));
        self.line(0, self.syntax.block_open);

        self.state.namespace_open = true;
        self.state.started = true;
        Ok(self)
    }

    /// Opens the configuration block for `entity`.
    ///
    /// An entity block that is still open is discarded, along with every
    /// statement written into it, before the new block starts.
    pub fn begin(&mut self, entity: &str) -> Result<&mut Self, EmitError> {
        if let Some(previous) = self.state.entity.take() {
            log::warn!("{} was not ended, discarding its partial block", previous);
            self.buf.truncate(self.state.entity_start);
        }

        self.state.entity_start = self.buf.len();
        let syntax = self.syntax;
        self.line(CLASS_INDENT, &fill(syntax.class_header, &[entity]));
        self.line(CLASS_INDENT, syntax.block_open);
        self.line(METHOD_INDENT, &fill(syntax.constructor_header, &[entity]));
        self.line(METHOD_INDENT, syntax.block_open);

        self.state.entity = Some(entity.to_string());
        self.state.started = true;
        Ok(self)
    }

    pub fn table_mapping(&mut self, table: &str, schema: &str) -> Result<&mut Self, EmitError> {
        self.require_entity()?;
        let stmt = fill(self.syntax.to_table, &[table, schema]);
        self.statement(&stmt);
        Ok(self)
    }

    /// Single-property key, or a composite key in the order given.
    pub fn primary_key(&mut self, keys: &[impl AsRef<str>]) -> Result<&mut Self, EmitError> {
        self.require_entity()?;
        if keys.is_empty() {
            return Err(EmitError::InvalidSchema(format!(
                "entity {} has no primary key",
                self.current_entity()
            )));
        }

        let stmt = fill(self.syntax.has_key, &[&self.syntax.property_list(keys)]);
        self.statement(&stmt);
        Ok(self)
    }

    pub fn column(&mut self, column: &ColumnDescription) -> Result<&mut Self, EmitError> {
        self.require_entity()?;

        let stmt: String = COLUMN_CLAUSES
            .iter()
            .filter_map(|clause| clause(self.syntax, column))
            .collect();
        self.statement(&stmt);
        Ok(self)
    }

    /// Appends one relationship statement.
    ///
    /// `primary_keys` are the owning entity's keys; they are removed from the
    /// relationship's foreign keys before the foreign key clause is built.
    /// Nothing is appended if the relationship is rejected.
    pub fn relationship(
        &mut self,
        relationship: &RelationshipDescription,
        primary_keys: &[impl AsRef<str>],
    ) -> Result<&mut Self, EmitError> {
        self.require_entity()?;

        let mut stmt = self.owning_clause(&relationship.from)?;
        stmt.push_str(&self.owned_clause(relationship, primary_keys)?);

        if !relationship.is_many_to_many {
            match relationship.delete_behavior {
                DeleteBehavior::Cascade => stmt.push_str(self.syntax.cascade_on),
                DeleteBehavior::None => stmt.push_str(self.syntax.cascade_off),
                DeleteBehavior::Unspecified => {}
            }
        }

        log::debug!(
            "{} -> {}: {} -- {}",
            self.current_entity(),
            relationship.target,
            relationship.from.cardinality,
            relationship.to.cardinality
        );

        self.statement(&stmt);
        Ok(self)
    }

    pub fn blank_line(&mut self) -> Result<&mut Self, EmitError> {
        self.require_entity()?;
        self.buf.push('\n');
        Ok(self)
    }

    /// Closes the block opened by [`begin`](Self::begin), and the namespace
    /// block if one is open.
    pub fn end_entity(&mut self) -> Result<&mut Self, EmitError> {
        if self.state.entity.take().is_none() {
            return Err(EmitError::InvalidState("end_entity without matching begin"));
        }

        let close = self.syntax.block_close;
        self.line(METHOD_INDENT, close);
        self.line(CLASS_INDENT, close);
        if self.state.namespace_open {
            self.line(0, close);
            self.state.namespace_open = false;
        }
        Ok(self)
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = State::default();
    }

    /// Text accumulated so far. May be partial.
    pub fn render(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn owning_clause(&self, from: &RelationshipEndpoint) -> Result<String, EmitError> {
        if from.navigation_property.is_empty() {
            return Err(EmitError::InvalidSchema(format!(
                "relationship on {} has no navigation property",
                self.current_entity()
            )));
        }

        let template = match from.cardinality {
            Cardinality::ZeroOrOne => self.syntax.has_optional,
            Cardinality::ExactlyOne => self.syntax.has_required,
            Cardinality::Many => self.syntax.has_many,
            other @ Cardinality::OneOrMore => return Err(EmitError::UnsupportedCardinality(other)),
        };
        Ok(fill(template, &[&from.navigation_property]))
    }

    fn owned_clause(
        &self,
        relationship: &RelationshipDescription,
        primary_keys: &[impl AsRef<str>],
    ) -> Result<String, EmitError> {
        let syntax = self.syntax;
        let to = &relationship.to;
        let navigation = if to.navigation_property.is_empty() {
            String::new()
        } else {
            fill(syntax.navigation_ref, &[&to.navigation_property])
        };

        let template = match to.cardinality {
            Cardinality::ZeroOrOne => syntax.with_optional,
            Cardinality::ExactlyOne => syntax.with_required,
            Cardinality::Many if relationship.from.cardinality == Cardinality::Many => {
                let mut clause = fill(syntax.with_many, &[&navigation]);
                clause.push_str(&self.join_block(relationship)?);
                return Ok(clause);
            }
            Cardinality::Many => syntax.with_many,
            other @ Cardinality::OneOrMore => return Err(EmitError::UnsupportedCardinality(other)),
        };

        let mut clause = fill(template, &[&navigation]);
        if !relationship.is_many_to_many && !relationship.is_zero_or_one_to_one {
            if let Some(fk) = self.foreign_key_clause(relationship, primary_keys) {
                clause.push_str(&fk);
            }
        }
        Ok(clause)
    }

    fn foreign_key_clause(
        &self,
        relationship: &RelationshipDescription,
        primary_keys: &[impl AsRef<str>],
    ) -> Option<String> {
        let mut keys: Vec<&str> = Vec::with_capacity(relationship.foreign_keys.len());
        for fk in &relationship.foreign_keys {
            let is_primary = primary_keys.iter().any(|pk| pk.as_ref() == fk.as_str());
            if !is_primary && !keys.contains(&fk.as_str()) {
                keys.push(fk);
            }
        }

        if keys.is_empty() {
            if !relationship.foreign_keys.is_empty() {
                log::warn!(
                    "{} -> {}: foreign keys are all primary keys, no foreign key clause",
                    self.current_entity(),
                    relationship.target
                );
            }
            return None;
        }

        Some(fill(self.syntax.foreign_key, &[&self.syntax.property_list(keys.as_slice())]))
    }

    fn join_block(&self, relationship: &RelationshipDescription) -> Result<String, EmitError> {
        let missing = |what: &str| {
            EmitError::InvalidSchema(format!(
                "many-to-many relationship {} -> {} has no {}",
                self.current_entity(),
                relationship.target,
                what
            ))
        };
        let table = non_empty(&relationship.join_table).ok_or_else(|| missing("join table"))?;
        let left = non_empty(&relationship.from.join_key).ok_or_else(|| missing("left join key"))?;
        let right = non_empty(&relationship.to.join_key).ok_or_else(|| missing("right join key"))?;

        let syntax = self.syntax;
        let outer = syntax.indent(STATEMENT_INDENT);
        let inner = syntax.indent(JOIN_INDENT);

        let mut block = String::from(syntax.join_open);
        block.push('\n');
        block.push_str(&format!("{}{}\n", outer, syntax.block_open));
        block.push_str(&format!("{}{}\n", inner, fill(syntax.join_table, &[table])));
        block.push_str(&format!("{}{}\n", inner, fill(syntax.join_left_key, &[left])));
        block.push_str(&format!("{}{}\n", inner, fill(syntax.join_right_key, &[right])));
        block.push_str(&outer);
        block.push_str(syntax.join_close);
        Ok(block)
    }

    fn require_entity(&self) -> Result<(), EmitError> {
        if self.state.entity.is_none() {
            return Err(EmitError::InvalidState("no entity block open"));
        }
        Ok(())
    }

    fn current_entity(&self) -> &str {
        self.state.entity.as_deref().unwrap_or("<none>")
    }

    fn statement(&mut self, body: &str) {
        self.buf.push_str(&self.syntax.indent(STATEMENT_INDENT));
        self.buf.push_str(body);
        self.buf.push_str(self.syntax.statement_end);
        self.buf.push('\n');
    }

    fn line(&mut self, indent: usize, text: &str) {
        self.buf.push_str(&self.syntax.indent(indent));
        self.buf.push_str(text);
        self.buf.push('\n');
    }
}

impl fmt::Display for MappingEmitter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RelationshipEndpoint;
    use pretty_assertions::assert_eq;

    fn column(name: &str, sql_type: &str) -> ColumnDescription {
        ColumnDescription {
            property_name: name.to_string(),
            column_name: name.to_string(),
            sql_type: sql_type.to_string(),
            ..Default::default()
        }
    }

    fn one_to_many() -> RelationshipDescription {
        let mut rel = RelationshipDescription::new(
            "OrderLine",
            RelationshipEndpoint::new("Lines", Cardinality::ExactlyOne),
            RelationshipEndpoint::new("Order", Cardinality::Many),
        );
        rel.foreign_keys = vec!["OrderId".to_string()];
        rel
    }

    fn many_to_many() -> RelationshipDescription {
        let mut from = RelationshipEndpoint::new("Courses", Cardinality::Many);
        from.join_key = Some("StudentId".to_string());
        let mut to = RelationshipEndpoint::new("Students", Cardinality::Many);
        to.join_key = Some("CourseId".to_string());

        let mut rel = RelationshipDescription::new("Course", from, to);
        rel.join_table = Some("StudentCourse".to_string());
        rel.foreign_keys = vec!["CourseId".to_string()];
        rel.delete_behavior = DeleteBehavior::Cascade;
        rel
    }

    fn statement_of(emitter: &MappingEmitter<'_>) -> String {
        emitter
            .render()
            .lines()
            .skip(4)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn emit_column(c: &ColumnDescription) -> String {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap().column(c).unwrap();
        statement_of(&emitter)
    }

    fn emit_relationship(rel: &RelationshipDescription, keys: &[&str]) -> Result<String, EmitError> {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap();
        emitter.relationship(rel, keys)?;
        Ok(statement_of(&emitter))
    }

    #[test]
    fn test_order_scenario() {
        let mut total = column("Total", "decimal(18,2)");
        total.is_nullable = false;
        let mut rel = one_to_many();
        rel.delete_behavior = DeleteBehavior::Cascade;

        let mut emitter = MappingEmitter::default();
        emitter
            .begin("Order")
            .unwrap()
            .table_mapping("Order", "dbo")
            .unwrap()
            .primary_key(&["Id"])
            .unwrap()
            .column(&total)
            .unwrap()
            .blank_line()
            .unwrap()
            .relationship(&rel, &["Id"])
            .unwrap()
            .end_entity()
            .unwrap();

        let expected = r#"  internal class OrderConfiguration : EntityTypeConfiguration<Order>
  {
    public OrderConfiguration()
    {
      ToTable("Order", "dbo");
      HasKey(e => e.Id);
      Property(e => e.Total).HasColumnName("Total").HasColumnType("decimal(18,2)").IsRequired();

      HasRequired(e => e.Lines).WithMany(e => e.Order).HasForeignKey(e => e.OrderId).WillCascadeOnDelete(true);
    }
  }
"#;
        assert_eq!(emitter.render(), expected);
    }

    #[test]
    fn test_many_to_many_scenario() {
        let out = emit_relationship(&many_to_many(), &["Id"]).unwrap();
        let expected = r#"      HasMany(e => e.Courses).WithMany(e => e.Students).Map(m =>
      {
        m.ToTable("StudentCourse");
        m.MapLeftKey("StudentId");
        m.MapRightKey("CourseId");
      });"#;
        assert_eq!(out, expected);
        assert!(!out.contains("HasForeignKey"));
        assert!(!out.contains("WillCascadeOnDelete"));
    }

    #[test]
    fn test_many_to_many_missing_join_metadata() {
        let mut rel = many_to_many();
        rel.join_table = None;
        assert!(matches!(
            emit_relationship(&rel, &["Id"]),
            Err(EmitError::InvalidSchema(_))
        ));

        let mut rel = many_to_many();
        rel.to.join_key = Some(String::new());
        assert!(matches!(
            emit_relationship(&rel, &["Id"]),
            Err(EmitError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_single_and_composite_key() {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap().primary_key(&["Id"]).unwrap();
        assert_eq!(statement_of(&emitter), "      HasKey(e => e.Id);");

        let mut emitter = MappingEmitter::default();
        emitter
            .begin("E")
            .unwrap()
            .primary_key(&["Zeta", "Alpha", "Mid"])
            .unwrap();
        assert_eq!(
            statement_of(&emitter),
            "      HasKey(e => new { e.Zeta, e.Alpha, e.Mid });"
        );
    }

    #[test]
    fn test_empty_primary_key() {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap();
        let keys: [&str; 0] = [];
        assert!(matches!(
            emitter.primary_key(&keys),
            Err(EmitError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_nullability_exactly_one() {
        for nullable in [true, false] {
            let mut c = column("Name", "nvarchar");
            c.is_nullable = nullable;
            let out = emit_column(&c);
            assert_eq!(out.contains(".IsOptional()"), nullable);
            assert_eq!(out.contains(".IsRequired()"), !nullable);
        }
    }

    #[test]
    fn test_full_column_clause_order() {
        let mut c = column("Code", "nchar");
        c.column_name = "OrderCode".to_string();
        c.is_fixed_length = Some(true);
        c.max_length = 10;
        c.is_computed = true;
        c.is_primary_key = true;

        assert_eq!(
            emit_column(&c),
            "      Property(e => e.Code).HasColumnName(\"OrderCode\").HasColumnType(\"nchar\")\
             .IsRequired().IsFixedLength().HasMaxLength(10)\
             .HasDatabaseGeneratedOption(DatabaseGeneratedOption.Computed);"
        );
    }

    #[test]
    fn test_fixed_length_and_max_length() {
        let mut c = column("Code", "char");
        c.is_fixed_length = Some(false);
        let out = emit_column(&c);
        assert!(!out.contains("IsFixedLength"));
        assert!(!out.contains("HasMaxLength"));

        c.is_fixed_length = None;
        c.max_length = 255;
        assert!(emit_column(&c).contains(".HasMaxLength(255)"));
    }

    #[test]
    fn test_generation_options() {
        let mut c = column("Id", "int");
        c.is_primary_key = true;
        assert!(emit_column(&c).ends_with(".HasDatabaseGeneratedOption(DatabaseGeneratedOption.None);"));

        c.is_identity = true;
        c.is_computed = true;
        assert!(emit_column(&c).ends_with(".HasDatabaseGeneratedOption(DatabaseGeneratedOption.Identity);"));

        let plain = column("Name", "nvarchar");
        assert!(!emit_column(&plain).contains("HasDatabaseGeneratedOption"));
    }

    #[test]
    fn test_column_clauses_in_isolation() {
        let syntax = Syntax::default();
        let c = column("Name", "nvarchar");
        assert_eq!(fixed_length_clause(&syntax, &c), None);
        assert_eq!(max_length_clause(&syntax, &c), None);
        assert_eq!(generation_option_clause(&syntax, &c), None);
        assert_eq!(
            column_type_clause(&syntax, &c),
            Some(".HasColumnType(\"nvarchar\")".to_string())
        );
        assert_eq!(COLUMN_CLAUSES.len(), 7);
    }

    #[test]
    fn test_foreign_keys_subset_of_primary_keys() {
        let mut rel = one_to_many();
        rel.foreign_keys = vec!["TenantId".to_string(), "Id".to_string()];
        let out = emit_relationship(&rel, &["Id", "TenantId"]).unwrap();
        assert_eq!(out, "      HasRequired(e => e.Lines).WithMany(e => e.Order);");
    }

    #[test]
    fn test_foreign_key_difference_keeps_order() {
        let mut rel = one_to_many();
        rel.foreign_keys = vec![
            "RegionId".to_string(),
            "Id".to_string(),
            "OrderId".to_string(),
        ];
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert!(out.ends_with(".HasForeignKey(e => new { e.RegionId, e.OrderId });"));
    }

    #[test]
    fn test_foreign_key_difference_dedups() {
        let mut rel = one_to_many();
        rel.foreign_keys = vec!["OrderId".to_string(), "OrderId".to_string()];
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert!(out.ends_with(".WithMany(e => e.Order).HasForeignKey(e => e.OrderId);"));

        rel.foreign_keys = vec![
            "RegionId".to_string(),
            "OrderId".to_string(),
            "RegionId".to_string(),
        ];
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert!(out.ends_with(".HasForeignKey(e => new { e.RegionId, e.OrderId });"));
    }

    #[test]
    fn test_optional_to_many_gets_foreign_key() {
        let mut rel = RelationshipDescription::new(
            "Order",
            RelationshipEndpoint::new("Customer", Cardinality::ZeroOrOne),
            RelationshipEndpoint::new("Orders", Cardinality::Many),
        );
        rel.foreign_keys = vec!["CustomerId".to_string()];
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert_eq!(
            out,
            "      HasOptional(e => e.Customer).WithMany(e => e.Orders).HasForeignKey(e => e.CustomerId);"
        );
    }

    #[test]
    fn test_many_to_required_gets_foreign_key() {
        let mut rel = RelationshipDescription::new(
            "OrderLine",
            RelationshipEndpoint::new("Lines", Cardinality::Many),
            RelationshipEndpoint::new("Order", Cardinality::ExactlyOne),
        );
        rel.foreign_keys = vec!["OrderId".to_string()];
        rel.delete_behavior = DeleteBehavior::Cascade;
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert_eq!(
            out,
            "      HasMany(e => e.Lines).WithRequired(e => e.Order)\
             .HasForeignKey(e => e.OrderId).WillCascadeOnDelete(true);"
        );
    }

    #[test]
    fn test_required_to_required_gets_foreign_key() {
        let mut rel = RelationshipDescription::new(
            "Invoice",
            RelationshipEndpoint::new("Invoice", Cardinality::ExactlyOne),
            RelationshipEndpoint::new("Order", Cardinality::ExactlyOne),
        );
        rel.foreign_keys = vec!["InvoiceId".to_string()];
        rel.delete_behavior = DeleteBehavior::None;
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert_eq!(
            out,
            "      HasRequired(e => e.Invoice).WithRequired(e => e.Order)\
             .HasForeignKey(e => e.InvoiceId).WillCascadeOnDelete(false);"
        );
    }

    #[test]
    fn test_zero_or_one_to_one_has_no_foreign_key() {
        let mut rel = RelationshipDescription::new(
            "Profile",
            RelationshipEndpoint::new("Profile", Cardinality::ZeroOrOne),
            RelationshipEndpoint::new("", Cardinality::ExactlyOne),
        );
        rel.foreign_keys = vec!["ProfileId".to_string()];
        let out = emit_relationship(&rel, &["Id"]).unwrap();
        assert_eq!(out, "      HasOptional(e => e.Profile).WithRequired();");
    }

    #[test]
    fn test_unsupported_cardinality() {
        let mut rel = one_to_many();
        rel.to.cardinality = Cardinality::OneOrMore;
        assert_eq!(
            emit_relationship(&rel, &["Id"]),
            Err(EmitError::UnsupportedCardinality(Cardinality::OneOrMore))
        );

        let mut rel = one_to_many();
        rel.from.cardinality = Cardinality::OneOrMore;
        assert_eq!(
            emit_relationship(&rel, &["Id"]),
            Err(EmitError::UnsupportedCardinality(Cardinality::OneOrMore))
        );
    }

    #[test]
    fn test_failed_relationship_leaves_buffer_untouched() {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap();
        let before = emitter.render().to_string();

        let mut rel = many_to_many();
        rel.join_table = None;
        assert!(emitter.relationship(&rel, &["Id"]).is_err());
        assert_eq!(emitter.render(), before);
    }

    #[test]
    fn test_empty_from_navigation() {
        let mut rel = one_to_many();
        rel.from.navigation_property.clear();
        assert!(matches!(
            emit_relationship(&rel, &["Id"]),
            Err(EmitError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_state_errors() {
        let mut emitter = MappingEmitter::default();
        assert!(matches!(emitter.end_entity(), Err(EmitError::InvalidState(_))));
        assert!(matches!(
            emitter.table_mapping("T", "dbo"),
            Err(EmitError::InvalidState(_))
        ));
        assert!(matches!(emitter.blank_line(), Err(EmitError::InvalidState(_))));

        emitter.begin("E").unwrap();
        assert!(matches!(
            emitter.namespace(Some("N")),
            Err(EmitError::InvalidState(_))
        ));
        assert!(matches!(emitter.default_usings(), Err(EmitError::InvalidState(_))));

        emitter.end_entity().unwrap();
        assert!(matches!(emitter.end_entity(), Err(EmitError::InvalidState(_))));
    }

    #[test]
    fn test_begin_discards_unfinished_entity() {
        let mut emitter = MappingEmitter::default();
        emitter
            .namespace(Some("App"))
            .unwrap()
            .begin("A")
            .unwrap()
            .table_mapping("A", "dbo")
            .unwrap();

        emitter.begin("B").unwrap().end_entity().unwrap();

        let out = emitter.render();
        assert!(out.starts_with("namespace App\n{\n"));
        assert!(!out.contains("AConfiguration"));
        assert!(!out.contains("ToTable(\"A\""));
        assert!(out.contains("internal class BConfiguration"));
    }

    #[test]
    fn test_begin_after_end_appends() {
        let mut emitter = MappingEmitter::default();
        emitter.begin("A").unwrap().end_entity().unwrap();
        emitter.begin("B").unwrap().end_entity().unwrap();

        let out = emitter.render();
        assert!(out.contains("AConfiguration"));
        assert!(out.contains("BConfiguration"));
    }

    #[test]
    fn test_usings_and_namespace() {
        let mut emitter = MappingEmitter::default();
        emitter
            .default_usings()
            .unwrap()
            .namespace(None)
            .unwrap()
            .begin("Tag")
            .unwrap()
            .table_mapping("Tags", "")
            .unwrap()
            .end_entity()
            .unwrap();

        let expected = r#"using System;
using System.ComponentModel.DataAnnotations;
using System.ComponentModel.DataAnnotations.Schema;
using System.Data.Entity.ModelConfiguration;

namespace Change.Namespace.Generated
{
  internal class TagConfiguration : EntityTypeConfiguration<Tag>
  {
    public TagConfiguration()
    {
      ToTable("Tags", "");
    }
  }
}
"#;
        assert_eq!(emitter.render(), expected);
    }

    #[test]
    fn test_render_idempotent_and_reset() {
        let mut emitter = MappingEmitter::default();
        emitter.begin("E").unwrap().table_mapping("E", "dbo").unwrap();

        let first = emitter.render().to_string();
        assert_eq!(emitter.render(), first);
        assert_eq!(emitter.to_string(), first);

        emitter.reset();
        assert_eq!(emitter.render(), "");
        emitter.begin("F").unwrap();
        assert!(emitter.render().contains("FConfiguration"));
    }
}
