use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub entities: Vec<EntityDescription>,
}

/// One mapped entity and the table it lives in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityDescription {
    pub name: String,
    pub table: String,
    pub schema: String,
    /// Key properties in declaration order
    pub primary_keys: Vec<String>,
    pub columns: Vec<ColumnDescription>,
    pub relationships: Vec<RelationshipDescription>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDescription {
    pub property_name: String,
    pub column_name: String,
    pub sql_type: String,
    pub is_nullable: bool,
    /// `None` when the source metadata does not say
    pub is_fixed_length: Option<bool>,
    /// 0 = unset
    pub max_length: u32,
    pub is_identity: bool,
    pub is_computed: bool,
    pub is_primary_key: bool,
}

impl ColumnDescription {
    /// Store-generation marker for this column, if any.
    ///
    /// Identity wins over computed, computed wins over primary-key-only.
    pub fn generation_option(&self) -> Option<GenerationOption> {
        if self.is_identity {
            Some(GenerationOption::Identity)
        } else if self.is_computed {
            Some(GenerationOption::Computed)
        } else if self.is_primary_key {
            Some(GenerationOption::PrimaryKey)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOption {
    Identity,
    Computed,
    /// Key column whose value is supplied by the caller
    PrimaryKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ZeroOrOne,  // 0..1
    ExactlyOne, // 1
    Many,       // *
    OneOrMore,  // 1..*
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::ZeroOrOne => "0..1",
            Cardinality::ExactlyOne => "1",
            Cardinality::Many => "*",
            Cardinality::OneOrMore => "1..*",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEndpoint {
    /// May be empty on the `to` side only
    pub navigation_property: String,
    pub cardinality: Cardinality,
    /// Join table column, many-to-many only
    pub join_key: Option<String>,
}

impl RelationshipEndpoint {
    pub fn new(navigation_property: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            navigation_property: navigation_property.into(),
            cardinality,
            join_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteBehavior {
    Cascade,
    None,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDescription {
    /// Name of the related entity
    pub target: String,
    pub from: RelationshipEndpoint,
    pub to: RelationshipEndpoint,
    pub foreign_keys: Vec<String>,
    pub join_table: Option<String>,
    pub is_many_to_many: bool,
    pub is_zero_or_one_to_one: bool,
    pub delete_behavior: DeleteBehavior,
}

impl RelationshipDescription {
    /// Builds a relationship and derives the many-to-many and
    /// zero-or-one-to-one flags from the endpoint cardinalities.
    pub fn new(target: impl Into<String>, from: RelationshipEndpoint, to: RelationshipEndpoint) -> Self {
        let is_many_to_many =
            from.cardinality == Cardinality::Many && to.cardinality == Cardinality::Many;
        let is_zero_or_one_to_one = matches!(
            (from.cardinality, to.cardinality),
            (Cardinality::ZeroOrOne, Cardinality::ExactlyOne)
                | (Cardinality::ExactlyOne, Cardinality::ZeroOrOne)
        );

        Self {
            target: target.into(),
            from,
            to,
            foreign_keys: Vec::new(),
            join_table: None,
            is_many_to_many,
            is_zero_or_one_to_one,
            delete_behavior: DeleteBehavior::Unspecified,
        }
    }
}
