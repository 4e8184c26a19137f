//! Literal target syntax used by the emitter.
//!
//! Every keyword and punctuation mark the emitter writes comes from a
//! [`Syntax`] table. Templates mark argument positions with `$`, filled in
//! order by [`fill`].

/// Rendering table for one target mapping language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    /// One indentation level
    pub indent: &'static str,
    pub usings: &'static [&'static str],
    pub namespace_open: &'static str,
    pub default_namespace: &'static str,
    pub block_open: &'static str,
    pub block_close: &'static str,
    pub class_header: &'static str,
    pub constructor_header: &'static str,
    pub statement_end: &'static str,

    pub to_table: &'static str,
    pub has_key: &'static str,

    // Property references used in key and foreign key expressions
    pub property_ref: &'static str,
    pub tuple_ref: &'static str,
    pub tuple_member: &'static str,
    pub tuple_separator: &'static str,

    // Column clauses
    pub property: &'static str,
    pub column_name: &'static str,
    pub column_type: &'static str,
    pub optional: &'static str,
    pub required: &'static str,
    pub fixed_length: &'static str,
    pub max_length: &'static str,
    pub identity: &'static str,
    pub computed: &'static str,
    pub not_generated: &'static str,

    // Relationship clauses
    pub navigation_ref: &'static str,
    pub has_optional: &'static str,
    pub has_required: &'static str,
    pub has_many: &'static str,
    pub with_optional: &'static str,
    pub with_required: &'static str,
    pub with_many: &'static str,
    pub foreign_key: &'static str,
    pub cascade_on: &'static str,
    pub cascade_off: &'static str,

    // Many-to-many join block
    pub join_open: &'static str,
    pub join_table: &'static str,
    pub join_left_key: &'static str,
    pub join_right_key: &'static str,
    pub join_close: &'static str,
}

impl Syntax {
    /// Entity Framework 6 `EntityTypeConfiguration<T>` fluent API.
    pub const ENTITY_FRAMEWORK: Syntax = Syntax {
        indent: "  ",
        usings: &[
            "using System;",
            "using System.ComponentModel.DataAnnotations;",
            "using System.ComponentModel.DataAnnotations.Schema;",
            "using System.Data.Entity.ModelConfiguration;",
        ],
        namespace_open: "namespace $",
        default_namespace: "Change.Namespace.Generated",
        block_open: "{",
        block_close: "}",
        class_header: "internal class $Configuration : EntityTypeConfiguration<$>",
        constructor_header: "public $Configuration()",
        statement_end: ";",

        to_table: "ToTable(\"$\", \"$\")",
        has_key: "HasKey($)",

        property_ref: "e => e.$",
        tuple_ref: "e => new { $ }",
        tuple_member: "e.$",
        tuple_separator: ", ",

        property: "Property(e => e.$)",
        column_name: ".HasColumnName(\"$\")",
        column_type: ".HasColumnType(\"$\")",
        optional: ".IsOptional()",
        required: ".IsRequired()",
        fixed_length: ".IsFixedLength()",
        max_length: ".HasMaxLength($)",
        identity: ".HasDatabaseGeneratedOption(DatabaseGeneratedOption.Identity)",
        computed: ".HasDatabaseGeneratedOption(DatabaseGeneratedOption.Computed)",
        not_generated: ".HasDatabaseGeneratedOption(DatabaseGeneratedOption.None)",

        navigation_ref: "e => e.$",
        has_optional: "HasOptional(e => e.$)",
        has_required: "HasRequired(e => e.$)",
        has_many: "HasMany(e => e.$)",
        with_optional: ".WithOptional($)",
        with_required: ".WithRequired($)",
        with_many: ".WithMany($)",
        foreign_key: ".HasForeignKey($)",
        cascade_on: ".WillCascadeOnDelete(true)",
        cascade_off: ".WillCascadeOnDelete(false)",

        join_open: ".Map(m =>",
        join_table: "m.ToTable(\"$\");",
        join_left_key: "m.MapLeftKey(\"$\");",
        join_right_key: "m.MapRightKey(\"$\");",
        join_close: "})",
    };

    pub fn indent(&self, level: usize) -> String {
        self.indent.repeat(level)
    }

    /// Single property reference, or a tuple of all of them when there are
    /// several. Order is kept as given.
    pub fn property_list(&self, names: &[impl AsRef<str>]) -> String {
        match names {
            [single] => fill(self.property_ref, &[single.as_ref()]),
            _ => {
                let members: Vec<String> = names
                    .iter()
                    .map(|n| fill(self.tuple_member, &[n.as_ref()]))
                    .collect();
                fill(self.tuple_ref, &[&members.join(self.tuple_separator)])
            }
        }
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self::ENTITY_FRAMEWORK
    }
}

/// Replace each `$` in `template` with the next argument.
///
/// A placeholder without a matching argument repeats the last one, so
/// `"class $Configuration : Base<$>"` needs only the entity name once.
pub fn fill(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut next = 0;

    for c in template.chars() {
        if c == '$' {
            let arg = args.get(next).or_else(|| args.last()).copied().unwrap_or("");
            out.push_str(arg);
            next += 1;
        } else {
            out.push(c);
        }
    }

    out
}
