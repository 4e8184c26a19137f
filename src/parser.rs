use crate::ast::*;
use crate::lexer::{LexError, Lexer, Token};

/// Schema used when an entity header names only a table.
pub const DEFAULT_SCHEMA: &str = "dbo";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
    #[error("Unexpected token: {found:?}, expected {expected:?}")]
    Expected { expected: Token, found: Token },
    #[error("Unexpected end of input")]
    UnexpectedEof,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> &Token {
        let tok = self.tokens.get(self.pos).unwrap_or(&Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().clone() {
            Token::Ident(s) => Ok(s),
            Token::Eof => Err(ParseError::UnexpectedEof),
            tok => Err(ParseError::Unexpected(tok, "identifier")),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let tok = self.advance().clone();
        if tok == expected {
            Ok(())
        } else if tok == Token::Eof {
            Err(ParseError::UnexpectedEof)
        } else {
            Err(ParseError::Expected {
                expected,
                found: tok,
            })
        }
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    /// Consume the identifier `name` if it is next.
    fn eat_ident(&mut self, name: &str) -> bool {
        if self.check_ident(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn parse(&mut self) -> Result<Schema, ParseError> {
        let mut entities = Vec::new();

        while *self.peek() != Token::Eof {
            if self.eat_ident("entity") {
                entities.push(self.parse_entity()?);
            } else {
                return Err(ParseError::Unexpected(self.peek().clone(), "entity"));
            }
        }

        Ok(Schema { entities })
    }

    fn parse_entity(&mut self) -> Result<EntityDescription, ParseError> {
        let name = self.expect_ident()?;
        let (schema, table) = self.parse_table_ref(&name)?;
        self.expect(Token::LBrace)?;

        let mut columns: Vec<ColumnDescription> = Vec::new();
        let mut relationships = Vec::new();
        let mut explicit_key = None;

        while *self.peek() != Token::RBrace {
            if *self.peek() == Token::Eof {
                return Err(ParseError::UnexpectedEof);
            }

            if self.eat_ident("primary_key") {
                self.expect(Token::LParen)?;
                explicit_key = Some(self.parse_ident_list()?);
                self.expect(Token::RParen)?;
            } else if self.eat_ident("rel") {
                relationships.push(self.parse_relationship()?);
            } else {
                columns.push(self.parse_column()?);
            }
        }

        self.expect(Token::RBrace)?;

        let primary_keys = match explicit_key {
            Some(keys) => {
                // The explicit list replaces any `pk` markers
                for column in columns.iter_mut() {
                    column.is_primary_key = keys.contains(&column.property_name);
                    if column.is_primary_key {
                        column.is_nullable = false;
                    }
                }
                keys
            }
            None => columns
                .iter()
                .filter(|c| c.is_primary_key)
                .map(|c| c.property_name.clone())
                .collect(),
        };

        Ok(EntityDescription {
            name,
            table,
            schema,
            primary_keys,
            columns,
            relationships,
        })
    }

    /// `: [schema.]table` after the entity name.
    fn parse_table_ref(&mut self, entity: &str) -> Result<(String, String), ParseError> {
        if *self.peek() != Token::Colon {
            return Ok((DEFAULT_SCHEMA.to_string(), entity.to_string()));
        }
        self.advance();

        let first = self.expect_ident()?;
        if *self.peek() == Token::Dot {
            self.advance();
            let table = self.expect_ident()?;
            Ok((first, table))
        } else {
            Ok((DEFAULT_SCHEMA.to_string(), first))
        }
    }

    fn parse_column(&mut self) -> Result<ColumnDescription, ParseError> {
        let property_name = self.expect_ident()?;
        let sql_type = match self.advance().clone() {
            Token::Ident(s) | Token::Str(s) => s,
            Token::Eof => return Err(ParseError::UnexpectedEof),
            tok => return Err(ParseError::Unexpected(tok, "column type")),
        };

        let mut column = ColumnDescription {
            column_name: property_name.clone(),
            property_name,
            sql_type,
            is_nullable: true,
            ..Default::default()
        };

        loop {
            if self.eat_ident("pk") {
                column.is_primary_key = true;
                column.is_nullable = false;
            } else if self.eat_ident("not") {
                if !self.eat_ident("null") {
                    return Err(ParseError::Unexpected(self.peek().clone(), "null"));
                }
                column.is_nullable = false;
            } else if self.eat_ident("null") {
                column.is_nullable = true;
            } else if self.eat_ident("identity") {
                column.is_identity = true;
            } else if self.eat_ident("computed") {
                column.is_computed = true;
            } else if self.eat_ident("fixed") {
                column.is_fixed_length = Some(true);
            } else if self.eat_ident("variable") {
                column.is_fixed_length = Some(false);
            } else if self.eat_ident("max") {
                column.max_length = match self.advance().clone() {
                    Token::Num(n) => n,
                    tok => return Err(ParseError::Unexpected(tok, "max length")),
                };
            } else if self.eat_ident("column") {
                column.column_name = match self.advance().clone() {
                    Token::Str(s) | Token::Ident(s) => s,
                    tok => return Err(ParseError::Unexpected(tok, "column name")),
                };
            } else {
                break;
            }
        }

        Ok(column)
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut list = vec![self.expect_ident()?];
        while *self.peek() == Token::Comma {
            self.advance();
            list.push(self.expect_ident()?);
        }
        Ok(list)
    }

    /// `<nav> <card> -- <card> <Target>[.<back>] [fk(..)] [via T(l, r)] [on delete ..]`
    fn parse_relationship(&mut self) -> Result<RelationshipDescription, ParseError> {
        let navigation = self.expect_ident()?;
        let from_cardinality = self.parse_cardinality()?;
        self.expect(Token::Dash)?;
        let to_cardinality = self.parse_cardinality()?;
        let target = self.expect_ident()?;

        let mut back_navigation = String::new();
        if *self.peek() == Token::Dot {
            self.advance();
            back_navigation = self.expect_ident()?;
        }

        let mut rel = RelationshipDescription::new(
            target,
            RelationshipEndpoint::new(navigation, from_cardinality),
            RelationshipEndpoint::new(back_navigation, to_cardinality),
        );

        loop {
            if self.eat_ident("fk") {
                self.expect(Token::LParen)?;
                rel.foreign_keys = self.parse_ident_list()?;
                self.expect(Token::RParen)?;
            } else if self.eat_ident("via") {
                rel.join_table = Some(self.expect_ident()?);
                self.expect(Token::LParen)?;
                rel.from.join_key = Some(self.expect_ident()?);
                self.expect(Token::Comma)?;
                rel.to.join_key = Some(self.expect_ident()?);
                self.expect(Token::RParen)?;
            } else if self.eat_ident("on") {
                if !self.eat_ident("delete") {
                    return Err(ParseError::Unexpected(self.peek().clone(), "delete"));
                }
                rel.delete_behavior = if self.eat_ident("cascade") {
                    DeleteBehavior::Cascade
                } else if self.eat_ident("none") {
                    DeleteBehavior::None
                } else {
                    return Err(ParseError::Unexpected(self.peek().clone(), "cascade or none"));
                };
            } else {
                break;
            }
        }

        Ok(rel)
    }

    fn parse_cardinality(&mut self) -> Result<Cardinality, ParseError> {
        match self.peek().clone() {
            Token::Star => {
                self.advance();
                Ok(Cardinality::Many)
            }
            Token::Num(0) => {
                self.advance();
                self.expect(Token::DotDot)?;
                match self.advance().clone() {
                    Token::Num(1) => Ok(Cardinality::ZeroOrOne),
                    tok => Err(ParseError::Unexpected(tok, "1 after 0..")),
                }
            }
            Token::Num(1) => {
                self.advance();
                if *self.peek() == Token::DotDot {
                    self.advance();
                    self.expect(Token::Star)?;
                    Ok(Cardinality::OneOrMore)
                } else {
                    Ok(Cardinality::ExactlyOne)
                }
            }
            tok => Err(ParseError::Unexpected(tok, "cardinality (1, 0..1, *, 1..*)")),
        }
    }
}
