//! Shift/reduce rules for the model and material formats
//!
//! The assemblers shift one token at a time onto a [`ParseStack`] and call
//! [`ReductionEngine::reduce`] until it reports [`Reduction::NoChange`]. Each rule
//! is keyed by the kind of the bottom-most unprocessed symbol and walks forward
//! over the operands it accepts:
//!
//! - running off the top of the stack means more input is needed;
//! - a symbol that doesn't qualify ends the walk, and the operand count decides
//!   between reducing the record and rejecting it.
//!
//! Either way the consumed symbols are dropped and the one that ended the walk
//! stays on the stack to be looked at again. A rejected record produces exactly
//! one diagnostic; whatever is left of it up to the end of the line is then
//! discarded silently.

use crate::assets::index_resolver::IndexResolver;
use crate::foundation::math::{Color, Vec2, Vec3};

use super::diagnostics::{Diagnostic, Diagnostics, Severity};
use super::span::SourceSpan;
use super::stack::{Nonterminal, ParseStack};
use super::token::{CompositeIndex, Keyword, Token, TokenKind, Value};

/// Values derived by reductions
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `v x y z [w]`
    Position(Vec3),
    /// `vn x y z`
    Normal(Vec3),
    /// `vt u [v [w]]`
    TexCoord(Vec2),
    /// `f ...` after welding, as a triangle list
    Triangles(Vec<u32>),
    /// `g [names...]`; empty when no name was given
    Group(String),
    /// `o name...`
    Object(String),
    /// `mtllib file...`
    MaterialLibrary(Vec<String>),
    /// `usemtl name`
    UseMaterial(String),
    /// `s on|off|n`; `None` turns smoothing off
    Smoothing(Option<u32>),
    /// `newmtl name`
    NewMaterial(String),
    /// `Kd r g b`
    Diffuse(Color),
    /// A recognised but unsupported statement
    Skipped(String),
}

/// Grammar rules, reported by [`Reduction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Vertex position
    Vertex,
    /// Vertex normal
    Normal,
    /// Texture coordinate
    TexCoord,
    /// Face
    Face,
    /// Group name
    Group,
    /// Object name
    Object,
    /// Material library reference
    MaterialLibrary,
    /// Material use
    UseMaterial,
    /// Smoothing toggle
    Smoothing,
    /// Material declaration
    NewMaterial,
    /// Diffuse color
    Diffuse,
    /// Unsupported statement
    Statement,
    /// Bare line break
    EndOfRecord,
    /// Operand where a statement was expected, or an invalid token
    Stray,
    /// Discarding the remains of a rejected record
    Recovery,
}

/// Outcome of one call to [`ReductionEngine::reduce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Nothing to do until another token is shifted
    NoChange,
    /// A rule consumed symbols
    Applied(Rule),
    /// A record was rejected and its symbols discarded
    Error(Rule),
}

/// What a rule decided, with the explicit truncation cursor
#[derive(Debug)]
enum Step {
    NeedMore,
    Reduce { end: usize, record: Record },
    /// `span: None` covers the record up to `end`
    Reject { end: usize, message: String, span: Option<SourceSpan> },
    Abandon { end: usize },
}

/// Applies grammar rules to the unprocessed suffix of a [`ParseStack`]
#[derive(Debug, Default)]
pub struct ReductionEngine {
    recovering: bool,
}

impl ReductionEngine {
    /// Create an engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Try one reduction on the bottom-most unprocessed symbol
    ///
    /// `resolver` is only consulted by the face rule; pass `None` for formats
    /// without faces.
    pub fn reduce(
        &mut self,
        stack: &mut ParseStack,
        resolver: Option<&mut IndexResolver>,
        diagnostics: &mut Diagnostics<'_>,
    ) -> Reduction {
        let Some(head) = stack.token_at(0) else {
            return Reduction::NoChange;
        };
        if self.recovering {
            return self.recover(stack);
        }

        let (rule, step) = match head.kind {
            TokenKind::Eof => return Reduction::NoChange,
            TokenKind::Newline => {
                stack.truncate_from_bottom(1);
                return Reduction::Applied(Rule::EndOfRecord);
            }
            TokenKind::Invalid => (Rule::Stray, Step::Abandon { end: 1 }),
            TokenKind::Statement => (Rule::Statement, statement(stack)),
            TokenKind::Keyword(keyword) => keyword_rule(keyword, stack, resolver),
            TokenKind::Integer | TokenKind::Float | TokenKind::Index | TokenKind::Name => (
                Rule::Stray,
                Step::Reject {
                    end: 1,
                    message: format!("expected a statement, found {}", head.kind),
                    span: Some(head.span.clone()),
                },
            ),
        };
        self.apply(rule, step, stack, diagnostics)
    }

    fn apply(&mut self, rule: Rule, step: Step, stack: &mut ParseStack, diagnostics: &mut Diagnostics<'_>) -> Reduction {
        match step {
            Step::NeedMore => Reduction::NoChange,
            Step::Reduce { end, record } => {
                let Some(span) = stack.span_until(end) else {
                    return Reduction::NoChange;
                };
                stack.reduce_to(end, Nonterminal { record, span });
                Reduction::Applied(rule)
            }
            Step::Reject { end, message, span } => {
                match span.or_else(|| stack.span_until(end)) {
                    Some(span) => diagnostics.error(message, span),
                    None => diagnostics.emit(Diagnostic::detached(Severity::Error, message)),
                }
                self.discard(end, stack);
                Reduction::Error(rule)
            }
            Step::Abandon { end } => {
                self.discard(end, stack);
                Reduction::Error(rule)
            }
        }
    }

    fn discard(&mut self, end: usize, stack: &mut ParseStack) {
        stack.truncate_from_bottom(end);
        self.recovering = !stack.token_at(0).is_some_and(Token::ends_record);
    }

    fn recover(&mut self, stack: &mut ParseStack) -> Reduction {
        let record_end = stack
            .unprocessed()
            .position(|symbol| symbol.as_token().is_some_and(Token::ends_record));

        match record_end {
            Some(offset) => {
                let through = match stack.token_at(offset).map(|t| t.kind) {
                    Some(TokenKind::Newline) => offset + 1,
                    _ => offset,
                };
                stack.truncate_from_bottom(through);
                self.recovering = false;
            }
            None => stack.truncate_from_bottom(stack.unprocessed_len()),
        }
        Reduction::Applied(Rule::Recovery)
    }
}

fn keyword_rule(keyword: Keyword, stack: &ParseStack, resolver: Option<&mut IndexResolver>) -> (Rule, Step) {
    match keyword {
        Keyword::Vertex => (
            Rule::Vertex,
            numeric(stack, keyword, 3, 4, |v| Record::Position(vec3(v))),
        ),
        Keyword::Normal => (
            Rule::Normal,
            numeric(stack, keyword, 3, 3, |v| Record::Normal(vec3(v))),
        ),
        Keyword::TexCoord => (
            Rule::TexCoord,
            numeric(stack, keyword, 1, 3, |v| {
                Record::TexCoord(Vec2::new(v[0] as f32, v.get(1).copied().unwrap_or(0.0) as f32))
            }),
        ),
        Keyword::Diffuse => (
            Rule::Diffuse,
            numeric(stack, keyword, 3, 3, |v| Record::Diffuse(Color::from(vec3(v)))),
        ),
        Keyword::Face => (Rule::Face, face(stack, resolver)),
        Keyword::Group => (
            Rule::Group,
            named(stack, keyword, 0, None, |names| Record::Group(names.join(" "))),
        ),
        Keyword::Object => (
            Rule::Object,
            named(stack, keyword, 1, None, |names| Record::Object(names.join(" "))),
        ),
        Keyword::MaterialLibrary => (
            Rule::MaterialLibrary,
            named(stack, keyword, 1, None, Record::MaterialLibrary),
        ),
        Keyword::UseMaterial => (
            Rule::UseMaterial,
            named(stack, keyword, 1, Some(1), |mut names| Record::UseMaterial(names.remove(0))),
        ),
        Keyword::NewMaterial => (
            Rule::NewMaterial,
            named(stack, keyword, 1, Some(1), |mut names| Record::NewMaterial(names.remove(0))),
        ),
        Keyword::Smoothing => (Rule::Smoothing, smoothing(stack)),
    }
}

fn vec3(values: &[f64]) -> Vec3 {
    Vec3::new(values[0] as f32, values[1] as f32, values[2] as f32)
}

fn expectation(min: usize, max: Option<usize>, noun: &str) -> String {
    match max {
        Some(max) if max == min => format!("{min} {noun}{}", if min == 1 { "" } else { "s" }),
        Some(max) => format!("{min} to {max} {noun}s"),
        None => format!("at least {min} {noun}{}", if min == 1 { "" } else { "s" }),
    }
}

/// Walk numeric operands
fn numeric(
    stack: &ParseStack,
    keyword: Keyword,
    min: usize,
    max: usize,
    build: impl FnOnce(&[f64]) -> Record,
) -> Step {
    let mut values = Vec::with_capacity(max);
    let mut offset = 1;
    loop {
        let Some(token) = stack.token_at(offset) else {
            return Step::NeedMore;
        };
        if token.is_number() {
            if values.len() == max {
                return Step::Reject {
                    end: offset,
                    message: format!(
                        "too many operands for `{}`, expected {}",
                        keyword.as_str(),
                        expectation(min, Some(max), "number")
                    ),
                    span: Some(token.span.clone()),
                };
            }
            values.push(token.as_number().unwrap_or_default());
        } else if token.ends_record() {
            break;
        } else if token.kind == TokenKind::Invalid {
            return Step::Abandon { end: offset };
        } else {
            return Step::Reject {
                end: offset,
                message: format!("expected a number, found {}", token.kind),
                span: Some(token.span.clone()),
            };
        }
        offset += 1;
    }

    if values.len() < min {
        return Step::Reject {
            end: offset,
            message: format!(
                "`{}` expects {}, found {}",
                keyword.as_str(),
                expectation(min, Some(max), "number"),
                values.len()
            ),
            span: None,
        };
    }
    Step::Reduce { end: offset, record: build(&values) }
}

/// Walk name operands
fn named(
    stack: &ParseStack,
    keyword: Keyword,
    min: usize,
    max: Option<usize>,
    build: impl FnOnce(Vec<String>) -> Record,
) -> Step {
    let mut names = Vec::new();
    let mut offset = 1;
    loop {
        let Some(token) = stack.token_at(offset) else {
            return Step::NeedMore;
        };
        if token.ends_record() {
            break;
        }
        let Some(name) = token.as_text().filter(|_| token.kind == TokenKind::Name) else {
            if token.kind == TokenKind::Invalid {
                return Step::Abandon { end: offset };
            }
            return Step::Reject {
                end: offset,
                message: format!("expected a name, found {}", token.kind),
                span: Some(token.span.clone()),
            };
        };
        if max.is_some_and(|max| names.len() == max) {
            return Step::Reject {
                end: offset,
                message: format!(
                    "too many operands for `{}`, expected {}",
                    keyword.as_str(),
                    expectation(min, max, "name")
                ),
                span: Some(token.span.clone()),
            };
        }
        names.push(name.to_string());
        offset += 1;
    }

    if names.len() < min {
        return Step::Reject {
            end: offset,
            message: format!("`{}` expects {}", keyword.as_str(), expectation(min, max, "name")),
            span: None,
        };
    }
    Step::Reduce { end: offset, record: build(names) }
}

fn smoothing(stack: &ParseStack) -> Step {
    let Some(operand) = stack.token_at(1) else {
        return Step::NeedMore;
    };
    if operand.ends_record() {
        return Step::Reject {
            end: 1,
            message: "`s` expects `on`, `off` or a smoothing group number".to_string(),
            span: None,
        };
    }
    let Some(terminator) = stack.token_at(2) else {
        return Step::NeedMore;
    };
    if !terminator.ends_record() {
        return Step::Reject {
            end: 2,
            message: "too many operands for `s`, expected 1".to_string(),
            span: Some(terminator.span.clone()),
        };
    }

    let value = match (&operand.value, operand.kind) {
        (Some(Value::Text(text)), TokenKind::Name) if text == "off" => Some(None),
        (Some(Value::Text(text)), TokenKind::Name) if text == "on" => Some(Some(1)),
        (Some(Value::UInt(0)), TokenKind::Integer) => Some(None),
        (Some(Value::UInt(n)), TokenKind::Integer) => u32::try_from(*n).ok().map(Some),
        _ => None,
    };
    match value {
        Some(group) => Step::Reduce { end: 2, record: Record::Smoothing(group) },
        None if operand.kind == TokenKind::Invalid => Step::Abandon { end: 1 },
        None => Step::Reject {
            end: 2,
            message: "unrecognised smoothing value, expected `on`, `off` or a smoothing group number".to_string(),
            span: Some(operand.span.clone()),
        },
    }
}

fn statement(stack: &ParseStack) -> Step {
    let Some(end) = stack
        .unprocessed()
        .position(|symbol| symbol.as_token().is_some_and(Token::ends_record))
    else {
        return Step::NeedMore;
    };
    let name = stack
        .token_at(0)
        .and_then(Token::as_text)
        .unwrap_or_default()
        .to_string();
    Step::Reduce { end, record: Record::Skipped(name) }
}

fn face(stack: &ParseStack, resolver: Option<&mut IndexResolver>) -> Step {
    let mut corners: Vec<(CompositeIndex, &SourceSpan)> = Vec::with_capacity(4);
    let mut offset = 1;
    loop {
        let Some(token) = stack.token_at(offset) else {
            return Step::NeedMore;
        };
        if token.ends_record() {
            break;
        }
        match (token.kind, token.as_corner()) {
            (TokenKind::Integer | TokenKind::Index, Some(corner)) => corners.push((corner, &token.span)),
            (TokenKind::Invalid, _) => return Step::Abandon { end: offset },
            _ => {
                return Step::Reject {
                    end: offset,
                    message: format!("expected a face corner, found {}", token.kind),
                    span: Some(token.span.clone()),
                }
            }
        }
        offset += 1;
    }

    let reject = |message: String, span: Option<SourceSpan>| Step::Reject { end: offset, message, span };

    if corners.len() < 3 {
        return reject(
            format!("`f` expects at least 3 corners, found {}", corners.len()),
            None,
        );
    }

    let shape = corners[0].0.shape();
    if let Some((other, _)) = corners.iter().find(|(corner, _)| corner.shape() != shape) {
        return reject(
            format!("face mixes corner shapes `{}` and `{}`", shape, other.shape()),
            None,
        );
    }

    let Some(resolver) = resolver else {
        return reject("faces are not valid in this file".to_string(), None);
    };

    let mut keys = Vec::with_capacity(corners.len());
    for (corner, span) in &corners {
        match resolver.key_for(*corner) {
            Ok(key) => keys.push(key),
            Err(err) => return reject(err.to_string(), Some((*span).clone())),
        }
    }

    let mut resolved = Vec::with_capacity(keys.len());
    for (key, (_, span)) in keys.into_iter().zip(&corners) {
        match resolver.resolve(key) {
            Ok(index) => resolved.push(index),
            Err(err) => return reject(err.to_string(), Some((*span).clone())),
        }
    }

    // Fan triangulation around the first corner
    let mut triangles = Vec::with_capacity((resolved.len() - 2) * 3);
    for pair in resolved[1..].windows(2) {
        triangles.extend_from_slice(&[resolved[0], pair[0], pair[1]]);
    }
    Step::Reduce { end: offset, record: Record::Triangles(triangles) }
}
