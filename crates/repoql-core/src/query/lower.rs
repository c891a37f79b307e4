//! Expression compiler: lowers an `Expr` tree into the query AST.
//!
//! Each expression node kind has exactly one rule. Nodes without a rule and
//! non-constant arguments are compile errors; nothing is silently dropped.

use crate::{
    config::UnknownFieldPolicy,
    error::CompileError,
    query::{
        ast::{Node, RangeOp, ScopeKind, SortKey, Term, WildcardShape},
        context::CompileContext,
        expr::{BinaryOp, Expr, Method},
        fold::Folder,
    },
    schema::{DataType, FieldInfo, HandlerType},
    value::Value,
};

///
/// Lowered
///
/// Result of lowering a predicate. Constant predicates are kept apart from
/// real nodes so `true`/`false` can act as neutral and absorbing elements.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Lowered {
    Const(bool),
    Node(Node),
}

///
/// Lowerer
///

pub(crate) struct Lowerer<'a> {
    ctx: &'a CompileContext<'a>,
    folder: Folder,
}

impl<'a> Lowerer<'a> {
    pub(crate) const fn new(ctx: &'a CompileContext<'a>) -> Self {
        Self {
            ctx,
            folder: Folder::new(ctx.clock()),
        }
    }

    pub(crate) fn lower_predicate(&self, expr: &Expr) -> Result<Lowered, CompileError> {
        if expr.is_constant() {
            return match self.folder.fold(expr)? {
                Value::Bool(b) => Ok(Lowered::Const(b)),
                other => Err(CompileError::unsupported(format!(
                    "constant {} used as a predicate",
                    other.kind_label()
                ))),
            };
        }

        match expr {
            Expr::Field(name) => {
                let info = self.resolve(name, DataType::Bool)?;
                if info.data_type != DataType::Bool {
                    return Err(CompileError::unsupported(format!(
                        "non-boolean field '{name}' used as a predicate"
                    )));
                }

                Ok(Lowered::Node(Term::boolean(info.indexed_name, true).into()))
            }

            Expr::Not(inner) => Ok(negate(self.lower_predicate(inner)?)),

            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::AndAlso => Ok(conjoin(
                    self.lower_predicate(lhs)?,
                    self.lower_predicate(rhs)?,
                )),
                BinaryOp::OrElse => Ok(disjoin(
                    self.lower_predicate(lhs)?,
                    self.lower_predicate(rhs)?,
                )),
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte => self.lower_comparison(*op, lhs, rhs).map(Lowered::Node),
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => Err(CompileError::unsupported(
                    format!("arithmetic '{}' used as a predicate", op.symbol()),
                )),
            },

            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => self.lower_conditional(test, if_true, if_false),

            Expr::Call {
                method,
                target,
                args,
            } => self.lower_call(*method, target, args),

            Expr::HandlerIs(handler) => self.lower_handler(handler).map(Lowered::Node),

            Expr::Constant(_) | Expr::Candidate | Expr::Now | Expr::Today | Expr::Negate(_) => {
                Err(CompileError::unsupported(format!(
                    "{} used as a predicate",
                    expr.describe()
                )))
            }
        }
    }

    /// Resolve sort keys to their indexed names, keeping declaration order.
    pub(crate) fn lower_sort(&self, keys: &[SortKey]) -> Result<Vec<SortKey>, CompileError> {
        keys.iter()
            .map(|key| {
                let info = self.resolve(&key.field, DataType::Text)?;
                Ok(SortKey {
                    field: info.indexed_name,
                    direction: key.direction,
                })
            })
            .collect()
    }

    // `test ? A : B` with a content predicate as `test` becomes
    // `(!test && B) || (test && A)`: the false branch is emitted first.
    fn lower_conditional(
        &self,
        test: &Expr,
        if_true: &Expr,
        if_false: &Expr,
    ) -> Result<Lowered, CompileError> {
        if test.is_constant() {
            return if self.folder.fold_bool(test)? {
                self.lower_predicate(if_true)
            } else {
                self.lower_predicate(if_false)
            };
        }

        let test = self.lower_predicate(test)?;
        let if_true = self.lower_predicate(if_true)?;
        let if_false = self.lower_predicate(if_false)?;

        Ok(disjoin(
            conjoin(negate(test.clone()), if_false),
            conjoin(test, if_true),
        ))
    }

    fn lower_comparison(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Node, CompileError> {
        let (name, literal, flipped) = match (lhs, rhs) {
            (Expr::Field(name), rhs) if rhs.is_constant() => (name, rhs, false),
            (lhs, Expr::Field(name)) if lhs.is_constant() => (name, lhs, true),
            (lhs, rhs) if !lhs.is_constant() && !rhs.is_constant() => {
                return Err(CompileError::NonConstantArgument {
                    operation: op.symbol(),
                });
            }
            (lhs, rhs) => {
                let operand = if lhs.is_constant() { rhs } else { lhs };
                return Err(CompileError::unsupported(format!(
                    "comparison '{}' on {}",
                    op.symbol(),
                    operand.describe()
                )));
            }
        };

        let value = self.folder.fold(literal)?;
        let info = self.resolve(name, DataType::infer(&value))?;
        let field = info.indexed_name;

        match (info.data_type, op) {
            (DataType::Bool, BinaryOp::Eq | BinaryOp::Ne) => match value {
                Value::Bool(b) => Ok(Term::boolean(field, b == (op == BinaryOp::Eq)).into()),
                Value::Null => Ok(with_sign(op, Term::equality(field, ""))),
                other => Err(CompileError::invalid_constant(format!(
                    "boolean field '{name}' compared with {}",
                    other.kind_label()
                ))),
            },

            (DataType::Reference, BinaryOp::Eq | BinaryOp::Ne) => {
                if value == Value::Null {
                    return Ok(with_sign(op, Term::equality(field, "")));
                }
                let target_id = reference_id(name, &value)?;

                Ok(with_sign(op, Term::ReferenceMatch { field, target_id }))
            }

            (_, BinaryOp::Eq | BinaryOp::Ne) => {
                let value = self.term_literal(name, value)?;
                Ok(with_sign(op, Term::Equality { field, value }))
            }

            (data_type, _) if !data_type.is_orderable() => Err(CompileError::unsupported(format!(
                "ordering comparison '{}' on field '{name}'",
                op.symbol()
            ))),

            (_, op) => {
                if value == Value::Null {
                    return Err(CompileError::invalid_constant(format!(
                        "null bound in ordering comparison on field '{name}'"
                    )));
                }
                let op = range_op(op)?;
                let op = if flipped { op.mirrored() } else { op };
                let value = self.term_literal(name, value)?;

                Ok(Term::Range { field, op, value }.into())
            }
        }
    }

    fn lower_call(
        &self,
        method: Method,
        target: &Expr,
        args: &[Expr],
    ) -> Result<Lowered, CompileError> {
        if args.len() != method.arity() {
            return Err(CompileError::unsupported(format!(
                "call '{}' with {} argument(s)",
                method.name(),
                args.len()
            )));
        }

        match method {
            Method::StartsWith | Method::EndsWith | Method::Contains => {
                self.lower_text_match(method, target, &args[0])
            }

            Method::Type | Method::TypeIs => {
                expect_candidate(method, target)?;
                let value = self.constant_arg(method, &args[0])?;
                let name = match value {
                    Value::Text(name) if !name.trim().is_empty() => name,
                    other => {
                        return Err(CompileError::invalid_constant(format!(
                            "'{}' needs a content type name, found {}",
                            method.name(),
                            other.kind_label()
                        )));
                    }
                };

                Ok(Lowered::Node(
                    Term::TypeFilter {
                        type_name: name.to_lowercase(),
                        transitive: method == Method::TypeIs,
                    }
                    .into(),
                ))
            }

            Method::InFolder | Method::InTree => {
                expect_candidate(method, target)?;
                let path = match self.constant_arg(method, &args[0])? {
                    Value::Text(path) => path,
                    Value::Node(node) => node.path,
                    other => {
                        return Err(CompileError::invalid_constant(format!(
                            "'{}' needs a path or node, found {}",
                            method.name(),
                            other.kind_label()
                        )));
                    }
                };
                if path.trim().is_empty() {
                    return Err(CompileError::invalid_constant(format!(
                        "'{}' needs a non-empty path",
                        method.name()
                    )));
                }
                let kind = if method == Method::InFolder {
                    ScopeKind::InFolder
                } else {
                    ScopeKind::InTree
                };

                Ok(Lowered::Node(
                    Term::Scope {
                        kind,
                        path: path.to_lowercase(),
                    }
                    .into(),
                ))
            }

            Method::AddDays
            | Method::AddHours
            | Method::AddMinutes
            | Method::AddSeconds
            | Method::ToLower
            | Method::ToUpper => Err(CompileError::unsupported(format!(
                "call '{}' used as a predicate",
                method.name()
            ))),
        }
    }

    // StartsWith / EndsWith / Contains on a field. An empty needle matches
    // every value and folds to `true`.
    fn lower_text_match(
        &self,
        method: Method,
        target: &Expr,
        arg: &Expr,
    ) -> Result<Lowered, CompileError> {
        let value = self.constant_arg(method, arg)?;
        let Expr::Field(name) = target else {
            return Err(CompileError::unsupported(format!(
                "call '{}' on {}",
                method.name(),
                target.describe()
            )));
        };
        let inferred = if method == Method::Contains {
            DataType::infer(&value)
        } else {
            DataType::Text
        };
        let info = self.resolve(name, inferred)?;

        if method == Method::Contains && info.multivalued {
            return self.lower_membership(name, info, value).map(Lowered::Node);
        }

        let text = value.to_match_text().ok_or_else(|| {
            CompileError::invalid_constant(format!(
                "'{}' needs a text argument, found {}",
                method.name(),
                value.kind_label()
            ))
        })?;
        if text.is_empty() {
            return Ok(Lowered::Const(true));
        }
        let shape = match method {
            Method::StartsWith => WildcardShape::Prefix,
            Method::EndsWith => WildcardShape::Suffix,
            _ => WildcardShape::Infix,
        };

        Ok(Lowered::Node(
            Term::Wildcard {
                field: info.indexed_name,
                text,
                shape,
            }
            .into(),
        ))
    }

    // Multi-valued `Contains`: single-value equality and membership render
    // identically.
    fn lower_membership(
        &self,
        name: &str,
        info: FieldInfo,
        value: Value,
    ) -> Result<Node, CompileError> {
        let field = info.indexed_name;
        if info.data_type == DataType::Reference {
            let target_id = reference_id(name, &value)?;
            return Ok(Term::ReferenceMatch { field, target_id }.into());
        }

        Ok(Term::Equality {
            field,
            value: self.term_literal(name, value)?,
        }
        .into())
    }

    fn lower_handler(&self, handler: &HandlerType) -> Result<Node, CompileError> {
        let name = self.ctx.types().type_name_of(handler).ok_or_else(|| {
            CompileError::UnknownContentType {
                handler: handler.rust_name(),
            }
        })?;

        Ok(Term::TypeFilter {
            type_name: name.to_lowercase(),
            transitive: true,
        }
        .into())
    }

    fn constant_arg(&self, method: Method, arg: &Expr) -> Result<Value, CompileError> {
        if !arg.is_constant() {
            return Err(CompileError::NonConstantArgument {
                operation: method.name(),
            });
        }

        self.folder.fold(arg)
    }

    fn resolve(&self, name: &str, inferred: DataType) -> Result<FieldInfo, CompileError> {
        if let Some(info) = self.ctx.fields().resolve(name) {
            return Ok(info.clone());
        }

        match self.ctx.options().unknown_fields {
            UnknownFieldPolicy::Reject => Err(CompileError::UnknownField {
                field: name.to_string(),
            }),
            UnknownFieldPolicy::Infer => Ok(FieldInfo::new(name, inferred)),
        }
    }

    // Literal as stored in a term: null reads as the empty string, text is
    // folded to the index's case when configured. Non-finite floats have no
    // literal form.
    fn term_literal(&self, name: &str, value: Value) -> Result<Value, CompileError> {
        match value {
            Value::Null => Ok(Value::Text(String::new())),
            Value::Float(v) if !v.is_finite() => Err(CompileError::invalid_constant(format!(
                "non-finite number compared with field '{name}'"
            ))),
            Value::Text(s) if self.ctx.options().lowercase_terms => {
                Ok(Value::Text(s.to_lowercase()))
            }
            other => Ok(other),
        }
    }
}

/// `left && right`. The right operand is emitted first, so a left-deep
/// chain `a && b && c` reads `c b a` once flattened.
pub(crate) fn conjoin(left: Lowered, right: Lowered) -> Lowered {
    match (left, right) {
        (Lowered::Const(false), _) | (_, Lowered::Const(false)) => Lowered::Const(false),
        (Lowered::Const(true), other) | (other, Lowered::Const(true)) => other,
        (Lowered::Node(left), Lowered::Node(right)) => Lowered::Node(Node::And(vec![right, left])),
    }
}

/// `left || right`, alternatives in declaration order.
pub(crate) fn disjoin(left: Lowered, right: Lowered) -> Lowered {
    match (left, right) {
        (Lowered::Const(true), _) | (_, Lowered::Const(true)) => Lowered::Const(true),
        (Lowered::Const(false), other) | (other, Lowered::Const(false)) => other,
        (Lowered::Node(left), Lowered::Node(right)) => Lowered::Node(Node::Or(vec![left, right])),
    }
}

pub(crate) fn negate(lowered: Lowered) -> Lowered {
    match lowered {
        Lowered::Const(b) => Lowered::Const(!b),
        Lowered::Node(node) => Lowered::Node(negate_node(node)),
    }
}

/// Negation that folds boolean literals and double negation in place.
pub(crate) fn negate_node(node: Node) -> Node {
    match node {
        Node::Term(Term::BooleanLiteral { field, value }) => Term::boolean(field, !value).into(),
        Node::Not(inner) => *inner,
        other => Node::Not(Box::new(other)),
    }
}

fn with_sign(op: BinaryOp, term: Term) -> Node {
    if op == BinaryOp::Ne {
        Node::Not(Box::new(term.into()))
    } else {
        term.into()
    }
}

fn expect_candidate(method: Method, target: &Expr) -> Result<(), CompileError> {
    if matches!(target, Expr::Candidate) {
        Ok(())
    } else {
        Err(CompileError::unsupported(format!(
            "call '{}' on {}",
            method.name(),
            target.describe()
        )))
    }
}

fn reference_id(name: &str, value: &Value) -> Result<u64, CompileError> {
    match value {
        Value::Node(node) => Ok(node.id),
        Value::Int(id) => u64::try_from(*id).map_err(|_| {
            CompileError::invalid_constant(format!("negative node id for reference field '{name}'"))
        }),
        other => Err(CompileError::invalid_constant(format!(
            "reference field '{name}' compared with {}",
            other.kind_label()
        ))),
    }
}

fn range_op(op: BinaryOp) -> Result<RangeOp, CompileError> {
    match op {
        BinaryOp::Lt => Ok(RangeOp::Lt),
        BinaryOp::Lte => Ok(RangeOp::Lte),
        BinaryOp::Gt => Ok(RangeOp::Gt),
        BinaryOp::Gte => Ok(RangeOp::Gte),
        other => Err(CompileError::unsupported(format!(
            "binary '{}' as a range",
            other.symbol()
        ))),
    }
}
