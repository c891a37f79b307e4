//! Compile-time evaluation of closed-form constant sub-expressions.

use crate::{
    error::CompileError,
    query::expr::{BinaryOp, Expr, Method},
    value::Value,
};
use std::{cell::OnceCell, cmp::Ordering};
use time::{Duration, OffsetDateTime, Time, UtcOffset};

///
/// Clock
///
/// Source of `Now`. A compilation samples it at most once so every `Now` in
/// one predicate agrees.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Clock {
    #[default]
    System,
    Fixed(OffsetDateTime),
}

impl Clock {
    fn read(self) -> OffsetDateTime {
        match self {
            Self::System => OffsetDateTime::now_utc(),
            Self::Fixed(at) => at.to_offset(UtcOffset::UTC),
        }
    }
}

///
/// Folder
///
/// Per-compilation constant evaluator.
///

pub(crate) struct Folder {
    clock: Clock,
    now: OnceCell<OffsetDateTime>,
}

impl Folder {
    pub(crate) const fn new(clock: Clock) -> Self {
        Self {
            clock,
            now: OnceCell::new(),
        }
    }

    fn now(&self) -> OffsetDateTime {
        *self.now.get_or_init(|| self.clock.read())
    }

    /// Fold a constant expression to its literal.
    /// Callers check `Expr::is_constant` first; candidate reads are rejected.
    pub(crate) fn fold(&self, expr: &Expr) -> Result<Value, CompileError> {
        match expr {
            Expr::Constant(v) => Ok(v.clone()),
            Expr::Now => Ok(Value::DateTime(self.now())),
            Expr::Today => Ok(Value::DateTime(self.now().replace_time(Time::MIDNIGHT))),
            Expr::Field(_) | Expr::Candidate | Expr::HandlerIs(_) => Err(
                CompileError::unsupported(format!("{} in a constant expression", expr.describe())),
            ),

            Expr::Not(inner) => match self.fold(inner)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(type_error("!", &other)),
            },
            Expr::Negate(inner) => match self.fold(inner)? {
                Value::Int(v) => v
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| CompileError::invalid_constant("integer overflow in negation")),
                Value::Float(v) => Ok(Value::Float(-v)),
                other => Err(type_error("-", &other)),
            },

            Expr::Binary { op, lhs, rhs } => self.fold_binary(*op, lhs, rhs),

            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                if self.fold_bool(test)? {
                    self.fold(if_true)
                } else {
                    self.fold(if_false)
                }
            }

            Expr::Call {
                method,
                target,
                args,
            } => self.fold_call(*method, target, args),
        }
    }

    pub(crate) fn fold_bool(&self, expr: &Expr) -> Result<bool, CompileError> {
        match self.fold(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(CompileError::invalid_constant(format!(
                "expected a boolean condition, found {}",
                other.kind_label()
            ))),
        }
    }

    fn fold_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, CompileError> {
        match op {
            // short-circuit operators evaluate the right side only when needed
            BinaryOp::AndAlso => Ok(Value::Bool(self.fold_bool(lhs)? && self.fold_bool(rhs)?)),
            BinaryOp::OrElse => Ok(Value::Bool(self.fold_bool(lhs)? || self.fold_bool(rhs)?)),
            BinaryOp::Eq => Ok(Value::Bool(self.fold(lhs)? == self.fold(rhs)?)),
            BinaryOp::Ne => Ok(Value::Bool(self.fold(lhs)? != self.fold(rhs)?)),
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let left = self.fold(lhs)?;
                let right = self.fold(rhs)?;
                let ord = left.partial_order(&right).ok_or_else(|| {
                    CompileError::invalid_constant(format!(
                        "cannot order {} against {}",
                        left.kind_label(),
                        right.kind_label()
                    ))
                })?;
                let result = match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Lte => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                arithmetic(op, self.fold(lhs)?, self.fold(rhs)?)
            }
        }
    }

    fn fold_call(
        &self,
        method: Method,
        target: &Expr,
        args: &[Expr],
    ) -> Result<Value, CompileError> {
        if args.len() != method.arity() {
            return Err(CompileError::unsupported(format!(
                "call '{}' with {} argument(s)",
                method.name(),
                args.len()
            )));
        }

        let target = self.fold(target)?;
        match method {
            Method::AddDays => shift(target, self.fold(&args[0])?, Duration::DAY),
            Method::AddHours => shift(target, self.fold(&args[0])?, Duration::HOUR),
            Method::AddMinutes => shift(target, self.fold(&args[0])?, Duration::MINUTE),
            Method::AddSeconds => shift(target, self.fold(&args[0])?, Duration::SECOND),
            Method::ToLower => map_text(method, target, |s| s.to_lowercase()),
            Method::ToUpper => map_text(method, target, |s| s.to_uppercase()),
            Method::StartsWith | Method::EndsWith | Method::Contains => {
                let arg = self.fold(&args[0])?;
                let (Value::Text(haystack), Some(needle)) = (&target, arg.to_match_text()) else {
                    return Err(type_error(method.name(), &target));
                };
                let hit = match method {
                    Method::StartsWith => haystack.starts_with(&needle),
                    Method::EndsWith => haystack.ends_with(&needle),
                    _ => haystack.contains(&needle),
                };
                Ok(Value::Bool(hit))
            }
            Method::Type | Method::TypeIs | Method::InFolder | Method::InTree => Err(
                CompileError::unsupported(format!("call '{}' on a constant", method.name())),
            ),
        }
    }
}

fn type_error(op: &str, value: &Value) -> CompileError {
    CompileError::invalid_constant(format!(
        "operator '{op}' does not apply to {}",
        value.kind_label()
    ))
}

fn overflow() -> CompileError {
    CompileError::invalid_constant("arithmetic overflow in constant expression")
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, CompileError> {
    match (op, left, right) {
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => {
            a.checked_add(b).map(Value::Int).ok_or_else(overflow)
        }
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => {
            a.checked_sub(b).map(Value::Int).ok_or_else(overflow)
        }
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => {
            a.checked_mul(b).map(Value::Int).ok_or_else(overflow)
        }
        (BinaryOp::Add, Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
        (op, a @ (Value::Int(_) | Value::Float(_)), b @ (Value::Int(_) | Value::Float(_))) => {
            let (a, b) = (as_float(&a), as_float(&b));
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                _ => a * b,
            };
            if !result.is_finite() {
                return Err(CompileError::invalid_constant(
                    "non-finite result in constant expression",
                ));
            }

            Ok(Value::Float(result))
        }
        (op, left, _) => Err(type_error(op.symbol(), &left)),
    }
}

#[expect(clippy::cast_precision_loss)]
const fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(v) => *v as f64,
        Value::Float(v) => *v,
        _ => 0.0,
    }
}

fn shift(target: Value, amount: Value, unit: Duration) -> Result<Value, CompileError> {
    let Value::DateTime(at) = target else {
        return Err(type_error("date shift", &target));
    };
    let delta = match amount {
        Value::Int(n) => unit
            .checked_mul(i32::try_from(n).map_err(|_| overflow())?)
            .ok_or_else(overflow)?,
        Value::Float(n) => {
            Duration::checked_seconds_f64(unit.as_seconds_f64() * n).ok_or_else(overflow)?
        }
        other => return Err(type_error("date shift", &other)),
    };

    at.checked_add(delta).map(Value::DateTime).ok_or_else(overflow)
}

fn map_text(
    method: Method,
    target: Value,
    f: impl FnOnce(&str) -> String,
) -> Result<Value, CompileError> {
    match target {
        Value::Text(s) => Ok(Value::Text(f(&s))),
        Value::Null => Ok(Value::Null),
        other => Err(type_error(method.name(), &other)),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::{field, now, today, value};
    use time::macros::datetime;

    fn folder() -> Folder {
        Folder::new(Clock::Fixed(datetime!(2026-10-17 13:45:30.123456 UTC)))
    }

    #[test]
    fn now_shifts_are_folded() {
        let folded = folder().fold(&now().add_days(-2)).unwrap();
        assert_eq!(
            folded,
            Value::DateTime(datetime!(2026-10-15 13:45:30.123456 UTC))
        );

        let folded = folder().fold(&today().add_hours(6)).unwrap();
        assert_eq!(folded, Value::DateTime(datetime!(2026-10-17 06:00 UTC)));
    }

    #[test]
    fn now_is_sampled_once() {
        let folder = Folder::new(Clock::System);
        let first = folder.fold(&now()).unwrap();
        let second = folder.fold(&now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn arithmetic_and_text_helpers() {
        let f = folder();
        assert_eq!(f.fold(&(value(40) + value(2))).unwrap(), Value::Int(42));
        assert_eq!(f.fold(&(value(3) * value(1.5))).unwrap(), Value::Float(4.5));
        assert_eq!(
            f.fold(&(value("Car") + value("1"))).unwrap(),
            Value::Text("Car1".to_string())
        );
        assert_eq!(
            f.fold(&value("ABC").to_lower()).unwrap(),
            Value::Text("abc".to_string())
        );
        assert_eq!(f.fold(&-value(5)).unwrap(), Value::Int(-5));
    }

    #[test]
    fn constant_comparisons_fold_to_bools() {
        let f = folder();
        assert_eq!(f.fold(&value(1).lt(2)).unwrap(), Value::Bool(true));
        assert_eq!(
            f.fold(&value("Car").starts_with("Ca")).unwrap(),
            Value::Bool(true)
        );
        assert!(f.fold_bool(&value(1).eq(1).and(value(false))).is_ok());
    }

    #[test]
    fn overflow_is_reported() {
        let err = folder().fold(&(value(i64::MAX) + value(1))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConstant { .. }));
    }

    #[test]
    fn non_finite_arithmetic_is_rejected() {
        let f = folder();
        let err = f.fold(&(value(f64::MAX) * value(2.0))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConstant { .. }));

        let err = f.fold(&(value(f64::INFINITY) - value(f64::INFINITY))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidConstant { .. }));
    }

    #[test]
    fn candidate_reads_do_not_fold() {
        let err = folder().fold(&field("Id")).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedExpressionNode { .. }));
    }
}
