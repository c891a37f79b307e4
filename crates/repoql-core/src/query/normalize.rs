use crate::{
    query::ast::{Node, RangeOp, Term},
    value::Value,
};

///
/// Normalize a query tree into its canonical form.
///
/// Normalization guarantees:
/// - Nested AND / OR nodes of the same kind are flattened in place
/// - Single-child composites collapse to their child
/// - Empty composites are dropped
/// - Double negation is eliminated; negated boolean literals are flipped
/// - Purely negative groups gain a presence guard on `guard_field`: a
///   negative root or all-negative conjunction gets the guard appended, each
///   alternative of an all-negative disjunction is guarded on its own
///
/// Declaration order is never changed, so this pass is idempotent and the
/// emitted text stays readable next to the source predicate.
///
/// Returns `None` when nothing is left to filter on.
///
#[must_use]
pub fn normalize(node: Node, guard_field: &str) -> Option<Node> {
    normalize_with_report(node, guard_field).map(|(node, _)| node)
}

/// Same as [`normalize`], also reporting whether a presence guard was added.
#[must_use]
pub fn normalize_with_report(node: Node, guard_field: &str) -> Option<(Node, bool)> {
    let mut guarded = false;
    let node = guard_groups(normalize_node(node)?, guard_field, &mut guarded);

    if node.is_negated() {
        return Some((Node::And(vec![node, presence_guard(guard_field)]), true));
    }

    Some((node, guarded))
}

/// The term that keeps a negative-only query legal: `<guard_field>:>0`.
#[must_use]
pub fn presence_guard(guard_field: &str) -> Node {
    Term::range(guard_field, RangeOp::Gt, Value::Int(0)).into()
}

fn normalize_node(node: Node) -> Option<Node> {
    match node {
        Node::Term(term) => Some(Node::Term(term)),
        Node::And(children) => collapse(flatten(children, true), Node::And),
        Node::Or(children) => collapse(flatten(children, false), Node::Or),
        Node::Not(inner) => normalize_node(*inner).map(normalize_not),
    }
}

fn normalize_not(inner: Node) -> Node {
    match inner {
        Node::Not(inner) => *inner,
        Node::Term(Term::BooleanLiteral { field, value }) => Term::boolean(field, !value).into(),
        other => Node::Not(Box::new(other)),
    }
}

// Normalize children and splice same-kind composites into the parent.
fn flatten(children: Vec<Node>, is_and: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());

    for child in children {
        match normalize_node(child) {
            Some(Node::And(inner)) if is_and => out.extend(inner),
            Some(Node::Or(inner)) if !is_and => out.extend(inner),
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

fn collapse(mut children: Vec<Node>, build: fn(Vec<Node>) -> Node) -> Option<Node> {
    match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(build(children)),
    }
}

// A group made of negations only matches nothing on the target engine, at
// the root or nested. Conjunctions get the guard as an extra member;
// disjunctions guard every alternative.
fn guard_groups(node: Node, guard_field: &str, guarded: &mut bool) -> Node {
    match node {
        Node::Term(_) => node,
        Node::Not(inner) => Node::Not(Box::new(guard_groups(*inner, guard_field, guarded))),
        Node::And(children) => {
            let mut children = guard_children(children, guard_field, guarded);
            if children.iter().all(Node::is_negated) {
                children.push(presence_guard(guard_field));
                *guarded = true;
            }

            Node::And(children)
        }
        Node::Or(children) => {
            let children = guard_children(children, guard_field, guarded);
            if !children.iter().all(Node::is_negated) {
                return Node::Or(children);
            }
            *guarded = true;

            Node::Or(
                children
                    .into_iter()
                    .map(|child| Node::And(vec![child, presence_guard(guard_field)]))
                    .collect(),
            )
        }
    }
}

fn guard_children(children: Vec<Node>, guard_field: &str, guarded: &mut bool) -> Vec<Node> {
    children
        .into_iter()
        .map(|child| guard_groups(child, guard_field, guarded))
        .collect()
}

///
/// TESTS
///
