//! Query text serializer.
//!
//! Pure and total over the AST: every node and term kind has exactly one
//! rendering, so equal trees always produce byte-identical text.

use crate::{
    query::ast::{
        AutofilterMode, CompiledQuery, ExecutionMode, LifespanMode, Node, SortDirection, Term,
        WildcardShape,
    },
    value::Value,
};
use time::{OffsetDateTime, UtcOffset};

// Characters that force a literal into single quotes.
const QUOTE_TRIGGERS: &[char] = &[
    ':', '+', '!', '(', ')', '[', ']', '{', '}', '^', '"', '\'', '~', '*', '?', '&', '|', '\\',
];

/// Render a compiled query: predicate first, then directives in their fixed
/// order.
#[must_use]
pub fn render(query: &CompiledQuery) -> String {
    let mut parts = Vec::new();

    if let Some(predicate) = &query.predicate {
        parts.push(render_node(predicate));
    }

    for key in &query.sort.keys {
        let keyword = match key.direction {
            SortDirection::Asc => "SORT",
            SortDirection::Desc => "REVERSESORT",
        };
        parts.push(format!(".{keyword}:{}", key.field));
    }

    if let Some(top) = query.page.top.filter(|n| *n > 0) {
        parts.push(format!(".TOP:{top}"));
    }
    if let Some(skip) = query.page.skip.filter(|n| *n > 0) {
        parts.push(format!(".SKIP:{skip}"));
    }
    if query.flags.autofilters == AutofilterMode::Disabled {
        parts.push(".AUTOFILTERS:OFF".to_string());
    }
    if query.flags.lifespan == LifespanMode::Enabled {
        parts.push(".LIFESPAN:ON".to_string());
    }
    if query.flags.execution_mode == ExecutionMode::Quick {
        parts.push(".QUICK".to_string());
    }

    parts.join(" ")
}

/// Render a predicate tree at root position: a lone term is bare.
#[must_use]
pub fn render_node(node: &Node) -> String {
    match node {
        Node::Term(term) => render_term(term),
        Node::Not(inner) => format!("-{}", render_grouped(inner)),
        Node::And(_) | Node::Or(_) => render_composite(node),
    }
}

fn render_composite(node: &Node) -> String {
    match node {
        Node::And(children) => children
            .iter()
            .map(|child| match child {
                Node::Not(inner) => format!("-{}", render_grouped(inner)),
                other => format!("+{}", render_grouped(other)),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Node::Or(children) => children
            .iter()
            .map(|child| match child {
                Node::Not(inner) => format!("-{}", render_grouped(inner)),
                other => render_grouped(other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Node::Term(_) | Node::Not(_) => render_node(node),
    }
}

// Member of another composite: nested composites are parenthesized.
fn render_grouped(node: &Node) -> String {
    match node {
        Node::Term(term) if term.is_composite_fragment() => format!("({})", render_term(term)),
        Node::Term(term) => render_term(term),
        Node::And(_) | Node::Or(_) => format!("({})", render_composite(node)),
        Node::Not(inner) => format!("-{}", render_grouped(inner)),
    }
}

/// Render a single term without any sign.
#[must_use]
pub fn render_term(term: &Term) -> String {
    match term {
        Term::Equality { field, value } => format!("{field}:{}", render_value(value)),
        Term::Range { field, op, value } => {
            format!("{field}:{}{}", op.symbol(), render_value(value))
        }
        Term::Wildcard { field, text, shape } => {
            let body = escape_wildcard(text);
            match shape {
                WildcardShape::Prefix => format!("{field}:{body}*"),
                WildcardShape::Suffix => format!("{field}:*{body}"),
                WildcardShape::Infix => format!("{field}:*{body}*"),
            }
        }
        Term::TypeFilter {
            type_name,
            transitive,
        } => {
            let keyword = if *transitive { "TypeIs" } else { "Type" };
            format!("{keyword}:{}", quote_text(&type_name.to_lowercase()))
        }
        Term::ReferenceMatch { field, target_id } => format!("{field}:{target_id}"),
        Term::BooleanLiteral { field, value } => {
            format!("{field}:{}", if *value { "yes" } else { "no" })
        }
        Term::Scope { kind, path } => {
            format!("{}:{}", kind.keyword(), quote_text(&path.to_lowercase()))
        }
        Term::RawFragment { text } => text.trim().to_string(),
    }
}

/// Literal as it appears after `field:`.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "''".to_string(),
        Value::Bool(b) => String::from(if *b { "yes" } else { "no" }),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(s) => quote_text(s),
        Value::DateTime(at) => format!("'{}'", render_datetime(*at)),
        Value::Node(node) => node.id.to_string(),
    }
}

/// Single-quote text when the engine would otherwise split or interpret it.
#[must_use]
pub fn quote_text(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }

    let needs_quotes = text.starts_with('-')
        || text
            .chars()
            .any(|c| c.is_whitespace() || QUOTE_TRIGGERS.contains(&c));
    if !needs_quotes {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');

    out
}

// Wildcard bodies cannot be quoted; metacharacters are escaped one by one.
fn escape_wildcard(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        if c.is_whitespace() || QUOTE_TRIGGERS.contains(&c) || (i == 0 && c == '-') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

// `yyyy-MM-dd HH:mm:ss.ffff` in UTC.
fn render_datetime(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:04}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.nanosecond() / 100_000,
    )
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{PageSpec, QueryFlags, RangeOp, ScopeKind, SortKey, SortSpec};
    use time::macros::datetime;

    fn term(t: Term) -> Node {
        t.into()
    }

    #[test]
    fn literal_rendering() {
        assert_eq!(render_value(&Value::Text(String::new())), "''");
        assert_eq!(render_value(&Value::Text("car".into())), "car");
        assert_eq!(render_value(&Value::Text("a b".into())), "'a b'");
        assert_eq!(render_value(&Value::Text("it's".into())), r"'it\'s'");
        assert_eq!(render_value(&Value::Text("-x".into())), "'-x'");
        assert_eq!(render_value(&Value::Float(2.5)), "2.5");
        assert_eq!(render_value(&Value::Bool(false)), "no");
        assert_eq!(
            render_value(&Value::DateTime(datetime!(2026-10-15 13:45:30.123456 UTC))),
            "'2026-10-15 13:45:30.1234'"
        );
    }

    #[test]
    fn wildcards_escape_metacharacters() {
        let t = Term::Wildcard {
            field: "Name".into(),
            text: "a b*".into(),
            shape: WildcardShape::Infix,
        };
        assert_eq!(render_term(&t), r"Name:*a\ b\**");
    }

    #[test]
    fn signs_and_grouping() {
        let node = Node::And(vec![
            term(Term::TypeFilter {
                type_name: "Folder".into(),
                transitive: true,
            }),
            !term(Term::equality("Name", "c")),
            Node::Or(vec![
                term(Term::equality("Id", 1)),
                !term(Term::equality("Id", 2)),
            ]),
        ]);

        assert_eq!(render_node(&node), "+TypeIs:folder -Name:c +(Id:1 -Id:2)");
    }

    #[test]
    fn composite_raw_fragments_are_grouped_when_nested() {
        let node = Node::And(vec![
            term(Term::boolean("IsFolder", true)),
            term(Term::raw("Id:1 Id:2")),
        ]);
        assert_eq!(render_node(&node), "+IsFolder:yes +(Id:1 Id:2)");

        let node = Node::And(vec![
            term(Term::boolean("IsFolder", true)),
            term(Term::raw("Name:\"it's\" Id:1")),
        ]);
        assert_eq!(render_node(&node), "+IsFolder:yes +(Name:\"it's\" Id:1)");
        assert_eq!(render_node(&term(Term::raw(" Id:1 Id:2 "))), "Id:1 Id:2");
    }

    #[test]
    fn scope_paths_are_lowercased_and_quoted_on_demand() {
        let t = Term::Scope {
            kind: ScopeKind::InTree,
            path: "/Root/My Docs".into(),
        };
        assert_eq!(render_term(&t), "InTree:'/root/my docs'");
    }

    #[test]
    fn directives_follow_fixed_order() {
        let query = CompiledQuery {
            predicate: Some(term(Term::range("Id", RangeOp::Lt, 4))),
            sort: SortSpec {
                keys: vec![
                    SortKey {
                        field: "Id".into(),
                        direction: SortDirection::Asc,
                    },
                    SortKey {
                        field: "Name".into(),
                        direction: SortDirection::Desc,
                    },
                ],
            },
            page: PageSpec {
                skip: Some(8),
                top: Some(5),
            },
            flags: QueryFlags {
                autofilters: AutofilterMode::Disabled,
                lifespan: LifespanMode::Enabled,
                execution_mode: ExecutionMode::Quick,
            },
        };

        assert_eq!(
            render(&query),
            "Id:<4 .SORT:Id .REVERSESORT:Name .TOP:5 .SKIP:8 .AUTOFILTERS:OFF .LIFESPAN:ON .QUICK"
        );
    }

    #[test]
    fn zero_paging_is_omitted() {
        let query = CompiledQuery {
            predicate: Some(term(Term::equality("Id", 42))),
            page: PageSpec {
                skip: Some(0),
                top: Some(0),
            },
            ..CompiledQuery::default()
        };

        assert_eq!(render(&query), "Id:42");
    }
}
