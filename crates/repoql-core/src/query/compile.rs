use crate::{
    error::CompileError,
    obs::sink::{self, MetricsEvent},
    query::{
        ast::{CompiledQuery, CompiledText, Node, SortSpec},
        builder::QuerySpec,
        context::CompileContext,
        lower::{Lowered, Lowerer},
        normalize::{normalize_with_report, presence_guard},
        render::render,
        scope::{ScopeDescriptor, combine},
    },
};

/// Compile a query under a scope into engine query text.
///
/// Runs lowering, normalization, scope merging and rendering. On failure no
/// text is produced.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile(
    spec: &QuerySpec,
    scope: &ScopeDescriptor,
    ctx: &CompileContext<'_>,
) -> Result<CompiledText, CompileError> {
    sink::record(MetricsEvent::CompileStart);

    match compile_scoped(spec, scope, ctx) {
        Ok((query, guarded)) => {
            let text = render(&query);
            let terms = query.predicate.as_ref().map_or(0, Node::term_count);

            if ctx.options().trace_queries {
                tracing::info!(query = %text, terms, guarded, "compiled query");
            } else {
                tracing::debug!(query = %text, terms, guarded, "compiled query");
            }
            sink::record(MetricsEvent::CompileFinish {
                terms: u64::try_from(terms).unwrap_or(u64::MAX),
                guarded,
                scoped: !scope.is_empty(),
            });

            Ok(CompiledText {
                text,
                execution_mode: query.flags.execution_mode,
            })
        }
        Err(err) => {
            tracing::warn!(error = %err, kind = err.label(), "query compilation failed");
            sink::record(MetricsEvent::CompileFailed { kind: err.label() });

            Err(err)
        }
    }
}

/// Lower and normalize a query without any scope.
///
/// The predicate is `None` when the filter is absent or always true.
pub fn compile_query(
    spec: &QuerySpec,
    ctx: &CompileContext<'_>,
) -> Result<CompiledQuery, CompileError> {
    lower_query(spec, ctx).map(|(query, _)| query)
}

fn compile_scoped(
    spec: &QuerySpec,
    scope: &ScopeDescriptor,
    ctx: &CompileContext<'_>,
) -> Result<(CompiledQuery, bool), CompileError> {
    let (query, mut guarded) = lower_query(spec, ctx)?;
    let mut query = combine(query, scope)?;

    if query.predicate.is_none() {
        query.predicate = Some(presence_guard(&ctx.options().guard_field));
        guarded = true;
    }

    Ok((query, guarded))
}

fn lower_query(
    spec: &QuerySpec,
    ctx: &CompileContext<'_>,
) -> Result<(CompiledQuery, bool), CompileError> {
    let lowerer = Lowerer::new(ctx);

    let lowered = match &spec.predicate {
        Some(expr) => lowerer.lower_predicate(expr)?,
        None => Lowered::Const(true),
    };
    let (predicate, guarded) = match lowered {
        Lowered::Const(true) => (None, false),
        Lowered::Const(false) => return Err(CompileError::ConstantPredicate),
        Lowered::Node(node) => match normalize_with_report(node, &ctx.options().guard_field) {
            Some((node, guarded)) => (Some(node), guarded),
            None => (None, false),
        },
    };

    let sort = SortSpec {
        keys: lowerer.lower_sort(&spec.sort)?,
    };

    Ok((
        CompiledQuery {
            predicate,
            sort,
            page: spec.page,
            flags: spec.flags,
        },
        guarded,
    ))
}
