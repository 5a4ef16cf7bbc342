#![no_main]

use libfuzzer_sys::fuzz_target;
use overql::{difference_of, union_of, QueryBuilder, QueryStatement, Term};
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
enum BuilderOp {
    Append { ranks: Vec<u8>, filter: String },
    AppendNamed { name: String, ranks: Vec<u8> },
    Union { left: u8, right: u8 },
    Difference { left: u8, right: u8 },
    ResultLimit(i64),
    IncludeGeometries,
    ToggleDescend,
}

fn statement(ranks: &[u8], filter: &str) -> Option<QueryStatement> {
    let stmt = QueryStatement::of(ranks).ok()?;
    if filter.is_empty() {
        return Some(stmt);
    }
    stmt.with_filter(filter).ok()
}

fn kind(rank: u8) -> Term {
    let stmt = match rank % 3 {
        0 => QueryStatement::node(),
        1 => QueryStatement::way(),
        _ => QueryStatement::relation(),
    };
    Term::from(stmt)
}

fuzz_target!(|ops: Vec<BuilderOp>| {
    let mut builder = QueryBuilder::new();

    for op in ops.iter().take(64) {
        match op {
            BuilderOp::Append { ranks, filter } => {
                if filter.len() <= 256 {
                    if let Some(stmt) = statement(ranks, filter) {
                        let _ = builder.append(stmt);
                    }
                }
            }
            BuilderOp::AppendNamed { name, ranks } => {
                if let Some(stmt) = statement(ranks, "") {
                    let _ = builder.append_named(name, stmt);
                }
            }
            BuilderOp::Union { left, right } => {
                let _ = builder.append(union_of(kind(*left), kind(*right)));
            }
            BuilderOp::Difference { left, right } => {
                if let Ok(diff) = difference_of(kind(*left), kind(*right)) {
                    let _ = builder.append(diff);
                }
            }
            BuilderOp::ResultLimit(limit) => {
                let _ = builder.output_format_mut().set_result_limit(*limit);
            }
            BuilderOp::IncludeGeometries => builder.include_geometries(),
            BuilderOp::ToggleDescend => {
                let auto_descend = builder.auto_descend();
                builder.set_auto_descend(!auto_descend);
            }
        }
    }

    // Rendering is total: every program ends with the output statement
    let program = builder.raw_query_string();
    assert!(program.contains("out"));
    assert!(program.ends_with(';'));
});
