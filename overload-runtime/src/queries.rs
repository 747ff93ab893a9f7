//! Query input files.
use overload_core::Query;

const FENCE: &str = "```";

/// Split `text` into queries.
///
/// Every fenced block tagged `sql` becomes one query. Text without any such block is taken
/// as a single query. Blank blocks are skipped.
pub fn parse_queries(text: &str) -> Vec<Query> {
    let mut queries = vec![];
    let mut block: Option<Vec<&str>> = None;
    let mut fenced = false;

    for line in text.lines() {
        let trimmed = line.trim();
        match block.as_mut() {
            Some(lines) if trimmed == FENCE => {
                push_query(&mut queries, &lines.join("\n"));
                block = None;
            }
            Some(lines) => lines.push(line),
            None => {
                if let Some(tag) = trimmed.strip_prefix(FENCE) {
                    if tag.trim().eq_ignore_ascii_case("sql") {
                        fenced = true;
                        block = Some(vec![]);
                    }
                }
            }
        }
    }

    // Unterminated block runs to the end of the file.
    if let Some(lines) = block {
        push_query(&mut queries, &lines.join("\n"));
    }

    if !fenced {
        push_query(&mut queries, text);
    }

    queries
}

fn push_query(queries: &mut Vec<Query>, sql: &str) {
    let sql = sql.trim();
    if !sql.is_empty() {
        queries.push(Query::new(sql));
    }
}
