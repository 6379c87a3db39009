//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for the authors and books tables.
//! Soft-delete scoping is explicit: every read takes a `Scope` and the builder adds the
//! `deleted_at IS NULL` predicate itself, so no query path can include deleted rows by accident.

use super::params::BindValue;

/// Static description of a table. Identifiers only ever come from these constants.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub soft_delete: bool,
}

pub const AUTHORS: TableSpec = TableSpec {
    name: "authors",
    columns: &["id", "name", "email", "created_at", "updated_at"],
    soft_delete: false,
};

pub const BOOKS: TableSpec = TableSpec {
    name: "books",
    columns: &[
        "id",
        "title",
        "isbn",
        "published_date",
        "author_id",
        "deleted_at",
        "created_at",
        "updated_at",
    ],
    soft_delete: true,
};

/// Which rows a query may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Only rows that are not soft-deleted.
    Active,
    /// Every stored row, including soft-deleted ones.
    WithDeleted,
}

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn column_list(table: &TableSpec) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn scope_predicate(table: &TableSpec, scope: Scope) -> Option<String> {
    (table.soft_delete && scope == Scope::Active).then(|| format!("{} IS NULL", quoted("deleted_at")))
}

fn where_clause(parts: Vec<String>) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Escape LIKE wildcards so the needle matches literally, then wrap it for a substring match.
pub fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// SELECT every visible row, ORDER BY id.
pub fn select_list(table: &TableSpec, scope: Scope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(scope_predicate(table, scope).into_iter().collect());
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        column_list(table),
        quoted(table.name),
        where_sql,
        quoted("id")
    );
    q
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableSpec, id: i64, scope: Scope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    let mut parts = vec![format!("{} = ${}", quoted("id"), n)];
    parts.extend(scope_predicate(table, scope));
    q.sql = format!(
        "SELECT {} FROM {}{}",
        column_list(table),
        quoted(table.name),
        where_clause(parts)
    );
    q
}

/// SELECT rows whose `column` contains `needle` anywhere (case-insensitive), ORDER BY id.
pub fn select_where_contains(table: &TableSpec, column: &str, needle: &str, scope: Scope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(contains_pattern(needle)));
    let mut parts = vec![format!("{} ILIKE ${} ESCAPE '\\'", quoted(column), n)];
    parts.extend(scope_predicate(table, scope));
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        column_list(table),
        quoted(table.name),
        where_clause(parts),
        quoted("id")
    );
    q
}

/// SELECT EXISTS(...) for `column = value`, optionally ignoring the row with id `except_id`.
pub fn exists_where(
    table: &TableSpec,
    column: &str,
    value: BindValue,
    except_id: Option<i64>,
    scope: Scope,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value);
    let mut parts = vec![format!("{} = ${}", quoted(column), n)];
    if let Some(id) = except_id {
        let n = q.push_param(BindValue::I64(id));
        parts.push(format!("{} <> ${}", quoted("id"), n));
    }
    parts.extend(scope_predicate(table, scope));
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {}{})",
        quoted(table.name),
        where_clause(parts)
    );
    q
}

/// SELECT COUNT(*) for `column = value`.
pub fn count_where(table: &TableSpec, column: &str, value: BindValue, scope: Scope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value);
    let mut parts = vec![format!("{} = ${}", quoted(column), n)];
    parts.extend(scope_predicate(table, scope));
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(table.name), where_clause(parts));
    q
}

/// INSERT the given fields; id and timestamps come from column defaults.
pub fn insert(table: &TableSpec, fields: Vec<(&'static str, BindValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let n = q.push_param(value);
        cols.push(quoted(name));
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table.name),
        cols.join(", "),
        placeholders.join(", "),
        column_list(table)
    );
    q
}

/// UPDATE by id: SET only the supplied fields plus `updated_at`. With no fields this degrades to a SELECT.
pub fn update(table: &TableSpec, id: i64, fields: Vec<(&'static str, BindValue)>, scope: Scope) -> QueryBuf {
    if fields.is_empty() {
        return select_by_id(table, id, scope);
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(fields.len() + 1);
    for (name, value) in fields {
        let n = q.push_param(value);
        sets.push(format!("{} = ${}", quoted(name), n));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let n = q.push_param(BindValue::I64(id));
    let mut parts = vec![format!("{} = ${}", quoted("id"), n)];
    parts.extend(scope_predicate(table, scope));
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        where_clause(parts),
        column_list(table)
    );
    q
}

/// Physical DELETE by id.
pub fn delete(table: &TableSpec, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    q.sql = format!("DELETE FROM {} WHERE {} = ${}", quoted(table.name), quoted("id"), n);
    q
}

/// Mark an active row deleted. Already-deleted rows are left untouched (no row returned).
pub fn soft_delete(table: &TableSpec, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} = NOW(), {} = NOW() WHERE {} = ${} AND {} IS NULL RETURNING {}",
        quoted(table.name),
        quoted("deleted_at"),
        quoted("updated_at"),
        quoted("id"),
        n,
        quoted("deleted_at"),
        quoted("id")
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_scope_excludes_deleted_books() {
        let q = select_list(&BOOKS, Scope::Active);
        assert!(q.sql.ends_with(r#"FROM "books" WHERE "deleted_at" IS NULL ORDER BY "id""#));
        assert!(q.params.is_empty());

        let q = select_list(&BOOKS, Scope::WithDeleted);
        assert!(!q.sql.contains("deleted_at\" IS NULL"));
    }

    #[test]
    fn authors_have_no_scope_predicate() {
        let q = select_by_id(&AUTHORS, 4, Scope::Active);
        assert_eq!(
            q.sql,
            r#"SELECT "id", "name", "email", "created_at", "updated_at" FROM "authors" WHERE "id" = $1"#
        );
        assert_eq!(q.params, vec![BindValue::I64(4)]);
    }

    #[test]
    fn isbn_uniqueness_excludes_self_and_deleted() {
        let q = exists_where(&BOOKS, "isbn", "978".into(), Some(9), Scope::Active);
        assert_eq!(
            q.sql,
            r#"SELECT EXISTS(SELECT 1 FROM "books" WHERE "isbn" = $1 AND "id" <> $2 AND "deleted_at" IS NULL)"#
        );
        assert_eq!(q.params, vec![BindValue::Text("978".into()), BindValue::I64(9)]);
    }

    #[test]
    fn search_escapes_wildcards() {
        assert_eq!(contains_pattern("Dun"), "%Dun%");
        assert_eq!(contains_pattern("100%_a"), "%100\\%\\_a%");
        let q = select_where_contains(&BOOKS, "title", "Dun", Scope::Active);
        assert!(q.sql.contains(r#""title" ILIKE $1 ESCAPE '\' AND "deleted_at" IS NULL"#));
    }

    #[test]
    fn update_sets_only_supplied_fields() {
        let q = update(&BOOKS, 3, vec![("title", "Dune Messiah".into())], Scope::Active);
        assert!(q.sql.starts_with(r#"UPDATE "books" SET "title" = $1, "updated_at" = NOW() WHERE "id" = $2 AND "deleted_at" IS NULL"#));
        assert_eq!(q.params.len(), 2);

        let q = update(&BOOKS, 3, Vec::new(), Scope::Active);
        assert!(q.sql.starts_with("SELECT"));
    }

    #[test]
    fn soft_delete_only_touches_active_rows() {
        let q = soft_delete(&BOOKS, 1);
        assert!(q.sql.contains(r#"SET "deleted_at" = NOW()"#));
        assert!(q.sql.contains(r#"AND "deleted_at" IS NULL"#));
    }
}
