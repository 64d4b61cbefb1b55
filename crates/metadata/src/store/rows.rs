//! Shared SQL helpers for root and child tables.
//!
//! Every child table has the same shape: an `id` primary key, a `parent_id`
//! foreign key with `ON DELETE CASCADE`, and the columns listed by its
//! [`ChildRow`] impl. Table and column names come from constants in this
//! crate, never from callers.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{ClientClaim, Owned, Property, Secret, UserClaim, ValueRow};
use gatehouse_core::paging::{LIKE_ESCAPE, like_pattern, listing_limit};
use gatehouse_core::{Aggregate, Page, PagedList, SortOrder, SurrogateKey};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqliteConnection};
use std::collections::{HashMap, HashSet};

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A child table and the label used for it in error details.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildTable {
    pub table: &'static str,
    pub label: &'static str,
}

/// A row stored in a child table.
pub(crate) trait ChildRow:
    for<'r> FromRow<'r, SqliteRow> + PartialEq + Send + Sync + Unpin
{
    /// Data columns, in bind order. Excludes `id` and `parent_id`.
    const COLUMNS: &'static [&'static str];

    /// Column that must be unique per parent, if any.
    const UNIQUE_COLUMN: Option<&'static str> = None;

    fn id(&self) -> SurrogateKey;

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

impl ChildRow for Secret {
    const COLUMNS: &'static [&'static str] =
        &["secret_type", "value", "description", "expiration", "created"];

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.secret_type)
            .bind(&self.value)
            .bind(&self.description)
            .bind(self.expiration)
            .bind(self.created)
    }
}

impl ChildRow for ClientClaim {
    const COLUMNS: &'static [&'static str] = &["claim_type", "value"];

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.claim_type).bind(&self.value)
    }
}

impl ChildRow for Property {
    const COLUMNS: &'static [&'static str] = &["key", "value"];
    const UNIQUE_COLUMN: Option<&'static str> = Some("key");

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.key).bind(&self.value)
    }
}

impl ChildRow for UserClaim {
    const COLUMNS: &'static [&'static str] = &["claim_type"];

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.claim_type)
    }
}

impl ChildRow for ValueRow {
    const COLUMNS: &'static [&'static str] = &["value"];

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn bind_values<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.value)
    }
}

// =============================================================================
// Root tables
// =============================================================================

/// A root table, its business key column, and the extra columns searched by
/// free-text queries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RootTable {
    pub table: &'static str,
    pub key_column: &'static str,
    pub search_columns: &'static [&'static str],
    pub label: &'static str,
}

pub(crate) async fn root_exists(
    conn: &mut SqliteConnection,
    root: &RootTable,
    id: SurrogateKey,
) -> MetadataResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", root.table);
    let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    Ok(exists)
}

/// Fail with `NotFound` unless the root row exists.
pub(crate) async fn require_root(
    conn: &mut SqliteConnection,
    root: &RootTable,
    id: SurrogateKey,
) -> MetadataResult<()> {
    if root_exists(conn, root, id).await? {
        Ok(())
    } else {
        Err(MetadataError::NotFound(format!("{} {id}", root.label)))
    }
}

/// Fail with `NotFound` unless `aggregate` was stored and its root row still
/// exists.
pub(crate) async fn require_stored<A: Aggregate>(
    conn: &mut SqliteConnection,
    root: &RootTable,
    aggregate: &A,
) -> MetadataResult<()> {
    if !aggregate.is_persisted() {
        return Err(MetadataError::NotFound(format!("unsaved {}", A::KIND)));
    }
    require_root(conn, root, aggregate.id()).await
}

/// Error detail naming an aggregate by kind and business key.
pub(crate) fn key_detail<A: Aggregate>(aggregate: &A) -> String {
    format!("{} '{}'", A::KIND, aggregate.business_key())
}

/// True when a row other than `except` already uses `key`.
pub(crate) async fn key_taken(
    conn: &mut SqliteConnection,
    root: &RootTable,
    key: &str,
    except: SurrogateKey,
) -> MetadataResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? AND id != ?)",
        root.table, root.key_column
    );
    let taken: bool = sqlx::query_scalar(&sql)
        .bind(key)
        .bind(except)
        .fetch_one(&mut *conn)
        .await?;
    Ok(taken)
}

pub(crate) async fn business_key(
    conn: &mut SqliteConnection,
    root: &RootTable,
    id: SurrogateKey,
) -> MetadataResult<Option<String>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?", root.key_column, root.table);
    let key: Option<String> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(key)
}

pub(crate) async fn fetch_root<T>(
    conn: &mut SqliteConnection,
    root: &RootTable,
    id: SurrogateKey,
) -> MetadataResult<Option<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE id = ?", root.table);
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

fn search_clause(root: &RootTable) -> String {
    root.search_columns
        .iter()
        .map(|column| format!("{column} LIKE ? ESCAPE '{LIKE_ESCAPE}'"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// One page of root rows matching `search`, plus the total match count.
pub(crate) async fn search_page<T>(
    conn: &mut SqliteConnection,
    root: &RootTable,
    search: &str,
    page: Page,
) -> MetadataResult<PagedList<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let pattern = like_pattern(search);
    let clause = search_clause(root);

    let count_sql = format!("SELECT COUNT(*) FROM {} WHERE {clause}", root.table);
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for _ in root.search_columns {
        count = count.bind(&pattern);
    }
    let total: i64 = count.fetch_one(&mut *conn).await?;

    let order = match page.order() {
        SortOrder::Id => "id".to_string(),
        SortOrder::Name => format!("{} COLLATE NOCASE, id", root.key_column),
    };
    let sql = format!(
        "SELECT * FROM {} WHERE {clause} ORDER BY {order} LIMIT ? OFFSET ?",
        root.table
    );
    let mut query = sqlx::query_as::<_, T>(&sql);
    for _ in root.search_columns {
        query = query.bind(&pattern);
    }
    let items = query
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok(PagedList::new(items, total as u64, page))
}

/// Business keys matching `search` in name order; `limit` 0 means no limit.
pub(crate) async fn key_listing(
    conn: &mut SqliteConnection,
    root: &RootTable,
    search: &str,
    limit: u32,
) -> MetadataResult<Vec<String>> {
    let sql = format!(
        "SELECT {key} FROM {table} WHERE {key} LIKE ? ESCAPE '{LIKE_ESCAPE}' \
         ORDER BY {key} COLLATE NOCASE LIMIT ?",
        key = root.key_column,
        table = root.table
    );
    let keys: Vec<String> = sqlx::query_scalar(&sql)
        .bind(like_pattern(search))
        .bind(listing_limit(limit))
        .fetch_all(&mut *conn)
        .await?;
    Ok(keys)
}

/// Delete a root row. Children go with it through `ON DELETE CASCADE`.
pub(crate) async fn delete_root(
    conn: &mut SqliteConnection,
    root: &RootTable,
    id: SurrogateKey,
) -> MetadataResult<u64> {
    let sql = format!("DELETE FROM {} WHERE id = ?", root.table);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(MetadataError::NotFound(format!("{} {id}", root.label)));
    }
    Ok(result.rows_affected())
}

// =============================================================================
// Child tables
// =============================================================================

fn column_list<T: ChildRow>() -> String {
    T::COLUMNS.join(", ")
}

/// Every row of one parent, ordered by id.
pub(crate) async fn list<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    parent_id: SurrogateKey,
) -> MetadataResult<Vec<T>> {
    let sql = format!(
        "SELECT id, {} FROM {} WHERE parent_id = ? ORDER BY id",
        column_list::<T>(),
        child.table
    );
    let rows = sqlx::query_as::<_, T>(&sql)
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// One page of a parent's rows, ordered by id.
pub(crate) async fn page<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    parent_id: SurrogateKey,
    page: Page,
) -> MetadataResult<PagedList<T>> {
    let count_sql = format!("SELECT COUNT(*) FROM {} WHERE parent_id = ?", child.table);
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await?;

    let sql = format!(
        "SELECT id, {} FROM {} WHERE parent_id = ? ORDER BY id LIMIT ? OFFSET ?",
        column_list::<T>(),
        child.table
    );
    let items = sqlx::query_as::<_, T>(&sql)
        .bind(parent_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok(PagedList::new(items, total as u64, page))
}

/// A single child row with its parent key. `NotFound` when absent.
pub(crate) async fn get<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    id: SurrogateKey,
) -> MetadataResult<Owned<T>> {
    let sql = format!(
        "SELECT id, parent_id, {} FROM {} WHERE id = ?",
        column_list::<T>(),
        child.table
    );
    sqlx::query_as::<_, Owned<T>>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| MetadataError::NotFound(format!("{} {id}", child.label)))
}

/// Insert a row under `parent_id`, ignoring the row's own id. Returns the
/// assigned id.
pub(crate) async fn insert<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    parent_id: SurrogateKey,
    row: &T,
) -> MetadataResult<SurrogateKey> {
    let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} (parent_id, {}) VALUES (?, {placeholders})",
        child.table,
        column_list::<T>()
    );
    let query = sqlx::query(&sql).bind(parent_id);
    let result = row
        .bind_values(query)
        .execute(&mut *conn)
        .await
        .map_err(|e| MetadataError::from_insert(e, || duplicate_detail(child, parent_id)))?;
    Ok(result.last_insert_rowid())
}

pub(crate) async fn insert_all<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    parent_id: SurrogateKey,
    rows: &[T],
) -> MetadataResult<u64> {
    for row in rows {
        insert(conn, child, parent_id, row).await?;
    }
    Ok(rows.len() as u64)
}

/// Overwrite the data columns of an existing row. `NotFound` when absent.
pub(crate) async fn update<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    row: &T,
) -> MetadataResult<u64> {
    let assignments = T::COLUMNS
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {assignments} WHERE id = ?", child.table);
    let query = row.bind_values(sqlx::query(&sql)).bind(row.id());
    let result = query
        .execute(&mut *conn)
        .await
        .map_err(|e| MetadataError::from_insert(e, || format!("{} value", child.label)))?;
    if result.rows_affected() == 0 {
        return Err(MetadataError::NotFound(format!("{} {}", child.label, row.id())));
    }
    Ok(result.rows_affected())
}

/// Delete one child row by id. `NotFound` when absent.
pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    id: SurrogateKey,
) -> MetadataResult<u64> {
    let sql = format!("DELETE FROM {} WHERE id = ?", child.table);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(MetadataError::NotFound(format!("{} {id}", child.label)));
    }
    Ok(result.rows_affected())
}

/// Make the stored rows of `parent_id` match `rows`.
///
/// Rows whose id belongs to this parent are kept (and rewritten only if their
/// data changed). Rows with an unassigned id, or an id this parent does not
/// own, are inserted. Stored rows missing from `rows` are deleted. Returns the
/// number of rows written.
pub(crate) async fn reconcile<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    parent_id: SurrogateKey,
    rows: &[T],
) -> MetadataResult<u64> {
    let stored: Vec<T> = list(conn, child, parent_id).await?;
    let stored_by_id: HashMap<SurrogateKey, &T> = stored.iter().map(|r| (r.id(), r)).collect();

    let mut kept = HashSet::new();
    let mut changed = Vec::new();
    let mut added = Vec::new();
    for row in rows {
        match stored_by_id.get(&row.id()) {
            Some(existing) if kept.insert(row.id()) => {
                if **existing != *row {
                    changed.push(row);
                }
            }
            _ => added.push(row),
        }
    }

    let mut affected = 0;
    for row in stored.iter().filter(|r| !kept.contains(&r.id())) {
        affected += delete(conn, child, row.id()).await?;
    }
    // Rewritten rows may trade unique values with each other, so move them out
    // of the way before writing their final values.
    park_unique::<T>(conn, child, &changed).await?;
    for row in changed {
        affected += update(conn, child, row).await?;
    }
    for row in added {
        insert(conn, child, parent_id, row).await?;
        affected += 1;
    }

    if affected > 0 {
        tracing::debug!(table = child.table, parent_id, rows = affected, "children reconciled");
    }
    Ok(affected)
}

/// Give each row a placeholder in the per-parent unique column, derived from
/// its id so placeholders never collide.
async fn park_unique<T: ChildRow>(
    conn: &mut SqliteConnection,
    child: &ChildTable,
    rows: &[&T],
) -> MetadataResult<()> {
    let Some(column) = T::UNIQUE_COLUMN else {
        return Ok(());
    };
    if rows.len() < 2 {
        return Ok(());
    }
    let sql = format!(
        "UPDATE {} SET {column} = '\u{1}parked:' || id WHERE id = ?",
        child.table
    );
    for row in rows {
        sqlx::query(&sql).bind(row.id()).execute(&mut *conn).await?;
    }
    Ok(())
}

fn duplicate_detail(child: &ChildTable, parent_id: SurrogateKey) -> String {
    format!("{} key already used by parent {parent_id}", child.label)
}
