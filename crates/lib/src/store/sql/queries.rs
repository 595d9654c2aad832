//! Record position queries for SQL stores.
//!
//! Statements are built per call from the configured identifiers. Placeholders
//! are numbered in the order they appear in the statement text, and values are
//! bound in that same order.

use sqlx::Any;
use sqlx::query::{Query, QueryAs};

use crate::Result;
use crate::record::{GroupKey, Position, RecordId};
use crate::store::{ShiftCriteria, StoreError};

use super::{SqlStore, SqlxResultExt};

type Tx = sqlx::Transaction<'static, Any>;
type AnyArgs<'q> = <Any as sqlx::Database>::Arguments<'q>;

/// Wrap an already-validated identifier in double quotes.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// Quoted identifiers for the configured table.
struct Names {
    table: String,
    id: String,
    group: String,
    sequence: String,
}

impl Names {
    fn of(store: &SqlStore) -> Self {
        let config = store.config();
        Self {
            table: quote(&config.table),
            id: quote(&config.id_field),
            group: quote(&config.group_field),
            sequence: quote(&config.sequence_field),
        }
    }
}

/// Tracks `$n` numbering while a statement is assembled.
#[derive(Default)]
struct Placeholders(usize);

impl Placeholders {
    fn next(&mut self) -> String {
        self.0 += 1;
        format!("${}", self.0)
    }
}

/// Render the group equality filter. `Root` compares with `IS NULL` and
/// consumes no placeholder.
fn group_filter(names: &Names, group: GroupKey, placeholders: &mut Placeholders) -> String {
    match group {
        GroupKey::Root => format!("{} IS NULL", names.group),
        GroupKey::Parent(_) => format!("{} = {}", names.group, placeholders.next()),
    }
}

fn bind_group<'q>(
    query: Query<'q, Any, AnyArgs<'q>>,
    group: GroupKey,
) -> Query<'q, Any, AnyArgs<'q>> {
    match group.as_column() {
        Some(parent) => query.bind(parent),
        None => query,
    }
}

fn bind_group_as<'q, O>(
    query: QueryAs<'q, Any, O, AnyArgs<'q>>,
    group: GroupKey,
) -> QueryAs<'q, Any, O, AnyArgs<'q>> {
    match group.as_column() {
        Some(parent) => query.bind(parent),
        None => query,
    }
}

pub(crate) async fn read_position(
    store: &SqlStore,
    tx: &mut Tx,
    id: RecordId,
) -> Result<Option<Position>> {
    let names = Names::of(store);
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} = $1",
        names.group, names.sequence, names.table, names.id
    );

    let row: Option<(Option<i64>, i64)> = sqlx::query_as(&sql)
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .sql_context("Failed to read record position")?;

    Ok(row.map(|(parent, sequence)| Position {
        group: GroupKey::from(parent.map(RecordId)),
        sequence,
    }))
}

pub(crate) async fn max_sequence(
    store: &SqlStore,
    tx: &mut Tx,
    group: GroupKey,
) -> Result<Option<i64>> {
    let names = Names::of(store);
    let mut placeholders = Placeholders::default();
    let sql = format!(
        "SELECT MAX({}) FROM {} WHERE {}",
        names.sequence,
        names.table,
        group_filter(&names, group, &mut placeholders)
    );

    let (max,): (Option<i64>,) = bind_group_as(sqlx::query_as(&sql), group)
        .fetch_one(&mut **tx)
        .await
        .sql_context("Failed to query max sequence")?;
    Ok(max)
}

pub(crate) async fn shift(
    store: &SqlStore,
    tx: &mut Tx,
    criteria: ShiftCriteria,
    delta: i64,
) -> Result<u64> {
    let names = Names::of(store);
    let mut placeholders = Placeholders::default();

    let delta_param = placeholders.next();
    let group = group_filter(&names, criteria.group, &mut placeholders);
    let sequence_param = placeholders.next();
    let mut sql = format!(
        "UPDATE {table} SET {seq} = {seq} + {delta_param} WHERE {group} AND {seq} {op} {sequence_param}",
        table = names.table,
        seq = names.sequence,
        op = criteria.comparison.as_sql(),
    );
    if criteria.exclude.is_some() {
        sql.push_str(&format!(" AND {} <> {}", names.id, placeholders.next()));
    }

    let mut query = bind_group(sqlx::query(&sql).bind(delta), criteria.group).bind(criteria.sequence);
    if let Some(excluded) = criteria.exclude {
        query = query.bind(excluded.0);
    }

    let result = query
        .execute(&mut **tx)
        .await
        .sql_context("Failed to shift sequences")?;
    Ok(result.rows_affected())
}

/// Take SQLite's write lock at the start of a transaction.
///
/// A deferred SQLite transaction that reads before another writer commits
/// cannot later upgrade to a write, and fails without waiting. Writing first
/// makes the transaction wait on `busy_timeout` instead. The update matches
/// no rows.
pub(crate) async fn reserve(store: &SqlStore, tx: &mut Tx) -> Result<()> {
    let names = Names::of(store);
    let sql = format!(
        "UPDATE {} SET {} = {} WHERE 1 = 0",
        names.table, names.sequence, names.sequence
    );

    sqlx::query(&sql)
        .execute(&mut **tx)
        .await
        .sql_context("Failed to take the write lock")?;
    Ok(())
}

pub(crate) async fn persist_position(
    store: &SqlStore,
    tx: &mut Tx,
    id: RecordId,
    position: Position,
) -> Result<()> {
    let names = Names::of(store);
    let sql = format!(
        "UPDATE {} SET {} = $1, {} = $2 WHERE {} = $3",
        names.table, names.group, names.sequence, names.id
    );

    let result = sqlx::query(&sql)
        .bind(position.group.as_column())
        .bind(position.sequence)
        .bind(id.0)
        .execute(&mut **tx)
        .await
        .sql_context("Failed to persist record position")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::RecordNotFound { id }.into());
    }
    Ok(())
}

pub(crate) async fn insert(
    store: &SqlStore,
    tx: &mut Tx,
    id: RecordId,
    position: Position,
) -> Result<()> {
    let names = Names::of(store);
    let sql = format!(
        "INSERT INTO {} ({}, {}, {}) VALUES ($1, $2, $3)",
        names.table, names.id, names.group, names.sequence
    );

    let result = sqlx::query(&sql)
        .bind(id.0)
        .bind(position.group.as_column())
        .bind(position.sequence)
        .execute(&mut **tx)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(StoreError::DuplicateRecord { id }.into())
        }
        Err(e) => Err(e).sql_context("Failed to insert record"),
    }
}

pub(crate) async fn delete(store: &SqlStore, tx: &mut Tx, id: RecordId) -> Result<bool> {
    let names = Names::of(store);
    let sql = format!("DELETE FROM {} WHERE {} = $1", names.table, names.id);

    let result = sqlx::query(&sql)
        .bind(id.0)
        .execute(&mut **tx)
        .await
        .sql_context("Failed to delete record")?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn members(
    store: &SqlStore,
    tx: &mut Tx,
    group: GroupKey,
) -> Result<Vec<(RecordId, i64)>> {
    let names = Names::of(store);
    let mut placeholders = Placeholders::default();
    let sql = format!(
        "SELECT {id}, {seq} FROM {table} WHERE {filter} ORDER BY {seq}, {id}",
        id = names.id,
        seq = names.sequence,
        table = names.table,
        filter = group_filter(&names, group, &mut placeholders),
    );

    let rows: Vec<(i64, i64)> = bind_group_as(sqlx::query_as(&sql), group)
        .fetch_all(&mut **tx)
        .await
        .sql_context("Failed to list group members")?;

    Ok(rows
        .into_iter()
        .map(|(id, sequence)| (RecordId(id), sequence))
        .collect())
}

pub(crate) async fn groups(store: &SqlStore, tx: &mut Tx) -> Result<Vec<GroupKey>> {
    let names = Names::of(store);
    let sql = format!("SELECT DISTINCT {} FROM {}", names.group, names.table);

    let rows: Vec<(Option<i64>,)> = sqlx::query_as(&sql)
        .fetch_all(&mut **tx)
        .await
        .sql_context("Failed to list groups")?;

    // NULL ordering differs between SQLite and PostgreSQL, so sort here.
    let mut groups: Vec<GroupKey> = rows
        .into_iter()
        .map(|(parent,)| GroupKey::from(parent.map(RecordId)))
        .collect();
    groups.sort();
    Ok(groups)
}
