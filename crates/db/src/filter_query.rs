//! SQL composition for content listings.
//!
//! Builds the optional JOIN/WHERE fragments for a [`ContentFilter`], the
//! viewer personalization joins and the pagination window. Every value goes
//! into a positional parameter accumulator; placeholders are numbered from the
//! accumulator's length at the time they are added, so fragments stay valid
//! whatever the caller bound before or binds after them.
//!
//! Only names from [`RelationKind`] and the fixed column names below are ever
//! written into SQL text.

use marquee_core::content::RelationKind;
use marquee_core::filter::{ContentFilter, Pagination};
use marquee_core::types::DbId;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

/// A positional parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlParam {
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Text(&'static str),
}

/// Fragments produced for a filter. Both are empty when no dimension is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterClause {
    /// Zero or more ` JOIN ...` fragments, each with a leading space.
    pub joins: String,
    /// Either empty or ` WHERE <cond> [AND <cond>...]`.
    pub where_clause: String,
}

impl FilterClause {
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.where_clause.is_empty()
    }
}

/// Projection and joins for the viewer overlay columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalizationClause {
    /// Selects `is_liked` and `is_favourite`.
    pub projection: &'static str,
    pub joins: String,
}

/// Push `param` and return its placeholder.
fn push_param(params: &mut Vec<SqlParam>, param: SqlParam) -> String {
    params.push(param);
    format!("${}", params.len())
}

/// Translate `filter` into JOIN and WHERE fragments over `content c`.
///
/// Relation dimensions become inner joins against the matching pair table;
/// scalar dimensions become AND-ed conditions. Each set dimension adds exactly
/// one parameter.
pub fn build_filter(params: &mut Vec<SqlParam>, filter: &ContentFilter) -> FilterClause {
    let mut joins = String::new();
    for kind in RelationKind::ALL {
        if let Some(entity_id) = filter.relation(kind) {
            let placeholder = push_param(params, SqlParam::BigInt(entity_id));
            let table = kind.join_table();
            let column = kind.entity_column();
            let alias = format!("fj_{column}");
            joins.push_str(&format!(
                " JOIN {table} {alias} ON {alias}.content_id = c.id AND {alias}.{column} = {placeholder}"
            ));
        }
    }

    let mut conditions = Vec::new();
    if let Some(year) = filter.year {
        let placeholder = push_param(params, SqlParam::Int(year));
        conditions.push(format!("c.year = {placeholder}"));
    }
    if let Some(is_free) = filter.is_free {
        let placeholder = push_param(params, SqlParam::Bool(is_free));
        conditions.push(format!("c.is_free = {placeholder}"));
    }
    if let Some(content_type) = filter.content_type {
        let placeholder = push_param(params, SqlParam::Text(content_type.as_str()));
        conditions.push(format!("c.content_type = {placeholder}"));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    FilterClause {
        joins,
        where_clause,
    }
}

/// Viewer overlay for `content c`.
///
/// With a viewer, ratings and favourites are LEFT OUTER joined on
/// `(user_id, content_id)`. A missing favourite row reads as `false`; a
/// missing rating stays `NULL`. Without a viewer both columns are `NULL` and
/// no parameter is added.
pub fn build_personalization(
    params: &mut Vec<SqlParam>,
    viewer: Option<DbId>,
) -> PersonalizationClause {
    match viewer {
        Some(user_id) => {
            let placeholder = push_param(params, SqlParam::BigInt(user_id));
            PersonalizationClause {
                projection: "ur.is_liked AS is_liked, \
                     CASE WHEN uf.content_id IS NULL THEN false ELSE true END AS is_favourite",
                joins: format!(
                    " LEFT OUTER JOIN user_ratings ur \
                       ON ur.user_id = {placeholder} AND ur.content_id = c.id \
                     LEFT OUTER JOIN user_favourites uf \
                       ON uf.user_id = {placeholder} AND uf.content_id = c.id"
                ),
            }
        }
        None => PersonalizationClause {
            projection: "NULL::BOOLEAN AS is_liked, NULL::BOOLEAN AS is_favourite",
            joins: String::new(),
        },
    }
}

/// ` LIMIT $n OFFSET $m`, or nothing at all when `count == 0`.
pub fn build_pagination(params: &mut Vec<SqlParam>, page: Pagination) -> String {
    if page.is_unbounded() {
        return String::new();
    }
    let limit = push_param(params, SqlParam::BigInt(to_bigint(page.count)));
    let offset = push_param(params, SqlParam::BigInt(to_bigint(page.from)));
    format!(" LIMIT {limit} OFFSET {offset}")
}

fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Bind accumulated parameters onto a query in placeholder order.
pub fn bind_params<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match *param {
            SqlParam::BigInt(v) => query.bind(v),
            SqlParam::Int(v) => query.bind(v),
            SqlParam::Bool(v) => query.bind(v),
            SqlParam::Text(v) => query.bind(v),
        };
    }
    query
}
