//! Static per-resource query configuration.
//!
//! Each list endpoint owns a [`ResourceTable`]: which query parameters filter
//! which fields, which fields may be ordered on, and the default ordering.
//! The tables are checked against the entity's known fields once, when the
//! router is built.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::types::Value;

use crate::db::models::{Account, Block, Entity, Post, PostCache};
use crate::error::{AppError, AppResult};
use crate::extractors::QueryParams;

pub const ORDERING_PARAM: &str = "ordering";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    Gte,
    Lte,
    /// Case-sensitive substring match.
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterDef {
    pub param: &'static str,
    pub field: &'static str,
    pub lookup: Lookup,
    pub kind: ValueKind,
}

const fn filter(
    param: &'static str,
    field: &'static str,
    lookup: Lookup,
    kind: ValueKind,
) -> FilterDef {
    FilterDef {
        param,
        field,
        lookup,
        kind,
    }
}

#[derive(Debug)]
pub struct ResourceTable {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub pk: &'static str,
    pub filters: &'static [FilterDef],
    pub ordering_fields: &'static [&'static str],
    /// Applied when the request carries no `ordering`; `-` means descending.
    pub default_ordering: &'static [&'static str],
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("{resource}: filter `{param}` refers to unknown field `{field}`")]
    UnknownFilterField {
        resource: &'static str,
        param: &'static str,
        field: &'static str,
    },

    #[error("{resource}: ordering on unknown field `{field}`")]
    UnknownOrderingField {
        resource: &'static str,
        field: &'static str,
    },

    #[error("{resource}: query parameter `{param}` declared twice")]
    DuplicateParam {
        resource: &'static str,
        param: &'static str,
    },
}

/// SQL `WHERE` conditions with their positional parameters.
#[derive(Debug, Default, Clone)]
pub struct Predicate {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition whose `?` placeholders bind `values` in order.
    pub fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.params.extend(values);
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

impl ResourceTable {
    pub fn validate(&self) -> Result<(), TableError> {
        for (idx, def) in self.filters.iter().enumerate() {
            if !self.fields.contains(&def.field) {
                return Err(TableError::UnknownFilterField {
                    resource: self.name,
                    param: def.param,
                    field: def.field,
                });
            }
            if self.filters[..idx].iter().any(|d| d.param == def.param) {
                return Err(TableError::DuplicateParam {
                    resource: self.name,
                    param: def.param,
                });
            }
        }

        let defaults = self
            .default_ordering
            .iter()
            .map(|f| f.trim_start_matches('-'));
        for field in self.ordering_fields.iter().copied().chain(defaults) {
            if !self.fields.contains(&field) {
                return Err(TableError::UnknownOrderingField {
                    resource: self.name,
                    field,
                });
            }
        }
        Ok(())
    }

    /// Builds the filter predicate. Empty values are skipped, values that do
    /// not parse as the field's kind are rejected.
    pub fn predicate(&self, query: &QueryParams) -> AppResult<Predicate> {
        let mut predicate = Predicate::new();
        for def in self.filters {
            let raw = match query.get(def.param) {
                Some(raw) if !raw.is_empty() => raw,
                _ => continue,
            };
            let value = parse_value(def.kind, raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid value for `{}`: {}", def.param, raw))
            })?;
            let clause = match def.lookup {
                Lookup::Exact => format!("t.{} = ?", def.field),
                Lookup::Gte => format!("t.{} >= ?", def.field),
                Lookup::Lte => format!("t.{} <= ?", def.field),
                Lookup::Contains => format!("instr(t.{}, ?) > 0", def.field),
            };
            predicate.push(clause, [value]);
        }
        Ok(predicate)
    }

    /// Resolves `?ordering=a,-b` against the allow-list. Unknown fields are
    /// rejected rather than ignored.
    pub fn order_by(&self, query: &QueryParams) -> AppResult<String> {
        let requested: Vec<&str> = query
            .get(ORDERING_PARAM)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        for term in &requested {
            let field = term.trim_start_matches('-');
            if !self.ordering_fields.contains(&field) {
                return Err(AppError::BadRequest(format!(
                    "Cannot order {} by `{}`; allowed: {}",
                    self.name,
                    field,
                    self.ordering_fields.join(", ")
                )));
            }
        }

        let terms: Vec<&str> = if requested.is_empty() {
            self.default_ordering.to_vec()
        } else {
            requested
        };
        Ok(order_clause(&terms, self.pk))
    }
}

/// Renders ordering terms as SQL, appending the primary key as a descending
/// tie-breaker unless it is already present.
pub fn order_clause(terms: &[&str], pk: &str) -> String {
    let mut parts = Vec::with_capacity(terms.len() + 1);
    let mut has_pk = false;
    for term in terms {
        let (field, direction) = match term.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (*term, "ASC"),
        };
        has_pk |= field == pk;
        parts.push(format!("t.{} {}", field, direction));
    }
    if !has_pk {
        parts.push(format!("t.{} DESC", pk));
    }
    parts.join(", ")
}

fn parse_value(kind: ValueKind, raw: &str) -> Option<Value> {
    match kind {
        ValueKind::Int => raw.trim().parse().ok().map(Value::Integer),
        ValueKind::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::Real),
        ValueKind::Text => Some(Value::Text(raw.to_string())),
        ValueKind::Bool => match raw {
            "true" | "True" | "1" => Some(Value::Integer(1)),
            "false" | "False" | "0" => Some(Value::Integer(0)),
            _ => None,
        },
        ValueKind::Timestamp => parse_timestamp(raw.trim())
            .map(|ts| Value::Text(ts.format(TIMESTAMP_FORMAT).to_string())),
    }
}

/// Accepts unix seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// --- Resource tables ---

pub static ACCOUNTS: ResourceTable = ResourceTable {
    name: "accounts",
    fields: Account::FIELDS,
    pk: Account::PK,
    filters: &[
        filter("min_rep", "reputation", Lookup::Gte, ValueKind::Float),
        filter("max_rep", "reputation", Lookup::Lte, ValueKind::Float),
        filter("min_reputation", "reputation", Lookup::Gte, ValueKind::Float),
        filter("max_reputation", "reputation", Lookup::Lte, ValueKind::Float),
        filter("min_vote_weight", "vote_weight", Lookup::Gte, ValueKind::Float),
        filter("max_vote_weight", "vote_weight", Lookup::Lte, ValueKind::Float),
        filter("min_following", "following", Lookup::Gte, ValueKind::Int),
        filter("max_following", "following", Lookup::Lte, ValueKind::Int),
        filter("min_followers", "followers", Lookup::Gte, ValueKind::Int),
        filter("max_followers", "followers", Lookup::Lte, ValueKind::Int),
        filter("min_active_at", "active_at", Lookup::Gte, ValueKind::Timestamp),
        filter("max_active_at", "active_at", Lookup::Lte, ValueKind::Timestamp),
        filter("min_created_at", "created_at", Lookup::Gte, ValueKind::Timestamp),
        filter("max_created_at", "created_at", Lookup::Lte, ValueKind::Timestamp),
        filter("location__contains", "location", Lookup::Contains, ValueKind::Text),
        filter("name__contains", "name", Lookup::Contains, ValueKind::Text),
        filter("id", "id", Lookup::Exact, ValueKind::Int),
        filter("name", "name", Lookup::Exact, ValueKind::Text),
        filter("created_at", "created_at", Lookup::Exact, ValueKind::Timestamp),
        filter("reputation", "reputation", Lookup::Exact, ValueKind::Float),
        filter("display_name", "display_name", Lookup::Exact, ValueKind::Text),
        filter("about", "about", Lookup::Exact, ValueKind::Text),
        filter("location", "location", Lookup::Exact, ValueKind::Text),
        filter("website", "website", Lookup::Exact, ValueKind::Text),
        filter("profile_image", "profile_image", Lookup::Exact, ValueKind::Text),
        filter("cover_image", "cover_image", Lookup::Exact, ValueKind::Text),
        filter("followers", "followers", Lookup::Exact, ValueKind::Int),
        filter("following", "following", Lookup::Exact, ValueKind::Int),
        filter("proxy", "proxy", Lookup::Exact, ValueKind::Text),
        filter("post_count", "post_count", Lookup::Exact, ValueKind::Int),
        filter("proxy_weight", "proxy_weight", Lookup::Exact, ValueKind::Float),
        filter("vote_weight", "vote_weight", Lookup::Exact, ValueKind::Float),
        filter("kb_used", "kb_used", Lookup::Exact, ValueKind::Int),
        filter("rank", "rank", Lookup::Exact, ValueKind::Int),
        filter("active_at", "active_at", Lookup::Exact, ValueKind::Timestamp),
        filter("cached_at", "cached_at", Lookup::Exact, ValueKind::Timestamp),
        filter("raw_json", "raw_json", Lookup::Exact, ValueKind::Text),
    ],
    ordering_fields: &[
        "vote_weight",
        "proxy_weight",
        "reputation",
        "post_count",
        "followers",
        "following",
    ],
    default_ordering: &["-id"],
};

pub static BLOCKS: ResourceTable = ResourceTable {
    name: "blocks",
    fields: Block::FIELDS,
    pk: Block::PK,
    filters: &[],
    ordering_fields: &["txs", "ops"],
    default_ordering: &["-num"],
};

pub static POSTS: ResourceTable = ResourceTable {
    name: "posts",
    fields: Post::FIELDS,
    pk: Post::PK,
    filters: &[
        filter("category", "category", Lookup::Exact, ValueKind::Text),
        filter("author", "author", Lookup::Exact, ValueKind::Text),
        filter("is_deleted", "is_deleted", Lookup::Exact, ValueKind::Bool),
    ],
    ordering_fields: &["created_at", "depth", "promoted"],
    default_ordering: &["-id"],
};

pub static POST_CACHE: ResourceTable = ResourceTable {
    name: "post_cache",
    fields: PostCache::FIELDS,
    pk: PostCache::PK,
    filters: &[
        filter("author", "author", Lookup::Exact, ValueKind::Text),
        filter("permlink", "permlink", Lookup::Exact, ValueKind::Text),
    ],
    ordering_fields: &[
        "created_at",
        "payout",
        "rshares",
        "sc_trend",
        "sc_hot",
        "total_votes",
        "children",
    ],
    default_ordering: &["-post_id"],
};

pub fn all_tables() -> [&'static ResourceTable; 4] {
    [&ACCOUNTS, &BLOCKS, &POSTS, &POST_CACHE]
}

pub fn validate_all() -> Result<(), TableError> {
    all_tables().iter().try_for_each(|table| table.validate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: &str) -> QueryParams {
        QueryParams::parse(Some(raw))
    }

    #[test]
    fn builtin_tables_are_valid() {
        validate_all().unwrap();
    }

    const UNKNOWN_FIELD_FILTERS: &[FilterDef] =
        &[filter("min_size", "size", Lookup::Gte, ValueKind::Int)];

    const DUPLICATE_PARAM_FILTERS: &[FilterDef] = &[
        filter("txs", "txs", Lookup::Exact, ValueKind::Int),
        filter("txs", "ops", Lookup::Exact, ValueKind::Int),
    ];

    #[test]
    fn unknown_filter_field_fails_validation() {
        let table = ResourceTable {
            name: "broken",
            fields: Block::FIELDS,
            pk: "num",
            filters: UNKNOWN_FIELD_FILTERS,
            ordering_fields: &[],
            default_ordering: &["-num"],
        };
        assert!(matches!(
            table.validate(),
            Err(TableError::UnknownFilterField { field: "size", .. })
        ));
    }

    #[test]
    fn unknown_ordering_field_fails_validation() {
        let table = ResourceTable {
            name: "broken",
            fields: Block::FIELDS,
            pk: "num",
            filters: &[],
            ordering_fields: &["txs", "weight"],
            default_ordering: &["-num"],
        };
        assert!(matches!(
            table.validate(),
            Err(TableError::UnknownOrderingField { field: "weight", .. })
        ));
    }

    #[test]
    fn duplicate_param_fails_validation() {
        let table = ResourceTable {
            name: "broken",
            fields: Block::FIELDS,
            pk: "num",
            filters: DUPLICATE_PARAM_FILTERS,
            ordering_fields: &[],
            default_ordering: &["-num"],
        };
        assert!(matches!(
            table.validate(),
            Err(TableError::DuplicateParam { param: "txs", .. })
        ));
    }

    #[test]
    fn range_and_contains_filters_build_predicate() {
        let predicate = ACCOUNTS
            .predicate(&query("min_rep=50&max_followers=10&name__contains=ali&sort=x"))
            .unwrap();
        assert_eq!(
            predicate.where_sql(),
            " WHERE t.reputation >= ? AND t.followers <= ? AND instr(t.name, ?) > 0"
        );
        assert_eq!(
            predicate.params(),
            &[
                Value::Real(50.0),
                Value::Integer(10),
                Value::Text("ali".into())
            ]
        );
    }

    #[test]
    fn every_account_column_has_an_exact_filter() {
        for field in Account::FIELDS {
            assert!(
                ACCOUNTS
                    .filters
                    .iter()
                    .any(|def| def.param == *field && def.lookup == Lookup::Exact),
                "no exact filter for {}",
                field
            );
        }
    }

    #[test]
    fn empty_filter_value_is_skipped() {
        let predicate = POSTS.predicate(&query("author=&category=life")).unwrap();
        assert_eq!(predicate.where_sql(), " WHERE t.category = ?");
    }

    #[test]
    fn invalid_numeric_filter_is_rejected() {
        let err = ACCOUNTS.predicate(&query("min_rep=high")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn bool_filter_accepts_common_spellings() {
        for raw in ["true", "True", "1"] {
            let predicate = POSTS.predicate(&query(&format!("is_deleted={}", raw))).unwrap();
            assert_eq!(predicate.params(), &[Value::Integer(1)]);
        }
        assert!(POSTS.predicate(&query("is_deleted=yes")).is_err());
    }

    #[test]
    fn timestamp_filters_accept_dates_and_epochs() {
        let predicate = ACCOUNTS
            .predicate(&query("min_created_at=2018-01-02&max_active_at=1514764800"))
            .unwrap();
        assert_eq!(
            predicate.params(),
            &[
                Value::Text("2018-01-01 00:00:00".into()),
                Value::Text("2018-01-02 00:00:00".into()),
            ]
        );
    }

    #[test]
    fn parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2018, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(parse_timestamp("2018-03-04 05:06:07"), Some(expected));
        assert_eq!(parse_timestamp("2018-03-04T05:06:07"), Some(expected));
        assert_eq!(parse_timestamp("2018-03-04T05:06:07Z"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn default_ordering_is_descending_primary_key() {
        assert_eq!(BLOCKS.order_by(&query("")).unwrap(), "t.num DESC");
        assert_eq!(ACCOUNTS.order_by(&query("")).unwrap(), "t.id DESC");
    }

    #[test]
    fn requested_ordering_gets_pk_tie_breaker() {
        assert_eq!(
            ACCOUNTS.order_by(&query("ordering=-reputation,followers")).unwrap(),
            "t.reputation DESC, t.followers ASC, t.id DESC"
        );
    }

    #[test]
    fn ordering_outside_allow_list_is_rejected() {
        let err = ACCOUNTS.order_by(&query("ordering=about")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = BLOCKS.order_by(&query("ordering=-hash")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
