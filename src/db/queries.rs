//! Read queries over the hive tables. Every function is a plain read on a
//! pooled connection; nothing here writes.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::models::{
    Account, AccountReblog, Entity, FollowState, HiveState, Post, PostCache, PostReblog,
};
use crate::filters::Predicate;
use crate::pagination::Window;

/// One page of `E` plus the total row count under `predicate`.
pub fn list_page<E: Entity>(
    conn: &Connection,
    predicate: &Predicate,
    order_by: &str,
    window: Window,
) -> rusqlite::Result<(Vec<E>, i64)> {
    let where_sql = predicate.where_sql();

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}{}", E::FROM, where_sql),
        params_from_iter(predicate.params()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
        E::COLUMNS,
        E::FROM,
        where_sql,
        order_by
    );
    tracing::debug!(%sql, "list query");

    let bound = predicate
        .params()
        .iter()
        .cloned()
        .chain([Value::Integer(window.limit), Value::Integer(window.offset)]);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(bound), E::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((rows, count))
}

/// First row of `E` matching `predicate`, if any.
pub fn find_one<E: Entity>(conn: &Connection, predicate: &Predicate) -> rusqlite::Result<Option<E>> {
    let sql = format!(
        "SELECT {} FROM {}{} LIMIT 1",
        E::COLUMNS,
        E::FROM,
        predicate.where_sql()
    );
    conn.query_row(&sql, params_from_iter(predicate.params()), E::from_row)
        .optional()
}

pub fn account_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Account>> {
    let mut predicate = Predicate::new();
    predicate.push("t.name = ?", [Value::Text(name.to_string())]);
    find_one(conn, &predicate)
}

/// Which side of a follow row the account sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowSide {
    /// Accounts pointing at this one (followers, muters).
    Incoming,
    /// Accounts this one points at (following, muting).
    Outgoing,
}

/// Names on the other end of `account_id`'s follow rows in `state`,
/// newest first.
pub fn follow_names(
    conn: &Connection,
    account_id: i64,
    side: FollowSide,
    state: FollowState,
) -> rusqlite::Result<Vec<String>> {
    let sql = match side {
        FollowSide::Incoming => {
            "SELECT a.name FROM hive_follows f \
             JOIN hive_accounts a ON a.id = f.follower \
             WHERE f.following = ?1 AND f.state = ?2 \
             ORDER BY f.created_at DESC, a.name"
        }
        FollowSide::Outgoing => {
            "SELECT a.name FROM hive_follows f \
             JOIN hive_accounts a ON a.id = f.following \
             WHERE f.follower = ?1 AND f.state = ?2 \
             ORDER BY f.created_at DESC, a.name"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let names = stmt
        .query_map(params![account_id, state as i64], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Posts reblogged by `account`, newest first, with the total count.
pub fn account_reblogs(
    conn: &Connection,
    account: &str,
    window: Window,
) -> rusqlite::Result<(Vec<AccountReblog>, i64)> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM hive_reblogs r \
         JOIN hive_posts p ON p.id = r.post_id \
         WHERE r.account = ?1",
        params![account],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT p.author, p.permlink, r.created_at FROM hive_reblogs r \
         JOIN hive_posts p ON p.id = r.post_id \
         WHERE r.account = ?1 \
         ORDER BY r.created_at DESC, r.post_id DESC \
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![account, window.limit, window.offset], |row| {
            Ok(AccountReblog {
                author: row.get(0)?,
                permlink: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((rows, count))
}

/// Every account that reblogged `post_id`, newest first.
pub fn post_reblogs(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<PostReblog>> {
    let mut stmt = conn.prepare(
        "SELECT account, created_at FROM hive_reblogs \
         WHERE post_id = ?1 \
         ORDER BY created_at DESC, account",
    )?;
    let rows = stmt
        .query_map(params![post_id], |row| {
            Ok(PostReblog {
                author: row.get(0)?,
                reblogged_at: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Restricts `predicate` to posts carrying every tag in `tags`.
pub fn push_tag_intersection(predicate: &mut Predicate, tags: &[&str]) {
    let subquery = vec!["SELECT post_id FROM hive_post_tags WHERE tag = ?"; tags.len()]
        .join(" INTERSECT ");
    predicate.push(
        format!("t.post_id IN ({})", subquery),
        tags.iter().map(|tag| Value::Text(tag.to_string())),
    );
}

/// How a single post is addressed in a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKey {
    Id(i64),
    Permlink { author: String, permlink: String },
}

impl PostKey {
    /// Numeric segments address by id; anything else is an author that
    /// needs a permlink to resolve.
    pub fn resolve(segment: &str, permlink: Option<&str>) -> Option<PostKey> {
        if let Ok(id) = segment.parse::<i64>() {
            return Some(PostKey::Id(id));
        }
        permlink.filter(|p| !p.is_empty()).map(|permlink| PostKey::Permlink {
            author: segment.to_string(),
            permlink: permlink.to_string(),
        })
    }

    fn predicate(&self, id_field: &str) -> Predicate {
        let mut predicate = Predicate::new();
        match self {
            PostKey::Id(id) => predicate.push(format!("t.{} = ?", id_field), [Value::Integer(*id)]),
            PostKey::Permlink { author, permlink } => {
                predicate.push("t.author = ?", [Value::Text(author.clone())]);
                predicate.push("t.permlink = ?", [Value::Text(permlink.clone())]);
            }
        }
        predicate
    }
}

pub fn find_post(conn: &Connection, key: &PostKey) -> rusqlite::Result<Option<Post>> {
    find_one(conn, &key.predicate(Post::PK))
}

pub fn find_post_cache(conn: &Connection, key: &PostKey) -> rusqlite::Result<Option<PostCache>> {
    find_one(conn, &key.predicate(PostCache::PK))
}

/// The most recently written indexer state.
pub fn last_state(conn: &Connection) -> rusqlite::Result<Option<HiveState>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM {} ORDER BY t.block_num DESC LIMIT 1",
            HiveState::COLUMNS,
            HiveState::FROM
        ),
        [],
        HiveState::from_row,
    )
    .optional()
}
