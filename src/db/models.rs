use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::Row;
use serde::Serialize;

/// A record shape read from one hive table.
///
/// `FROM` aliases the primary table as `t`; filters and ordering are
/// qualified with that alias.
pub trait Entity: Sized {
    const FROM: &'static str;
    const COLUMNS: &'static str;
    /// Field names that filters and orderings may refer to.
    const FIELDS: &'static [&'static str];
    const PK: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Fixed three-place decimal, rendered as a string like `"1.500"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(Amount(format!("{}.000", i))),
            ValueRef::Real(f) => Ok(Amount(format!("{:.3}", f))),
            ValueRef::Text(t) => {
                let text = std::str::from_utf8(t).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                let value: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| FromSqlError::InvalidType)?;
                Ok(Amount(format!("{:.3}", value)))
            }
            ValueRef::Null | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub reputation: f64,
    pub display_name: Option<String>,
    pub about: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub profile_image: String,
    pub cover_image: String,
    pub followers: i64,
    pub following: i64,
    pub proxy: String,
    pub post_count: i64,
    pub proxy_weight: f64,
    pub vote_weight: f64,
    pub kb_used: i64,
    pub rank: i64,
    pub active_at: NaiveDateTime,
    pub cached_at: NaiveDateTime,
    pub raw_json: Option<String>,
}

impl Entity for Account {
    const FROM: &'static str = "hive_accounts t";
    const COLUMNS: &'static str = "t.id, t.name, t.created_at, t.reputation, t.display_name, \
        t.about, t.location, t.website, t.profile_image, t.cover_image, t.followers, \
        t.following, t.proxy, t.post_count, t.proxy_weight, t.vote_weight, t.kb_used, \
        t.rank, t.active_at, t.cached_at, t.raw_json";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "created_at",
        "reputation",
        "display_name",
        "about",
        "location",
        "website",
        "profile_image",
        "cover_image",
        "followers",
        "following",
        "proxy",
        "post_count",
        "proxy_weight",
        "vote_weight",
        "kb_used",
        "rank",
        "active_at",
        "cached_at",
        "raw_json",
    ];
    const PK: &'static str = "id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Account {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: row.get("created_at")?,
            reputation: row.get("reputation")?,
            display_name: row.get("display_name")?,
            about: row.get("about")?,
            location: row.get("location")?,
            website: row.get("website")?,
            profile_image: row.get("profile_image")?,
            cover_image: row.get("cover_image")?,
            followers: row.get("followers")?,
            following: row.get("following")?,
            proxy: row.get("proxy")?,
            post_count: row.get("post_count")?,
            proxy_weight: row.get("proxy_weight")?,
            vote_weight: row.get("vote_weight")?,
            kb_used: row.get("kb_used")?,
            rank: row.get("rank")?,
            active_at: row.get("active_at")?,
            cached_at: row.get("cached_at")?,
            raw_json: row.get("raw_json")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub num: i64,
    pub hash: String,
    pub prev: Option<i64>,
    pub txs: i32,
    pub ops: i32,
    pub created_at: NaiveDateTime,
}

impl Entity for Block {
    const FROM: &'static str = "hive_blocks t";
    const COLUMNS: &'static str = "t.num, t.hash, t.prev, t.txs, t.ops, t.created_at";
    const FIELDS: &'static [&'static str] = &["num", "hash", "prev", "txs", "ops", "created_at"];
    const PK: &'static str = "num";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Block {
            num: row.get("num")?,
            hash: row.get("hash")?,
            prev: row.get("prev")?,
            txs: row.get("txs")?,
            ops: row.get("ops")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub parent: Option<i64>,
    pub author: String,
    pub permlink: String,
    pub community: String,
    pub category: String,
    pub depth: i32,
    pub created_at: NaiveDateTime,
    pub is_deleted: bool,
    pub is_pinned: bool,
    pub is_muted: bool,
    pub is_valid: bool,
    pub promoted: Amount,
}

impl Entity for Post {
    const FROM: &'static str = "hive_posts t";
    const COLUMNS: &'static str = "t.id, t.parent_id, t.author, t.permlink, t.community, \
        t.category, t.depth, t.created_at, t.is_deleted, t.is_pinned, t.is_muted, \
        t.is_valid, t.promoted";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "parent_id",
        "author",
        "permlink",
        "community",
        "category",
        "depth",
        "created_at",
        "is_deleted",
        "is_pinned",
        "is_muted",
        "is_valid",
        "promoted",
    ];
    const PK: &'static str = "id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get("id")?,
            parent: row.get("parent_id")?,
            author: row.get("author")?,
            permlink: row.get("permlink")?,
            community: row.get("community")?,
            category: row.get("category")?,
            depth: row.get("depth")?,
            created_at: row.get("created_at")?,
            is_deleted: row.get("is_deleted")?,
            is_pinned: row.get("is_pinned")?,
            is_muted: row.get("is_muted")?,
            is_valid: row.get("is_valid")?,
            promoted: row.get("promoted")?,
        })
    }
}

/// The slice of a post embedded in every post-cache payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub is_deleted: bool,
    pub is_pinned: bool,
    pub is_muted: bool,
    pub is_valid: bool,
    pub promoted: Amount,
    pub parent: Option<i64>,
    pub community: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCache {
    pub post_id: i64,
    pub post: Option<PostSummary>,
    pub author: String,
    pub permlink: String,
    pub category: String,
    pub depth: i32,
    pub children: i32,
    pub author_rep: f64,
    pub flag_weight: f64,
    pub total_votes: i64,
    pub up_votes: i64,
    pub title: String,
    pub preview: String,
    pub img_url: String,
    pub payout: Amount,
    pub promoted: Amount,
    pub created_at: NaiveDateTime,
    pub payout_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_paidout: bool,
    pub is_nsfw: bool,
    pub is_declined: bool,
    pub is_full_power: bool,
    pub is_hidden: bool,
    pub is_grayed: bool,
    pub rshares: i64,
    pub sc_trend: f64,
    pub sc_hot: f64,
    pub body: Option<String>,
    pub votes: Option<String>,
    pub json: Option<String>,
    pub raw_json: Option<String>,
}

impl Entity for PostCache {
    const FROM: &'static str = "hive_posts_cache t LEFT JOIN hive_posts p ON p.id = t.post_id";
    const COLUMNS: &'static str = "t.post_id, t.author, t.permlink, t.category, t.depth, \
        t.children, t.author_rep, t.flag_weight, t.total_votes, t.up_votes, t.title, \
        t.preview, t.img_url, t.payout, t.promoted, t.created_at, t.payout_at, t.updated_at, \
        t.is_paidout, t.is_nsfw, t.is_declined, t.is_full_power, t.is_hidden, t.is_grayed, \
        t.rshares, t.sc_trend, t.sc_hot, t.body, t.votes, t.json, t.raw_json, \
        p.id AS post__id, p.is_deleted AS post__is_deleted, p.is_pinned AS post__is_pinned, \
        p.is_muted AS post__is_muted, p.is_valid AS post__is_valid, \
        p.promoted AS post__promoted, p.parent_id AS post__parent, \
        p.community AS post__community";
    const FIELDS: &'static [&'static str] = &[
        "post_id",
        "author",
        "permlink",
        "category",
        "depth",
        "children",
        "author_rep",
        "flag_weight",
        "total_votes",
        "up_votes",
        "title",
        "preview",
        "img_url",
        "payout",
        "promoted",
        "created_at",
        "payout_at",
        "updated_at",
        "is_paidout",
        "is_nsfw",
        "is_declined",
        "is_full_power",
        "is_hidden",
        "is_grayed",
        "rshares",
        "sc_trend",
        "sc_hot",
        "body",
        "votes",
        "json",
        "raw_json",
    ];
    const PK: &'static str = "post_id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let post = match row.get::<_, Option<i64>>("post__id")? {
            Some(id) => Some(PostSummary {
                id,
                is_deleted: row.get("post__is_deleted")?,
                is_pinned: row.get("post__is_pinned")?,
                is_muted: row.get("post__is_muted")?,
                is_valid: row.get("post__is_valid")?,
                promoted: row.get("post__promoted")?,
                parent: row.get("post__parent")?,
                community: row.get("post__community")?,
            }),
            None => None,
        };

        Ok(PostCache {
            post_id: row.get("post_id")?,
            post,
            author: row.get("author")?,
            permlink: row.get("permlink")?,
            category: row.get("category")?,
            depth: row.get("depth")?,
            children: row.get("children")?,
            author_rep: row.get("author_rep")?,
            flag_weight: row.get("flag_weight")?,
            total_votes: row.get("total_votes")?,
            up_votes: row.get("up_votes")?,
            title: row.get("title")?,
            preview: row.get("preview")?,
            img_url: row.get("img_url")?,
            payout: row.get("payout")?,
            promoted: row.get("promoted")?,
            created_at: row.get("created_at")?,
            payout_at: row.get("payout_at")?,
            updated_at: row.get("updated_at")?,
            is_paidout: row.get("is_paidout")?,
            is_nsfw: row.get("is_nsfw")?,
            is_declined: row.get("is_declined")?,
            is_full_power: row.get("is_full_power")?,
            is_hidden: row.get("is_hidden")?,
            is_grayed: row.get("is_grayed")?,
            rshares: row.get("rshares")?,
            sc_trend: row.get("sc_trend")?,
            sc_hot: row.get("sc_hot")?,
            body: row.get("body")?,
            votes: row.get("votes")?,
            json: row.get("json")?,
            raw_json: row.get("raw_json")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HiveState {
    pub block_num: i64,
    pub db_version: i64,
    pub steem_per_mvest: Amount,
    pub usd_per_steem: Amount,
    pub sbd_per_steem: Amount,
    pub dgpo: String,
}

impl Entity for HiveState {
    const FROM: &'static str = "hive_state t";
    const COLUMNS: &'static str = "t.block_num, t.db_version, t.steem_per_mvest, \
        t.usd_per_steem, t.sbd_per_steem, t.dgpo";
    const FIELDS: &'static [&'static str] = &[
        "block_num",
        "db_version",
        "steem_per_mvest",
        "usd_per_steem",
        "sbd_per_steem",
        "dgpo",
    ];
    const PK: &'static str = "block_num";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(HiveState {
            block_num: row.get("block_num")?,
            db_version: row.get("db_version")?,
            steem_per_mvest: row.get("steem_per_mvest")?,
            usd_per_steem: row.get("usd_per_steem")?,
            sbd_per_steem: row.get("sbd_per_steem")?,
            dgpo: row.get("dgpo")?,
        })
    }
}

/// Follow row states written by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    Active = 1,
    Muted = 2,
}

/// A post reblogged by an account, as listed under the account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountReblog {
    pub author: String,
    pub permlink: String,
    pub created_at: NaiveDateTime,
}

/// An account that reblogged a post, as listed under the post.
#[derive(Debug, Clone, Serialize)]
pub struct PostReblog {
    pub author: String,
    pub reblogged_at: NaiveDateTime,
}
