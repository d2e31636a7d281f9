use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Decoded query string, keeping repeated keys such as `[]exact=a&[]exact=b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// Last value for `key`, matching how form parameters usually resolve.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Copy with `key` removed, or replaced by a single `value`.
    pub fn with(&self, key: &str, value: Option<String>) -> Self {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != key)
            .cloned()
            .collect();
        if let Some(value) = value {
            pairs.push((key.to_string(), value));
        }
        Self { pairs }
    }

    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// Query parameters plus the absolute URL of the current path, used to
/// build pagination links.
#[derive(Debug, Clone)]
pub struct ApiQuery {
    pub params: QueryParams,
    pub url: String,
}

impl ApiQuery {
    /// URL of the current path carrying `params`.
    pub fn link(&self, params: &QueryParams) -> String {
        let query = params.encode();
        if query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, query)
        }
    }
}

impl FromRequestParts<AppState> for ApiQuery {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let params = QueryParams::parse(parts.uri.query());
        let path = parts.uri.path();

        let base = match state.config.server.public_url.as_deref() {
            Some(public) => public.trim_end_matches('/').to_string(),
            None => {
                let host = parts
                    .headers
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .or_else(|| parts.uri.authority().map(|a| a.as_str()))
                    .unwrap_or("localhost");
                format!("http://{}", host)
            }
        };

        Ok(ApiQuery {
            params,
            url: format!("{}{}", base, path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_repeated_keys() {
        let params = QueryParams::parse(Some("%5B%5Dexact=python&[]exact=rust&limit=3"));
        assert_eq!(params.get_all("[]exact"), vec!["python", "rust"]);
        assert_eq!(params.get("limit"), Some("3"));
        assert_eq!(params.get("offset"), None);
    }

    #[test]
    fn get_returns_last_value() {
        let params = QueryParams::parse(Some("limit=3&limit=7"));
        assert_eq!(params.get("limit"), Some("7"));
    }

    #[test]
    fn plus_decodes_to_space() {
        let params = QueryParams::parse(Some("min_created_at=2018-01-01+10:00:00"));
        assert_eq!(params.get("min_created_at"), Some("2018-01-01 10:00:00"));
    }

    #[test]
    fn missing_query_is_empty() {
        assert_eq!(QueryParams::parse(None), QueryParams::default());
    }

    #[test]
    fn with_replaces_and_removes() {
        let params = QueryParams::parse(Some("offset=5&author=alice"));
        assert_eq!(
            params.with("offset", Some("10".into())).encode(),
            "author=alice&offset=10"
        );
        assert_eq!(params.with("offset", None).encode(), "author=alice");
    }

    #[test]
    fn link_omits_empty_query() {
        let query = ApiQuery {
            params: QueryParams::default(),
            url: "http://host/api/v1/blocks/".into(),
        };
        assert_eq!(query.link(&query.params), "http://host/api/v1/blocks/");
        let next = query.params.with("limit", Some("20".into()));
        assert_eq!(query.link(&next), "http://host/api/v1/blocks/?limit=20");
    }
}
