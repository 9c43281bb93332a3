//! GitLab REST (v4) implementation of [`RemoteApi`].
//!
//! Offset pagination is read from the `x-next-page` header; keyset
//! pagination from the `Link: <...>; rel="next"` header, whose URL becomes an
//! opaque [`Cursor::Token`] and is requested verbatim on the next call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::{Blob, Cursor, Error, Group, PageResult, Project, RemoteApi, Result};

/// Public GitLab instance used when no server is configured.
pub const DEFAULT_SERVER: &str = "https://gitlab.com";

const NEXT_PAGE_HEADER: &str = "x-next-page";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// HTTP client for the three GitLab endpoints the search pipeline uses.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    client: Client,
    base: Url,
    token: Option<String>,
    keyset_projects: bool,
    include_subgroups: bool,
}

impl GitlabClient {
    /// Creates a client for `server`, authenticating with `token` when given.
    pub fn new(server: &str, token: Option<&str>) -> Result<Self> {
        Self::with_timeout(server, token, Duration::from_secs(30))
    }

    /// Creates a client with a custom request timeout (primarily for tests)
    pub fn with_timeout(server: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(server.trim())
            .map_err(|e| Error::InvalidUrl(format!("'{server}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "'{server}': only http and https servers are supported"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tanuki/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            base,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
            keyset_projects: false,
            include_subgroups: false,
        })
    }

    /// Request keyset pagination when listing group projects.
    #[must_use]
    pub const fn with_keyset_pagination(mut self, enabled: bool) -> Self {
        self.keyset_projects = enabled;
        self
    }

    /// Also list projects of descendant groups.
    #[must_use]
    pub const fn with_subgroups(mut self, enabled: bool) -> Self {
        self.include_subgroups = enabled;
        self
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn server(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("api/v4/{path}"))?)
    }

    /// A token cursor is a URL handed out by this server; refuse anything else.
    fn token_url(&self, token: &str) -> Result<Url> {
        let url = Url::parse(token)
            .map_err(|e| Error::MalformedResponse(format!("pagination link '{token}': {e}")))?;
        if url.origin() != self.base.origin() {
            return Err(Error::MalformedResponse(format!(
                "pagination link '{token}' points outside {}",
                self.base
            )));
        }
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        cursor: Cursor,
    ) -> Result<PageResult<T>> {
        let url = match &cursor {
            Cursor::Token(token) => self.token_url(token)?,
            Cursor::Page { number, size } => {
                let mut url = self.endpoint(path)?;
                {
                    let mut query = url.query_pairs_mut();
                    for (key, value) in params {
                        query.append_pair(key, value);
                    }
                    query.append_pair("page", &number.to_string());
                    query.append_pair("per_page", &size.to_string());
                }
                url
            },
        };

        debug!("GET {}", url);
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication(format!(
                    "{status} from {path}. Check the token passed with --token or stored by 'tanuki config --write'"
                )),
                StatusCode::NOT_FOUND => Error::NotFound(format!("{path} ({status})")),
                StatusCode::TOO_MANY_REQUESTS => {
                    Error::Transient(format!("rate limited on {path} ({status})"))
                },
                s if s.is_server_error() => Error::Transient(format!("{status} from {path}")),
                _ => response.error_for_status().err().map_or_else(
                    || Error::MalformedResponse(format!("unexpected {status} from {path}")),
                    Error::Network,
                ),
            });
        }

        let next = next_cursor(response.headers(), &cursor)?;
        let body = response.text().await?;
        let items: Vec<T> = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("{path}: {e}")))?;

        info!("Fetched {} items from {} (next: {})", items.len(), path, next);
        Ok(PageResult::new(items, next))
    }
}

/// Work out where the following request resumes.
fn next_cursor(headers: &HeaderMap, current: &Cursor) -> Result<Cursor> {
    let next_link = headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(parse_next_link);

    match current {
        Cursor::Page { size, .. } => {
            let header = headers
                .get(NEXT_PAGE_HEADER)
                .map(|v| {
                    v.to_str()
                        .map(str::trim)
                        .map_err(|e| Error::MalformedResponse(format!("{NEXT_PAGE_HEADER}: {e}")))
                })
                .transpose()?;
            match header {
                Some("") => Ok(Cursor::end_of_pages(*size)),
                Some(raw) => {
                    let number = raw.parse::<u32>().map_err(|e| {
                        Error::MalformedResponse(format!("{NEXT_PAGE_HEADER} '{raw}': {e}"))
                    })?;
                    Ok(Cursor::Page {
                        number,
                        size: *size,
                    })
                },
                None => Ok(next_link.map_or_else(|| Cursor::end_of_pages(*size), Cursor::Token)),
            }
        },
        Cursor::Token(_) => Ok(next_link.map_or_else(Cursor::end_of_tokens, Cursor::Token)),
    }
}

/// Extract the `rel="next"` target from one `Link` header value.
fn parse_next_link(value: &str) -> Option<String> {
    value.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[async_trait]
impl RemoteApi for GitlabClient {
    async fn search_groups(&self, query: &str, cursor: Cursor) -> Result<PageResult<Group>> {
        let mut params = Vec::new();
        if !query.is_empty() {
            params.push(("search", query.to_string()));
        }
        self.get_page("groups", &params, cursor).await
    }

    async fn list_group_projects(
        &self,
        group_id: u64,
        cursor: Cursor,
    ) -> Result<PageResult<Project>> {
        let mut params = Vec::new();
        if self.include_subgroups {
            params.push(("include_subgroups", "true".to_string()));
        }
        if self.keyset_projects {
            params.push(("pagination", "keyset".to_string()));
            params.push(("order_by", "id".to_string()));
            params.push(("sort", "asc".to_string()));
        }
        self.get_page(&format!("groups/{group_id}/projects"), &params, cursor)
            .await
    }

    async fn search_project_blobs(
        &self,
        project_id: u64,
        query: &str,
        cursor: Cursor,
    ) -> Result<PageResult<Blob>> {
        let params = [
            ("scope", "blobs".to_string()),
            ("search", query.to_string()),
        ];
        self.get_page(&format!("projects/{project_id}/search"), &params, cursor)
            .await
    }
}
