use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{Result, UsersError};
use crate::query::UsersSource;
use crate::types::{Gender, UsersResponse};

/// Parameters for a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub gender: Option<Gender>,
}

impl FetchParams {
    /// Server-side offset for this page. Pages start at 1.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Build the request URL: the search endpoint when there is search text,
/// the listing endpoint otherwise, with the gender filter appended to either.
pub fn users_url(base: &Url, params: &FetchParams) -> Url {
    let mut url = base.clone();
    let searching = !params.search.is_empty();

    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("users");
        if searching {
            segments.push("search");
        }
    }

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        if searching {
            query.append_pair("q", &params.search);
        }
        query
            .append_pair("limit", &params.limit.to_string())
            .append_pair("skip", &params.skip().to_string());
        if let Some(gender) = params.gender {
            query.append_pair("gender", gender.as_str());
        }
    }

    url
}

pub struct UsersClient {
    http: Client,
    base: Url,
}

impl UsersClient {
    pub fn new(api_base: &str) -> Result<Self> {
        let base = Url::parse(api_base).map_err(|e| UsersError::InvalidBaseUrl {
            url: api_base.to_string(),
            source: e,
        })?;

        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub async fn fetch_users(&self, params: &FetchParams) -> Result<UsersResponse> {
        let url = users_url(&self.base, params);
        tracing::info!(%url, "fetching users");

        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(UsersError::FetchFailed {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl UsersSource for UsersClient {
    async fn fetch_users(&self, params: &FetchParams) -> Result<UsersResponse> {
        UsersClient::fetch_users(self, params).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn base() -> Url {
        Url::parse("https://dummyjson.com").unwrap()
    }

    fn params(page: u32, search: &str, gender: Option<Gender>) -> FetchParams {
        FetchParams {
            page,
            limit: 10,
            search: search.to_string(),
            gender,
        }
    }

    #[test]
    fn test_skip_is_page_offset() {
        for page in 1..=50 {
            assert_eq!(params(page, "", None).skip(), u64::from(page - 1) * 10);
        }
    }

    #[test]
    fn test_first_page_lists_users() {
        let url = users_url(&base(), &params(1, "", None));
        assert_eq!(url.as_str(), "https://dummyjson.com/users?limit=10&skip=0");
    }

    #[test]
    fn test_search_with_gender_targets_search_endpoint() {
        let url = users_url(&base(), &params(2, "john", Some(Gender::Male)));
        assert_eq!(
            url.as_str(),
            "https://dummyjson.com/users/search?q=john&limit=10&skip=10&gender=male"
        );
    }

    #[test]
    fn test_gender_appended_to_listing() {
        let url = users_url(&base(), &params(3, "", Some(Gender::Female)));
        assert_eq!(
            url.as_str(),
            "https://dummyjson.com/users?limit=10&skip=20&gender=female"
        );
    }

    #[test]
    fn test_search_text_is_encoded() {
        let url = users_url(&base(), &params(1, "a b&c", None));
        assert_eq!(
            url.as_str(),
            "https://dummyjson.com/users/search?q=a+b%26c&limit=10&skip=0"
        );
    }

    #[test]
    fn test_base_with_path_prefix() {
        let base = Url::parse("http://localhost:8080/api/").unwrap();
        let url = users_url(&base, &params(1, "", None));
        assert_eq!(url.as_str(), "http://localhost:8080/api/users?limit=10&skip=0");
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            UsersClient::new("not a url"),
            Err(UsersError::InvalidBaseUrl { .. })
        ));
    }

    /// Answer one connection with `response` and hand back the request head.
    async fn serve_once(response: &'static str) -> (UsersClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        let client = UsersClient {
            http: Client::builder().no_proxy().build().unwrap(),
            base: Url::parse(&format!("http://{addr}")).unwrap(),
        };
        (client, server)
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failed() {
        let (client, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let result = client.fetch_users(&params(1, "", None)).await;
        assert!(matches!(result, Err(UsersError::FetchFailed { status: 500 })));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_http_decode_error() {
        let (client, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        )
        .await;

        match client.fetch_users(&params(1, "", None)).await {
            Err(UsersError::Http(e)) => assert!(e.is_decode()),
            other => panic!("expected decode error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_parses_users_from_search_endpoint() {
        const BODY: &str = r#"{"users":[{"id":7,"username":"johnd","gender":"male","email":"john@x.com","eyeColor":"Green","age":30}],"total":11,"skip":10,"limit":10}"#;
        let response = Box::leak(
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{BODY}",
                BODY.len()
            )
            .into_boxed_str(),
        );
        let (client, server) = serve_once(response).await;

        let page = client
            .fetch_users(&params(2, "john", Some(Gender::Male)))
            .await
            .unwrap();
        assert_eq!(page.total, 11);
        assert_eq!(page.users[0].username, "johnd");
        assert_eq!(page.users[0].eye_color, "Green");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /users/search?q=john&limit=10&skip=10&gender=male HTTP/1.1"));
    }
}
