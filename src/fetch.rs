//! One-shot HTTP GET and JSON decoding against the admin API.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

/// Joins `path` onto the path of `base` and appends `query`.
///
/// ```
/// # use elasticsearch_exporter::fetch::endpoint;
/// # use url::Url;
/// let base = Url::parse("http://localhost:9200/es/").unwrap();
/// let url = endpoint(&base, "/_cat/indices", &[("format", "json")]);
/// assert_eq!("http://localhost:9200/es/_cat/indices?format=json", url.as_str());
/// ```
pub fn endpoint(base: &Url, path: &str, query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    url
}

/// Decodes a JSON document.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Issues GET requests relative to a base URL with an externally configured
/// client.
///
/// Timeouts, TLS and authentication are properties of the [`Client`].
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    base: Url,
}

impl Fetcher {
    /// Creates a new [`Fetcher`].
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Issues exactly one GET and returns the response body.
    ///
    /// The response is dropped, and its connection released, on every path.
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let url = endpoint(&self.base, path, query);
        trace!(%url, "fetching");

        let response = match self.client.get(url.clone()).send() {
            Ok(response) => response,
            Err(source) => return Err(Error::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }

        match response.bytes() {
            Ok(body) => Ok(body.to_vec()),
            Err(source) => Err(Error::Transport { url, source }),
        }
    }

    /// Like [`Fetcher::get`], decoding the body as JSON.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        decode(&self.get(path, query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Doc {
        a: u32,
    }

    fn fetcher(server: &MockServer) -> Fetcher {
        Fetcher::new(Client::new(), Url::parse(&server.base_url()).unwrap())
    }

    #[test]
    fn endpoint_joins_paths() {
        let base = Url::parse("http://localhost:9200").unwrap();
        assert_eq!(
            "http://localhost:9200/_all/_settings",
            endpoint(&base, "/_all/_settings", &[]).as_str()
        );

        let base = Url::parse("http://localhost:9200/prefix").unwrap();
        assert_eq!(
            "http://localhost:9200/prefix/_all/_settings",
            endpoint(&base, "/_all/_settings", &[]).as_str()
        );
    }

    #[test]
    fn endpoint_encodes_query() {
        let base = Url::parse("http://localhost:9200").unwrap();
        let url = endpoint(
            &base,
            "/_cat/indices",
            &[("format", "json"), ("h", "index,docs.count")],
        );

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            vec![
                ("format".to_string(), "json".to_string()),
                ("h".to_string(), "index,docs.count".to_string()),
            ],
            pairs
        );
    }

    #[test]
    fn get_json_decodes_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/doc").query_param("format", "json");
            then.status(200).body(r#"{"a": 7}"#);
        });

        let doc: Doc = fetcher(&server)
            .get_json("/doc", &[("format", "json")])
            .unwrap();

        assert_eq!(7, doc.a);
        mock.assert();
    }

    #[test]
    fn non_success_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/doc");
            then.status(503);
        });

        match fetcher(&server).get("/doc", &[]) {
            Err(Error::Status { status, .. }) => assert_eq!(503, status.as_u16()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/doc");
            then.status(200).body("{not json");
        });

        let err = fetcher(&server).get_json::<Doc>("/doc", &[]).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let fetcher = Fetcher::new(Client::new(), Url::parse("http://127.0.0.1:1").unwrap());

        let err = fetcher.get("/doc", &[]).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
