use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    http::uri::{self, Scheme},
    Uri,
};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{
        connect::{Connect, HttpConnector},
        Client,
    },
    rt::TokioExecutor,
};

use crate::{
    didcore::Document as DIDDocument,
    jwk::Jwk,
    methods::{
        errors::{DidWebError, ParsingErrorSource},
        resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
        traits::{DIDMethod, DIDResolver},
    },
};

/// A struct for resolving DID Web documents.
///
/// Each request goes through the connection pool of this resolver only;
/// no document is cached between calls.
pub struct DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    client: Client<C, Full<Bytes>>,
}

impl DidWeb<HttpConnector> {
    // Creates a new `DidWeb` resolver with HTTP scheme, for testing only.
    #[cfg(test)]
    pub fn http() -> DidWeb<HttpConnector> {
        DidWeb {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for DidWeb<HttpsConnector<HttpConnector>> {
    fn default() -> Self {
        Self::new()
    }
}

impl DidWeb<HttpsConnector<HttpConnector>> {
    /// Creates a new `DidWeb` resolver.
    ///
    /// Idle connections are not kept, so that a resolver shared by several
    /// runtimes never hands a connection from one call to the next.
    pub fn new() -> DidWeb<HttpsConnector<HttpConnector>> {
        DidWeb {
            client: Client::builder(TokioExecutor::new())
                .pool_max_idle_per_host(0)
                .build::<_, Full<Bytes>>(HttpsConnector::new()),
        }
    }
}

impl<C> DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    /// Fetches a DID document from the given URL
    async fn fetch_did_document(&self, url: Uri) -> Result<String, DidWebError> {
        let res = self.client.get(url).await?;

        if !res.status().is_success() {
            return Err(DidWebError::NonSuccessResponse(res.status()));
        }

        let body = BodyExt::collect(res.into_body()).await?;

        String::from_utf8(body.to_bytes().to_vec()).map_err(|err| err.into())
    }

    /// Fetches and parses a DID document for the given DID.
    async fn resolver_fetcher(&self, did: &str) -> Result<DIDDocument, DidWebError> {
        let url = did_web_url(did)?;

        tracing::debug!(%url, "fetching did:web document");
        let json_string = self.fetch_did_document(url).await?;

        let did_document: DIDDocument = serde_json::from_str(&json_string).map_err(ParsingErrorSource::from)?;
        if did_document.id != did {
            return Err(DidWebError::IdMismatch(did_document.id));
        }

        Ok(did_document)
    }
}

/// Maps a did:web DID to the URL of its document.
///
/// Plain HTTP is used only for `localhost`, with or without a port.
fn did_web_url(did: &str) -> Result<Uri, DidWebError> {
    let (path, domain_name) = parse_did_web_url(did)?;
    let scheme = match is_localhost(&domain_name) {
        true => Scheme::HTTP,
        false => Scheme::HTTPS,
    };

    uri::Builder::new()
        .scheme(scheme)
        .authority(domain_name)
        .path_and_query(path)
        .build()
        .map_err(|err| DidWebError::InvalidDid(err.to_string()))
}

fn is_localhost(authority: &str) -> bool {
    match authority.split_once(':') {
        Some((host, port)) => host == "localhost" && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => authority == "localhost",
    }
}

/// Parses a DID Web URL and returns the path and domain name.
fn parse_did_web_url(did: &str) -> Result<(String, String), DidWebError> {
    let mut parts = did.split(':').peekable();
    let domain_name = match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some("web"), Some(domain_name)) if !domain_name.is_empty() => {
            domain_name.replacen("%3A", ":", 1).replacen("%3a", ":", 1)
        }
        _ => {
            return Err(DidWebError::InvalidDid(did.to_string()));
        }
    };

    let mut path = match parts.peek() {
        Some(_) => parts.collect::<Vec<&str>>().join("/"),
        None => ".well-known".to_string(),
    };

    path = format!("/{path}/did.json");

    Ok((path, domain_name))
}

impl<C> DIDMethod for DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    fn name(&self) -> &'static str {
        "web"
    }

    /// did:web identifiers need a hosted document; they cannot be derived from a key.
    fn generate(&self, _jwk: &Jwk) -> Option<String> {
        None
    }
}

#[async_trait]
impl<C> DIDResolver for DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    /// Resolves a `did:web` address to a DID document.
    ///
    /// # Example
    ///
    /// ```
    /// use did_utils::methods::{DIDResolver, DidWeb, DIDResolutionOptions};
    ///
    /// # async fn example_resolve_did_web() {
    /// // create new web did resolver
    /// let did_web_resolver = DidWeb::new();
    /// let did = "did:web:example.com";
    /// // resolve the did
    /// let output = did_web_resolver.resolve(did, &DIDResolutionOptions::default()).await;
    /// # }
    /// ```
    async fn resolve(&self, did: &str, _options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.resolver_fetcher(did).await {
            Ok(diddoc) => ResolutionOutput::from_document(diddoc, MediaType::DidLdJson),
            Err(err) => {
                tracing::warn!(did, %err, "did:web resolution failed");
                ResolutionOutput::from_error(err.into())
            }
        }
    }
}
