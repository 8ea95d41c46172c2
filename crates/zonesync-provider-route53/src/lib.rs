// # Amazon Route 53 Provider
//
// `ZoneProvider` implementation for the Route 53 REST API.
//
// ## Behavior
//
// - ✅ One HTTP request per trait call
// - ✅ Credentials from the configuration or the standard AWS chain
// - ✅ Every request signed with AWS Signature Version 4
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (400, 401/403, 404, 429, 5xx)
// - ✅ Provider rejection messages passed through verbatim
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry or backoff (a failed call aborts the reconciliation)
// - ❌ NO pagination (driven by the core fetcher)
// - ❌ NO response parsing beyond error bodies (owned by the core)
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the configured endpoint only
// - ✅ Sign requests with the configured credentials
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Cache responses beyond a single request
// - ❌ Decide which changes to submit
//
// ## Security Requirements
//
// - Secret key and session token NEVER appear in logs or Debug output
// - Provider MUST fail fast if explicit credentials are empty
//
// ## API Reference
//
// - List hosted zones: GET `/{version}/hostedzone?marker=...`
// - List record sets: GET `/{version}/hostedzone/{id}/rrset?name=...&type=...&identifier=...`
// - Change record sets: POST `/{version}/hostedzone/{id}/rrset/`

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use std::time::{Duration, SystemTime};
use tokio::sync::OnceCell;
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::namespace;
use zonesync_core::xml::{self, Element};
use zonesync_core::{
    DEFAULT_API_VERSION, Error, PaginationCursor, ProviderRegistry, Result, ZoneId, ZoneProvider,
    ZoneProviderFactory,
};

pub use aws_credential_types::Credentials;

/// Route 53 API endpoint
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route 53 is a global service signed in us-east-1
const ROUTE53_REGION: &str = "us-east-1";

/// SigV4 service name
const ROUTE53_SERVICE: &str = "route53";

/// Provider name recorded on credentials given in the configuration
const EXPLICIT_CREDENTIALS: &str = "zonesync-explicit";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable selecting dry-run mode
const MODE_ENV: &str = "ZONESYNC_MODE";

/// Route 53 DNS provider
///
/// # Trust Level: Untrusted
///
/// Isolated, stateless and single-shot. Pagination, diffing and validation
/// are owned by the core.
///
/// # Credentials
///
/// Explicit credentials win. Without them the standard AWS chain is loaded
/// on first use: environment variables, `AWS_PROFILE` and the shared
/// config files, web identity, then container or instance roles.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone listing, record-set pages)
/// - Log the intended POST payload
/// - **NOT** submit the change batch, returning a synthetic `PENDING` change
pub struct Route53Provider {
    /// Credentials source, resolved again for every request
    /// ⚠️ NEVER log the resolved credentials
    credentials: OnceCell<SharedCredentialsProvider>,

    /// Whether the credentials came from the configuration
    explicit_credentials: bool,

    /// API endpoint, without trailing slash
    endpoint: Url,

    /// API version used in request paths
    api_version: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip the POST
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let credentials = if self.explicit_credentials {
            "explicit"
        } else {
            "default chain"
        };
        f.debug_struct("Route53Provider")
            .field("credentials", &credentials)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Route53Provider {
    /// Create a new Route 53 provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: AWS credentials with `route53:*RecordSets` permissions,
    ///   `None` to use the default credential chain
    /// - `endpoint`: endpoint override, `None` for [`ROUTE53_ENDPOINT`]
    /// - `api_version`: version segment of every request path
    /// - `dry_run`: if true, perform GET requests but skip the change POST
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for empty explicit credentials or an endpoint that
    /// is not an http(s) URL, [`Error::Http`] if the HTTP client cannot be
    /// built.
    pub fn new(
        credentials: Option<Credentials>,
        endpoint: Option<&str>,
        api_version: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        if let Some(credentials) = &credentials {
            if credentials.access_key_id().is_empty() || credentials.secret_access_key().is_empty()
            {
                return Err(Error::config("Route 53 credentials cannot be empty"));
            }
        }

        let raw = endpoint.unwrap_or(ROUTE53_ENDPOINT).trim_end_matches('/');
        let endpoint = Url::parse(raw)
            .map_err(|e| Error::config(format!("Invalid Route 53 endpoint {}: {}", raw, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(Error::config(format!(
                "Route 53 endpoint must be an http(s) URL, got {}",
                raw
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let explicit_credentials = credentials.is_some();
        let credentials = OnceCell::new_with(credentials.map(SharedCredentialsProvider::new));

        Ok(Self {
            credentials,
            explicit_credentials,
            endpoint,
            api_version: api_version.into(),
            client,
            dry_run,
        })
    }

    /// Resolve the credentials for one request
    async fn resolve_credentials(&self) -> Result<Credentials> {
        let provider = self
            .credentials
            .get_or_try_init(|| async {
                tracing::debug!("Loading AWS credentials from the default chain");
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(ROUTE53_REGION))
                    .load()
                    .await;
                sdk_config.credentials_provider().ok_or_else(|| {
                    Error::auth("No AWS credentials provider is available for Route 53")
                })
            })
            .await?;

        provider
            .provide_credentials()
            .await
            .map_err(|e| Error::auth(format!("Failed to load AWS credentials: {}", e)))
    }

    /// Send one signed request and return the response body
    ///
    /// `path` is unencoded; `query` pairs are encoded exactly as they are
    /// signed.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&str>,
        operation: &str,
    ) -> Result<String> {
        let url = self.request_url(path, query);
        let host = host_header(&self.endpoint);
        let identity = self.resolve_credentials().await?.into();

        let mut headers = vec![("host", host.as_str())];
        if body.is_some() {
            headers.push(("content-type", "text/xml"));
        }

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(body.unwrap_or_default().as_bytes()),
        )
        .map_err(|e| Error::auth(format!("Cannot sign {} request: {}", operation, e)))?;
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(ROUTE53_REGION)
            .name(ROUTE53_SERVICE)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| Error::auth(format!("Invalid signing parameters: {}", e)))?
            .into();
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| Error::auth(format!("Cannot sign {} request: {}", operation, e)))?
            .into_parts();

        tracing::debug!("{} {} ({})", method, url, operation);

        let mut request = self.client.request(method, &url);
        for (name, value) in instructions.headers() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", "text/xml")
                .body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &text, operation));
        }

        Ok(text)
    }

    fn request_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let encoded_path: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let mut url = format!(
            "{}{}",
            self.endpoint.as_str().trim_end_matches('/'),
            encoded_path.join("/")
        );
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        url
    }

    fn zone_path(&self, zone_id: &ZoneId) -> String {
        format!("/{}/hostedzone/{}/rrset", self.api_version, zone_id.as_str())
    }
}

#[async_trait]
impl ZoneProvider for Route53Provider {
    /// # API Call
    ///
    /// ```http
    /// GET /2013-04-01/hostedzone?marker=Z2
    /// ```
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<String> {
        let path = format!("/{}/hostedzone", self.api_version);
        let query: Vec<(&str, &str)> = marker.map(|m| ("marker", m)).into_iter().collect();
        self.send(Method::GET, &path, &query, None, "ListHostedZones")
            .await
    }

    /// # API Call
    ///
    /// ```http
    /// GET /2013-04-01/hostedzone/Z1/rrset?name=www.example.com.&type=A&identifier=blue
    /// ```
    async fn list_record_sets(
        &self,
        zone_id: &ZoneId,
        cursor: Option<&PaginationCursor>,
    ) -> Result<String> {
        let query = cursor.map(PaginationCursor::query_pairs).unwrap_or_default();
        self.send(
            Method::GET,
            &self.zone_path(zone_id),
            &query,
            None,
            "ListResourceRecordSets",
        )
        .await
    }

    /// # API Call
    ///
    /// ```http
    /// POST /2013-04-01/hostedzone/Z1/rrset/
    /// Content-Type: text/xml
    ///
    /// <ChangeResourceRecordSetsRequest>...</ChangeResourceRecordSetsRequest>
    /// ```
    ///
    /// Skipped in dry-run mode.
    async fn change_record_sets(&self, zone_id: &ZoneId, request_xml: &str) -> Result<String> {
        let path = format!("{}/", self.zone_path(zone_id));

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.request_url(&path, &[]),
                request_xml
            );
            return dry_run_response(&self.api_version, request_xml);
        }

        tracing::info!("Submitting change batch to zone {}", zone_id);
        self.send(
            Method::POST,
            &path,
            &[],
            Some(request_xml),
            "ChangeResourceRecordSets",
        )
        .await
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// `Host` header value: host plus port when it is not the scheme default
fn host_header(endpoint: &Url) -> String {
    let host = endpoint.host_str().unwrap_or_default();
    match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Map a non-success response to an error
///
/// A `Throttling` error code is rate limiting whatever the status.
fn status_error(status: StatusCode, body: &str, operation: &str) -> Error {
    let (code, detail) = describe_error(body);

    if code.as_deref() == Some("Throttling") {
        return Error::rate_limited(format!("{}: {}", operation, detail));
    }

    match status.as_u16() {
        400 => Error::provider("route53", detail),
        401 | 403 => Error::auth(format!(
            "Route 53 rejected the request signature or permissions. Status: {} - {}",
            status, detail
        )),
        404 => Error::not_found(format!("{}: {}", operation, detail)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            "route53",
            format!("Route 53 server error (transient): {} - {}", status, detail),
        ),
        _ => Error::provider(
            "route53",
            format!("{} failed: {} - {}", operation, status, detail),
        ),
    }
}

/// Extract the error code and message from a Route 53 error body
///
/// `InvalidChangeBatch` bodies yield all their messages joined by `; `;
/// `ErrorResponse` bodies yield `Code: Message`. Anything else is returned
/// as-is.
fn describe_error(body: &str) -> (Option<String>, String) {
    let Ok(mut root) = xml::parse(body) else {
        return (None, body.trim().to_string());
    };
    root.strip_whitespace();

    match root.name.as_str() {
        "InvalidChangeBatch" => {
            let messages: Vec<&str> = root
                .find("Messages")
                .map(|m| m.find_all("Message").filter_map(|e| e.text.as_deref()).collect())
                .unwrap_or_default();
            let detail = if messages.is_empty() {
                root.find_text("Message").unwrap_or_default().to_string()
            } else {
                messages.join("; ")
            };
            (Some("InvalidChangeBatch".to_string()), detail)
        }
        "ErrorResponse" => {
            let error = root.find("Error");
            let code = error.and_then(|e| e.find_text("Code")).unwrap_or_default();
            let message = error
                .and_then(|e| e.find_text("Message"))
                .unwrap_or_default();
            (Some(code.to_string()), format!("{}: {}", code, message))
        }
        _ => (None, body.trim().to_string()),
    }
}

/// Synthetic acknowledgement for a change batch that was not sent
fn dry_run_response(api_version: &str, request_xml: &str) -> Result<String> {
    let now = Utc::now();
    let comment = xml::parse(request_xml)
        .ok()
        .and_then(|root| {
            root.find("ChangeBatch")
                .and_then(|batch| batch.find_text("Comment"))
                .map(str::to_string)
        });

    let mut info = Element::new("ChangeInfo")
        .child(Element::with_text(
            "Id",
            format!("/change/DRYRUN{}", now.format("%Y%m%d%H%M%S")),
        ))
        .child(Element::with_text("Status", "PENDING"))
        .child(Element::with_text(
            "SubmittedAt",
            now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        ));
    if let Some(comment) = comment {
        info.push(Element::with_text("Comment", comment));
    }

    Element::new("ChangeResourceRecordSetsResponse")
        .attribute("xmlns", namespace(api_version))
        .child(info)
        .to_document(false)
}

/// Factory for creating Route 53 providers
#[derive(Debug, Clone)]
pub struct Route53Factory {
    /// API version passed to every provider
    pub api_version: String,
}

impl Default for Route53Factory {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ZoneProviderFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        match config {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                session_token,
                endpoint,
            } => {
                let credentials = match (access_key_id, secret_access_key) {
                    (Some(key), Some(secret)) => Some(Credentials::new(
                        key,
                        secret,
                        session_token.clone(),
                        None,
                        EXPLICIT_CREDENTIALS,
                    )),
                    (None, None) => None,
                    _ => {
                        return Err(Error::config(
                            "Route 53 access key id and secret access key must be set together",
                        ));
                    }
                };

                // Check for dry-run mode environment variable
                let dry_run = std::env::var(MODE_ENV).unwrap_or_default().to_lowercase() == "dry-run";

                if dry_run {
                    tracing::warn!(
                        "Route 53 provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(Route53Provider::new(
                    credentials,
                    endpoint.as_deref(),
                    self.api_version.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_route53::register(&registry, "2013-04-01");
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &ProviderRegistry, api_version: &str) {
    registry.register_provider(
        "route53",
        Box::new(Route53Factory {
            api_version: api_version.to_string(),
        }),
    );
}
