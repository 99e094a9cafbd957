// src/domain/payload.rs
// Job payloads: where they live and the schemas they come in

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::model::base_name;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("No payload location provided")]
    EmptyLocation,

    #[error("Invalid payload location {location:?}: {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Invalid {format} payload: {message}")]
    InvalidBody {
        format: PayloadFormat,
        message: String,
    },

    #[error("Unsupported resource scheme {0:?}, only s3 is supported")]
    UnsupportedScheme(String),
}

/// Payload schema. `Auto` picks one from the key extension or the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Auto,
    /// JSON `inputs`/`outputs` lists of `{href, rel}` links
    Ogc,
    /// YAML `model_configuration` with `resource_info` links
    Stac,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Ogc => write!(f, "OGC JSON"),
            Self::Stac => write!(f, "STAC YAML"),
        }
    }
}

impl PayloadFormat {
    /// Name as written in settings files and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Ogc => "ogc",
            Self::Stac => "stac",
        }
    }

    /// Resolve `Auto` using the key extension, then the first byte of the body
    pub fn detect(self, key: &str, body: &[u8]) -> Self {
        if self != Self::Auto {
            return self;
        }

        let lower = key.to_ascii_lowercase();
        if lower.ends_with(".json") {
            return Self::Ogc;
        }
        if lower.ends_with(".yml") || lower.ends_with(".yaml") {
            return Self::Stac;
        }

        match body.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Ogc,
            _ => Self::Stac,
        }
    }
}

/// Object holding the job payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadLocation {
    pub bucket: Option<String>,
    pub key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InlineParams {
    Wrapped { inputs: Params },
    Flat(Params),
}

#[derive(Deserialize)]
struct Params {
    s3key: String,
    #[serde(default)]
    bucket: Option<String>,
}

impl PayloadLocation {
    /// Parse the runner's positional argument.
    ///
    /// Accepts inline JSON (`{"s3key": "..."}`, optionally nested under
    /// `inputs`), an `s3://bucket/key` URL, or a bare key.
    pub fn parse(arg: &str) -> Result<Self, PayloadError> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(PayloadError::EmptyLocation);
        }

        if arg.starts_with('{') {
            let params: InlineParams =
                serde_json::from_str(arg).map_err(|e| PayloadError::InvalidLocation {
                    location: arg.to_string(),
                    message: e.to_string(),
                })?;
            let params = match params {
                InlineParams::Wrapped { inputs } => inputs,
                InlineParams::Flat(params) => params,
            };
            if params.s3key.trim().is_empty() {
                return Err(PayloadError::EmptyLocation);
            }
            return Ok(Self {
                bucket: params.bucket.filter(|b| !b.is_empty()),
                key: params.s3key,
            });
        }

        if arg.starts_with("s3://") {
            let link = ResourceLink::from_href(arg, None)?;
            return Ok(Self {
                bucket: link.bucket,
                key: link.key,
            });
        }

        Ok(Self {
            bucket: None,
            key: arg.to_string(),
        })
    }
}

/// One input or output object of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    /// `None` means the runner's own bucket
    pub bucket: Option<String>,
    pub key: String,
    pub rel: Option<String>,
}

impl ResourceLink {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            bucket: None,
            key: key.into(),
            rel: None,
        }
    }

    /// Build a link from an OGC `href`, either a plain key or an `s3://` URL
    pub fn from_href(href: &str, rel: Option<String>) -> Result<Self, PayloadError> {
        let Some((scheme, rest)) = href.split_once("://") else {
            return Ok(Self {
                bucket: None,
                key: href.trim_start_matches('/').to_string(),
                rel,
            });
        };
        if !scheme.eq_ignore_ascii_case("s3") {
            return Err(PayloadError::UnsupportedScheme(scheme.to_string()));
        }

        // Keys are taken verbatim: S3 allows spaces, `%`, `#` and `?`
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(PayloadError::InvalidLocation {
                location: href.to_string(),
                message: "missing object key".to_string(),
            });
        }

        Ok(Self {
            bucket: Some(bucket.to_string()).filter(|b| !b.is_empty()),
            key: key.to_string(),
            rel,
        })
    }

    pub fn bucket_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.bucket.as_deref().unwrap_or(default)
    }

    /// File name the object is staged under locally
    pub fn file_name(&self) -> &str {
        base_name(&self.key)
    }
}

/// Schema-neutral job description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    pub model_name: Option<String>,
    pub inputs: Vec<ResourceLink>,
    pub outputs: Vec<ResourceLink>,
}

impl Payload {
    /// Deserialize a payload body in the given (resolved) format
    pub fn from_slice(format: PayloadFormat, body: &[u8]) -> Result<Self, PayloadError> {
        match format {
            PayloadFormat::Ogc => OgcPayload::parse(body),
            PayloadFormat::Stac => StacPayload::parse(body),
            PayloadFormat::Auto => Self::from_slice(format.detect("", body), body),
        }
    }
}

#[derive(Deserialize)]
struct OgcLink {
    href: String,
    #[serde(default)]
    rel: Option<String>,
}

#[derive(Deserialize)]
struct OgcPayload {
    inputs: Vec<OgcLink>,
    #[serde(default)]
    outputs: Vec<OgcLink>,
}

impl OgcPayload {
    fn parse(body: &[u8]) -> Result<Payload, PayloadError> {
        let raw: Self = serde_json::from_slice(body).map_err(|e| PayloadError::InvalidBody {
            format: PayloadFormat::Ogc,
            message: e.to_string(),
        })?;

        let convert = |links: Vec<OgcLink>| {
            links
                .into_iter()
                .map(|link| ResourceLink::from_href(&link.href, link.rel))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Payload {
            model_name: None,
            inputs: convert(raw.inputs)?,
            outputs: convert(raw.outputs)?,
        })
    }
}

#[derive(Deserialize)]
struct ResourceInfo {
    #[serde(default)]
    scheme: String,
    #[serde(default)]
    authority: String,
    fragment: String,
}

#[derive(Deserialize)]
struct StacLink {
    #[serde(default)]
    name: Option<String>,
    resource_info: ResourceInfo,
}

#[derive(Deserialize, Default)]
struct ModelLinks {
    #[serde(default)]
    linked_input_files: Vec<StacLink>,
    #[serde(default)]
    required_output_files: Vec<StacLink>,
}

#[derive(Deserialize)]
struct ModelConfiguration {
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    model_links: ModelLinks,
}

#[derive(Deserialize)]
struct StacPayload {
    model_configuration: ModelConfiguration,
}

impl StacPayload {
    fn parse(body: &[u8]) -> Result<Payload, PayloadError> {
        let raw: Self = serde_yaml::from_slice(body).map_err(|e| PayloadError::InvalidBody {
            format: PayloadFormat::Stac,
            message: e.to_string(),
        })?;

        let convert = |links: Vec<StacLink>| {
            links
                .into_iter()
                .map(|link| {
                    let info = link.resource_info;
                    if !info.scheme.is_empty() && !info.scheme.eq_ignore_ascii_case("s3") {
                        return Err(PayloadError::UnsupportedScheme(info.scheme));
                    }
                    Ok(ResourceLink {
                        bucket: Some(info.authority).filter(|a| !a.is_empty()),
                        key: info.fragment.trim_start_matches('/').to_string(),
                        rel: link.name,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let config = raw.model_configuration;
        Ok(Payload {
            model_name: config.model_name.filter(|n| !n.is_empty()),
            inputs: convert(config.model_links.linked_input_files)?,
            outputs: convert(config.model_links.required_output_files)?,
        })
    }
}
