use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_XML: &str = "text/xml";

/// Wire representation of request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported content type '{0}'")]
    UnsupportedContentType(String),

    #[error("No acceptable representation for '{0}'")]
    NotAcceptable(String),

    #[error("Malformed {format} body: {message}")]
    Malformed { format: &'static str, message: String },

    #[error("Failed to render {format} body: {message}")]
    Render { format: &'static str, message: String },
}

impl Format {
    pub fn mime(&self) -> &'static str {
        match self {
            Format::Json => APPLICATION_JSON,
            Format::Xml => APPLICATION_XML,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    /// Maps a bare `type/subtype` (no parameters) to a supported format.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.trim().to_ascii_lowercase().as_str() {
            APPLICATION_JSON => Some(Format::Json),
            APPLICATION_XML | TEXT_XML => Some(Format::Xml),
            _ => None,
        }
    }

    /// Resolves a `Content-Type` header. A missing header means JSON.
    pub fn from_content_type(header: Option<&str>) -> Result<Self, FormatError> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(Format::Json);
        };
        let media_type = header.split(';').next().unwrap_or_default();
        Self::from_media_type(media_type)
            .ok_or_else(|| FormatError::UnsupportedContentType(header.to_string()))
    }

    /// Picks the response format from an `Accept` header, honouring q-values and
    /// wildcards. Ties keep the order in which the client listed the ranges.
    pub fn from_accept(header: Option<&str>) -> Result<Self, FormatError> {
        let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(Format::Json);
        };

        let mut best: Option<(f32, Format)> = None;
        for range in header.split(',') {
            let mut parts = range.split(';');
            let media_range = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

            let mut quality = 1.0_f32;
            for param in parts {
                if let Some(q) = param.trim().strip_prefix("q=") {
                    quality = q.trim().parse().unwrap_or(0.0);
                }
            }
            if quality <= 0.0 {
                continue;
            }

            let candidate = match media_range.as_str() {
                "*/*" | "application/*" => Some(Format::Json),
                "text/*" => Some(Format::Xml),
                other => Self::from_media_type(other),
            };

            if let Some(format) = candidate {
                match best {
                    Some((q, _)) if q >= quality => {}
                    _ => best = Some((quality, format)),
                }
            }
        }

        best.map(|(_, format)| format)
            .ok_or_else(|| FormatError::NotAcceptable(header.to_string()))
    }

    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, FormatError> {
        match self {
            Format::Json => serde_json::from_slice(body).map_err(|e| FormatError::Malformed {
                format: self.name(),
                message: e.to_string(),
            }),
            Format::Xml => {
                let text = std::str::from_utf8(body).map_err(|e| FormatError::Malformed {
                    format: self.name(),
                    message: e.to_string(),
                })?;
                quick_xml::de::from_str(text).map_err(|e| FormatError::Malformed {
                    format: self.name(),
                    message: e.to_string(),
                })
            }
        }
    }

    pub fn encode<T: Representation>(&self, value: &T) -> Result<Vec<u8>, FormatError> {
        match self {
            Format::Json => value.to_json(),
            Format::Xml => value.to_xml().map(String::into_bytes),
        }
    }
}

/// A value that can be sent to clients in either format.
///
/// XML documents need a named root element; JSON collections override
/// [`Representation::to_json`] to render as bare arrays.
pub trait Representation: Serialize {
    const XML_ROOT: &'static str;

    fn to_json(&self) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec(self).map_err(|e| FormatError::Render {
            format: "json",
            message: e.to_string(),
        })
    }

    fn to_xml(&self) -> Result<String, FormatError> {
        quick_xml::se::to_string_with_root(Self::XML_ROOT, self).map_err(|e| FormatError::Render {
            format: "xml",
            message: e.to_string(),
        })
    }
}
