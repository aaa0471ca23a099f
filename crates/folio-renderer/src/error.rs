use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AssetError {
    #[error("request for {url} failed")]
    #[diagnostic(code(assets::fetch))]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    #[diagnostic(code(assets::status))]
    Status { url: String, status: u16 },

    #[error("io error at {path}")]
    #[diagnostic(code(assets::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset map at {path} is not a flat JSON object of strings")]
    #[diagnostic(
        code(assets::map_parse),
        help("delete the file and rebuild the cache to regenerate it")
    )]
    MapParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode asset map")]
    #[diagnostic(code(assets::map_encode))]
    MapEncode(#[source] serde_json::Error),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ContentError {
    #[error("failed to read {path}")]
    #[diagnostic(code(content::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON")]
    #[diagnostic(code(content::parse))]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("page is missing required field `{field}`")]
    #[diagnostic(code(content::missing_field))]
    MissingField { field: &'static str },

    #[error("failed to encode post index")]
    #[diagnostic(code(content::encode))]
    Encode(#[source] serde_json::Error),
}
