//! Loading raw document text from files and URLs.
//!
//! # Examples
//!
//! ```no_run
//! use swaggerfold_core::source;
//!
//! # #[tokio::main]
//! # async fn main() -> swaggerfold_core::Result<()> {
//! let text = source::load("https://petstore.swagger.io/v2/swagger.json").await?;
//! let local = source::load("specs/petstore.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

use crate::Error;

// External imports (alphabetized)
use tokio::fs;
use url::Url;

/// Whether a location should be fetched over HTTP rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    Url::parse(location)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Load document text from a file path or an HTTP(S) URL
pub async fn load<S: AsRef<str>>(location: S) -> crate::Result<String> {
    let location = location.as_ref();
    if is_remote(location) {
        return load_url(location).await;
    }
    load_file(location).await
}

/// Read document text from a file
pub async fn load_file<P: AsRef<Path>>(path: P) -> crate::Result<String> {
    let path = path.as_ref();
    log::debug!("reading {}", path.display());
    let content = fs::read_to_string(path).await?;
    Ok(content)
}

/// Fetch document text from a URL
pub async fn load_url(url: &str) -> crate::Result<String> {
    log::debug!("fetching {}", url);
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::fetch(format!("Failed to fetch document from {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::fetch(format!(
            "Failed to fetch document from {}: HTTP {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| Error::fetch(format!("Failed to read response from {}: {}", url, e)))
}
