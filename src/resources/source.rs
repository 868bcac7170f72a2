//! Byte transports for assets.
//!
//! The loader never touches files or URLs directly; it asks an [`AssetSource`]
//! for the raw bytes of a path and decodes them itself. [`AssetDir`] is the
//! transport used by the application: the `assets/` directory next to the
//! binary on native targets and `<origin>/assets/` over HTTP on the web.

use futures::future::LocalBoxFuture;

/// Future resolving to the complete contents of one asset.
pub type FetchFuture = LocalBoxFuture<'static, anyhow::Result<Vec<u8>>>;

pub trait AssetSource {
    /// Starts fetching `path`. The future may never resolve (a stalled transport).
    fn fetch(&self, path: &str) -> FetchFuture;
}

/// Reads assets relative to an asset root.
#[derive(Clone, Debug)]
pub struct AssetDir {
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    root: std::path::PathBuf,
}

impl AssetDir {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for AssetDir {
    fn default() -> Self {
        Self::new(std::path::Path::new("./").join("assets"))
    }
}

impl AssetSource for AssetDir {
    fn fetch(&self, path: &str) -> FetchFuture {
        #[cfg(target_arch = "wasm32")]
        {
            let file_name = path.to_string();
            Box::pin(async move { load_binary(&file_name).await })
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = self.root.join(path);
            // Blocking read: it finishes in the first poll, on the thread that pumps the loader
            Box::pin(async move { Ok(std::fs::read(path)?) })
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("the page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg(target_arch = "wasm32")]
async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    let url = format_url(file_name)?;
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Resolves `name` relative to the directory of `of`, e.g. a texture named in a material file.
pub fn sibling(of: &str, name: &str) -> String {
    match of.rfind('/') {
        Some(idx) => format!("{}/{}", &of[..idx], name),
        None => name.to_string(),
    }
}
