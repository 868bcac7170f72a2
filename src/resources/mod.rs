//! Asynchronous asset loading.
//!
//! A [`LoadRequest`] names an asset, its kind and a continuation. The
//! [`ResourceLoader`] fetches and decodes the asset in the background on the
//! same thread as the render loop and later hands the outcome to the
//! continuation together with the [`Scene`], which is the only way a load can
//! change what gets drawn.
//!
//! Guarantees:
//! - a continuation fires at most once, with either the decoded asset or a
//!   [`LoadFailure`], never both;
//! - every load that completes (successfully or not) fires its continuation
//!   on the next [`ResourceLoader::pump`];
//! - a load whose transport never answers simply never fires. Nothing waits
//!   for it, nothing times it out.
//! - loads share no intermediate state, so they finish in any order.

pub mod font;
pub mod mesh;
pub mod model;
pub mod source;
pub mod texture;

use std::{collections::HashMap, fmt, rc::Rc};

use futures::channel::mpsc;
#[cfg(not(target_arch = "wasm32"))]
use futures::{executor::LocalPool, task::LocalSpawnExt};
use image::RgbaImage;
use thiserror::Error;

use crate::{
    data_structures::scene_graph::Scene,
    resources::{font::Typeface, model::ModelAsset, source::AssetSource},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    #[error("asset {path} is unreachable: {reason}")]
    Unreachable { path: String, reason: String },
    #[error("asset {path} is malformed: {reason}")]
    Malformed { path: String, reason: String },
}

impl LoadFailure {
    pub fn unreachable(path: &str, reason: impl fmt::Display) -> Self {
        Self::Unreachable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(path: &str, reason: impl fmt::Display) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Unreachable { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    Typeface,
    /// The request path names the geometry; `material` names its material file.
    Model { material: String },
}

pub enum Asset {
    Texture(RgbaImage),
    Typeface(Typeface),
    Model(ModelAsset),
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Texture(img) => write!(f, "Texture({}x{})", img.width(), img.height()),
            Self::Typeface(typeface) => write!(f, "{:?}", typeface),
            Self::Model(model) => write!(f, "Model({} meshes)", model.meshes.len()),
        }
    }
}

/// Invoked exactly once with the outcome of its request.
pub type Continuation = Box<dyn FnOnce(&mut Scene, Result<Asset, LoadFailure>)>;

pub struct LoadRequest {
    pub path: String,
    pub kind: AssetKind,
    continuation: Continuation,
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn mismatch(path: &str, expected: &str, got: Asset) -> LoadFailure {
    LoadFailure::malformed(path, format!("expected a {} but decoded {:?}", expected, got))
}

impl LoadRequest {
    pub fn new(
        path: &str,
        kind: AssetKind,
        continuation: impl FnOnce(&mut Scene, Result<Asset, LoadFailure>) + 'static,
    ) -> Self {
        Self {
            path: path.to_string(),
            kind,
            continuation: Box::new(continuation),
        }
    }

    pub fn texture(
        path: &str,
        continuation: impl FnOnce(&mut Scene, Result<RgbaImage, LoadFailure>) + 'static,
    ) -> Self {
        let owned = path.to_string();
        Self::new(path, AssetKind::Texture, move |scene, result| {
            let result = result.and_then(|asset| match asset {
                Asset::Texture(img) => Ok(img),
                other => Err(mismatch(&owned, "texture", other)),
            });
            continuation(scene, result)
        })
    }

    pub fn typeface(
        path: &str,
        continuation: impl FnOnce(&mut Scene, Result<Typeface, LoadFailure>) + 'static,
    ) -> Self {
        let owned = path.to_string();
        Self::new(path, AssetKind::Typeface, move |scene, result| {
            let result = result.and_then(|asset| match asset {
                Asset::Typeface(typeface) => Ok(typeface),
                other => Err(mismatch(&owned, "typeface", other)),
            });
            continuation(scene, result)
        })
    }

    pub fn model(
        geometry_path: &str,
        material_path: &str,
        continuation: impl FnOnce(&mut Scene, Result<ModelAsset, LoadFailure>) + 'static,
    ) -> Self {
        let owned = geometry_path.to_string();
        let kind = AssetKind::Model {
            material: material_path.to_string(),
        };
        Self::new(geometry_path, kind, move |scene, result| {
            let result = result.and_then(|asset| match asset {
                Asset::Model(model) => Ok(model),
                other => Err(mismatch(&owned, "model", other)),
            });
            continuation(scene, result)
        })
    }
}

pub(crate) async fn fetch(source: &dyn AssetSource, path: &str) -> Result<Vec<u8>, LoadFailure> {
    source
        .fetch(path)
        .await
        .map_err(|e| LoadFailure::unreachable(path, e))
}

async fn fetch_and_decode(
    source: Rc<dyn AssetSource>,
    path: String,
    kind: AssetKind,
) -> Result<Asset, LoadFailure> {
    match kind {
        AssetKind::Texture => {
            let bytes = fetch(&*source, &path).await?;
            texture::decode_texture(&path, &bytes).map(Asset::Texture)
        }
        AssetKind::Typeface => {
            let bytes = fetch(&*source, &path).await?;
            Typeface::from_bytes(&bytes)
                .map(Asset::Typeface)
                .map_err(|e| LoadFailure::malformed(&path, e))
        }
        AssetKind::Model { material } => model::load_model(source, path, material)
            .await
            .map(Asset::Model),
    }
}

type Ticket = u64;
type Completion = (Ticket, Result<Asset, LoadFailure>);

pub struct ResourceLoader {
    source: Rc<dyn AssetSource>,
    #[cfg(not(target_arch = "wasm32"))]
    pool: LocalPool,
    next_ticket: Ticket,
    /// Continuations of loads that have not been delivered yet.
    waiting: HashMap<Ticket, (String, Continuation)>,
    sender: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl ResourceLoader {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        let (sender, completions) = mpsc::unbounded();
        Self {
            source: Rc::new(source),
            #[cfg(not(target_arch = "wasm32"))]
            pool: LocalPool::new(),
            next_ticket: 0,
            waiting: HashMap::new(),
            sender,
            completions,
        }
    }

    /// Starts loading in the background and returns immediately.
    pub fn load(&mut self, request: LoadRequest) {
        let LoadRequest {
            path,
            kind,
            continuation,
        } = request;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        log::info!("Loading {:?} from {}", kind, path);
        self.waiting.insert(ticket, (path.clone(), continuation));

        let source = self.source.clone();
        let sender = self.sender.clone();
        let task = async move {
            let result = fetch_and_decode(source, path, kind).await;
            // The receiver lives as long as the loader; nobody is left to notify otherwise
            let _ = sender.unbounded_send((ticket, result));
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Err(e) = self.pool.spawner().spawn_local(task) {
                let path = self.waiting[&ticket].0.clone();
                let _ = self
                    .sender
                    .unbounded_send((ticket, Err(LoadFailure::unreachable(&path, e))));
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(task);
        }
    }

    pub fn load_all(&mut self, requests: impl IntoIterator<Item = LoadRequest>) {
        requests.into_iter().for_each(|request| self.load(request));
    }

    /// Loads started but not yet handed to their continuation.
    pub fn pending(&self) -> usize {
        self.waiting.len()
    }

    /**
     * Lets in-flight loads make progress without blocking, then fires the
     * continuation of every load that finished. Returns how many fired.
     */
    pub fn pump(&mut self, scene: &mut Scene) -> usize {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.pool.run_until_stalled();
        }

        let mut fired = 0;
        while let Ok(Some((ticket, result))) = self.completions.try_next() {
            let Some((path, continuation)) = self.waiting.remove(&ticket) else {
                log::warn!("Dropping a second completion for load #{}", ticket);
                continue;
            };
            match &result {
                Ok(asset) => log::info!("Loaded {} ({:?})", path, asset),
                Err(e) => log::warn!("Failed to load {}: {}", path, e),
            }
            continuation(scene, result);
            fired += 1;
        }
        fired
    }
}
