//! Background loading of the glTF still-life, the environment map and the
//! spot light mask. Each asset is decoded on its own thread and delivered
//! once, as an [`AssetEvent`], to whatever sink the caller provides.

mod gltf_scene;
mod images;

pub use gltf_scene::load_scene;
pub use images::{load_environment, load_spot_mask, EnvironmentLevel, EnvironmentMap, MaskImage};

use std::path::{Path, PathBuf};

use crate::config::AssetPaths;
use crate::scene::SceneGraph;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import glTF {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error(
        "{path} uses Draco mesh compression, which is not supported; \
         re-export it without mesh compression (e.g. Blender glTF export with compression off)"
    )]
    DracoCompressed { path: String },
    #[error("{path} contains no triangle meshes")]
    NoMeshes { path: String },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to spawn loader thread for {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One-shot completion of a background load.
#[derive(Debug)]
pub enum AssetEvent {
    Scene(Result<SceneGraph, AssetError>),
    Environment(Result<EnvironmentMap, AssetError>),
    SpotMask(Result<MaskImage, AssetError>),
}

impl AssetEvent {
    pub fn label(&self) -> &'static str {
        match self {
            AssetEvent::Scene(_) => "model",
            AssetEvent::Environment(_) => "environment",
            AssetEvent::SpotMask(_) => "spot mask",
        }
    }
}

/// Relative paths are tried against the working directory first, then
/// against the crate root so `cargo run` works from anywhere.
pub fn resolve_asset_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    let manifest_relative = Path::new(env!("CARGO_MANIFEST_DIR")).join(path);
    if manifest_relative.exists() {
        manifest_relative
    } else {
        path.to_path_buf()
    }
}

/// Starts one loader thread per asset. `sink` is called exactly once per
/// asset, from the loader thread, with the decoded result.
pub fn spawn_loaders<F>(paths: &AssetPaths, sink: F)
where
    F: Fn(AssetEvent) + Send + Clone + 'static,
{
    let model = resolve_asset_path(&paths.model);
    spawn_one("model", model, sink.clone(), |path| load_scene(path), AssetEvent::Scene);

    let environment = resolve_asset_path(&paths.environment);
    spawn_one(
        "environment",
        environment,
        sink.clone(),
        |path| load_environment(path),
        AssetEvent::Environment,
    );

    let mask = resolve_asset_path(&paths.spot_mask);
    spawn_one("spot-mask", mask, sink, |path| load_spot_mask(path), AssetEvent::SpotMask);
}

fn spawn_one<T, F, L>(
    name: &str,
    path: PathBuf,
    sink: F,
    load: L,
    wrap: fn(Result<T, AssetError>) -> AssetEvent,
) where
    F: Fn(AssetEvent) + Send + Clone + 'static,
    L: FnOnce(&Path) -> Result<T, AssetError> + Send + 'static,
    T: 'static,
{
    log::info!("Loading {} from {}", name, path.display());
    let thread_sink = sink.clone();
    let thread_path = path.clone();
    let spawned = std::thread::Builder::new()
        .name(format!("load-{name}"))
        .spawn(move || thread_sink(wrap(load(&thread_path))));
    if let Err(source) = spawned {
        sink(wrap(Err(AssetError::Spawn {
            path: path.display().to_string(),
            source,
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn missing_files_are_reported_once_each() {
        let paths = AssetPaths {
            model: PathBuf::from("/no/such/candles.glb"),
            environment: PathBuf::from("/no/such/env.hdr"),
            spot_mask: PathBuf::from("/no/such/mask.jpg"),
        };
        let (tx, rx) = mpsc::channel();
        spawn_loaders(&paths, move |event| {
            let _ = tx.send(event);
        });

        let mut labels: Vec<&str> = Vec::new();
        for _ in 0..3 {
            let event = rx
                .recv_timeout(std::time::Duration::from_secs(10))
                .expect("loader never reported");
            let failed = match &event {
                AssetEvent::Scene(result) => result.is_err(),
                AssetEvent::Environment(result) => result.is_err(),
                AssetEvent::SpotMask(result) => result.is_err(),
            };
            assert!(failed);
            labels.push(event.label());
        }
        labels.sort_unstable();
        assert_eq!(labels, vec!["environment", "model", "spot mask"]);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let path = Path::new("/tmp/whatever.glb");
        assert_eq!(resolve_asset_path(path), path);
    }
}
