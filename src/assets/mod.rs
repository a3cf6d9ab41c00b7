//! Background glTF loading.
//!
//! Files are imported on worker threads; only their bounds come back. A
//! finished load is turned into a draggable box entity when the frame loop
//! polls, so the scene graph is only ever touched on the event-loop thread.

use crate::config::AssetEntry;
use crate::scene::{Capabilities, Color, EntityId, NewEntity, SceneGraph, Shape};
use glam::{Mat4, Vec3};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

const ASSET_COLOR: u32 = 0xb4b4b4;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import glTF at {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF at {path} has no vertex positions")]
    NoGeometry { path: String },
    #[error("failed to start loader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetRequest {
    pub name: String,
    pub path: PathBuf,
    pub position: Vec3,
    pub scale: f32,
}

impl From<&AssetEntry> for AssetRequest {
    fn from(entry: &AssetEntry) -> Self {
        Self {
            name: entry.display_name(),
            path: entry.path.clone(),
            position: entry.position(),
            scale: entry.scale,
        }
    }
}

/// Axis-aligned bounds of an imported asset, in the asset's own units.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub request: AssetRequest,
    pub center: Vec3,
    pub extent: Vec3,
}

impl LoadedAsset {
    fn to_entity(&self) -> NewEntity {
        let scale = self.request.scale;
        NewEntity::new(
            self.request.name.clone(),
            Shape::Box {
                size: self.extent.max(Vec3::splat(1e-3)),
            },
            Color::from_hex_u32(ASSET_COLOR),
        )
        .at(self.request.position + self.center * scale)
        .scaled(Vec3::splat(scale))
        .with(Capabilities::DRAGGABLE)
        .shadows(true, true)
    }
}

type LoadResult = Result<LoadedAsset, AssetError>;

pub struct AssetManager {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    pending: usize,
    loaded: Vec<LoadedAsset>,
}

impl AssetManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: 0,
            loaded: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn loaded_assets(&self) -> &[LoadedAsset] {
        &self.loaded
    }

    /// Start loading in the background. Never blocks.
    pub fn request(&mut self, request: AssetRequest) -> Result<(), AssetError> {
        let sender = self.sender.clone();
        // Thread names may not contain NUL.
        let thread_name = format!("asset-{}", request.name.replace('\0', ""));
        log::info!("assets: loading '{}' from {}", request.name, request.path.display());
        std::thread::Builder::new().name(thread_name).spawn(move || {
            let result = load_bounds(&request.path).map(|(center, extent)| LoadedAsset {
                request,
                center,
                extent,
            });
            // The receiver is gone once the session is torn down.
            let _ = sender.send(result);
        })?;
        self.pending += 1;
        Ok(())
    }

    /// Insert every finished load into the scene. Failures are logged.
    pub fn poll(&mut self, scene: &mut SceneGraph) -> Vec<EntityId> {
        let mut inserted = Vec::new();
        loop {
            let result = match self.receiver.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            self.pending = self.pending.saturating_sub(1);
            match result {
                Ok(asset) => match scene.insert(asset.to_entity()) {
                    Ok(id) => {
                        log::info!(
                            "assets: '{}' ready as {} (extent {:.2}, {:.2}, {:.2})",
                            asset.request.name,
                            id,
                            asset.extent.x,
                            asset.extent.y,
                            asset.extent.z
                        );
                        inserted.push(id);
                        self.loaded.push(asset);
                    }
                    Err(err) => log::warn!("assets: '{}' rejected: {}", asset.request.name, err),
                },
                Err(err) => log::warn!("assets: {}", err),
            }
        }
        inserted
    }
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Import a glTF file and return the center and size of its world-space
/// bounds across the default scene.
pub fn load_bounds(path: &Path) -> Result<(Vec3, Vec3), AssetError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.display().to_string(),
        source,
    })?;

    let mut points = Vec::new();
    let scene = document.default_scene().or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node_points(&node, Mat4::IDENTITY, &buffers, &mut points);
            }
        }
        None => {
            for mesh in document.meshes() {
                collect_mesh_points(&mesh, Mat4::IDENTITY, &buffers, &mut points);
            }
        }
    }

    bounds_of(points.into_iter()).ok_or_else(|| AssetError::NoGeometry {
        path: path.display().to_string(),
    })
}

fn collect_node_points(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<Vec3>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_mesh_points(&mesh, world, buffers, out);
    }
    for child in node.children() {
        collect_node_points(&child, world, buffers, out);
    }
}

fn collect_mesh_points(mesh: &gltf::Mesh, world: Mat4, buffers: &[gltf::buffer::Data], out: &mut Vec<Vec3>) {
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        if let Some(positions) = reader.read_positions() {
            out.extend(positions.map(|p| world.transform_point3(Vec3::from_array(p))));
        }
    }
}

/// Center and full size of the points' axis-aligned bounds.
pub fn bounds_of(points: impl Iterator<Item = Vec3>) -> Option<(Vec3, Vec3)> {
    let (min, max) = points.fold(None, |acc: Option<(Vec3, Vec3)>, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })?;
    Some(((min + max) * 0.5, max - min))
}
