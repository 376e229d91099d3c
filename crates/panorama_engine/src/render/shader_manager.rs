//! Shader program cache with in-place hot reload
//!
//! Programs are keyed by their (vertex, fragment) source pair. A [`ShaderId`]
//! handed out by [`ShaderManager::get`] stays valid across reloads: reloading
//! swaps the device program behind the id and never invalidates it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use slotmap::{new_key_type, SlotMap};

use crate::assets::AssetSource;
use crate::render::device::{GraphicsDevice, ProgramHandle, RenderError, RenderResult};

new_key_type! {
    /// Stable handle to a cached shader program
    pub struct ShaderId;
}

/// A cached program and where it came from
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    name: String,
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    program: ProgramHandle,
    built_from: Option<SystemTime>,
}

impl ShaderProgram {
    /// `vert+frag` name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current device program (changes on reload)
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    fn sources_modified(&self, assets: &dyn AssetSource) -> Option<SystemTime> {
        let vertex = assets.modified(&self.vertex_path).ok()?;
        let fragment = assets.modified(&self.fragment_path).ok()?;
        Some(vertex.max(fragment))
    }
}

/// Source-pair keyed shader cache
#[derive(Debug)]
pub struct ShaderManager {
    shader_root: PathBuf,
    programs: SlotMap<ShaderId, ShaderProgram>,
    by_sources: HashMap<(String, String), ShaderId>,
    watched_stamp: Option<SystemTime>,
}

impl ShaderManager {
    /// Create an empty cache reading sources from `shader_root`
    pub fn new(shader_root: impl Into<PathBuf>) -> Self {
        Self {
            shader_root: shader_root.into(),
            programs: SlotMap::with_key(),
            by_sources: HashMap::new(),
            watched_stamp: None,
        }
    }

    /// Directory sources are read from
    pub fn shader_root(&self) -> &Path {
        &self.shader_root
    }

    /// Get the program for a source pair, building it on first use
    pub fn get(
        &mut self,
        device: &mut dyn GraphicsDevice,
        assets: &dyn AssetSource,
        vertex: &str,
        fragment: &str,
    ) -> RenderResult<ShaderId> {
        let key = (vertex.to_string(), fragment.to_string());
        if let Some(&id) = self.by_sources.get(&key) {
            return Ok(id);
        }

        let mut shader = ShaderProgram {
            name: format!("{vertex}+{fragment}"),
            vertex_path: self.shader_root.join(vertex),
            fragment_path: self.shader_root.join(fragment),
            program: ProgramHandle(0),
            built_from: None,
        };
        let (program, built_from) = build(device, assets, &shader)?;
        shader.program = program;
        shader.built_from = built_from;
        log::debug!("Built shader {} as {:?}", shader.name, program);

        let id = self.programs.insert(shader);
        self.by_sources.insert(key, id);
        Ok(id)
    }

    /// Look up a cached program
    pub fn shader(&self, id: ShaderId) -> RenderResult<&ShaderProgram> {
        self.programs.get(id).ok_or_else(|| RenderError::InvalidHandle {
            kind: "shader",
            id: format!("{id:?}"),
        })
    }

    /// Device program currently behind `id`
    pub fn program(&self, id: ShaderId) -> RenderResult<ProgramHandle> {
        self.shader(id).map(ShaderProgram::program)
    }

    /// Rebuild programs in place
    ///
    /// A full reload rebuilds every program. Otherwise only programs whose
    /// sources changed since they were last built are rebuilt. A program that
    /// fails to build keeps running its previous version; the first failure
    /// is returned after all were tried. Returns how many were rebuilt.
    pub fn reload(&mut self, device: &mut dyn GraphicsDevice, assets: &dyn AssetSource, full: bool) -> RenderResult<usize> {
        let mut rebuilt = 0;
        let mut first_error = None;

        for shader in self.programs.values_mut() {
            if !full {
                let current = shader.sources_modified(assets);
                if current.is_some() && current == shader.built_from {
                    continue;
                }
            }

            match build(device, assets, shader) {
                Ok((program, built_from)) => {
                    device.delete_program(shader.program);
                    log::info!("Reloaded shader {}", shader.name);
                    shader.program = program;
                    shader.built_from = built_from;
                    rebuilt += 1;
                }
                Err(e) => {
                    log::error!("Failed to reload shader {}: {}", shader.name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(rebuilt), Err)
    }

    /// Poll the shader directory and rebuild changed programs
    ///
    /// The first call only records the directory time. Returns whether a
    /// change was seen.
    pub fn reload_if_changed(&mut self, device: &mut dyn GraphicsDevice, assets: &dyn AssetSource) -> RenderResult<bool> {
        let Ok(stamp) = assets.modified(&self.shader_root) else {
            return Ok(false);
        };

        match self.watched_stamp.replace(stamp) {
            Some(previous) if previous != stamp => {
                log::debug!("Shader directory {} changed", self.shader_root.display());
                self.reload(device, assets, false)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Delete every program and forget the cache
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for shader in self.programs.values() {
            device.delete_program(shader.program);
        }
        self.programs.clear();
        self.by_sources.clear();
    }

    /// Number of cached programs
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn build(
    device: &mut dyn GraphicsDevice,
    assets: &dyn AssetSource,
    shader: &ShaderProgram,
) -> RenderResult<(ProgramHandle, Option<SystemTime>)> {
    let built_from = shader.sources_modified(assets);
    let vertex = assets.read_to_string(&shader.vertex_path)?;
    let fragment = assets.read_to_string(&shader.fragment_path)?;
    let program = device.create_program(&shader.name, &vertex, &fragment)?;
    Ok((program, built_from))
}
