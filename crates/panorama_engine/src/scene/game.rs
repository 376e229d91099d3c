//! Game: actor owner and frame scheduler
//!
//! The game owns every actor in a generation-checked arena, the resource
//! managers, the renderer and the injected device, asset source and clock.
//! One frame is input, then update, then draw.
//!
//! # Mutation during iteration
//!
//! Input and update walk a snapshot of the active ids. While an actor's hooks
//! run, the actor is checked out of its slot, so the hooks can take the game
//! by `&mut` and spawn or remove actors freely:
//!
//! - actors added while iterating go to `pending` and are merged into
//!   `active` exactly once, after the update pass and before drawing;
//! - actors marked [`ActorState::Dead`] are reaped after the merge with
//!   swap-and-pop, so `active` order is not preserved across a reap;
//! - removing an actor that is currently checked out unlinks it at once and
//!   destroys it when its hook returns.
//!
//! Destroying an actor releases its device objects and drops it; every actor
//! is destroyed exactly once.

use slotmap::SlotMap;

use crate::application::{AppControl, AppEvent};
use crate::assets::AssetSource;
use crate::core::EngineConfig;
use crate::debug::DebugOverlay;
use crate::engine::EngineResult;
use crate::foundation::math::Vec3;
use crate::foundation::time::{Clock, FrameTimer};
use crate::input::{InputManager, KeyCode};
use crate::render::{
    CameraMatrices, DrawContext, FrameDrawStats, GraphicsDevice, Mesh, MeshData, MeshTexture, Renderer, ShaderId,
    ShaderManager, TextureId, TextureManager,
};
use crate::scene::actor::{Actor, ActorId, ActorState};
use crate::scene::component::FrameInfo;

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    /// Frames simulated
    pub frames: u64,
    /// Actors registered
    pub spawned: u64,
    /// Actors destroyed
    pub destroyed: u64,
    /// Removals of actors that were not registered
    pub missed_removals: u64,
}

/// Arena slot; empty while the actor is checked out or being built
#[derive(Debug)]
struct ActorSlot {
    actor: Option<Actor>,
}

/// Actor owner and frame scheduler
pub struct Game {
    config: EngineConfig,
    actors: SlotMap<ActorId, ActorSlot>,
    active: Vec<ActorId>,
    pending: Vec<ActorId>,
    updating_actors: bool,
    timer: FrameTimer,
    paused: bool,
    camera: Option<ActorId>,
    input: InputManager,
    shaders: ShaderManager,
    textures: TextureManager,
    renderer: Renderer,
    device: Box<dyn GraphicsDevice>,
    assets: Box<dyn AssetSource>,
    clock: Box<dyn Clock>,
    stats: GameStats,
}

impl Game {
    /// Set up an empty game
    pub fn new(
        config: EngineConfig,
        mut device: Box<dyn GraphicsDevice>,
        assets: Box<dyn AssetSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        log::info!("Setting up game");

        let renderer = Renderer::new(device.as_mut(), config.window.width, config.window.height);
        renderer.log_info(device.as_ref());

        let timer = FrameTimer::new(clock.ticks_ms(), config.timing.max_delta_seconds);
        let shaders = ShaderManager::new(config.assets.shader_root());
        let textures = TextureManager::new(config.assets.base_path.clone());

        Self {
            config,
            actors: SlotMap::with_key(),
            active: Vec::new(),
            pending: Vec::new(),
            updating_actors: false,
            timer,
            paused: false,
            camera: None,
            input: InputManager::new(),
            shaders,
            textures,
            renderer,
            device,
            assets,
            clock,
            stats: GameStats::default(),
        }
    }

    // ---------------------------------------------------------------
    // Actor lifecycle
    // ---------------------------------------------------------------

    /// Reserve an id, build an actor for it and register it
    ///
    /// `build` gets the reserved id and the game (for shaders, textures and
    /// meshes). If it fails nothing is registered and the error is returned.
    pub fn spawn<F>(&mut self, build: F) -> EngineResult<ActorId>
    where
        F: FnOnce(ActorId, &mut Self) -> EngineResult<Actor>,
    {
        let id = self.actors.insert(ActorSlot { actor: None });

        let actor = match build(id, self) {
            Ok(actor) => actor,
            Err(e) => {
                self.actors.remove(id);
                log::warn!("Failed to construct actor: {}", e);
                return Err(e);
            }
        };
        debug_assert_eq!(actor.id(), id, "actor built for a different id");

        log::debug!("Spawned actor {} {:?}", actor.name(), id);
        // The reserved slot is not linked yet, so nothing can have removed it
        self.actors[id].actor = Some(actor);
        self.link(id);
        Ok(id)
    }

    /// Register an actor that was previously taken out with [`Game::take_actor`]
    ///
    /// The actor gets a fresh id, which is returned.
    pub fn add_actor(&mut self, mut actor: Actor) -> ActorId {
        let id = self.actors.insert(ActorSlot { actor: None });
        actor.rebind(id);
        log::debug!("Added actor {} {:?}", actor.name(), id);
        self.actors[id].actor = Some(actor);
        self.link(id);
        id
    }

    fn link(&mut self, id: ActorId) {
        self.stats.spawned += 1;
        if self.updating_actors {
            self.pending.push(id);
        } else {
            self.active.push(id);
        }
    }

    /// Unregister an actor and destroy it
    ///
    /// Looks in pending first, then active. Returns false if the actor is not
    /// registered (the miss is logged and counted). Removing an actor whose
    /// hook is running unlinks it at once; it is destroyed when the hook
    /// returns.
    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        let Some(slot) = self.unlink(id) else {
            return false;
        };
        if let Some(actor) = slot.actor {
            self.destroy_actor(actor);
        }
        true
    }

    /// Unregister an actor and hand it back, keeping its device objects
    ///
    /// The caller owns the actor afterwards and must either register it
    /// again with [`Game::add_actor`] or pass it to [`Game::destroy_actor`].
    /// Returns `None` for an actor that is not registered or whose hook is
    /// running; the latter is destroyed when the hook returns.
    #[must_use = "a taken actor holds device objects until it is added back or destroyed"]
    pub fn take_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.unlink(id)?.actor
    }

    fn unlink(&mut self, id: ActorId) -> Option<ActorSlot> {
        if let Some(index) = self.pending.iter().position(|&p| p == id) {
            self.pending.swap_remove(index);
        } else if let Some(index) = self.active.iter().position(|&a| a == id) {
            self.active.swap_remove(index);
        } else {
            self.stats.missed_removals += 1;
            log::warn!("Actor {:?} is not registered", id);
            return None;
        }

        if self.camera == Some(id) {
            self.camera = None;
        }
        self.actors.remove(id)
    }

    /// Release an actor's device objects and drop it
    pub fn destroy_actor(&mut self, actor: Actor) {
        log::debug!("Destroying actor {} {:?}", actor.name(), actor.id());
        actor.release_resources(self.device.as_mut());
        if self.camera == Some(actor.id()) {
            self.camera = None;
        }
        self.stats.destroyed += 1;
    }

    fn checkout(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.get_mut(id)?.actor.take()
    }

    fn put_back(&mut self, id: ActorId, actor: Actor) {
        match self.actors.get_mut(id) {
            Some(slot) => slot.actor = Some(actor),
            None => {
                log::debug!("Actor {} was removed during its own callback", actor.name());
                self.destroy_actor(actor);
            }
        }
    }

    // ---------------------------------------------------------------
    // Frame
    // ---------------------------------------------------------------

    /// Run one frame
    ///
    /// While paused this only re-anchors the frame timer and releases the
    /// mouse.
    pub fn iterate(&mut self, overlay: &mut DebugOverlay) -> EngineResult<AppControl> {
        if self.paused {
            self.timer.reset(self.clock.ticks_ms());
            overlay.relative_mouse = false;
            return Ok(AppControl::Continue);
        }

        if self.config.debug.hot_reload {
            self.shaders.reload_if_changed(self.device.as_mut(), self.assets.as_ref())?;
        }

        overlay.apply(self.device.as_mut());
        self.input();
        let delta = self.update();
        let drawn = self.draw()?;
        overlay.record_frame(delta, drawn, self.camera_position());

        Ok(AppControl::Continue)
    }

    /// Forward this frame's input snapshot to every active actor
    pub fn input(&mut self) {
        let keys = self.input.take_snapshot();

        self.updating_actors = true;
        for id in self.active.clone() {
            if let Some(mut actor) = self.checkout(id) {
                actor.input(&keys, self);
                self.put_back(id, actor);
            }
        }
        self.updating_actors = false;
    }

    /// Update every active actor, merge pending actors, reap dead ones
    ///
    /// Returns the clamped delta in seconds.
    pub fn update(&mut self) -> f32 {
        let delta = self.timer.tick(self.clock.ticks_ms());

        self.updating_actors = true;
        for id in self.active.clone() {
            if let Some(mut actor) = self.checkout(id) {
                actor.update(delta, self);
                self.put_back(id, actor);
            }
        }
        self.updating_actors = false;

        self.merge_pending();
        self.reap_dead();
        self.stats.frames += 1;
        delta
    }

    fn merge_pending(&mut self) {
        if !self.pending.is_empty() {
            log::trace!("Merging {} pending actors", self.pending.len());
            self.active.append(&mut self.pending);
        }
    }

    fn reap_dead(&mut self) {
        let mut index = 0;
        while index < self.active.len() {
            let id = self.active[index];
            let dead = self
                .actors
                .get(id)
                .and_then(|slot| slot.actor.as_ref())
                .is_some_and(|actor| actor.state() == ActorState::Dead);

            if dead {
                self.active.swap_remove(index);
                if let Some(actor) = self.actors.remove(id).and_then(|slot| slot.actor) {
                    self.destroy_actor(actor);
                }
            } else {
                index += 1;
            }
        }
    }

    /// Draw every live mesh through the active camera
    pub fn draw(&mut self) -> EngineResult<FrameDrawStats> {
        let camera = self.camera_matrices();

        let mut drawables = Vec::new();
        for id in &self.active {
            let Some(actor) = self.actors.get(*id).and_then(|slot| slot.actor.as_ref()) else {
                continue;
            };
            if actor.state() == ActorState::Dead {
                continue;
            }
            for component in actor.components() {
                drawables.push((component, actor.transform()));
            }
        }

        let mut ctx = DrawContext {
            device: self.device.as_mut(),
            shaders: &self.shaders,
            textures: &self.textures,
        };
        Ok(self.renderer.draw(&mut ctx, camera, &drawables)?)
    }

    // ---------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------

    /// Handle one platform event
    pub fn event(&mut self, event: &AppEvent, overlay: &mut DebugOverlay) -> EngineResult<AppControl> {
        match *event {
            AppEvent::Quit | AppEvent::WindowCloseRequested => return Ok(AppControl::Quit),
            AppEvent::KeyInput { key, pressed } => {
                self.input.handle_key_input(key, pressed);
                if pressed {
                    return self.handle_hotkey(key, overlay);
                }
            }
            AppEvent::WindowResized { width, height } => {
                self.renderer.set_dimensions(self.device.as_mut(), width, height);
            }
            // Look input only counts while the mouse is captured
            AppEvent::MouseMoved { x, y } if overlay.relative_mouse => self.input.handle_mouse_move(x, y),
            AppEvent::MouseMotion { dx, dy } if overlay.relative_mouse => self.input.handle_mouse_motion(dx, dy),
            AppEvent::MouseMoved { .. } | AppEvent::MouseMotion { .. } => {}
        }
        Ok(AppControl::Continue)
    }

    fn handle_hotkey(&mut self, key: KeyCode, overlay: &mut DebugOverlay) -> EngineResult<AppControl> {
        match key {
            KeyCode::Escape => return Ok(AppControl::Quit),
            KeyCode::F1 => {
                overlay.relative_mouse = !overlay.relative_mouse;
                self.input.reset_cursor();
                log::info!("Relative mouse {}", if overlay.relative_mouse { "on" } else { "off" });
            }
            KeyCode::F2 => {
                if cfg!(debug_assertions) && self.paused {
                    self.paused = false;
                }
                self.reload_resources()?;
            }
            KeyCode::F3 => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
            }
            _ => {}
        }
        Ok(AppControl::Continue)
    }

    /// Reload every texture and rebuild every shader in place
    pub fn reload_resources(&mut self) -> EngineResult<()> {
        let textures = self.textures.reload(self.device.as_mut(), self.assets.as_ref());
        let shaders = self.shaders.reload(self.device.as_mut(), self.assets.as_ref(), true);
        textures?;
        shaders?;
        Ok(())
    }

    /// Stop simulating until resumed
    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("Paused");
        }
        self.paused = true;
    }

    /// Resume simulating
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the simulation is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ---------------------------------------------------------------
    // Camera
    // ---------------------------------------------------------------

    /// Make an actor's camera the active one
    ///
    /// Returns false (and changes nothing) if the actor is not registered or
    /// has no camera component.
    pub fn set_camera(&mut self, id: ActorId) -> bool {
        let has_camera = self
            .actors
            .get(id)
            .and_then(|slot| slot.actor.as_ref())
            .is_some_and(|actor| actor.camera().is_some());
        if has_camera {
            self.camera = Some(id);
        } else {
            log::warn!("set_camera: {:?} has no camera component", id);
        }
        has_camera
    }

    /// Actor whose camera is active
    pub fn camera(&self) -> Option<ActorId> {
        self.camera
    }

    fn camera_actor(&self) -> Option<&Actor> {
        self.camera
            .and_then(|id| self.actor(id))
            .filter(|actor| actor.state() != ActorState::Dead)
    }

    fn camera_matrices(&self) -> Option<CameraMatrices> {
        self.camera_actor()?.camera().map(|camera| camera.matrices())
    }

    fn camera_position(&self) -> Option<Vec3> {
        self.camera_actor().map(Actor::position)
    }

    // ---------------------------------------------------------------
    // Resources
    // ---------------------------------------------------------------

    /// Shader program for a source pair, built on first use
    pub fn shader(&mut self, vertex: &str, fragment: &str) -> EngineResult<ShaderId> {
        Ok(self.shaders.get(self.device.as_mut(), self.assets.as_ref(), vertex, fragment)?)
    }

    /// Texture or cubemap by name, loaded on first use
    pub fn texture(&mut self, name: &str) -> EngineResult<TextureId> {
        Ok(self.textures.get(self.device.as_mut(), self.assets.as_ref(), name)?)
    }

    /// Upload geometry for a mesh component
    pub fn create_mesh(&mut self, data: &MeshData, textures: Vec<MeshTexture>) -> EngineResult<Mesh> {
        Ok(Mesh::new(self.device.as_mut(), data, textures)?)
    }

    /// Shader cache
    pub fn shaders(&self) -> &ShaderManager {
        &self.shaders
    }

    /// Texture cache
    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    /// The graphics device
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// A registered actor, unless its hook is currently running
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)?.actor.as_ref()
    }

    /// Mutable access to a registered actor
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)?.actor.as_mut()
    }

    /// Ids updated this frame, in dispatch order
    pub fn active_ids(&self) -> &[ActorId] {
        &self.active
    }

    /// Ids waiting for the next merge
    pub fn pending_ids(&self) -> &[ActorId] {
        &self.pending
    }

    /// Whether actor hooks are running
    pub fn is_updating(&self) -> bool {
        self.updating_actors
    }

    /// Values components see during update
    pub fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            aspect: self.renderer.aspect(),
        }
    }

    /// Delta handed out by the last update
    pub fn last_delta(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Lifetime counters
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Configuration the game was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Viewport owner
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        log::info!("Quitting game");

        let mut ids: Vec<ActorId> = self.active.drain(..).rev().collect();
        ids.extend(self.pending.drain(..).rev());
        for id in ids {
            if let Some(actor) = self.actors.remove(id).and_then(|slot| slot.actor) {
                self.destroy_actor(actor);
            }
        }

        let leftovers: Vec<Actor> = self.actors.drain().filter_map(|(_, slot)| slot.actor).collect();
        for actor in leftovers {
            self.destroy_actor(actor);
        }

        self.shaders.release_all(self.device.as_mut());
        self.textures.release_all(self.device.as_mut());
    }
}
