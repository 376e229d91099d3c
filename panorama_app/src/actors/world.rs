//! The world: a skybox cube textured with the panorama

use panorama_engine::prelude::*;

/// Vertex shader for the skybox, relative to the shader directory
pub const SKYBOX_VERTEX: &str = "skybox.vert.wgsl";
/// Fragment shader for the skybox
pub const SKYBOX_FRAGMENT: &str = "skybox.frag.wgsl";

/// Keeps the skybox centred on the actor it follows
#[derive(Debug, Clone, Copy, Default)]
pub struct World {
    follow: Option<ActorId>,
}

impl World {
    /// A world that stays centred on `follow`
    pub fn following(follow: ActorId) -> Self {
        Self { follow: Some(follow) }
    }
}

impl ActorBehavior for World {
    fn update(&mut self, actor: &mut Actor, _delta: f32, game: &mut Game) {
        let Some(target) = self.follow else {
            return;
        };
        match game.actor(target) {
            Some(followed) => actor.set_position(followed.position()),
            None => {
                log::debug!("World lost the actor it follows");
                self.follow = None;
            }
        }
    }
}

/// Spawn the skybox for the panorama directory `pano`
///
/// Fails if the shaders or any cubemap face cannot be loaded.
pub fn spawn_world(game: &mut Game, pano: &str, follow: Option<ActorId>) -> EngineResult<ActorId> {
    let texture_name = if pano.ends_with('/') || pano.ends_with(std::path::MAIN_SEPARATOR) {
        pano.to_string()
    } else {
        format!("{pano}/")
    };

    let far = game.config().camera.far;
    let id = game.spawn(|id, game| {
        let shader = game.shader(SKYBOX_VERTEX, SKYBOX_FRAGMENT)?;
        let texture = game.texture(&texture_name)?;
        let mesh = game.create_mesh(
            &MeshData::skybox(),
            vec![MeshTexture::new(texture, TextureRole::Skybox)],
        )?;

        // Half the far plane keeps every corner of the cube inside the frustum
        let half_extent = far * 0.5 / 3.0_f32.sqrt();
        Ok(ActorBuilder::new(id, "world")
            .scale(Vec3::repeat(half_extent))
            .component(ComponentKind::Mesh(MeshComponent::new(mesh, shader)))
            .behavior(follow.map_or_else(World::default, World::following))
            .build())
    })?;

    log::info!("World ready with panorama {}", pano);
    Ok(id)
}
