use anyhow::Context as _;
use skyroom_app::{AppContext, Camera, Controller, KeyCode, SkyroomApp};
use skyroom_renderer::geometry::primitives;
use skyroom_renderer::scene::{Room, RoomDesc, RoomTexturePaths, RoomTextures, Skybox, SkyboxDesc};
use skyroom_renderer::{Frame, Mesh};

use crate::config::SceneConfig;

/// Side of the unit cube shared by the skybox and the cubemap capture.
const SKY_CUBE_SIZE: f32 = 2.0;

pub struct Viewer {
    scene: SceneConfig,
    camera: Camera,
    controller: Controller,
    skybox: Option<Skybox<'static>>,
    room: Option<Room>,
}

impl Viewer {
    pub fn new(scene: SceneConfig) -> Self {
        let camera = scene.camera.camera(1.0);
        let mut controller = Controller::with_default_wasd();
        controller.speed = scene.camera.speed;
        controller.mouse_sensitivity = scene.camera.sensitivity;
        Self {
            scene,
            camera,
            controller,
            skybox: None,
            room: None,
        }
    }
}

impl SkyroomApp for Viewer {
    fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        let aspect = ctx.aspect();
        let renderer = ctx.renderer().context("renderer not available during setup")?;
        let format = renderer.format();
        let shader_dir = self.scene.shader_dir.as_deref();

        // lives as long as the process, like the skybox that borrows it
        let cube: &'static Mesh = Box::leak(Box::new(primitives::cube(&renderer.context.device, SKY_CUBE_SIZE)));
        let restore = renderer.full_viewport();
        let skybox = Skybox::new(
            &renderer.context,
            &mut renderer.state,
            cube,
            &SkyboxDesc {
                hdr_path: &self.scene.hdr,
                cube_size: self.scene.cubemap_size,
                restore,
                color_format: format,
                shader_dir,
            },
        )
        .context("failed to build the skybox")?;

        let textures = RoomTextures::load(
            &renderer.context,
            &RoomTexturePaths::from(&self.scene.textures),
            self.scene.cut_window,
        );
        let room = Room::new(
            &renderer.context,
            &RoomDesc {
                size: self.scene.room_size(),
                cut_window: self.scene.cut_window,
                color_format: format,
                shader_dir,
            },
            textures,
        )
        .context("failed to build the room")?;

        self.skybox = Some(skybox);
        self.room = Some(room);
        self.camera.set_aspect(aspect);
        log::info!("Scene ready");
        Ok(())
    }

    fn update(&mut self, ctx: &mut AppContext) {
        if ctx.input.just_pressed(KeyCode::Escape) {
            ctx.request_exit();
            return;
        }
        self.controller.apply(&mut self.camera, ctx.input, ctx.time.delta);
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        if let Some(skybox) = &mut self.skybox {
            skybox.draw(frame, &self.camera);
        }
        if let Some(room) = &mut self.room {
            room.draw(frame, &self.camera);
        }
    }

    fn on_resize(&mut self, new_size: (u32, u32), ctx: &mut AppContext) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.camera.set_aspect(ctx.aspect());
        }
    }
}
