//! Physics playground demo
//!
//! A stack of cubes falls onto a ground plane, bounces, and settles, lit
//! by a single point light. WASD/QE moves the camera, arrow keys look
//! around, R resets the simulation to its initial state.

mod keyboard_controller;

use std::sync::Arc;

use ash::vk;
use forge_engine::prelude::*;
use forge_engine::render::vulkan::{Buffer, DescriptorPool, DescriptorSetLayout, DescriptorWriter, MAX_FRAMES_IN_FLIGHT};
use keyboard_controller::KeyboardController;

const CONFIG_PATH: &str = "sandbox.toml";

struct SandboxApp {
    config: EngineConfig,
    game_objects: GameObjectStore,
    ubo_buffers: Vec<Buffer>,
    global_sets: Vec<vk::DescriptorSet>,
    mesh_system: MeshRenderSystem,
    point_light_system: PointLightSystem,
    physics: PhysicsSystem,
    _global_pool: DescriptorPool,
    _global_set_layout: DescriptorSetLayout,
    renderer: Renderer,
    context: DeviceContext,
    window: Window,
}

impl SandboxApp {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = EngineConfig::load_or_default(CONFIG_PATH);

        let mut window = Window::new(config.window.width, config.window.height, &config.window.title)?;
        let context = DeviceContext::new(&mut window, &config.window.title)?;
        let renderer = Renderer::new(&context, &mut window)?;

        let global_set_layout = DescriptorSetLayout::builder()
            .add_uniform_buffer(0, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .build(&context)?;

        let global_pool = DescriptorPool::builder()
            .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, MAX_FRAMES_IN_FLIGHT as u32)
            .max_sets(MAX_FRAMES_IN_FLIGHT as u32)
            .build(&context)?;

        let mut ubo_buffers = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut global_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            let buffer = Buffer::new(
                &context,
                std::mem::size_of::<GlobalUbo>() as vk::DeviceSize,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            )?;
            let set = DescriptorWriter::new(&global_set_layout, &global_pool)
                .write_buffer(0, buffer.descriptor_info())
                .build(&context)?;
            ubo_buffers.push(buffer);
            global_sets.push(set);
        }

        let mesh_system = MeshRenderSystem::new(
            &context,
            renderer.render_pass(),
            global_set_layout.handle(),
            &config.shaders.shader_path("mesh.vert.spv"),
            &config.shaders.shader_path("mesh.frag.spv"),
        )?;

        let point_light_system = PointLightSystem::new(
            &context,
            renderer.render_pass(),
            global_set_layout.handle(),
            &config.shaders.shader_path("point_light.vert.spv"),
            &config.shaders.shader_path("point_light.frag.spv"),
        )?;

        let physics = PhysicsSystem::new(config.physics.clone());

        let mut game_objects = GameObjectStore::new();
        Self::load_scene(&context, &mut game_objects)?;
        game_objects.capture_initial_state();

        Ok(Self {
            config,
            game_objects,
            ubo_buffers,
            global_sets,
            mesh_system,
            point_light_system,
            physics,
            _global_pool: global_pool,
            _global_set_layout: global_set_layout,
            renderer,
            context,
            window,
        })
    }

    fn load_scene(context: &DeviceContext, objects: &mut GameObjectStore) -> VulkanResult<()> {
        let cube_mesh = Arc::new(Mesh::new(context, &MeshData::cube())?);

        // Ground slab: purely visual, the physics ground plane sits at its
        // upper face
        let floor = objects.create_object();
        floor.mesh = Some(cube_mesh.clone());
        floor.color = Vec3::new(0.4, 0.4, 0.45);
        floor.transform.translation = Vec3::new(0.0, 0.05, 0.0);
        floor.transform.scale = Vec3::new(8.0, 0.1, 8.0);

        // Falling cubes, slightly offset so they collide on the way down
        let drops = [
            (Vec3::new(-0.3, -5.0, 0.0), Vec3::new(0.9, 0.3, 0.2)),
            (Vec3::new(0.3, -7.0, 0.2), Vec3::new(0.2, 0.7, 0.9)),
            (Vec3::new(0.0, -9.0, -0.2), Vec3::new(0.3, 0.8, 0.3)),
        ];
        for (position, color) in drops {
            let cube = objects.create_object();
            cube.mesh = Some(cube_mesh.clone());
            cube.color = color;
            cube.transform.translation = position;
            cube.transform.scale = Vec3::new(0.8, 0.8, 0.8);
            cube.physics = Some(PhysicsComponent::default());
        }

        let light = objects.create_point_light(1.5, 0.1, Vec3::new(1.0, 1.0, 0.9));
        light.transform.translation = Vec3::new(-1.5, -3.5, -1.5);

        Ok(())
    }

    fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::info!(
            "Starting sandbox: {} objects, gravity {}",
            self.game_objects.len(),
            self.config.physics.gravity
        );

        let controller = KeyboardController::default();
        let mut viewer = TransformComponent {
            translation: Vec3::new(0.0, -2.0, -8.0),
            ..Default::default()
        };
        let mut camera = Camera::default();
        let mut timer = Timer::new();
        let mut reset_held = false;

        while !self.window.should_close() {
            self.window.poll_events();
            timer.update();
            let dt = timer.delta_time();

            // Edge-trigger the reset so holding R resets once
            let reset_pressed = self.window.is_key_pressed(glfw::Key::R);
            if reset_pressed && !reset_held {
                log::info!("Resetting simulation");
                self.game_objects.reset_simulation();
            }
            reset_held = reset_pressed;

            controller.move_in_plane_xz(&self.window, dt, &mut viewer);
            camera.set_view_yxz(viewer.translation, viewer.rotation);
            camera.set_perspective_projection(
                50.0_f32.to_radians(),
                self.renderer.aspect_ratio(),
                0.1,
                100.0,
            );

            if let Some(command_buffer) = self.renderer.begin_frame(&self.context, &mut self.window)? {
                let frame_index = self.renderer.frame_index();

                let mut frame_info = FrameInfo {
                    frame_index,
                    frame_time: dt,
                    command_buffer,
                    camera: &camera,
                    global_descriptor_set: self.global_sets[frame_index],
                    game_objects: &mut self.game_objects,
                };

                self.physics.update(&mut frame_info);

                let ubo = GlobalUbo::from_scene(&camera, frame_info.game_objects);
                self.ubo_buffers[frame_index].write_data(&[ubo])?;

                self.renderer.begin_swapchain_render_pass(command_buffer);
                self.mesh_system.render(&frame_info);
                self.point_light_system.render(&frame_info);
                self.renderer.end_swapchain_render_pass(command_buffer);

                self.renderer.end_frame(&self.context, &mut self.window)?;
            }
        }

        self.context.wait_idle()?;
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let result = SandboxApp::new().and_then(|mut app| app.run());
    if let Err(error) = result {
        log::error!("Fatal: {}", error);
        std::process::exit(1);
    }
}
