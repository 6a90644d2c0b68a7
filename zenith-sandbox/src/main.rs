#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use zenith::core::profile;
use zenith::rendergraph::{
    AttachmentType, BarrierSet, Command, CommandList, CompiledRenderGraph, Executor, OutputAttachment,
    RenderGraph, ResourceFlags, SizeClass, Task,
};
use zenith::rhi::{BufferView, Extent2D, HeadlessDevice, ImageView, RenderDevice, TextureFormat, TextureState};
use zenith::EngineArgs;

/// Prints what a GPU backend would have recorded.
#[derive(Default)]
struct LoggingExecutor {
    barrier_count: usize,
    command_count: usize,
}

impl Executor for LoggingExecutor {
    fn begin_task(&mut self, graph: &CompiledRenderGraph, index: usize) -> anyhow::Result<()> {
        let task = graph.task(index);
        log::debug!("[{index}] begin {:?} task [{}]", task.kind(), task.name());
        Ok(())
    }

    fn record_barriers(&mut self, _graph: &CompiledRenderGraph, index: usize, barriers: &BarrierSet) -> anyhow::Result<()> {
        let (images, buffers) = barriers.to_vk();
        for barrier in &images {
            log::debug!("[{index}]   image {:?} -> {:?}", barrier.old_layout, barrier.new_layout);
        }
        for barrier in &buffers {
            log::debug!("[{index}]   buffer {:?} -> {:?}", barrier.src_access_mask, barrier.dst_access_mask);
        }
        self.barrier_count += images.len() + buffers.len();
        Ok(())
    }

    fn record_command(&mut self, _graph: &CompiledRenderGraph, index: usize, command: &Command) -> anyhow::Result<()> {
        log::trace!("[{index}]   {command:?}");
        self.command_count += 1;
        Ok(())
    }

    fn end_task(&mut self, graph: &CompiledRenderGraph, index: usize) -> anyhow::Result<()> {
        log::debug!("[{index}] end task [{}]", graph.task(index).name());
        Ok(())
    }
}

fn record_frame(graph: &mut RenderGraph, extent: Extent2D) {
    graph.add_task(
        Task::compute("cull")
            .read("instances", AttachmentType::DataBufferWO)
            .with_compute_shader("cull.comp")
            .with_commands(CommandList::new().dispatch(64, 1, 1)),
    );
    graph.add_task(
        Task::graphics("gbuffer")
            .read("instances", AttachmentType::DataBufferRO)
            .write(OutputAttachment::color("albedo", TextureFormat::RGBA8UNorm))
            .write(OutputAttachment::depth("depth", TextureFormat::D32Float))
            .with_vertex_shader("gbuffer.vert")
            .with_fragment_shader("gbuffer.frag")
            .with_commands(
                CommandList::new()
                    .viewport(extent.width as f32, extent.height as f32)
                    .draw_indexed(36, 1024),
            ),
    );
    graph.add_task(
        Task::graphics("lighting")
            .read("albedo", AttachmentType::Texture2D)
            .read("depth", AttachmentType::Texture2D)
            .write(OutputAttachment::color("hdr", TextureFormat::RGBA16Float))
            .with_vertex_shader("fullscreen.vert")
            .with_fragment_shader("lighting.frag")
            .with_commands(CommandList::new().draw(3, 1)),
    );
    graph.add_task(
        Task::graphics("bloom")
            .read("hdr", AttachmentType::Texture2D)
            .write(
                OutputAttachment::color("bloom", TextureFormat::RGBA16Float)
                    .with_size_class(SizeClass::HalfSwapchain),
            )
            .with_vertex_shader("fullscreen.vert")
            .with_fragment_shader("bloom.frag")
            .with_commands(CommandList::new().draw(3, 1)),
    );
    graph.add_task(
        Task::graphics("tonemap")
            .read("hdr", AttachmentType::Texture2D)
            .read("bloom", AttachmentType::Texture2D)
            .write(OutputAttachment::color("backbuffer", TextureFormat::BGRA8Srgb).with_size_class(SizeClass::Custom))
            .with_vertex_shader("fullscreen.vert")
            .with_fragment_shader("tonemap.frag")
            .with_callback(|ctx| ctx.record(&Command::Draw {
                vertex_count: 3,
                instance_count: 1,
                first_vertex: 0,
                first_instance: 0,
            })),
    );
}

fn run(args: &EngineArgs) -> anyhow::Result<()> {
    let mut device = HeadlessDevice::new(Extent2D::new(args.width, args.height));
    let mut graph = RenderGraph::new();
    let instances = BufferView::new(1 << 32, 1 << 20);
    let mut backbuffer_state = TextureState::Undefined;

    for frame in 0..args.frames {
        profiling::scope!("frame");

        // shrink the swapchain half way through to exercise reallocation
        if frame == args.frames / 2 && frame > 0 {
            let extent = device.swapchain_extent();
            device.resize(Extent2D::new((extent.width / 2).max(1), (extent.height / 2).max(1)));
        }

        let extent = device.swapchain_extent();
        let backbuffer = ImageView::new(u64::MAX, TextureFormat::BGRA8Srgb, extent.into())
            .with_state(backbuffer_state);

        graph.begin_frame();
        record_frame(&mut graph, extent);
        graph.bind_buffer("instances", instances, ResourceFlags::empty());
        graph.bind_image("backbuffer", backbuffer, ResourceFlags::empty());

        let compiled = graph.compile(&mut device)?;
        let order: Vec<_> = compiled.tasks().map(|task| task.name()).collect();
        log::info!("Frame {frame}: {}x{} order {:?}", extent.width, extent.height, order);

        let mut executor = LoggingExecutor::default();
        compiled.execute(&mut executor)?;
        log::info!(
            "Frame {frame}: {} barriers, {} commands",
            executor.barrier_count, executor.command_count
        );

        if let Some(state) = compiled.final_texture_state("backbuffer") {
            backbuffer_state = state;
        }

        compiled.retire().release_frame_resources(&mut device);
        graph.end_frame(&mut device);
        profile::new_frame();
    }

    log::info!("Done, {} textures still alive", device.live_texture_count());
    Ok(())
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = EngineArgs::parse_args();
    let _server = zenith::initialize(&args).expect("Failed to initialize zenith!");

    run(&args).expect("Failed to run zenith sandbox!");
}
