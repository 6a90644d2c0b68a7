pub use paste::paste;

macro_rules! module_facade {
    ($name:ident) => {
        $crate::paste!{
            pub mod $name {
                pub use [<zenith_ $name>]::*;
            }
        }
    };
}

module_facade!(core);
module_facade!(rhi);
module_facade!(rendergraph);

pub use zenith_core::cli::EngineArgs;

/// Bring up logging and profiling for an application.
///
/// Hold on to the returned server while profiling data should be streamed.
pub fn initialize(args: &EngineArgs) -> Result<Option<puffin_http::Server>, anyhow::Error> {
    zenith_core::log::initialize(args.log_level.into())?;
    let server = zenith_core::profile::initialize(args.profile)?;

    log::info!("Zenith initialized, swapchain {}x{}", args.width, args.height);
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_modules_reach_member_crates() {
        let mut device = rhi::HeadlessDevice::new(rhi::Extent2D::new(320, 240));
        let mut graph = rendergraph::RenderGraph::new();

        graph.begin_frame();
        graph.add_task(rendergraph::Task::graphics("clear").write(
            rendergraph::OutputAttachment::color("target", rhi::TextureFormat::RGBA8UNorm),
        ));
        let compiled = graph.compile(&mut device).unwrap();
        assert_eq!(compiled.image_view("target").extent.width, 320);

        compiled.retire().release_frame_resources(&mut device);
        graph.end_frame(&mut device);
        assert_eq!(device.live_texture_count(), 0);
    }
}
