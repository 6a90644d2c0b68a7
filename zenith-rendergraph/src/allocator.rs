//! Swapchain-relative textures backing managed graphics outputs.

use zenith_core::collections::hashmap::{Entry, HashMap};
use zenith_core::log::{debug, warn};
use zenith_rhi::{Extent2D, Extent3D, TextureDesc, TextureDimension, TextureUsage};
use crate::container::TaskContainer;

/// Texture descriptions for every managed output, one per output name.
///
/// Usage flags are the union over every declaration of the name in any task, so an internal
/// target can also be sampled, stored to or copied from.
pub(crate) fn plan_internal_textures(tasks: &TaskContainer, swapchain: Extent2D) -> Vec<TextureDesc> {
    let mut index_of: HashMap<&str, usize> = HashMap::default();
    let mut descs: Vec<TextureDesc> = Vec::new();

    for (_, _, task) in tasks.iter() {
        for output in task.outputs() {
            let Some(extent) = output.size_class.extent(swapchain) else {
                continue;
            };

            match index_of.entry(output.name.as_str()) {
                Entry::Occupied(entry) => {
                    let desc = &descs[*entry.get()];
                    if desc.format != output.format {
                        warn!(
                            "Internal resource [{}] declared with {:?} and {:?}, keeping the first format!",
                            output.name, desc.format, output.format
                        );
                    }
                }
                Entry::Vacant(entry) => {
                    let dimension = output.ty.texture_dimension();
                    let extent = match dimension {
                        TextureDimension::D1 => Extent3D { width: extent.width, height: 1, depth: 1 },
                        _ => extent.into(),
                    };

                    entry.insert(descs.len());
                    descs.push(TextureDesc {
                        name: output.name.clone(),
                        format: output.format,
                        extent,
                        usage: output.ty.texture_usage(),
                        dimension,
                        ..Default::default()
                    });
                }
            }
        }
    }

    for (_, _, task) in tasks.iter() {
        for input in task.inputs() {
            if let Some(index) = index_of.get(input.name.as_str()) {
                descs[*index].usage |= input.ty.texture_usage();
            }
        }
    }

    for desc in &mut descs {
        if !desc.usage.contains(TextureUsage::DepthStencilAttachment) {
            desc.usage |= TextureUsage::TransferSrc;
        }
        debug!(
            "Internal resource [{}] planned {}x{} {:?}",
            desc.name, desc.extent.width, desc.extent.height, desc.format
        );
    }

    descs
}
