use derive_more::From;
use enumflags2::{bitflags, BitFlags};
use zenith_core::collections::SmallVec;
use zenith_rhi::{BufferView, ImageView, Sampler, ShaderResourceSet};
use crate::attachment::AttachmentType;
use crate::container::TaskContainer;
use crate::symbol::{ResourceName, SymbolTable};
use crate::task::{TaskDirty, TaskDirtyFlags, TaskId};

#[bitflags]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceFlag {
    /// The application synchronizes this resource itself.
    ManualBarriers = 1 << 0,
}

pub type ResourceFlags = BitFlags<ResourceFlag>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Generic,
    Vertex,
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferBinding {
    pub view: BufferView,
    pub kind: BufferKind,
}

#[derive(Clone, Debug, PartialEq, From)]
pub enum ResourceBinding {
    Image(ImageView),
    ImageArray(Vec<ImageView>),
    Buffer(BufferBinding),
    Sampler(Sampler),
    ShaderResourceSet(ShaderResourceSet),
}

impl ResourceBinding {
    /// Whether the graph synthesizes barriers for this binding.
    pub fn tracks_state(&self) -> bool {
        matches!(
            self,
            ResourceBinding::Image(_) | ResourceBinding::ImageArray(_) | ResourceBinding::Buffer(_)
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceBinding::Image(_) => "image",
            ResourceBinding::ImageArray(_) => "image array",
            ResourceBinding::Buffer(_) => "buffer",
            ResourceBinding::Sampler(_) => "sampler",
            ResourceBinding::ShaderResourceSet(_) => "shader resource set",
        }
    }
}

/// One declaration of a resource by a task, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceUsage {
    pub attachment: AttachmentType,
    pub task_index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ResourceInfo {
    binding: Option<ResourceBinding>,
    flags: ResourceFlags,
    usages: SmallVec<[ResourceUsage; 8]>,
    generation: u32,
}

impl ResourceInfo {
    #[inline]
    pub fn binding(&self) -> Option<&ResourceBinding> {
        self.binding.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> ResourceFlags {
        self.flags
    }

    #[inline]
    pub fn usages(&self) -> &[ResourceUsage] {
        &self.usages
    }

    /// Bumped every time the slot is (re)bound.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// Name to binding slot table of one render graph.
#[derive(Clone, Default)]
pub struct ResourceBindingTable {
    symbols: SymbolTable,
    slots: Vec<ResourceInfo>,
}

impl ResourceBindingTable {
    pub(crate) fn intern(&mut self, name: &str) -> ResourceName {
        let id = self.symbols.intern(name);
        if self.slots.len() <= id.index() {
            self.slots.resize_with(id.index() + 1, ResourceInfo::default);
        }
        id
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<ResourceName> {
        self.symbols.lookup(name)
    }

    #[inline]
    pub fn name_of(&self, id: ResourceName) -> &str {
        self.symbols.name_of(id)
    }

    #[inline]
    pub fn info(&self, id: ResourceName) -> &ResourceInfo {
        self.slots.get(id.index()).expect("Graph resource id out of bound!")
    }

    pub fn info_by_name(&self, name: &str) -> Option<&ResourceInfo> {
        self.lookup(name).map(|id| self.info(id))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.info_by_name(name).is_some_and(ResourceInfo::is_bound)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceName, &ResourceInfo)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, info)| (ResourceName::from_index(index), info))
    }

    /// Bind `binding` under `name`, dropping the usage history of any previous binding.
    pub(crate) fn bind(&mut self, name: &str, binding: ResourceBinding, flags: ResourceFlags) -> ResourceName {
        let id = self.intern(name);
        let slot = &mut self.slots[id.index()];
        slot.binding = Some(binding);
        slot.flags = flags;
        slot.usages.clear();
        slot.generation = slot.generation.wrapping_add(1);
        id
    }

    /// Record every declaration of `resource` in execution order.
    ///
    /// Returns the tasks touching the resource and the state they need to rebuild.
    pub(crate) fn record_usages(
        &mut self,
        resource: ResourceName,
        tasks: &TaskContainer,
    ) -> SmallVec<[(TaskId, TaskDirtyFlags); 8]> {
        let slot = self.slots.get_mut(resource.index()).expect("Graph resource id out of bound!");
        slot.usages.clear();

        let mut touched = SmallVec::new();
        for (position, id, task) in tasks.iter() {
            let mut dirty = TaskDirtyFlags::empty();

            for input in task.inputs().iter().filter(|input| input.resource == resource) {
                slot.usages.push(ResourceUsage { attachment: input.ty, task_index: position });
                dirty |= TaskDirty::Descriptors;
            }
            for output in task.outputs().iter().filter(|output| output.resource == resource) {
                slot.usages.push(ResourceUsage { attachment: output.ty, task_index: position });
                dirty |= TaskDirty::Framebuffer;
            }

            if !dirty.is_empty() {
                touched.push((id, dirty));
            }
        }
        touched
    }

    /// Rebuild the usage history of every bound slot against the current task order.
    pub(crate) fn rescan(&mut self, tasks: &TaskContainer) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_bound() {
                self.record_usages(ResourceName::from_index(index), tasks);
            }
        }
    }

    pub fn image_view(&self, name: &str) -> &ImageView {
        match self.try_image_view(name) {
            Some(view) => view,
            None => panic!("Resource [{name}] is not bound to an image!"),
        }
    }

    pub fn try_image_view(&self, name: &str) -> Option<&ImageView> {
        match self.info_by_name(name)?.binding()? {
            ResourceBinding::Image(view) => Some(view),
            _ => None,
        }
    }

    pub fn image_array_views(&self, name: &str) -> &[ImageView] {
        match self.info_by_name(name).and_then(ResourceInfo::binding) {
            Some(ResourceBinding::ImageArray(views)) => views,
            Some(ResourceBinding::Image(view)) => std::slice::from_ref(view),
            _ => panic!("Resource [{name}] is not bound to an image array!"),
        }
    }

    pub fn buffer(&self, name: &str) -> &BufferBinding {
        match self.try_buffer(name) {
            Some(buffer) => buffer,
            None => panic!("Resource [{name}] is not bound to a buffer!"),
        }
    }

    pub fn try_buffer(&self, name: &str) -> Option<&BufferBinding> {
        match self.info_by_name(name)?.binding()? {
            ResourceBinding::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn sampler(&self, name: &str) -> &Sampler {
        match self.info_by_name(name).and_then(ResourceInfo::binding) {
            Some(ResourceBinding::Sampler(sampler)) => sampler,
            _ => panic!("Resource [{name}] is not bound to a sampler!"),
        }
    }

    pub fn shader_resource_set(&self, name: &str) -> &ShaderResourceSet {
        match self.info_by_name(name).and_then(ResourceInfo::binding) {
            Some(ResourceBinding::ShaderResourceSet(set)) => set,
            _ => panic!("Resource [{name}] is not bound to a shader resource set!"),
        }
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
        self.slots.clear();
    }
}
