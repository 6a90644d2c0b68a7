use derive_builder::Builder;

/// Tunables of render graph compilation.
#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct RenderGraphConfig {
    /// Score added to a candidate of the same kind as the previously scheduled task.
    #[builder(default = "30")]
    pub same_kind_bonus: u32,
    /// Score added per dependency edge a candidate unblocks.
    #[builder(default = "10")]
    pub fan_out_weight: u32,
    #[builder(default = "true")]
    pub validate_cycles: bool,
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        Self {
            same_kind_bonus: 30,
            fan_out_weight: 10,
            validate_cycles: true,
        }
    }
}
