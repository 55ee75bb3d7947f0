//! Shader module management.
//!
//! This module creates VkShaderModules from pre-compiled SPIR-V byte
//! buffers. Reading the buffers from disk belongs to the host; the byte
//! content is not parsed here beyond the SPIR-V alignment requirement, so a
//! malformed buffer surfaces as a module-creation failure.
//!
//! Shader modules are transient: the presenter keeps them alive only for the
//! duration of pipeline creation and drops them immediately after.

use std::ffi::CString;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Shader stage type for the fixed two-stage program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader stage
    Vertex,
    /// Fragment shader stage
    Fragment,
}

impl ShaderStage {
    /// Converts the shader stage to Vulkan shader stage flags.
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    /// Returns a human-readable name for the shader stage.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Vulkan shader module wrapper.
pub struct Shader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
    /// Shader stage type.
    stage: ShaderStage,
    /// Entry point function name.
    entry_point: CString,
}

impl Shader {
    /// Creates a shader module from SPIR-V bytes.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `bytes` - The SPIR-V binary data (must be 4-byte aligned in length)
    /// * `stage` - The shader stage
    /// * `entry_point` - The entry point function name (typically "main")
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The byte length is not a multiple of 4 (SPIR-V word size)
    /// - The entry point name contains null bytes
    /// - Shader module creation fails
    pub fn from_spirv_bytes(
        device: Arc<Device>,
        bytes: &[u8],
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            return Err(RhiError::Shader(format!(
                "SPIR-V code must be a non-empty multiple of 4 bytes, got {} bytes",
                bytes.len()
            )));
        }

        let code: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        let entry_point = CString::new(entry_point)
            .map_err(|e| RhiError::Shader(format!("invalid entry point name: {}", e)))?;

        debug!("Created {} shader module ({} bytes)", stage, bytes.len());

        Ok(Self {
            device,
            module,
            stage,
            entry_point,
        })
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Returns the shader stage.
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Creates a pipeline shader stage create info structure.
    ///
    /// The returned structure borrows from this shader and must not outlive
    /// it.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {} shader module", self.stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_stage_to_vk_stage() {
        assert_eq!(
            ShaderStage::Vertex.to_vk_stage(),
            vk::ShaderStageFlags::VERTEX
        );
        assert_eq!(
            ShaderStage::Fragment.to_vk_stage(),
            vk::ShaderStageFlags::FRAGMENT
        );
    }

    #[test]
    fn test_shader_stage_display() {
        assert_eq!(format!("{}", ShaderStage::Vertex), "vertex");
        assert_eq!(format!("{}", ShaderStage::Fragment), "fragment");
    }
}
