//! SPIR-V shader module loading.

use std::ffi::CStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use ash::{vk, Device};

use super::{VulkanError, VulkanResult};

/// Entry point shared by every pipeline stage.
pub const ENTRY_POINT: &CStr = match CStr::from_bytes_with_nul(b"main\0") {
    Ok(name) => name,
    Err(_) => panic!("shader entry point must be nul-terminated"),
};

/// Compiled shader module with RAII cleanup.
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    pub fn from_bytes(device: &Device, bytes: &[u8]) -> VulkanResult<Self> {
        // SPIR-V is a stream of u32 words.
        let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "SPIR-V bytecode is not u32-aligned".to_string(),
            ));
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: device.clone(),
            module,
        })
    }

    pub fn from_file<P: AsRef<Path>>(device: &Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| VulkanError::Shader {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| VulkanError::Shader {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        log::debug!("Loaded shader {} ({} bytes)", path.display(), bytes.len());

        Self::from_bytes(device, &bytes).map_err(|e| match e {
            VulkanError::InitializationFailed(message) => VulkanError::Shader {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn create_stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
