//! Vulkan instance and surface
//!
//! [`VulkanContext`] loads the Vulkan entry points, creates the instance
//! with the extensions GLFW asks for, and owns the window surface. Debug
//! builds enable the Khronos validation layer and route its messages into
//! the `log` facade.

use std::ffi::{CStr, CString};

#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Surface;
use ash::{vk, Entry, Instance};

use crate::render::vulkan::{VulkanError, VulkanResult};
use crate::window::Window;

#[cfg(debug_assertions)]
const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Owns the instance, the surface and the debug messenger
pub struct VulkanContext {
    entry: Entry,
    instance: Instance,
    #[cfg(debug_assertions)]
    debug_utils: Option<DebugUtils>,
    #[cfg(debug_assertions)]
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    surface_loader: Surface,
    surface: vk::SurfaceKHR,
}

impl VulkanContext {
    /// Creates the instance and a surface for `window`.
    pub fn new(window: &mut Window, app_name: &str) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|err| {
            VulkanError::InitializationFailed(format!("failed to load Vulkan: {err}"))
        })?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("app name contains NUL".into()))?;
        let engine_name = CStr::from_bytes_with_nul(b"ember\0")
            .map_err(|_| VulkanError::InitializationFailed("bad engine name".into()))?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let required = window.get_required_instance_extensions().map_err(|err| {
            VulkanError::InitializationFailed(format!("required extensions: {err}"))
        })?;
        let extension_names: Vec<CString> = required
            .iter()
            .map(|name| {
                CString::new(name.as_str()).map_err(|_| {
                    VulkanError::InitializationFailed(format!("extension name '{name}'"))
                })
            })
            .collect::<VulkanResult<_>>()?;
        #[allow(unused_mut)]
        let mut extensions: Vec<*const i8> =
            extension_names.iter().map(|name| name.as_ptr()).collect();

        #[cfg(debug_assertions)]
        let validation = Self::validation_available(&entry);
        #[cfg(debug_assertions)]
        if validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        #[cfg(debug_assertions)]
        let layer_names: Vec<CString> = if validation {
            vec![CString::new(VALIDATION_LAYER).map_err(|_| {
                VulkanError::InitializationFailed("bad validation layer name".into())
            })?]
        } else {
            Vec::new()
        };
        #[cfg(not(debug_assertions))]
        let layer_names: Vec<CString> = Vec::new();
        let layer_ptrs: Vec<*const i8> = layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(VulkanError::Api)?;

        #[cfg(debug_assertions)]
        let (debug_utils, debug_messenger) = if validation {
            let utils = DebugUtils::new(&entry, &instance);
            let messenger = create_debug_messenger(&utils)?;
            (Some(utils), Some(messenger))
        } else {
            log::debug!("validation layer unavailable, continuing without it");
            (None, None)
        };

        let surface_loader = Surface::new(&entry, &instance);
        let surface = window.create_vulkan_surface(instance.handle()).map_err(|err| {
            VulkanError::InitializationFailed(format!("surface creation: {err}"))
        })?;

        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            debug_utils,
            #[cfg(debug_assertions)]
            debug_messenger,
            surface_loader,
            surface,
        })
    }

    #[cfg(debug_assertions)]
    fn validation_available(entry: &Entry) -> bool {
        let Ok(layers) = entry.enumerate_instance_layer_properties() else {
            return false;
        };
        layers.iter().any(|layer| {
            let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            name.to_str().map(|n| n == VALIDATION_LAYER).unwrap_or(false)
        })
    }

    /// Loaded Vulkan entry points
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The instance handle wrapper
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// The window surface
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// The surface extension loader
    pub fn surface_loader(&self) -> &Surface {
        &self.surface_loader
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let (Some(utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger) {
                utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
    }
}

#[cfg(debug_assertions)]
fn create_debug_messenger(utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    unsafe { utils.create_debug_utils_messenger(&create_info, None) }.map_err(VulkanError::Api)
}

#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() {
        std::borrow::Cow::from("<no message>")
    } else {
        CStr::from_ptr((*callback_data).p_message).to_string_lossy()
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[vulkan {message_type:?}] {message}");
    } else {
        log::warn!("[vulkan {message_type:?}] {message}");
    }

    vk::FALSE
}
