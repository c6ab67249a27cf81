//! Window management using GLFW
//!
//! Cross-platform window creation, event translation and Vulkan surface
//! support. GLFW window events are converted into engine [`Event`]s here so
//! nothing outside this module touches GLFW types.

use thiserror::Error;

use crate::events::{Event, KeyCode, MouseButton};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("GLFW initialization failed")]
    InitializationFailed,

    #[error("window creation failed")]
    CreationFailed,

    #[error("GLFW error: {0}")]
    Glfw(String),
}

pub type WindowResult<T> = Result<T, WindowError>;

impl From<WindowError> for crate::render::RenderError {
    fn from(err: WindowError) -> Self {
        Self::Window(err.to_string())
    }
}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw =
            glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        // Configure for Vulkan (no OpenGL context)
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_scroll_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the GLFW event queue; follow up with [`Window::drain_events`].
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drains pending GLFW events, translated into engine events.
    ///
    /// Events with no engine counterpart (unmapped keys, window moves) are
    /// dropped.
    pub fn drain_events(&mut self) -> Vec<Event> {
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(&event))
            .collect()
    }

    pub fn get_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width as u32, height as u32)
    }

    /// Framebuffer size in pixels, the size the swapchain renders at
    pub fn get_framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }

    /// Width over height of the framebuffer, or 1.0 while minimized
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.get_framebuffer_size();
        if height == 0 {
            return 1.0;
        }
        width as f32 / height as f32
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn get_required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::Glfw("failed to get required extensions".to_string()))
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_vulkan_surface(
        &mut self,
        instance: ash::vk::Instance,
    ) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::Glfw(format!(
                "failed to create Vulkan surface: {result:?}"
            )))
        }
    }
}

fn translate_event(event: &glfw::WindowEvent) -> Option<Event> {
    match *event {
        glfw::WindowEvent::Close => Some(Event::WindowClose),
        glfw::WindowEvent::FramebufferSize(width, height) => Some(Event::WindowResize {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::Key(key, _, action, _) => {
            let key = translate_key(key)?;
            match action {
                glfw::Action::Press => Some(Event::KeyPressed { key, repeat: false }),
                glfw::Action::Repeat => Some(Event::KeyPressed { key, repeat: true }),
                glfw::Action::Release => Some(Event::KeyReleased { key }),
            }
        }
        glfw::WindowEvent::Scroll(dx, dy) => Some(Event::MouseScrolled {
            dx: dx as f32,
            dy: dy as f32,
        }),
        glfw::WindowEvent::MouseButton(button, action, _) => {
            let button = translate_mouse_button(button)?;
            match action {
                glfw::Action::Press => Some(Event::MouseButtonPressed { button }),
                glfw::Action::Release => Some(Event::MouseButtonReleased { button }),
                glfw::Action::Repeat => None,
            }
        }
        glfw::WindowEvent::CursorPos(x, y) => Some(Event::CursorMoved {
            x: x as f32,
            y: y as f32,
        }),
        _ => None,
    }
}

fn translate_key(key: glfw::Key) -> Option<KeyCode> {
    match key {
        glfw::Key::A => Some(KeyCode::A),
        glfw::Key::D => Some(KeyCode::D),
        glfw::Key::E => Some(KeyCode::E),
        glfw::Key::G => Some(KeyCode::G),
        glfw::Key::Q => Some(KeyCode::Q),
        glfw::Key::R => Some(KeyCode::R),
        glfw::Key::S => Some(KeyCode::S),
        glfw::Key::W => Some(KeyCode::W),
        glfw::Key::Up => Some(KeyCode::Up),
        glfw::Key::Down => Some(KeyCode::Down),
        glfw::Key::Left => Some(KeyCode::Left),
        glfw::Key::Right => Some(KeyCode::Right),
        glfw::Key::Space => Some(KeyCode::Space),
        glfw::Key::Escape => Some(KeyCode::Escape),
        _ => None,
    }
}

fn translate_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_events_translate_with_repeat_flag() {
        let pressed = translate_event(&glfw::WindowEvent::Key(
            glfw::Key::W,
            0,
            glfw::Action::Press,
            glfw::Modifiers::empty(),
        ));
        assert_eq!(
            pressed,
            Some(Event::KeyPressed {
                key: KeyCode::W,
                repeat: false
            })
        );

        let repeated = translate_event(&glfw::WindowEvent::Key(
            glfw::Key::G,
            0,
            glfw::Action::Repeat,
            glfw::Modifiers::empty(),
        ));
        assert_eq!(
            repeated,
            Some(Event::KeyPressed {
                key: KeyCode::G,
                repeat: true
            })
        );
    }

    #[test]
    fn test_unmapped_keys_are_dropped() {
        let event = translate_event(&glfw::WindowEvent::Key(
            glfw::Key::F12,
            0,
            glfw::Action::Press,
            glfw::Modifiers::empty(),
        ));
        assert_eq!(event, None);
    }

    #[test]
    fn test_framebuffer_resize_translates_to_window_resize() {
        let event = translate_event(&glfw::WindowEvent::FramebufferSize(1280, 720));
        assert_eq!(
            event,
            Some(Event::WindowResize {
                width: 1280,
                height: 720
            })
        );
    }

    #[test]
    fn test_scroll_and_mouse_buttons_translate() {
        assert_eq!(
            translate_event(&glfw::WindowEvent::Scroll(0.0, -1.0)),
            Some(Event::MouseScrolled { dx: 0.0, dy: -1.0 })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::MouseButton(
                glfw::MouseButton::Button1,
                glfw::Action::Press,
                glfw::Modifiers::empty(),
            )),
            Some(Event::MouseButtonPressed {
                button: MouseButton::Left
            })
        );
    }
}
