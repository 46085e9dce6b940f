//! Backend com janela de depuração real via `minifb`.
//!
//! Renderers e texturas continuam no [`SoftwareBackend`]; este backend só
//! acrescenta a janela do sistema. Uma janela criada com `HIDDEN` não é aberta
//! até o primeiro `present`, já que o `minifb` não tem janelas ocultas.

use std::collections::HashMap;

use ::minifb::{Window, WindowOptions};
use log::{debug, info};

use crate::video::{
    BackendError, BackendResult, Color, Handle, PixelFormat, Rect, RendererFlags, RendererId, SoftwareBackend,
    TextureAccess, TextureId, VideoBackend, WindowFlags, WindowId, WindowPos,
};

pub struct MinifbBackend {
    software: SoftwareBackend,
    open: HashMap<WindowId, Window>,
}

// SAFETY: o frontend libretro chama o core sempre da mesma thread; as janelas
// nunca são usadas fora dela, apenas guardadas no estático da camada `libretro`.
unsafe impl Send for MinifbBackend {}

impl Default for MinifbBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MinifbBackend {
    pub fn new() -> Self {
        Self { software: SoftwareBackend::new(), open: HashMap::new() }
    }

    pub fn software(&self) -> &SoftwareBackend {
        &self.software
    }

    /// Se a janela do sistema já foi aberta
    pub fn is_open(&self, window: WindowId) -> bool {
        self.open.contains_key(&window)
    }

    fn open_window(&mut self, window: WindowId, pos: Option<WindowPos>) -> BackendResult<&mut Window> {
        if !self.open.contains_key(&window) {
            let title = self.software.window_title(window).unwrap_or_default().to_owned();
            let (width, height) = self
                .software
                .window_size(window)
                .ok_or(BackendError::InvalidHandle(Handle::Window(window)))?;
            let mut handle = Window::new(&title, width, height, WindowOptions::default())
                .map_err(|e| BackendError::WindowCreation(e.to_string()))?;
            if let Some(WindowPos::At(x, y)) = pos {
                handle.set_position(x as isize, y as isize);
            }
            info!("Janela {:?} aberta: \"{}\" {}x{}", window, title, width, height);
            self.open.insert(window, handle);
        }
        self.open
            .get_mut(&window)
            .ok_or(BackendError::InvalidHandle(Handle::Window(window)))
    }
}

impl VideoBackend for MinifbBackend {
    fn init(&mut self) -> BackendResult<()> {
        self.software.init()
    }

    fn quit(&mut self) {
        if !self.open.is_empty() {
            debug!("Fechando {} janela(s)", self.open.len());
        }
        self.open.clear();
        self.software.quit();
    }

    fn create_window(
        &mut self,
        title: &str,
        pos: WindowPos,
        width: usize,
        height: usize,
        flags: WindowFlags,
    ) -> BackendResult<WindowId> {
        let window = self.software.create_window(title, pos, width, height, flags)?;
        if !flags.contains(WindowFlags::HIDDEN) {
            if let Err(e) = self.open_window(window, Some(pos)) {
                self.software.destroy_window(window);
                return Err(e);
            }
        }
        Ok(window)
    }

    fn create_renderer(&mut self, window: WindowId, flags: RendererFlags) -> BackendResult<RendererId> {
        self.software.create_renderer(window, flags)
    }

    fn create_texture(
        &mut self,
        renderer: RendererId,
        format: PixelFormat,
        access: TextureAccess,
        width: usize,
        height: usize,
    ) -> BackendResult<TextureId> {
        self.software.create_texture(renderer, format, access, width, height)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.software.destroy_texture(texture);
    }

    fn destroy_renderer(&mut self, renderer: RendererId) {
        self.software.destroy_renderer(renderer);
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.open.remove(&window);
        self.software.destroy_window(window);
    }

    fn lock_texture(&mut self, texture: TextureId) -> BackendResult<usize> {
        self.software.lock_texture(texture)
    }

    fn locked_pixels_mut(&mut self, texture: TextureId) -> BackendResult<&mut [u8]> {
        self.software.locked_pixels_mut(texture)
    }

    fn unlock_texture(&mut self, texture: TextureId) {
        self.software.unlock_texture(texture);
    }

    fn texture_pixels(&self, texture: TextureId) -> BackendResult<(&[u8], usize)> {
        self.software.texture_pixels(texture)
    }

    fn set_draw_color(&mut self, renderer: RendererId, color: Color) -> BackendResult<()> {
        self.software.set_draw_color(renderer, color)
    }

    fn clear(&mut self, renderer: RendererId) -> BackendResult<()> {
        self.software.clear(renderer)
    }

    fn fill_rect(&mut self, renderer: RendererId, rect: Rect) -> BackendResult<()> {
        self.software.fill_rect(renderer, rect)
    }

    fn present(&mut self, renderer: RendererId) -> BackendResult<()> {
        self.software.present(renderer)?;
        let window = self
            .software
            .renderer_window(renderer)
            .ok_or(BackendError::InvalidHandle(Handle::Renderer(renderer)))?;
        let (width, height) = self
            .software
            .window_size(window)
            .ok_or(BackendError::InvalidHandle(Handle::Window(window)))?;
        // Superfície copiada antes de emprestar a janela como mutável
        let surface = self.software.window_surface(window).unwrap_or_default().to_vec();
        self.open_window(window, None)?
            .update_with_buffer(&surface, width, height)
            .map_err(|e| BackendError::PresentFailed(e.to_string()))
    }
}
