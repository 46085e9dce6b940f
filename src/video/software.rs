//! Backend de vídeo em software.
//! Janelas, renderers e texturas vivem inteiramente em memória; a janela de
//! depuração nunca é mostrada, `present` apenas copia o alvo de renderização
//! para a superfície da janela.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::video::{
    warn_unknown, BackendError, BackendResult, Color, Handle, PixelFormat, Rect, RendererFlags, RendererId,
    TextureAccess, TextureId, VideoBackend, WindowFlags, WindowId, WindowPos,
};

/// Alinhamento padrão das linhas de textura, em bytes
pub const DEFAULT_PITCH_ALIGNMENT: usize = 64;

struct Window {
    title: String,
    width: usize,
    height: usize,
    flags: WindowFlags,
    surface: Vec<u32>,
}

struct Renderer {
    window: WindowId,
    draw_color: Color,
    target: Vec<u32>,
    width: usize,
    height: usize,
}

struct Texture {
    renderer: RendererId,
    access: TextureAccess,
    pitch: usize,
    data: Vec<u32>,
    locked: bool,
}

/// Backend de vídeo puramente em memória
pub struct SoftwareBackend {
    initialized: bool,
    pitch_alignment: usize,
    next_id: u32,
    windows: HashMap<WindowId, Window>,
    renderers: HashMap<RendererId, Renderer>,
    textures: HashMap<TextureId, Texture>,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::with_pitch_alignment(DEFAULT_PITCH_ALIGNMENT)
    }

    /// Cria o backend com alinhamento de linha customizado (potência de 2, mínimo 4 bytes)
    pub fn with_pitch_alignment(alignment: usize) -> Self {
        Self {
            initialized: false,
            pitch_alignment: alignment.max(4).next_power_of_two(),
            next_id: 1,
            windows: HashMap::new(),
            renderers: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_locked(&self, texture: TextureId) -> bool {
        self.textures.get(&texture).map_or(false, |t| t.locked)
    }

    /// Superfície da janela (resultado do último `present`)
    pub fn window_surface(&self, window: WindowId) -> Option<&[u32]> {
        self.windows.get(&window).map(|w| w.surface.as_slice())
    }

    pub fn window_title(&self, window: WindowId) -> Option<&str> {
        self.windows.get(&window).map(|w| w.title.as_str())
    }

    pub fn window_flags(&self, window: WindowId) -> Option<WindowFlags> {
        self.windows.get(&window).map(|w| w.flags)
    }

    pub fn window_size(&self, window: WindowId) -> Option<(usize, usize)> {
        self.windows.get(&window).map(|w| (w.width, w.height))
    }

    /// Janela onde o renderer apresenta
    pub fn renderer_window(&self, renderer: RendererId) -> Option<WindowId> {
        self.renderers.get(&renderer).map(|r| r.window)
    }

    /// Quantidade de (janelas, renderers, texturas) vivos
    pub fn live_resources(&self) -> (usize, usize, usize) {
        (self.windows.len(), self.renderers.len(), self.textures.len())
    }

    fn ensure_initialized(&self) -> BackendResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(BackendError::SubsystemUnavailable("subsistema de vídeo não inicializado".into()))
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn renderer_mut(&mut self, renderer: RendererId) -> BackendResult<&mut Renderer> {
        self.renderers
            .get_mut(&renderer)
            .ok_or(BackendError::InvalidHandle(Handle::Renderer(renderer)))
    }

    fn align_pitch(&self, row_bytes: usize) -> usize {
        let mask = self.pitch_alignment - 1;
        (row_bytes + mask) & !mask
    }
}

impl VideoBackend for SoftwareBackend {
    fn init(&mut self) -> BackendResult<()> {
        if !self.initialized {
            debug!("Subsistema de vídeo em software inicializado");
            self.initialized = true;
        }
        Ok(())
    }

    fn quit(&mut self) {
        if !self.initialized {
            return;
        }
        let (windows, renderers, textures) = self.live_resources();
        if windows + renderers + textures > 0 {
            warn!(
                "Encerrando vídeo com recursos vivos: {} janela(s), {} renderer(s), {} textura(s)",
                windows, renderers, textures
            );
        }
        self.textures.clear();
        self.renderers.clear();
        self.windows.clear();
        self.initialized = false;
        debug!("Subsistema de vídeo em software encerrado");
    }

    fn create_window(
        &mut self,
        title: &str,
        pos: WindowPos,
        width: usize,
        height: usize,
        flags: WindowFlags,
    ) -> BackendResult<WindowId> {
        self.ensure_initialized()?;
        if width == 0 || height == 0 {
            return Err(BackendError::WindowCreation(format!("dimensões inválidas {}x{}", width, height)));
        }
        let id = WindowId(self.next_id());
        info!("Janela {:?} criada: \"{}\" {}x{} em {:?} ({:?})", id, title, width, height, pos, flags);
        self.windows.insert(
            id,
            Window {
                title: title.to_owned(),
                width,
                height,
                flags,
                surface: vec![0; width * height],
            },
        );
        Ok(id)
    }

    fn create_renderer(&mut self, window: WindowId, flags: RendererFlags) -> BackendResult<RendererId> {
        self.ensure_initialized()?;
        if flags.contains(RendererFlags::ACCELERATED) {
            return Err(BackendError::RendererCreation("aceleração por hardware não suportada".into()));
        }
        let (width, height) = match self.windows.get(&window) {
            Some(w) => (w.width, w.height),
            None => return Err(BackendError::InvalidHandle(Handle::Window(window))),
        };
        let id = RendererId(self.next_id());
        debug!("Renderer {:?} criado para janela {:?} ({:?})", id, window, flags);
        self.renderers.insert(
            id,
            Renderer {
                window,
                draw_color: Color::BLACK,
                target: vec![0; width * height],
                width,
                height,
            },
        );
        Ok(id)
    }

    fn create_texture(
        &mut self,
        renderer: RendererId,
        format: PixelFormat,
        access: TextureAccess,
        width: usize,
        height: usize,
    ) -> BackendResult<TextureId> {
        self.ensure_initialized()?;
        if !self.renderers.contains_key(&renderer) {
            return Err(BackendError::InvalidHandle(Handle::Renderer(renderer)));
        }
        if width == 0 || height == 0 {
            return Err(BackendError::TextureCreation(format!("dimensões inválidas {}x{}", width, height)));
        }
        let pitch = self.align_pitch(width * format.bytes_per_pixel());
        let id = TextureId(self.next_id());
        debug!("Textura {:?} criada: {}x{} {:?} {:?}, pitch {}", id, width, height, format, access, pitch);
        self.textures.insert(
            id,
            Texture {
                renderer,
                access,
                pitch,
                data: vec![0; pitch / 4 * height],
                locked: false,
            },
        );
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            warn_unknown(Handle::Texture(texture));
        }
    }

    fn destroy_renderer(&mut self, renderer: RendererId) {
        if self.renderers.remove(&renderer).is_none() {
            warn_unknown(Handle::Renderer(renderer));
            return;
        }
        // Texturas pertencem ao renderer que as criou
        self.textures.retain(|id, t| {
            let orphan = t.renderer == renderer;
            if orphan {
                debug!("Textura {:?} liberada junto com o renderer {:?}", id, renderer);
            }
            !orphan
        });
    }

    fn destroy_window(&mut self, window: WindowId) {
        if self.windows.remove(&window).is_none() {
            warn_unknown(Handle::Window(window));
        }
    }

    fn lock_texture(&mut self, texture: TextureId) -> BackendResult<usize> {
        let tex = self
            .textures
            .get_mut(&texture)
            .ok_or(BackendError::InvalidHandle(Handle::Texture(texture)))?;
        if tex.access != TextureAccess::Streaming {
            return Err(BackendError::LockFailed("textura não é de streaming".into()));
        }
        if tex.locked {
            return Err(BackendError::AlreadyLocked(texture));
        }
        tex.locked = true;
        Ok(tex.pitch)
    }

    fn locked_pixels_mut(&mut self, texture: TextureId) -> BackendResult<&mut [u8]> {
        let tex = self
            .textures
            .get_mut(&texture)
            .ok_or(BackendError::InvalidHandle(Handle::Texture(texture)))?;
        if !tex.locked {
            return Err(BackendError::NotLocked(texture));
        }
        Ok(bytemuck::cast_slice_mut(&mut tex.data))
    }

    fn unlock_texture(&mut self, texture: TextureId) {
        match self.textures.get_mut(&texture) {
            Some(tex) if tex.locked => tex.locked = false,
            Some(_) => warn!("Textura {:?} destravada sem estar travada", texture),
            None => warn_unknown(Handle::Texture(texture)),
        }
    }

    fn texture_pixels(&self, texture: TextureId) -> BackendResult<(&[u8], usize)> {
        let tex = self
            .textures
            .get(&texture)
            .ok_or(BackendError::InvalidHandle(Handle::Texture(texture)))?;
        Ok((bytemuck::cast_slice(&tex.data), tex.pitch))
    }

    fn set_draw_color(&mut self, renderer: RendererId, color: Color) -> BackendResult<()> {
        self.renderer_mut(renderer)?.draw_color = color;
        Ok(())
    }

    fn clear(&mut self, renderer: RendererId) -> BackendResult<()> {
        let r = self.renderer_mut(renderer)?;
        let color = r.draw_color.to_argb8888();
        r.target.fill(color);
        Ok(())
    }

    fn fill_rect(&mut self, renderer: RendererId, rect: Rect) -> BackendResult<()> {
        let r = self.renderer_mut(renderer)?;
        let color = r.draw_color.to_argb8888();
        let rect = rect.clip(r.width, r.height);
        for y in rect.y..rect.y + rect.h {
            let start = y * r.width + rect.x;
            r.target[start..start + rect.w].fill(color);
        }
        Ok(())
    }

    fn present(&mut self, renderer: RendererId) -> BackendResult<()> {
        let r = self
            .renderers
            .get(&renderer)
            .ok_or(BackendError::InvalidHandle(Handle::Renderer(renderer)))?;
        let window = self
            .windows
            .get_mut(&r.window)
            .ok_or(BackendError::InvalidHandle(Handle::Window(r.window)))?;
        window.surface.copy_from_slice(&r.target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::TextureLock;

    fn setup(backend: &mut SoftwareBackend, width: usize, height: usize) -> (WindowId, RendererId, TextureId) {
        backend.init().unwrap();
        let window = backend
            .create_window("teste", WindowPos::Centered, width, height, WindowFlags::HIDDEN)
            .unwrap();
        let renderer = backend.create_renderer(window, RendererFlags::SOFTWARE).unwrap();
        let texture = backend
            .create_texture(renderer, PixelFormat::Argb8888, TextureAccess::Streaming, width, height)
            .unwrap();
        (window, renderer, texture)
    }

    #[test]
    fn test_requires_init() {
        let mut backend = SoftwareBackend::new();
        let err = backend
            .create_window("x", WindowPos::Centered, 640, 480, WindowFlags::HIDDEN)
            .unwrap_err();
        assert!(matches!(err, BackendError::SubsystemUnavailable(_)));
    }

    #[test]
    fn test_pitch_alignment() {
        let mut backend = SoftwareBackend::new();
        let (_, _, texture) = setup(&mut backend, 640, 480);
        let (pixels, pitch) = backend.texture_pixels(texture).unwrap();
        assert_eq!(pitch, 2560);
        assert_eq!(pixels.len(), 2560 * 480);

        let mut backend = SoftwareBackend::with_pitch_alignment(1024);
        let (_, _, texture) = setup(&mut backend, 640, 480);
        let (pixels, pitch) = backend.texture_pixels(texture).unwrap();
        assert_eq!(pitch, 3072);
        assert_eq!(pixels.len(), 3072 * 480);

        // Alinhamento inválido é arredondado para potência de 2
        let mut backend = SoftwareBackend::with_pitch_alignment(3);
        let (_, _, texture) = setup(&mut backend, 3, 1);
        assert_eq!(backend.texture_pixels(texture).unwrap().1, 12);
    }

    #[test]
    fn test_lock_states() {
        let mut backend = SoftwareBackend::new();
        let (_, _, texture) = setup(&mut backend, 16, 16);

        assert!(matches!(backend.locked_pixels_mut(texture), Err(BackendError::NotLocked(_))));
        assert_eq!(backend.lock_texture(texture).unwrap(), 64);
        assert!(matches!(backend.lock_texture(texture), Err(BackendError::AlreadyLocked(_))));
        assert_eq!(backend.locked_pixels_mut(texture).unwrap().len(), 64 * 16);
        backend.unlock_texture(texture);
        assert!(!backend.is_locked(texture));
    }

    #[test]
    fn test_static_texture_cannot_lock() {
        let mut backend = SoftwareBackend::new();
        let (_, renderer, _) = setup(&mut backend, 4, 4);
        let texture = backend
            .create_texture(renderer, PixelFormat::Argb8888, TextureAccess::Static, 4, 4)
            .unwrap();
        assert!(matches!(backend.lock_texture(texture), Err(BackendError::LockFailed(_))));
    }

    #[test]
    fn test_accelerated_renderer_unsupported() {
        let mut backend = SoftwareBackend::new();
        backend.init().unwrap();
        let window = backend
            .create_window("x", WindowPos::At(0, 0), 4, 4, WindowFlags::HIDDEN)
            .unwrap();
        assert!(matches!(
            backend.create_renderer(window, RendererFlags::ACCELERATED),
            Err(BackendError::RendererCreation(_))
        ));
        assert!(matches!(
            backend.create_renderer(WindowId(999), RendererFlags::SOFTWARE),
            Err(BackendError::InvalidHandle(Handle::Window(WindowId(999))))
        ));
    }

    #[test]
    fn test_draw_and_present() {
        let mut backend = SoftwareBackend::new();
        let (window, renderer, _) = setup(&mut backend, 8, 8);

        backend.set_draw_color(renderer, Color::BLACK).unwrap();
        backend.clear(renderer).unwrap();
        backend.set_draw_color(renderer, Color::RED).unwrap();
        backend.fill_rect(renderer, Rect::new(2, 2, 3, 3)).unwrap();

        // Nada chega na janela antes do present
        assert!(backend.window_surface(window).unwrap().iter().all(|&p| p == 0));
        backend.present(renderer).unwrap();

        let surface = backend.window_surface(window).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let expected = if (2..5).contains(&x) && (2..5).contains(&y) { 0xFFFF_0000 } else { 0xFF00_0000 };
                assert_eq!(surface[y * 8 + x], expected);
            }
        }
    }

    #[test]
    fn test_destroy_renderer_releases_textures() {
        let mut backend = SoftwareBackend::new();
        let (_, renderer, texture) = setup(&mut backend, 4, 4);
        backend.destroy_renderer(renderer);
        assert_eq!(backend.live_resources(), (1, 0, 0));
        assert!(backend.texture_pixels(texture).is_err());
    }

    #[test]
    fn test_quit_releases_everything() {
        let mut backend = SoftwareBackend::new();
        setup(&mut backend, 4, 4);
        backend.quit();
        assert!(!backend.is_initialized());
        assert_eq!(backend.live_resources(), (0, 0, 0));
        // Idempotente
        backend.quit();
    }

    #[test]
    fn test_guarded_write_is_visible_after_unlock() {
        let mut backend = SoftwareBackend::new();
        let (_, _, texture) = setup(&mut backend, 2, 2);
        {
            let mut lock = TextureLock::acquire(&mut backend, texture).unwrap();
            lock.pixels_mut().unwrap()[..4].copy_from_slice(&0xFFFF_0000u32.to_ne_bytes());
        }
        let (pixels, pitch) = backend.texture_pixels(texture).unwrap();
        assert_eq!(crate::video::frame::read_pixel(pixels, pitch, 0, 0), Some(0xFFFF_0000));
    }
}
