// retro-skeleton-rs/src/video/mod.rs

//! Backend de renderização
//!
//! O core só precisa de três recursos do backend: uma janela (oculta, usada
//! para depuração), um contexto de renderização e uma textura de streaming
//! onde o quadro é escrito antes de ser entregue ao frontend.
//!
//! Toda chamada do backend devolve um [`BackendResult`]; quem decide o que
//! fazer com a falha é o core.

pub mod frame;
pub mod software;
#[cfg(feature = "minifb")]
pub mod window;

pub use frame::FrameBuffer;
pub use software::SoftwareBackend;
#[cfg(feature = "minifb")]
pub use window::MinifbBackend;

use bitflags::bitflags;
use log::warn;
use thiserror::Error;

/// Erros do backend de vídeo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("subsistema de vídeo indisponível: {0}")]
    SubsystemUnavailable(String),
    #[error("falha ao criar janela: {0}")]
    WindowCreation(String),
    #[error("falha ao criar renderer: {0}")]
    RendererCreation(String),
    #[error("falha ao criar textura: {0}")]
    TextureCreation(String),
    #[error("handle inválido: {0:?}")]
    InvalidHandle(Handle),
    #[error("textura {0:?} já está travada")]
    AlreadyLocked(TextureId),
    #[error("textura {0:?} não está travada")]
    NotLocked(TextureId),
    #[error("falha ao travar textura: {0}")]
    LockFailed(String),
    #[error("buffer de pixels desalinhado (pitch {pitch})")]
    Misaligned { pitch: usize },
    #[error("buffer de {len} bytes pequeno demais para {width}x{height} com pitch {pitch}")]
    OutOfBounds { len: usize, width: usize, height: usize, pitch: usize },
    #[error("falha ao apresentar quadro: {0}")]
    PresentFailed(String),
    #[error("operação não suportada: {0}")]
    Unsupported(&'static str),
}

/// Tipo de resultado para operações do backend
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Qualquer handle do backend (usado nas mensagens de erro)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Window(WindowId),
    Renderer(RendererId),
    Texture(TextureId),
}

bitflags! {
    /// Flags de criação de janela
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WindowFlags: u32 {
        const HIDDEN = 1 << 0;
    }
}

bitflags! {
    /// Flags de criação do contexto de renderização
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RendererFlags: u32 {
        const SOFTWARE = 1 << 0;
        const ACCELERATED = 1 << 1;
    }
}

/// Posição da janela na tela
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPos {
    Centered,
    At(i32, i32),
}

/// Formato de pixel de uma textura
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32 bits: alpha, vermelho, verde, azul (byte mais significativo primeiro).
    /// Compatível com XRGB8888 do libretro.
    Argb8888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Argb8888 => 4,
        }
    }
}

/// Modo de acesso à textura
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAccess {
    Static,
    Streaming,
}

/// Cor RGBA de desenho
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const RED: Color = Color::rgba(255, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Empacota em 0xAARRGGBB
    pub const fn to_argb8888(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Retângulo alinhado aos eixos (origem no canto superior esquerdo)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Recorta o retângulo para caber em `width` x `height`
    pub fn clip(&self, width: usize, height: usize) -> Rect {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Rect {
            x,
            y,
            w: (self.x + self.w).min(width) - x,
            h: (self.y + self.h).min(height) - y,
        }
    }
}

/// Interface do backend de vídeo usado pelo core
pub trait VideoBackend {
    /// Inicializa o subsistema de vídeo (idempotente)
    fn init(&mut self) -> BackendResult<()>;

    /// Encerra o subsistema, liberando qualquer recurso restante
    fn quit(&mut self);

    fn create_window(
        &mut self,
        title: &str,
        pos: WindowPos,
        width: usize,
        height: usize,
        flags: WindowFlags,
    ) -> BackendResult<WindowId>;

    fn create_renderer(&mut self, window: WindowId, flags: RendererFlags) -> BackendResult<RendererId>;

    fn create_texture(
        &mut self,
        renderer: RendererId,
        format: PixelFormat,
        access: TextureAccess,
        width: usize,
        height: usize,
    ) -> BackendResult<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);
    fn destroy_renderer(&mut self, renderer: RendererId);
    fn destroy_window(&mut self, window: WindowId);

    /// Trava a textura para escrita direta. Devolve o pitch (bytes por linha).
    fn lock_texture(&mut self, texture: TextureId) -> BackendResult<usize>;

    /// Pixels de uma textura travada
    fn locked_pixels_mut(&mut self, texture: TextureId) -> BackendResult<&mut [u8]>;

    fn unlock_texture(&mut self, texture: TextureId);

    /// Conteúdo atual da textura e seu pitch (leitura, fora do lock)
    fn texture_pixels(&self, texture: TextureId) -> BackendResult<(&[u8], usize)>;

    fn set_draw_color(&mut self, renderer: RendererId, color: Color) -> BackendResult<()>;
    fn clear(&mut self, renderer: RendererId) -> BackendResult<()>;
    fn fill_rect(&mut self, renderer: RendererId, rect: Rect) -> BackendResult<()>;
    fn present(&mut self, renderer: RendererId) -> BackendResult<()>;
}

/// Lock de escopo sobre uma textura de streaming.
///
/// A textura é destravada no `Drop`, inclusive quando o chamador sai cedo
/// por causa de um erro.
pub struct TextureLock<'a, B: VideoBackend + ?Sized> {
    backend: &'a mut B,
    texture: TextureId,
    pitch: usize,
}

impl<'a, B: VideoBackend + ?Sized> TextureLock<'a, B> {
    pub fn acquire(backend: &'a mut B, texture: TextureId) -> BackendResult<Self> {
        let pitch = backend.lock_texture(texture)?;
        Ok(Self { backend, texture, pitch })
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels_mut(&mut self) -> BackendResult<&mut [u8]> {
        self.backend.locked_pixels_mut(self.texture)
    }
}

impl<B: VideoBackend + ?Sized> Drop for TextureLock<'_, B> {
    fn drop(&mut self) {
        self.backend.unlock_texture(self.texture);
    }
}

/// Avisa sobre destruição de handle desconhecido (comum a todos os backends)
pub(crate) fn warn_unknown(handle: Handle) {
    warn!("Tentativa de liberar handle desconhecido: {:?}", handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_packing() {
        assert_eq!(Color::BLACK.to_argb8888(), 0xFF00_0000);
        assert_eq!(Color::RED.to_argb8888(), 0xFFFF_0000);
        assert_eq!(Color::rgba(0x12, 0x34, 0x56, 0x78).to_argb8888(), 0x7812_3456);
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(100, 100, 200, 200);
        assert!(rect.contains(100, 100));
        assert!(rect.contains(299, 299));
        assert!(!rect.contains(300, 150));
        assert!(!rect.contains(150, 300));
        assert!(!rect.contains(99, 150));
    }

    #[test]
    fn test_rect_clip() {
        let rect = Rect::new(600, 450, 100, 100).clip(640, 480);
        assert_eq!(rect, Rect::new(600, 450, 40, 30));

        let outside = Rect::new(700, 10, 10, 10).clip(640, 480);
        assert_eq!(outside.w, 0);
    }

    #[test]
    fn test_texture_lock_unlocks_on_drop() {
        let mut backend = SoftwareBackend::new();
        backend.init().unwrap();
        let window = backend
            .create_window("t", WindowPos::Centered, 8, 8, WindowFlags::HIDDEN)
            .unwrap();
        let renderer = backend.create_renderer(window, RendererFlags::SOFTWARE).unwrap();
        let texture = backend
            .create_texture(renderer, PixelFormat::Argb8888, TextureAccess::Streaming, 8, 8)
            .unwrap();

        {
            let mut lock = TextureLock::acquire(&mut backend, texture).unwrap();
            assert!(lock.pixels_mut().is_ok());
        }
        assert!(!backend.is_locked(texture));

        // Saída antecipada com `?` também destrava
        fn early_exit(backend: &mut SoftwareBackend, texture: TextureId) -> BackendResult<()> {
            let _lock = TextureLock::acquire(backend, texture)?;
            Err(BackendError::Unsupported("saída antecipada"))
        }
        assert!(early_exit(&mut backend, texture).is_err());
        assert!(!backend.is_locked(texture));
    }
}
