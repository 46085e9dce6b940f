// retro-skeleton-rs/src/core/mod.rs

//! O core propriamente dito.
//!
//! [`Core`] guarda os callbacks do frontend, o estado `running` e os recursos
//! de vídeo. Não há estado global aqui: a camada `libretro` mantém uma única
//! instância, os testes criam quantas quiserem.
//!
//! Ciclo de vida: Não inicializado -> Rodando -> Não inicializado.

pub mod callbacks;
pub mod info;

pub use callbacks::Callbacks;
pub use info::{AvInfo, SystemInfo, AV_INFO, SYSTEM_INFO};

use std::fmt;

use cfg_if::cfg_if;
use libc::{c_uint, c_void};
use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::libretro::sys::{
    AudioSampleBatchCallback, AudioSampleCallback, EnvironmentCallback, GameInfo, InputPollCallback,
    InputStateCallback, VideoRefreshCallback, ENVIRONMENT_SET_PIXEL_FORMAT, ENVIRONMENT_SET_SUPPORT_NO_GAME,
    PIXEL_FORMAT_XRGB8888, REGION_NTSC,
};
use crate::video::{
    BackendError, BackendResult, Color, FrameBuffer, PixelFormat, Rect, RendererFlags, RendererId,
    TextureAccess, TextureId, TextureLock, VideoBackend, WindowFlags, WindowId, WindowPos,
};

/// Largura fixa da tela
pub const SCREEN_WIDTH: usize = 640;

/// Altura fixa da tela
pub const SCREEN_HEIGHT: usize = 480;

pub const ASPECT_RATIO: f32 = 4.0 / 3.0;
pub const FPS: f64 = 60.0;

/// Taxa nominal; nenhum áudio é produzido
pub const SAMPLE_RATE: f64 = 44100.0;

/// Título da janela de depuração
pub const WINDOW_TITLE: &str = "My Libretro Core";

/// Retângulo vermelho desenhado em todo quadro (linhas e colunas 100..300)
pub const RED_RECT: Rect = Rect::new(100, 100, 200, 200);

pub const BACKGROUND: Color = Color::BLACK;
pub const FOREGROUND: Color = Color::RED;

/// Etapas de aquisição de recursos em `init`, na ordem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    Subsystem,
    Window,
    Renderer,
    Texture,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStep::Subsystem => write!(f, "subsistema de vídeo"),
            InitStep::Window => write!(f, "janela"),
            InitStep::Renderer => write!(f, "renderer"),
            InitStep::Texture => write!(f, "textura"),
        }
    }
}

/// Erros do core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("init falhou na etapa {step}: {source}")]
    Init { step: InitStep, source: BackendError },
    #[error("quadro descartado: {0}")]
    Frame(BackendError),
}

/// Tipo de resultado para operações do core
pub type CoreResult<T> = Result<T, CoreError>;

/// Handles de vídeo pertencentes ao core
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VideoResources {
    pub window: Option<WindowId>,
    pub renderer: Option<RendererId>,
    pub texture: Option<TextureId>,
}

impl VideoResources {
    pub fn is_empty(&self) -> bool {
        self.window.is_none() && self.renderer.is_none() && self.texture.is_none()
    }
}

/// Estado do core
pub struct Core<B: VideoBackend> {
    callbacks: Callbacks,
    backend: B,
    video: VideoResources,
    running: bool,
}

impl<B: VideoBackend> Core<B> {
    /// Cria o core sem callbacks e parado
    pub fn new(backend: B) -> Self {
        Self {
            callbacks: Callbacks::default(),
            backend,
            video: VideoResources::default(),
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn video(&self) -> VideoResources {
        self.video
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn system_info(&self) -> SystemInfo {
        SYSTEM_INFO
    }

    pub fn av_info(&self) -> AvInfo {
        AV_INFO
    }

    // --- Registro de callbacks ---

    /// Guarda o callback de ambiente e declara as capacidades do core.
    /// Recusas do frontend são ignoradas.
    pub fn set_environment(&mut self, cb: EnvironmentCallback) {
        self.callbacks.environment = cb;

        let mut support_no_game = true;
        if !self
            .callbacks
            .environment(ENVIRONMENT_SET_SUPPORT_NO_GAME, &mut support_no_game as *mut bool as *mut c_void)
        {
            debug!("Frontend recusou SET_SUPPORT_NO_GAME");
        }

        let mut pixel_format: c_uint = PIXEL_FORMAT_XRGB8888;
        if !self
            .callbacks
            .environment(ENVIRONMENT_SET_PIXEL_FORMAT, &mut pixel_format as *mut c_uint as *mut c_void)
        {
            debug!("Frontend recusou SET_PIXEL_FORMAT (XRGB8888)");
        }
    }

    pub fn set_video_refresh(&mut self, cb: VideoRefreshCallback) {
        self.callbacks.video_refresh = cb;
    }

    pub fn set_audio_sample(&mut self, cb: AudioSampleCallback) {
        self.callbacks.audio_sample = cb;
    }

    pub fn set_audio_sample_batch(&mut self, cb: AudioSampleBatchCallback) {
        self.callbacks.audio_sample_batch = cb;
    }

    pub fn set_input_poll(&mut self, cb: InputPollCallback) {
        self.callbacks.input_poll = cb;
    }

    pub fn set_input_state(&mut self, cb: InputStateCallback) {
        self.callbacks.input_state = cb;
    }

    // --- Ciclo de vida ---

    /// Inicializa o core; falhas são registradas e deixam o core parado
    pub fn init(&mut self) {
        if let Err(e) = self.try_init() {
            error!("{}", e);
        }
    }

    /// Adquire subsistema -> janela -> renderer -> textura.
    /// Em caso de falha, libera o que já foi adquirido em ordem reversa.
    pub fn try_init(&mut self) -> CoreResult<()> {
        info!("Initializing core...");

        if self.running || !self.video.is_empty() {
            warn!("init chamado com recursos ainda alocados, liberando antes");
            self.deinit();
        }

        let result = self.acquire_resources();
        if result.is_err() {
            self.release_resources();
            self.backend.quit();
        }
        self.running = result.is_ok();
        result
    }

    fn acquire_resources(&mut self) -> CoreResult<()> {
        self.backend
            .init()
            .map_err(|source| CoreError::Init { step: InitStep::Subsystem, source })?;

        let window = self
            .backend
            .create_window(WINDOW_TITLE, WindowPos::Centered, SCREEN_WIDTH, SCREEN_HEIGHT, WindowFlags::HIDDEN)
            .map_err(|source| CoreError::Init { step: InitStep::Window, source })?;
        self.video.window = Some(window);

        let renderer = self
            .backend
            .create_renderer(window, RendererFlags::SOFTWARE)
            .map_err(|source| CoreError::Init { step: InitStep::Renderer, source })?;
        self.video.renderer = Some(renderer);

        let texture = self
            .backend
            .create_texture(renderer, PixelFormat::Argb8888, TextureAccess::Streaming, SCREEN_WIDTH, SCREEN_HEIGHT)
            .map_err(|source| CoreError::Init { step: InitStep::Texture, source })?;
        self.video.texture = Some(texture);

        Ok(())
    }

    /// Libera textura -> renderer -> janela, cada um só se existir
    fn release_resources(&mut self) {
        if let Some(texture) = self.video.texture.take() {
            self.backend.destroy_texture(texture);
        }
        if let Some(renderer) = self.video.renderer.take() {
            self.backend.destroy_renderer(renderer);
        }
        if let Some(window) = self.video.window.take() {
            self.backend.destroy_window(window);
        }
    }

    /// Libera tudo e encerra o backend. Pode ser chamado várias vezes.
    pub fn deinit(&mut self) {
        self.release_resources();
        self.backend.quit();
        self.running = false;
    }

    /// Produz um quadro: preto com retângulo vermelho.
    /// Parado, não faz nada; se o lock falhar, o quadro inteiro é descartado.
    pub fn run(&mut self) {
        if !self.running {
            return;
        }

        trace!("Running frame...");

        let Some(texture) = self.video.texture else {
            error!("Core rodando sem textura");
            return;
        };

        let pitch = match self.draw_frame(texture) {
            Ok(pitch) => pitch,
            Err(e) => {
                error!("{}", CoreError::Frame(e));
                return;
            }
        };

        match self.backend.texture_pixels(texture) {
            Ok((pixels, _)) => {
                self.callbacks.video_refresh(pixels, SCREEN_WIDTH, SCREEN_HEIGHT, pitch);
            }
            Err(e) => error!("Falha ao ler textura: {}", e),
        }

        cfg_if! {
            if #[cfg(feature = "debug-mirror")] {
                if let Err(e) = self.mirror_to_window() {
                    debug!("Espelho de depuração falhou: {}", e);
                }
            }
        }

        // O estado dos controles nunca é lido
        self.callbacks.input_poll();

        // Sem áudio
        self.callbacks.audio_sample_batch(&[]);
    }

    /// Escreve o quadro com a textura travada; devolve o pitch
    fn draw_frame(&mut self, texture: TextureId) -> BackendResult<usize> {
        let mut lock = TextureLock::acquire(&mut self.backend, texture)?;
        let pitch = lock.pitch();
        let mut frame = FrameBuffer::new(lock.pixels_mut()?, SCREEN_WIDTH, SCREEN_HEIGHT, pitch)?;
        frame.fill(BACKGROUND.to_argb8888())?;
        frame.fill_rect(RED_RECT, FOREGROUND.to_argb8888())?;
        Ok(pitch)
    }

    /// Repete o desenho no renderer da janela de depuração
    #[cfg_attr(not(feature = "debug-mirror"), allow(dead_code))]
    fn mirror_to_window(&mut self) -> BackendResult<()> {
        let Some(renderer) = self.video.renderer else {
            return Ok(());
        };
        self.backend.set_draw_color(renderer, BACKGROUND)?;
        self.backend.clear(renderer)?;
        self.backend.set_draw_color(renderer, FOREGROUND)?;
        self.backend.fill_rect(renderer, RED_RECT)?;
        self.backend.present(renderer)
    }

    // --- Conteúdo ---

    /// Sempre aceita, inclusive sem conteúdo (`game` nulo)
    pub fn load_game(&mut self, game: Option<&GameInfo>) -> bool {
        match game {
            Some(g) if !g.path.is_null() => debug!("load_game com caminho, conteúdo ignorado"),
            Some(_) => debug!("load_game com dados em memória, conteúdo ignorado"),
            None => debug!("load_game sem conteúdo"),
        }
        true
    }

    pub fn load_game_special(&mut self, game_type: c_uint, _info: Option<&[GameInfo]>) -> bool {
        debug!("load_game_special({}) não suportado", game_type);
        false
    }

    pub fn unload_game(&mut self) {}

    pub fn reset(&mut self) {}

    pub fn set_controller_port_device(&mut self, port: c_uint, device: c_uint) {
        trace!("Controle {} na porta {} ignorado", device, port);
    }

    pub fn cheat_reset(&mut self) {}

    pub fn cheat_set(&mut self, index: c_uint, enabled: bool, _code: Option<&str>) {
        trace!("Cheat {} (ativo: {}) ignorado", index, enabled);
    }

    // --- Estado salvo e memória ---

    pub fn serialize_size(&self) -> usize {
        0
    }

    pub fn serialize(&self, _data: &mut [u8]) -> bool {
        false
    }

    pub fn unserialize(&mut self, _data: &[u8]) -> bool {
        false
    }

    pub fn region(&self) -> c_uint {
        REGION_NTSC
    }

    /// Nenhuma região de memória é exposta
    pub fn memory_data(&mut self, _id: c_uint) -> Option<&mut [u8]> {
        None
    }

    pub fn memory_size(&self, _id: c_uint) -> usize {
        0
    }
}
