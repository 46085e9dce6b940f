// Este é o ponto de entrada principal da biblioteca.
// Compilada como `cdylib`, vira um core libretro carregável pelo RetroArch.

// Módulos principais do projeto.
pub mod core;
pub mod video;

// A implementação da API libretro (os símbolos `retro_*` dependem da feature `libretro`).
pub mod libretro;

// Re-exportações para facilitar o uso.
pub use crate::core::{Core, CoreError, InitStep};
pub use crate::video::{SoftwareBackend, VideoBackend};
#[cfg(feature = "minifb")]
pub use crate::video::MinifbBackend;

/// Versão do core.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Função conveniente para criar um core com o backend em software.
pub fn create_core() -> Core<SoftwareBackend> {
    Core::new(SoftwareBackend::new())
}
