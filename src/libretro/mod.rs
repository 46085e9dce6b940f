//! Interface libretro: tipos da ABI C, ponte de log e os pontos de entrada
//! `retro_*` que o frontend carrega por nome.

pub mod logger;
pub mod sys;

// Os símbolos exportados só existem com a feature `libretro`.
#[cfg(feature = "libretro")]
pub mod api;
