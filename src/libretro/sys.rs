//! Ligações C do libretro, vindas da crate `libretro-sys`.
//!
//! O frontend pode passar ponteiros de callback nulos, então cada callback
//! registrado é guardado como `Option` do tipo de função da crate.

use libc::c_uint;

pub use libretro_sys::*;

pub type EnvironmentCallback = Option<EnvironmentFn>;
pub type VideoRefreshCallback = Option<VideoRefreshFn>;
pub type AudioSampleCallback = Option<AudioSampleFn>;
pub type AudioSampleBatchCallback = Option<AudioSampleBatchFn>;
pub type InputPollCallback = Option<InputPollFn>;
pub type InputStateCallback = Option<InputStateFn>;

/// `retro_log_printf_t` como chega em `LogCallback::log`, possivelmente nulo
pub type LogPrintfCallback = Option<LogPrintfFn>;

/// Valor de `PixelFormat::ARGB8888` (XRGB8888 em `libretro.h`) para SET_PIXEL_FORMAT
pub const PIXEL_FORMAT_XRGB8888: c_uint = PixelFormat::ARGB8888 as c_uint;

/// Valor de `Region::NTSC` (`RETRO_REGION_NTSC` em `libretro.h`) para `retro_get_region`
pub const REGION_NTSC: c_uint = Region::NTSC as c_uint;

/// `retro_log_printf_t` de `libretro.h` é variádico; a crate o declara com dois argumentos fixos
pub type LogPrintfFn = unsafe extern "C" fn(level: LogLevel, fmt: *const libc::c_char, ...);
