//! Informações de sistema e de áudio/vídeo reportadas ao frontend.
//! São valores imutáveis: consultas repetidas devolvem exatamente o mesmo conteúdo.

use std::ffi::CStr;

use crate::core::{ASPECT_RATIO, FPS, SAMPLE_RATE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::libretro::sys;

/// Descrição do core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: &'static CStr,
    pub library_version: &'static CStr,
    pub valid_extensions: &'static CStr,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

pub const SYSTEM_INFO: SystemInfo = SystemInfo {
    library_name: c"My Libretro Core",
    library_version: c"1.0",
    valid_extensions: c"",
    need_fullpath: false,
    block_extract: false,
};

impl SystemInfo {
    /// Os ponteiros apontam para dados estáticos e nunca expiram
    pub fn to_raw(&self) -> sys::SystemInfo {
        sys::SystemInfo {
            library_name: self.library_name.as_ptr(),
            library_version: self.library_version.as_ptr(),
            valid_extensions: self.valid_extensions.as_ptr(),
            need_fullpath: self.need_fullpath,
            block_extract: self.block_extract,
        }
    }
}

/// Geometria e temporização
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvInfo {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
    pub fps: f64,
    pub sample_rate: f64,
}

pub const AV_INFO: AvInfo = AvInfo {
    base_width: SCREEN_WIDTH as u32,
    base_height: SCREEN_HEIGHT as u32,
    max_width: SCREEN_WIDTH as u32,
    max_height: SCREEN_HEIGHT as u32,
    aspect_ratio: ASPECT_RATIO,
    fps: FPS,
    sample_rate: SAMPLE_RATE,
};

impl AvInfo {
    pub fn to_raw(&self) -> sys::SystemAvInfo {
        sys::SystemAvInfo {
            geometry: sys::GameGeometry {
                base_width: self.base_width,
                base_height: self.base_height,
                max_width: self.max_width,
                max_height: self.max_height,
                aspect_ratio: self.aspect_ratio,
            },
            timing: sys::SystemTiming {
                fps: self.fps,
                sample_rate: self.sample_rate,
            },
        }
    }
}
