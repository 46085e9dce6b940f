//! Callbacks registrados pelo frontend.
//!
//! Cada callback é opcional até o frontend chamar o setter correspondente.
//! Invocar um callback ausente é violação de contrato do frontend: registramos
//! um aviso e seguimos, nunca derrubamos o processo.

use std::ptr;

use libc::{c_uint, c_void};
use log::warn;

use crate::libretro::sys::{
    AudioSampleBatchCallback, AudioSampleCallback, EnvironmentCallback, InputPollCallback, InputStateCallback,
    VideoRefreshCallback,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Callbacks {
    pub environment: EnvironmentCallback,
    pub video_refresh: VideoRefreshCallback,
    pub audio_sample: AudioSampleCallback,
    pub audio_sample_batch: AudioSampleBatchCallback,
    pub input_poll: InputPollCallback,
    pub input_state: InputStateCallback,
}

impl Callbacks {
    /// Envia um comando de ambiente. `false` se o frontend recusou ou não há callback.
    pub fn environment(&self, cmd: c_uint, data: *mut c_void) -> bool {
        match self.environment {
            // SAFETY: ponteiro fornecido pelo frontend via retro_set_environment
            Some(cb) => unsafe { cb(cmd, data) },
            None => {
                warn!("Callback de ambiente ausente (comando {})", cmd);
                false
            }
        }
    }

    /// Entrega um quadro. `frame` precisa ter pelo menos `pitch * height` bytes.
    pub fn video_refresh(&self, frame: &[u8], width: usize, height: usize, pitch: usize) -> bool {
        match self.video_refresh {
            Some(cb) => {
                // SAFETY: `frame` continua vivo durante a chamada; o frontend só lê
                unsafe { cb(frame.as_ptr().cast(), width as c_uint, height as c_uint, pitch) };
                true
            }
            None => {
                warn!("Callback de vídeo ausente, quadro descartado");
                false
            }
        }
    }

    pub fn input_poll(&self) -> bool {
        match self.input_poll {
            // SAFETY: ponteiro fornecido pelo frontend via retro_set_input_poll
            Some(cb) => {
                unsafe { cb() };
                true
            }
            None => {
                warn!("Callback de input_poll ausente");
                false
            }
        }
    }

    /// Envia amostras estéreo intercaladas. Slice vazio vira (NULL, 0): "sem áudio neste quadro".
    pub fn audio_sample_batch(&self, samples: &[i16]) -> Option<usize> {
        let Some(cb) = self.audio_sample_batch else {
            warn!("Callback de áudio em lote ausente");
            return None;
        };
        let data = if samples.is_empty() { ptr::null() } else { samples.as_ptr() };
        // SAFETY: `samples` vive durante a chamada; frames = pares L/R
        Some(unsafe { cb(data, samples.len() / 2) })
    }
}
