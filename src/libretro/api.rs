// retro-skeleton-rs/src/libretro/api.rs

//! Pontos de entrada exportados para o frontend.
//!
//! Cada função apenas traduz ponteiros C para tipos Rust e delega para a
//! única instância de [`Core`] do processo, sempre via [`with_core`].
//!
//! O frontend pode chamar `retro_*` de dentro de um callback que o próprio
//! core disparou (por exemplo, `retro_get_region` dentro de `input_poll`).
//! A instância já está travada nesse momento; a chamada reentrante é
//! descartada com um aviso e devolve o valor neutro da operação.

use std::cell::Cell;
use std::ffi::CStr;
use std::ptr;
use std::slice;
use std::sync::{Mutex, OnceLock, PoisonError};

use cfg_if::cfg_if;
use libc::{c_char, c_uint, c_void, size_t};
use log::warn;

use crate::core::{Core, AV_INFO, SYSTEM_INFO};
use crate::libretro::logger;
use crate::libretro::sys::{
    AudioSampleBatchCallback, AudioSampleCallback, EnvironmentCallback, GameInfo, InputPollCallback,
    InputStateCallback, SystemAvInfo, SystemInfo, VideoRefreshCallback, API_VERSION, REGION_NTSC,
};

cfg_if! {
    if #[cfg(feature = "minifb")] {
        use crate::video::MinifbBackend as Backend;
    } else {
        use crate::video::SoftwareBackend as Backend;
    }
}

/// Core usado pelos pontos de entrada
pub type RetroCore = Core<Backend>;

thread_local! {
    // Verdadeiro enquanto esta thread segura a instância
    static IN_CORE: Cell<bool> = const { Cell::new(false) };
}

/// Limpa `IN_CORE` ao sair, inclusive em pânico
struct CoreEntry;

impl Drop for CoreEntry {
    fn drop(&mut self) {
        IN_CORE.with(|active| active.set(false));
    }
}

/// Executa `f` com a instância travada. Chamada reentrante devolve `fallback`.
fn with_core<R>(entry: &str, fallback: R, f: impl FnOnce(&mut RetroCore) -> R) -> R {
    static CORE: OnceLock<Mutex<RetroCore>> = OnceLock::new();

    if IN_CORE.with(Cell::get) {
        warn!("{} chamado de dentro de um callback do core, ignorado", entry);
        return fallback;
    }
    let mut core = CORE
        .get_or_init(|| Mutex::new(Core::new(Backend::new())))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    IN_CORE.with(|active| active.set(true));
    let _entry = CoreEntry;
    f(&mut core)
}

#[no_mangle]
pub extern "C" fn retro_api_version() -> c_uint {
    API_VERSION
}

/// # Safety
/// `info` deve ser nulo ou apontar para memória gravável de `SystemInfo`.
#[no_mangle]
pub unsafe extern "C" fn retro_get_system_info(info: *mut SystemInfo) {
    if !info.is_null() {
        info.write(SYSTEM_INFO.to_raw());
    }
}

/// # Safety
/// `info` deve ser nulo ou apontar para memória gravável de `SystemAvInfo`.
#[no_mangle]
pub unsafe extern "C" fn retro_get_system_av_info(info: *mut SystemAvInfo) {
    if !info.is_null() {
        info.write(AV_INFO.to_raw());
    }
}

#[no_mangle]
pub extern "C" fn retro_set_environment(cb: EnvironmentCallback) {
    with_core("retro_set_environment", (), |core| core.set_environment(cb));
    logger::init(cb);
}

#[no_mangle]
pub extern "C" fn retro_set_video_refresh(cb: VideoRefreshCallback) {
    with_core("retro_set_video_refresh", (), |core| core.set_video_refresh(cb));
}

#[no_mangle]
pub extern "C" fn retro_set_audio_sample(cb: AudioSampleCallback) {
    with_core("retro_set_audio_sample", (), |core| core.set_audio_sample(cb));
}

#[no_mangle]
pub extern "C" fn retro_set_audio_sample_batch(cb: AudioSampleBatchCallback) {
    with_core("retro_set_audio_sample_batch", (), |core| core.set_audio_sample_batch(cb));
}

#[no_mangle]
pub extern "C" fn retro_set_input_poll(cb: InputPollCallback) {
    with_core("retro_set_input_poll", (), |core| core.set_input_poll(cb));
}

#[no_mangle]
pub extern "C" fn retro_set_input_state(cb: InputStateCallback) {
    with_core("retro_set_input_state", (), |core| core.set_input_state(cb));
}

#[no_mangle]
pub extern "C" fn retro_init() {
    with_core("retro_init", (), |core| core.init());
}

#[no_mangle]
pub extern "C" fn retro_deinit() {
    with_core("retro_deinit", (), |core| core.deinit());
}

#[no_mangle]
pub extern "C" fn retro_run() {
    with_core("retro_run", (), |core| core.run());
}

#[no_mangle]
pub extern "C" fn retro_reset() {
    with_core("retro_reset", (), |core| core.reset());
}

#[no_mangle]
pub extern "C" fn retro_set_controller_port_device(port: c_uint, device: c_uint) {
    with_core("retro_set_controller_port_device", (), |core| core.set_controller_port_device(port, device));
}

/// # Safety
/// `game` deve ser nulo ou apontar para um `GameInfo` válido.
#[no_mangle]
pub unsafe extern "C" fn retro_load_game(game: *const GameInfo) -> bool {
    let game = game.as_ref();
    with_core("retro_load_game", false, |core| core.load_game(game))
}

/// # Safety
/// `info` deve ser nulo ou apontar para `num_info` elementos válidos.
#[no_mangle]
pub unsafe extern "C" fn retro_load_game_special(
    game_type: c_uint,
    info: *const GameInfo,
    num_info: size_t,
) -> bool {
    let info = if info.is_null() { None } else { Some(slice::from_raw_parts(info, num_info)) };
    with_core("retro_load_game_special", false, |core| core.load_game_special(game_type, info))
}

#[no_mangle]
pub extern "C" fn retro_unload_game() {
    with_core("retro_unload_game", (), |core| core.unload_game());
}

#[no_mangle]
pub extern "C" fn retro_get_region() -> c_uint {
    with_core("retro_get_region", REGION_NTSC, |core| core.region())
}

#[no_mangle]
pub extern "C" fn retro_serialize_size() -> size_t {
    with_core("retro_serialize_size", 0, |core| core.serialize_size())
}

/// # Safety
/// `data` deve ser nulo ou apontar para `size` bytes graváveis.
#[no_mangle]
pub unsafe extern "C" fn retro_serialize(data: *mut c_void, size: size_t) -> bool {
    let buffer: &mut [u8] = if data.is_null() { &mut [] } else { slice::from_raw_parts_mut(data.cast(), size) };
    with_core("retro_serialize", false, |core| core.serialize(buffer))
}

/// # Safety
/// `data` deve ser nulo ou apontar para `size` bytes legíveis.
#[no_mangle]
pub unsafe extern "C" fn retro_unserialize(data: *const c_void, size: size_t) -> bool {
    let buffer: &[u8] = if data.is_null() { &[] } else { slice::from_raw_parts(data.cast(), size) };
    with_core("retro_unserialize", false, |core| core.unserialize(buffer))
}

#[no_mangle]
pub extern "C" fn retro_cheat_reset() {
    with_core("retro_cheat_reset", (), |core| core.cheat_reset());
}

/// # Safety
/// `code` deve ser nulo ou uma string C terminada em NUL.
#[no_mangle]
pub unsafe extern "C" fn retro_cheat_set(index: c_uint, enabled: bool, code: *const c_char) {
    let code = if code.is_null() { None } else { CStr::from_ptr(code).to_str().ok() };
    with_core("retro_cheat_set", (), |core| core.cheat_set(index, enabled, code));
}

#[no_mangle]
pub extern "C" fn retro_get_memory_data(id: c_uint) -> *mut c_void {
    with_core("retro_get_memory_data", ptr::null_mut(), |core| match core.memory_data(id) {
        Some(data) => data.as_mut_ptr().cast(),
        None => ptr::null_mut(),
    })
}

#[no_mangle]
pub extern "C" fn retro_get_memory_size(id: c_uint) -> size_t {
    with_core("retro_get_memory_size", 0, |core| core.memory_size(id))
}
