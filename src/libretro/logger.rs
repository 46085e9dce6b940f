//! Ponte entre o `log` e a interface de log do frontend.
//!
//! O logger é registrado uma vez por processo. Enquanto o frontend não
//! fornecer `retro_log_printf_t` (ou se recusar), as mensagens vão para stderr.

use std::ffi::CString;
use std::sync::{Mutex, PoisonError};

use libc::c_void;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::libretro::sys::{EnvironmentCallback, LogLevel, LogPrintfCallback, ENVIRONMENT_GET_LOG_INTERFACE};

const PREFIX: &str = "[retro-skeleton]";

pub struct HostLogger {
    level: LevelFilter,
    sink: Mutex<LogPrintfCallback>,
}

static LOGGER: HostLogger =
    HostLogger::new(if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info });

/// Registra o logger e pede a interface de log ao frontend
pub fn init(environment: EnvironmentCallback) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOGGER.level);
    }
    LOGGER.set_sink(query_log_interface(environment));
}

fn query_log_interface(environment: EnvironmentCallback) -> LogPrintfCallback {
    let cb = environment?;
    // `struct retro_log_callback` tem um único campo ponteiro; nulo vira `None`
    let mut log: LogPrintfCallback = None;
    // SAFETY: callback de ambiente válido fornecido pelo frontend; `log` vive durante a chamada
    let accepted = unsafe { cb(ENVIRONMENT_GET_LOG_INTERFACE, &mut log as *mut LogPrintfCallback as *mut c_void) };
    if accepted {
        log
    } else {
        None
    }
}

/// Nível equivalente do libretro (não há TRACE: vira DEBUG)
pub fn retro_level(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::Error,
        Level::Warn => LogLevel::Warn,
        Level::Info => LogLevel::Info,
        Level::Debug | Level::Trace => LogLevel::Debug,
    }
}

/// Linha entregue ao frontend: prefixo, mensagem e quebra de linha.
/// NUL interno cortaria a string C, então vira espaço.
fn host_line(record: &Record) -> CString {
    let text = format!("{} {}\n", PREFIX, record.args()).replace('\0', " ");
    CString::new(text).unwrap_or_default()
}

impl HostLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level, sink: Mutex::new(None) }
    }

    pub fn set_sink(&self, sink: LogPrintfCallback) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    fn sink(&self) -> LogPrintfCallback {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match self.sink() {
            Some(printf) => {
                let message = host_line(record);
                // SAFETY: formato "%s" com um único argumento C string válido
                unsafe { printf(retro_level(record.level()), c"%s".as_ptr(), message.as_ptr()) };
            }
            None => eprintln!("{} [{}] {}", PREFIX, record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use libc::c_uint;

    #[test]
    fn test_level_mapping() {
        assert_eq!(retro_level(Level::Error) as c_uint, 3);
        assert_eq!(retro_level(Level::Warn) as c_uint, 2);
        assert_eq!(retro_level(Level::Info) as c_uint, 1);
        assert_eq!(retro_level(Level::Debug) as c_uint, 0);
        assert_eq!(retro_level(Level::Trace) as c_uint, 0);
    }

    #[test]
    fn test_query_without_environment() {
        assert!(query_log_interface(None).is_none());
    }

    #[test]
    fn test_query_refused() {
        extern "C" fn refuse(_cmd: c_uint, _data: *mut c_void) -> bool {
            false
        }
        assert!(query_log_interface(Some(refuse)).is_none());
    }

    #[test]
    fn test_query_accepted_without_printf() {
        extern "C" fn provide(cmd: c_uint, data: *mut c_void) -> bool {
            if cmd != ENVIRONMENT_GET_LOG_INTERFACE {
                return false;
            }
            unsafe { *(data as *mut LogPrintfCallback) = None };
            true
        }
        assert!(query_log_interface(Some(provide)).is_none());
    }

    #[test]
    fn test_host_line_prefix_and_nul() {
        let line = host_line(&Record::builder().args(format_args!("antes\0depois")).level(Level::Info).build());
        assert_eq!(line.to_str().unwrap(), "[retro-skeleton] antes depois\n");
    }

    // Funções variádicas não podem ser definidas em Rust estável. Em x86-64 os
    // três primeiros argumentos inteiros vão nos mesmos registradores com ou sem
    // `...`, então uma função de três parâmetros recebe a chamada do printf.
    #[cfg(target_arch = "x86_64")]
    mod printf_sink {
        use super::*;
        use crate::libretro::sys::LogPrintfFn;
        use libc::c_char;
        use std::cell::RefCell;
        use std::ffi::CStr;

        type PlainPrintf = extern "C" fn(LogLevel, *const c_char, *const c_char);

        thread_local! {
            static LINES: RefCell<Vec<(c_uint, String, String)>> = RefCell::new(Vec::new());
        }

        extern "C" fn capture(level: LogLevel, fmt: *const c_char, message: *const c_char) {
            let fmt = unsafe { CStr::from_ptr(fmt) }.to_string_lossy().into_owned();
            let message = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
            LINES.with(|l| l.borrow_mut().push((level as c_uint, fmt, message)));
        }

        fn capturing_sink() -> LogPrintfCallback {
            // SAFETY: ver comentário do módulo; só lemos os três primeiros argumentos
            Some(unsafe { std::mem::transmute::<PlainPrintf, LogPrintfFn>(capture) })
        }

        fn take_lines() -> Vec<(c_uint, String, String)> {
            LINES.with(|l| std::mem::take(&mut *l.borrow_mut()))
        }

        #[test]
        fn test_records_reach_host_printf() {
            let logger = HostLogger::new(LevelFilter::Trace);
            logger.set_sink(capturing_sink());
            take_lines();

            for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
                logger.log(&Record::builder().args(format_args!("quadro {}", level)).level(level).build());
            }

            let lines = take_lines();
            let levels: Vec<c_uint> = lines.iter().map(|(level, _, _)| *level).collect();
            assert_eq!(levels, vec![3, 2, 1, 0, 0]);
            assert!(lines.iter().all(|(_, fmt, _)| fmt == "%s"));
            assert_eq!(lines[0].2, "[retro-skeleton] quadro ERROR\n");
            assert_eq!(lines[4].2, "[retro-skeleton] quadro TRACE\n");
        }

        #[test]
        fn test_embedded_nul_still_reaches_host() {
            let logger = HostLogger::new(LevelFilter::Info);
            logger.set_sink(capturing_sink());
            take_lines();

            logger.log(&Record::builder().args(format_args!("textura\0perdida")).level(Level::Warn).build());

            assert_eq!(take_lines(), vec![(2, "%s".to_string(), "[retro-skeleton] textura perdida\n".to_string())]);
        }

        #[test]
        fn test_filtered_and_unset_sink() {
            let logger = HostLogger::new(LevelFilter::Info);
            logger.set_sink(capturing_sink());
            take_lines();

            logger.log(&Record::builder().args(format_args!("detalhe")).level(Level::Debug).build());
            assert!(take_lines().is_empty());

            // Sem sink a mensagem vai para stderr
            logger.set_sink(None);
            logger.log(&Record::builder().args(format_args!("sem frontend")).level(Level::Error).build());
            assert!(take_lines().is_empty());
        }
    }
}
