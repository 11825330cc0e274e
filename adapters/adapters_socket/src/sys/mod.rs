//! Platform Layer
//!
//! Everything that differs between POSIX and Winsock: the native handle
//! type, error translation tables, socket address marshalling, one-time
//! subsystem start-up and name resolution.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use self::unix::*;
    } else if #[cfg(windows)] {
        mod windows;
        pub(crate) use self::windows::*;
    } else {
        compile_error!("adapters_socket supports unix and windows targets only");
    }
}
