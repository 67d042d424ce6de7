use std::path::{Path, PathBuf};

pub const DAEMON_LABEL: &str = "dev.photogrid.daemon";

pub const DAEMON_LOG: &str = "daemon.log";
pub const DAEMON_SOCKET: &str = "daemon.sock";

pub fn photogrid_root(home: &Path) -> PathBuf {
    home.join(".photogrid")
}

pub fn galleries_root(home: &Path) -> PathBuf {
    photogrid_root(home).join("galleries")
}

pub fn run_dir(home: &Path) -> PathBuf {
    photogrid_root(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    photogrid_root(home).join(DAEMON_SOCKET)
}

pub fn logs_dir(home: &Path) -> PathBuf {
    photogrid_root(home).join("logs")
}

pub fn log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(DAEMON_LOG)
}
