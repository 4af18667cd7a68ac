use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("termscope.log")
}

/// Owner-only log file; an existing file is truncated.
fn open_private(path: &Path) -> io::Result<File> {
    match OpenOptions::new().write(true).create_new(true).mode(0o600).open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            OpenOptions::new().write(true).truncate(true).open(path)
        }
        Err(e) => Err(e),
    }
}

/// Send log records to the debug file. Stderr would corrupt the screen,
/// so without `--debug` no logger is installed at all.
pub fn init(path: &Path) -> io::Result<()> {
    let file = open_private(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("termscope {} starting up", env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn log_file_is_private_and_truncated() {
        let path = std::env::temp_dir().join(format!("termscope-log-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        open_private(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::write(&path, "old contents").unwrap();
        open_private(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        let _ = std::fs::remove_file(&path);
    }
}
