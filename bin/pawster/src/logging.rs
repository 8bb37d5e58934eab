//! Logger setup: `RUST_LOG` filtering (default `info`) to stderr, and to
//! the configured log file as well.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Env, Target};

/// Copies every record to stderr and to a file.
struct TeeWriter<W: Write> {
    stderr: io::Stderr,
    file: W,
}

impl<W: Write> Write for TeeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // stderr failures are ignored
        let _ = self.stderr.write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.stderr.flush();
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::new().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = open_append(path)?;
        builder.target(Target::Pipe(Box::new(TeeWriter {
            stderr: io::stderr(),
            file,
        })));
    }
    builder.try_init()?;
    Ok(())
}
