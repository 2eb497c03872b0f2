use crate::config::Args;
use std::{
    fs::{File, OpenOptions},
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex},
};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

pub struct LogGuard {
    file: Option<Arc<Mutex<File>>>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Sends log lines to the log file when one is configured, otherwise to stderr.
struct LogWriter {
    file: Option<Arc<Mutex<File>>>,
    crlf: bool,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.write_all(buf);
            }
        } else if self.crlf {
            let _ = write_crlf(&mut io::stderr().lock(), buf);
        } else {
            let _ = io::stderr().write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                return file.flush();
            }
        }
        io::stderr().flush()
    }
}

// In raw mode a bare `\n` leaves the cursor in its column.
fn write_crlf(out: &mut impl Write, buf: &[u8]) -> io::Result<()> {
    for chunk in buf.split_inclusive(|byte| *byte == b'\n') {
        match chunk.strip_suffix(b"\n") {
            Some(line) => {
                out.write_all(line.strip_suffix(b"\r").unwrap_or(line))?;
                out.write_all(b"\r\n")?;
            }
            None => out.write_all(chunk)?,
        }
    }
    Ok(())
}

fn resolve_level(args: &Args) -> String {
    if args.debug {
        return "debug".to_string();
    }
    match std::env::var("SS_PRETTY_LOG_LEVEL") {
        Ok(level) if !level.trim().is_empty() => level,
        _ => "warn".to_string(),
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn init_logging(args: &Args) -> Option<LogGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(resolve_level(args)));
    let file = match args.log_file.as_deref().map(open_log_file) {
        Some(Ok(file)) => Some(Arc::new(Mutex::new(file))),
        Some(Err(err)) => {
            eprintln!("log_file_error: {err}");
            None
        }
        None => None,
    };
    let to_file = file.is_some();
    let crlf = io::stderr().is_terminal();
    let writer_file = file.clone();
    let make_writer = BoxMakeWriter::new(move || LogWriter {
        file: writer_file.clone(),
        crlf,
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!to_file && crlf)
        .with_writer(make_writer)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }
    Some(LogGuard { file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newlines_gain_carriage_returns() {
        let mut out = Vec::new();
        write_crlf(&mut out, b"first\nsecond\r\nthird").expect("write");
        assert_eq!(out, b"first\r\nsecond\r\nthird");
    }

    #[test]
    fn debug_flag_wins_over_environment() {
        let args = <Args as clap::Parser>::try_parse_from(["ss-pretty", "--debug"]).expect("args");
        assert_eq!(resolve_level(&args), "debug");
    }
}
