//! Remote control: JSON-lines commands from stdin or from a watched file.
//!
//! ```text
//! {"command":"finale"}
//! {"command":"clear"}
//! {"command":"render","mode":"half-block"}
//! {"command":"color","mode":"ansi256"}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use notify::Watcher;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    Finale,
    Clear,
    Render { mode: String },
    Color { mode: String },
}

/// Parse one line. Blank lines are skipped, bad ones logged and skipped.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            log::warn!("ignoring remote line {line:?}: {e}");
            None
        }
    }
}

pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    /// `-` or `stdin` means standard input, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "-" | "stdin" => Source::Stdin,
            path => Source::File(PathBuf::from(path)),
        }
    }
}

/// Start a background reader and return the channel it feeds.
pub fn spawn_reader(source: Source) -> Result<Receiver<Command>> {
    let (tx, rx) = mpsc::channel::<Command>();

    match source {
        Source::Stdin => {
            std::thread::spawn(move || {
                let stdin = io::BufReader::new(io::stdin());
                for line in stdin.split(b'\n') {
                    let Ok(line) = line else { break };
                    let Some(line) = decode_line(&line, "stdin") else {
                        continue;
                    };
                    if let Some(cmd) = parse_line(&line)
                        && tx.send(cmd).is_err()
                    {
                        break;
                    }
                }
                log::debug!("remote stdin closed");
            });
        }
        Source::File(path) => {
            // Only commands appended after startup count
            OpenOptions::new().create(true).append(true).open(&path)?;
            let mut tail = Tail::at_end(&path)?;

            let (file_tx, file_rx) = mpsc::channel();
            let mut watcher = notify::recommended_watcher(move |res| {
                let _ = file_tx.send(res);
            })?;
            watcher.watch(&path, notify::RecursiveMode::NonRecursive)?;
            log::info!("watching {} for remote commands", path.display());

            std::thread::spawn(move || {
                let _watcher = watcher;
                while let Ok(event) = file_rx.recv() {
                    if let Err(e) = event {
                        log::warn!("watch error on {}: {e}", tail.path.display());
                        continue;
                    }
                    match tail.read_new() {
                        Ok(lines) => {
                            if !forward(&lines, &tx) {
                                break;
                            }
                        }
                        Err(e) => log::warn!("failed to read {}: {e}", tail.path.display()),
                    }
                }
            });
        }
    }

    Ok(rx)
}

/// Send parsed commands; false once the receiver is gone.
fn forward(lines: &[String], tx: &Sender<Command>) -> bool {
    lines
        .iter()
        .filter_map(|l| parse_line(l))
        .all(|cmd| tx.send(cmd).is_ok())
}

/// One line of text without its line ending. Bytes that are not UTF-8 are
/// logged and the line is dropped.
fn decode_line(bytes: &[u8], origin: &str) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.trim_end_matches('\r').to_string()),
        Err(e) => {
            log::warn!("skipping non UTF-8 line from {origin}: {e}");
            None
        }
    }
}

/// Reads whole lines appended to a file since the last read.
struct Tail {
    path: PathBuf,
    offset: u64,
}

impl Tail {
    fn at_end(path: &Path) -> io::Result<Self> {
        let offset = std::fs::metadata(path)?.len();
        Ok(Tail {
            path: path.to_path_buf(),
            offset,
        })
    }

    fn read_new(&mut self) -> io::Result<Vec<String>> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            // truncated, start over
            self.offset = 0;
        }
        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        // A trailing partial line waits for its newline
        let Some(end) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        self.offset += end as u64 + 1;
        let origin = self.path.display().to_string();
        Ok(buf[..end]
            .split(|&b| b == b'\n')
            .filter_map(|line| decode_line(line, &origin))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line(r#"{"command":"finale"}"#), Some(Command::Finale));
        assert_eq!(parse_line(r#" {"command":"clear"} "#), Some(Command::Clear));
        assert_eq!(
            parse_line(r#"{"command":"render","mode":"ascii"}"#),
            Some(Command::Render {
                mode: "ascii".to_string()
            })
        );
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("launch!"), None);
        assert_eq!(parse_line(r#"{"command":"explode"}"#), None);
    }

    #[test]
    fn test_source_from_arg() {
        assert!(matches!(Source::from_arg("-"), Source::Stdin));
        assert!(matches!(Source::from_arg("stdin"), Source::Stdin));
        assert!(matches!(Source::from_arg("/tmp/x"), Source::File(p) if p == Path::new("/tmp/x")));
    }

    #[test]
    fn test_tail_reads_only_appended_whole_lines() {
        let path = std::env::temp_dir().join(format!("skyburst-tail-{}.jsonl", std::process::id()));
        std::fs::write(&path, "{\"command\":\"clear\"}\n").unwrap();
        let mut tail = Tail::at_end(&path).unwrap();
        assert!(tail.read_new().unwrap().is_empty());

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        write!(f, "{{\"command\":\"finale\"}}\n{{\"command\":").unwrap();
        f.flush().unwrap();
        assert_eq!(tail.read_new().unwrap(), vec![r#"{"command":"finale"}"#]);

        writeln!(f, "\"clear\"}}").unwrap();
        f.flush().unwrap();
        assert_eq!(tail.read_new().unwrap(), vec![r#"{"command":"clear"}"#]);

        std::fs::write(&path, "{\"command\":\"finale\"}\n").unwrap();
        assert_eq!(tail.read_new().unwrap(), vec![r#"{"command":"finale"}"#]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(
            decode_line(b"{\"command\":\"clear\"}\r", "test").as_deref(),
            Some(r#"{"command":"clear"}"#)
        );
        assert_eq!(decode_line(b"\xff\xfe", "test"), None);
    }

    #[test]
    fn test_tail_skips_lines_that_are_not_utf8() {
        let path = std::env::temp_dir().join(format!("skyburst-bytes-{}.jsonl", std::process::id()));
        std::fs::write(&path, "").unwrap();
        let mut tail = Tail::at_end(&path).unwrap();

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"\xff\xfe garbage\n").unwrap();
        f.flush().unwrap();
        assert!(tail.read_new().unwrap().is_empty());

        writeln!(f, "{{\"command\":\"finale\"}}").unwrap();
        f.flush().unwrap();
        assert_eq!(tail.read_new().unwrap(), vec![r#"{"command":"finale"}"#]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_forward_stops_when_receiver_drops() {
        let (tx, rx) = mpsc::channel();
        let lines = vec![r#"{"command":"finale"}"#.to_string(), "junk".to_string()];
        assert!(forward(&lines, &tx));
        assert_eq!(rx.try_recv(), Ok(Command::Finale));
        drop(rx);
        assert!(!forward(&lines, &tx));
    }
}
