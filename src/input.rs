use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

pub const CHUNK_SIZE: usize = 64 * 1024;

/// Elementary stream source: a file, or stdin when the path is "-".
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
    bytes_read: u64,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let input_path = input_path.as_ref();
        let is_pipe = is_pipe(input_path);

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path)
                .with_context(|| format!("Cannot open input {}", input_path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self {
            reader,
            is_pipe,
            bytes_read: 0,
        })
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Feeds the input to `callback` chunk by chunk until EOF or until the
    /// callback returns `Ok(false)`.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let n = match self.reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.bytes_read += n as u64;

            if !callback(&buffer[..n])? {
                break;
            }
        }

        Ok(())
    }
}

pub fn is_pipe(path: &Path) -> bool {
    path.as_os_str() == "-"
}
