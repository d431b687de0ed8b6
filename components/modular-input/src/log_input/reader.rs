// Local crates
use crate::log_input::models::FileState;

// External crates
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const READ_BUFFER_SIZE: usize = 16384;

/// Lines appended to a data file since the previous invocation.
///
/// Lines are read one at a time through a fixed-size buffer, so memory is
/// bounded by the longest line rather than by how far the file has grown.
/// Only complete (newline-terminated) lines are yielded; a trailing partial
/// line is left for the next run. [`NewLines::state`] is the position to store
/// once the caller is done, and only covers lines already yielded.
#[derive(Debug)]
pub struct NewLines {
    path: PathBuf,
    reader: BufReader<File>,
    inode: u64,
    offset: u64,
    line: Vec<u8>,
}

impl NewLines {
    /// Open `path` at the stored offset. The offset restarts at zero when the
    /// file was replaced (different inode) or truncated below it.
    pub fn open(path: &Path, previous: Option<&FileState>) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let inode = inode_of(&metadata);

        let start = match previous {
            Some(state) if state.inode == inode && state.offset <= metadata.len() => state.offset,
            Some(state) => {
                tracing::info!(
                    file = %path.display(),
                    previous_offset = state.offset,
                    "Data file rotated or truncated, reading from the start"
                );
                0
            }
            None => 0,
        };

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(start))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            inode,
            offset: start,
            line: Vec::new(),
        })
    }

    /// Read position after the last yielded line.
    pub fn state(&self) -> FileState {
        FileState {
            path: self.path.clone(),
            inode: self.inode,
            offset: self.offset,
        }
    }
}

impl Iterator for NewLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            let read = match self.reader.read_until(b'\n', &mut self.line) {
                Ok(read) => read,
                Err(e) => return Some(Err(e)),
            };
            if read == 0 || self.line.last() != Some(&b'\n') {
                return None;
            }
            self.offset += read as u64;

            let line = &self.line[..read - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if !line.is_empty() {
                return Some(Ok(String::from_utf8_lossy(line).into_owned()));
            }
        }
    }
}

#[cfg(unix)]
fn inode_of(metadata: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &fs::Metadata) -> u64 {
    0
}
