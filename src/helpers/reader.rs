use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

/// Seekable reader over either an open file or an in-memory upload
pub(crate) enum SourceReader {
    /// Local file reader
    File(BufReader<File>),
    /// Bytes handed over by the caller
    Memory(Cursor<Vec<u8>>),
}

impl SourceReader {
    pub(crate) fn from_path(path: &Path) -> std::io::Result<SourceReader> {
        let file = File::open(path)?;
        Ok(SourceReader::File(BufReader::new(file)))
    }

    pub(crate) fn from_bytes(data: Vec<u8>) -> SourceReader {
        SourceReader::Memory(Cursor::new(data))
    }

    /// Reads up to `N` leading bytes and rewinds to the start
    pub(crate) fn peek<const N: usize>(&mut self) -> std::io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(0))?;
        let mut magic = Vec::with_capacity(N);
        self.by_ref().take(N as u64).read_to_end(&mut magic)?;
        self.seek(SeekFrom::Start(0))?;
        Ok(magic)
    }

    /// Consumes the reader, returning the full content
    pub(crate) fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            SourceReader::File(mut reader) => {
                reader.seek(SeekFrom::Start(0))?;
                let mut data = Vec::new();
                reader.read_to_end(&mut data)?;
                Ok(data)
            }
            SourceReader::Memory(cursor) => Ok(cursor.into_inner()),
        }
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceReader::File(reader) => reader.read(buf),
            SourceReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceReader::File(reader) => reader.seek(pos),
            SourceReader::Memory(reader) => reader.seek(pos),
        }
    }
}
