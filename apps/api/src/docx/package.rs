use std::io::{Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::docx::error::DocxError;

/// The OPC zip container underneath a `.docx` file.
///
/// Parts are kept as raw bytes in archive order so a rewritten package keeps
/// everything it arrived with (styles, relationships, media) untouched.
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Self {
        Package::default()
    }

    /// Reads every part of a zip archive into memory.
    pub fn read<R: Read + Seek>(reader: R) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((file.name().to_string(), data));
        }
        Ok(Package { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Replaces a part's bytes, or appends the part if it is new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Part names in archive order. Exercised by tests; kept public as part
    /// of the container API.
    #[allow(dead_code)]
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Writes all parts back out as a deflate-compressed zip archive.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<(), DocxError> {
        let mut zip = ZipWriter::new(writer);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        zip.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_round_trip_preserves_parts_and_order() {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        package.set_part("word/document.xml", b"<w:document/>".to_vec());
        package.set_part("word/styles.xml", b"<w:styles/>".to_vec());

        let mut buffer = Cursor::new(Vec::new());
        package.write(&mut buffer).unwrap();
        buffer.set_position(0);

        let reread = Package::read(buffer).unwrap();
        let names: Vec<&str> = reread.part_names().collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "word/document.xml", "word/styles.xml"]
        );
        assert_eq!(reread.part("word/styles.xml"), Some(b"<w:styles/>".as_slice()));
    }

    #[test]
    fn test_set_part_replaces_existing_bytes() {
        let mut package = Package::new();
        package.set_part("word/document.xml", b"old".to_vec());
        package.set_part("word/document.xml", b"new".to_vec());
        assert_eq!(package.part("word/document.xml"), Some(b"new".as_slice()));
        assert_eq!(package.part_names().count(), 1);
    }

    #[test]
    fn test_read_rejects_garbage() {
        let result = Package::read(Cursor::new(b"this is not a zip".to_vec()));
        assert!(matches!(result, Err(DocxError::Zip(_))));
    }
}
