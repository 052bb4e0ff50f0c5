use crate::error::Result;
use serde_yaml::Mapping;
use std::io::Write;

const DOCUMENT_START: &[u8] = b"---\n";
const DOCUMENT_END: &[u8] = b"...\n";

/// Writes mappings as an explicit-boundary YAML document stream.
///
/// Each document is framed by `---` and `...` and serialized in block style, one field
/// per line. Key order is preserved, so the same input always produces the same bytes.
pub struct DocumentWriter<W: Write> {
    inner: W,
    documents: usize,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            documents: 0,
        }
    }

    pub fn write(&mut self, document: &Mapping) -> Result<()> {
        self.inner.write_all(DOCUMENT_START)?;
        serde_yaml::to_writer(&mut self.inner, document)?;
        self.inner.write_all(DOCUMENT_END)?;
        self.documents += 1;
        Ok(())
    }

    /// Number of documents written so far
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
