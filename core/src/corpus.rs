use crate::{DocumentId, Error, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Read every regular file under `root` as one document.
///
/// Document ids are paths relative to `root` joined with `/`, returned in
/// ascending order.
pub fn load_directory<P: AsRef<Path>>(root: P) -> Result<Vec<(DocumentId, String)>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "corpus directory not found"),
        });
    }
    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let text = fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        documents.push((document_id(root, path), text));
    }
    documents.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::debug!(root = %root.display(), documents = documents.len(), "loaded corpus");
    Ok(documents)
}

fn document_id(root: &Path, path: &Path) -> DocumentId {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
