use std::fs::File;
use std::path::Path;

use crate::error::ExportError;

pub(crate) fn ensure_not_empty<T>(items: &[T]) -> Result<(), ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    Ok(())
}

pub(crate) fn create_output_file(path: impl AsRef<Path>) -> Result<File, ExportError> {
    let path = path.as_ref();
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
