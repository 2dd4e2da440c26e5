//! # Archivos servidos
//! src/storage/files.rs
//!
//! El servidor solo resuelve y valida el path (ver
//! [`ServerConfig::contains`](crate::config::ServerConfig::contains));
//! leer bytes y tamaños es responsabilidad de un `FileStore`.

use std::fs;
use std::io;
use std::path::Path;

/// Acceso de solo lectura al contenido servido
pub trait FileStore: Send + Sync {
    /// ¿Existe un archivo servible en `path`?
    fn exists(&self, path: &Path) -> bool;

    /// Contenido completo del archivo
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Tamaño en bytes
    fn size(&self, path: &Path) -> io::Result<u64>;
}

/// `FileStore` sobre el filesystem local
///
/// Los directorios no cuentan como existentes: pedir uno da 404.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileStore;

impl FileStore for FsFileStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }
}
