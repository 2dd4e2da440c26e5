//! # Errores del Servidor
//! src/error.rs
//!
//! Errores que pueden escapar de una conexión o del arranque del servidor.
//! El parsing de requests nunca produce errores: un request malformado
//! se marca como inválido y se responde 400.

use thiserror::Error;

/// Alias de `Result` para operaciones del servidor
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errores del servidor web
#[derive(Debug, Error)]
pub enum ServerError {
    /// Error de I/O sobre el socket o el filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No se pudo hacer bind al puerto configurado
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuración inválida
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// El pool de workers ya no acepta trabajo
    #[error("Worker pool is shut down")]
    PoolClosed,

    /// Falló la actualización de la tabla de parámetros
    #[error("Params log update failed: {0}")]
    ParamsLog(String),
}
