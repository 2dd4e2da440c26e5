//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en el puerto configurado
//! 2. Acepta conexiones en el thread principal
//! 3. Entrega cada conexión a un pool fijo de workers
//! 4. Cada worker lee, despacha y responde un request, y cierra el socket

pub mod connection;
pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::ServerContext;
pub use pool::WorkerPool;
pub use tcp::Server;
