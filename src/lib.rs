//! # Web Server
//! src/lib.rs
//!
//! Servidor web HTTP/1.1 multihilo de archivos estáticos. Un thread acepta
//! conexiones y un pool fijo de workers las atiende, un request por
//! conexión.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: Archivo clave/valor, defaults y overrides de CLI
//! - `http`: Parsing de requests, query strings y framing de respuestas
//! - `server`: Listener TCP, pool de workers y ciclo por conexión
//! - `storage`: Lectura de archivos y la tabla de `params_info.html`
//! - `logging`: Inicialización de `tracing`
//! - `error`: Errores del servidor
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use webserver::config::ServerConfig;
//! use webserver::server::Server;
//!
//! let config = ServerConfig::new("/srv/www", 8080, "index.html", 4);
//! let server = Server::bind(config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el loop de accept");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod storage;

pub use error::{Result, ServerError};
