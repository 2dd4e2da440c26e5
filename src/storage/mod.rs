//! # Almacenamiento
//! src/storage/mod.rs
//!
//! Capacidades externas que usa el despacho:
//! - `files`: lectura del contenido servido (`FileStore`)
//! - `params_log`: la tabla de parámetros en `params_info.html` (`ParamLogger`)
//!
//! Ambas son traits para poder sustituirlas en tests.

pub mod files;
pub mod params_log;

pub use files::{FileStore, FsFileStore};
pub use params_log::{HtmlParamLogger, ParamLogger, PARAMS_PAGE};
