//! # Módulo HTTP
//!
//! Parsing de requests y framing de respuestas HTTP/1.x, escrito a mano:
//!
//! - Validación de formato y extracción de método, target y headers
//! - Decodificación de query strings (y bodies de POST, con la misma rutina)
//! - Respuestas con `Content-Length` o `Transfer-Encoding: chunked`
//! - Tabla fija de status codes
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 13\r\n
//! Content-Type: text/html\r\n
//! \r\n
//! <h1>hi!</h1>
//! ```
//!
//! Solo se leen los headers `Referer`, `User-Agent`, `Content-Length`
//! (en POST) y la extensión no estándar `chunked: yes`.

pub mod query;     // Decodificación de parámetros
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use request::ParsedRequest;
pub use response::ResponseWriter;
pub use status::StatusCode;
