//! # Construcción de Respuestas HTTP
//!
//! Escribe una respuesta completa sobre cualquier `Write` (el socket en
//! producción, un `Vec<u8>` en tests).
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 11\r\n            (o Transfer-Encoding: chunked)
//! Content-Type: text/html\r\n
//! \r\n
//! hello world
//! ```
//!
//! En modo chunked el body va en trozos de 1000 bytes, cada uno precedido
//! por su largo en hexadecimal, y termina con `0\r\n\r\n`.
//!
//! ## Flag de error
//!
//! El [`ParsedRequest`] lleva un flag de un solo uso. Si falla la escritura
//! de una respuesta normal se marca el flag y se intenta un único 500; si
//! ese también falla solo se loguea. Una respuesta de error con el flag ya
//! marcado se suprime.

use super::{ParsedRequest, StatusCode};
use crate::error::Result;
use std::io::Write;
use tracing::{debug, error, warn};

const CRLF: &str = "\r\n";

/// Tamaño de cada trozo en modo chunked
pub const CHUNK_SIZE: usize = 1000;

/// Escritor de respuestas sobre un sink
pub struct ResponseWriter<W: Write> {
    sink: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Envía la respuesta con el contenido actual del request
    ///
    /// Si la escritura falla y todavía no hubo error, marca el flag e
    /// intenta un 500 una sola vez.
    pub fn send(&mut self, status: StatusCode, request: &mut ParsedRequest) -> Result<()> {
        match self.write_response(status, request) {
            Ok(()) => Ok(()),
            Err(e) if !request.error_flag_set() => {
                request.set_error_flag();
                warn!(status = status.as_u16(), error = %e, "Response write failed, attempting 500");

                request.prepare_error_body(StatusCode::InternalServerError);
                self.write_response(StatusCode::InternalServerError, request)
                    .inspect_err(|e| error!(error = %e, "Failed to send 500 response"))
            }
            Err(e) => Err(e),
        }
    }

    /// Envía una respuesta de error con body `"<code> <reason>"` en texto plano
    ///
    /// No hace nada si ya se inició una respuesta de error para este request.
    pub fn send_error(&mut self, status: StatusCode, request: &mut ParsedRequest) -> Result<()> {
        if request.error_flag_set() {
            debug!(status = status.as_u16(), "Error response suppressed, one was already sent");
            return Ok(());
        }

        request.set_error_flag();
        request.prepare_error_body(status);
        self.write_response(status, request)
            .inspect_err(|e| error!(status = status.as_u16(), error = %e, "Failed to send error response"))
    }

    /// Responde un TRACE: 200 con el request crudo como body
    pub fn send_trace(&mut self, request: &mut ParsedRequest) -> Result<()> {
        request.prepare_trace_body();
        self.send(StatusCode::Ok, request)
    }

    /// Escribe status line, headers y body, y hace flush
    fn write_response(&mut self, status: StatusCode, request: &ParsedRequest) -> Result<()> {
        let header = response_header(status, request);
        self.sink.write_all(header.as_bytes())?;

        if !request.is_head() {
            if request.is_chunked() {
                write_chunked(&mut self.sink, request.content())?;
            } else {
                self.sink.write_all(request.content())?;
            }
        }

        self.sink.flush()?;
        debug!("HTTP Response:\n{}", header);
        Ok(())
    }

    /// Recupera el sink (útil en tests)
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Status line + headers + línea vacía
pub fn response_header(status: StatusCode, request: &ParsedRequest) -> String {
    let mut header = format!("HTTP/1.1 {}{CRLF}", status);

    if request.is_chunked() {
        header.push_str(&format!("Transfer-Encoding: chunked{CRLF}"));
    } else {
        header.push_str(&format!("Content-Length: {}{CRLF}", request.content_length()));
    }

    header.push_str(&format!("Content-Type: {}{CRLF}", request.content_type()));
    header.push_str(CRLF);
    header
}

/// Escribe `content` en trozos de [`CHUNK_SIZE`] más el trozo final vacío
pub fn write_chunked<W: Write>(sink: &mut W, content: &[u8]) -> std::io::Result<()> {
    for chunk in content.chunks(CHUNK_SIZE) {
        sink.write_all(format!("{:x}{CRLF}", chunk.len()).as_bytes())?;
        sink.write_all(chunk)?;
        sink.write_all(CRLF.as_bytes())?;
    }
    sink.write_all(format!("0{CRLF}{CRLF}").as_bytes())
}
