//! # Worker de Conexión
//! src/server/connection.rs
//!
//! Un ciclo request/response por conexión:
//!
//! ```text
//! leer headers ─► ParsedRequest ─► ¿válido? ─no─► 400
//!                                     │
//!                                     └─sí─► GET / POST / HEAD / TRACE / otro(501)
//! ```
//!
//! Cualquier error no manejado durante el despacho termina en un 500 si
//! todavía se puede responder. El socket se cierra en todas las salidas.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::http::query::url_decode;
use crate::http::{ParsedRequest, ResponseWriter, StatusCode};
use crate::storage::{FileStore, FsFileStore, HtmlParamLogger, ParamLogger};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const CRLF: &str = "\r\n";

/// Dependencias compartidas por todas las conexiones
#[derive(Clone)]
pub struct ServerContext {
    pub config: Arc<ServerConfig>,
    pub files: Arc<dyn FileStore>,
    pub params_log: Arc<dyn ParamLogger>,
}

impl ServerContext {
    /// Contexto con filesystem local y `params_info.html` bajo el root
    pub fn new(config: ServerConfig) -> Self {
        let params_log = HtmlParamLogger::in_root(&config.root_directory);
        Self {
            config: Arc::new(config),
            files: Arc::new(FsFileStore),
            params_log: Arc::new(params_log),
        }
    }

    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = files;
        self
    }

    pub fn with_param_logger(mut self, params_log: Arc<dyn ParamLogger>) -> Self {
        self.params_log = params_log;
        self
    }

    /// Actualiza el log de parámetros; un fallo no afecta la respuesta
    fn record_params(&self, request: &ParsedRequest) {
        if !request.should_record_params() {
            return;
        }
        if let Err(e) = self.params_log.record(request.query_params()) {
            warn!(error = %e, "Could not update params log");
        }
    }
}

/// Atiende una conexión aceptada y la cierra
pub fn handle_connection(stream: TcpStream, ctx: &ServerContext) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    {
        let mut reader = BufReader::new(&stream);
        let mut writer = ResponseWriter::new(&stream);
        serve(&mut reader, &mut writer, ctx, &peer);
        // reader y writer se sueltan aquí, antes de cerrar
    }

    if let Err(e) = stream.shutdown(Shutdown::Write) {
        debug!(peer = %peer, error = %e, "Socket already closed");
    }
}

/// Un ciclo completo sobre un reader/writer cualquiera
pub fn serve<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut ResponseWriter<W>,
    ctx: &ServerContext,
    peer: &str,
) {
    let start = Instant::now();

    let raw = match read_request_text(reader) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(peer = %peer, "Connection closed before sending a request");
            return;
        }
        Err(e) => {
            error!(peer = %peer, error = %e, "Failed to read request");
            let mut request = ParsedRequest::parse("", &ctx.config);
            let _ = writer.send_error(StatusCode::InternalServerError, &mut request);
            return;
        }
    };

    let mut request = ParsedRequest::parse(&raw, &ctx.config);
    debug!("HTTP Request:\n{}", raw);

    if !request.is_valid() {
        info!(peer = %peer, "Malformed request");
        let _ = writer.send_error(StatusCode::BadRequest, &mut request);
        return;
    }

    info!(
        peer = %peer,
        method = %request.method(),
        target = %request.target_path().display(),
        "Request"
    );
    ctx.record_params(&request);

    match dispatch(reader, writer, &mut request, ctx) {
        Ok(status) => {
            info!(
                peer = %peer,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Response sent"
            );
        }
        Err(e) => {
            error!(peer = %peer, error = %e, "Request failed");
            let _ = writer.send_error(StatusCode::InternalServerError, &mut request);
        }
    }
}

/// Despacha por método y retorna el status enviado
fn dispatch<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut ResponseWriter<W>,
    request: &mut ParsedRequest,
    ctx: &ServerContext,
) -> Result<StatusCode> {
    match request.method() {
        "GET" => serve_file(writer, request, ctx),
        "POST" => {
            let body = read_entity_body(reader, request.content_length())?;
            request.merge_body_params(&url_decode(&body));
            ctx.record_params(request);
            serve_file(writer, request, ctx)
        }
        "HEAD" => serve_head(writer, request, ctx),
        "TRACE" => {
            writer.send_trace(request)?;
            Ok(StatusCode::Ok)
        }
        _ => {
            writer.send_error(StatusCode::NotImplemented, request)?;
            Ok(StatusCode::NotImplemented)
        }
    }
}

/// El recurso está dentro del root y existe
fn is_servable(request: &ParsedRequest, ctx: &ServerContext) -> bool {
    let path = request.target_path();
    ctx.config.contains(path) && ctx.files.exists(path)
}

/// GET y POST: 200 con el contenido del archivo, o 404
fn serve_file<W: Write>(
    writer: &mut ResponseWriter<W>,
    request: &mut ParsedRequest,
    ctx: &ServerContext,
) -> Result<StatusCode> {
    if !is_servable(request, ctx) {
        writer.send_error(StatusCode::NotFound, request)?;
        return Ok(StatusCode::NotFound);
    }

    let content = ctx.files.read(request.target_path())?;
    request.set_content(content);
    writer.send(StatusCode::Ok, request)?;
    Ok(StatusCode::Ok)
}

/// HEAD: mismo chequeo que GET, reporta el tamaño sin leer el archivo
fn serve_head<W: Write>(
    writer: &mut ResponseWriter<W>,
    request: &mut ParsedRequest,
    ctx: &ServerContext,
) -> Result<StatusCode> {
    if !is_servable(request, ctx) {
        writer.send_error(StatusCode::NotFound, request)?;
        return Ok(StatusCode::NotFound);
    }

    let size = ctx.files.size(request.target_path())?;
    request.set_content_length(size as usize);
    writer.send(StatusCode::Ok, request)?;
    Ok(StatusCode::Ok)
}

/// Lee líneas hasta una línea vacía o EOF y las normaliza a CRLF
///
/// El texto resultante siempre termina en `\r\n\r\n`. Retorna `None` si
/// la conexión se cerró sin enviar ni un byte.
pub fn read_request_text<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut text = String::new();
    let mut line = Vec::new();
    let mut received_any = false;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        received_any = true;

        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        if line.is_empty() {
            break;
        }

        text.push_str(&String::from_utf8_lossy(&line));
        text.push_str(CRLF);
    }

    if !received_any {
        return Ok(None);
    }
    if !text.ends_with("\r\n\r\n") {
        text.push_str(CRLF);
    }
    Ok(Some(text))
}

/// Lee hasta `length` bytes del body (menos si el cliente cierra antes)
pub fn read_entity_body<R: Read>(reader: &mut R, length: usize) -> std::io::Result<String> {
    let mut body = Vec::with_capacity(length.min(64 * 1024));
    reader.by_ref().take(length as u64).read_to_end(&mut body)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}
