//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Convierte el texto crudo de un request en un [`ParsedRequest`].
//! No hace I/O: el worker de conexión es quien lee del socket, escribe el
//! log de parámetros y decide la respuesta.
//!
//! ## Formato esperado
//!
//! ```text
//! GET /path?param1=value1&param2=value2 HTTP/1.1\r\n
//! Referer: http://localhost/\r\n
//! User-Agent: curl/8.0\r\n
//! chunked: yes\r\n
//! \r\n
//! ```
//!
//! El parsing es escaneo de texto, no una gramática. Cada regla vive en su
//! propia función para poder probarla por separado:
//!
//! 1. [`is_valid_format`] decide si el request es procesable (si no, 400).
//! 2. [`parse_request_line`] saca método y target de la primera línea.
//! 3. [`header_value`] busca un header por prefijo `Nombre:`.
//! 4. [`query::raw_query`] + [`query::merge_query_string`] sacan los parámetros.

use super::query::{self, Params};
use super::StatusCode;
use crate::config::ServerConfig;
use path_clean::PathClean;
use std::path::{Path, PathBuf};

const CRLF: &str = "\r\n";

/// Content type usado cuando la extensión no se reconoce (y en TRACE)
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Request de una conexión
///
/// Se construye una vez por conexión. Durante el despacho solo cambian el
/// contenido a enviar, su largo, el content type y el flag de error.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    /// Texto original del request (para TRACE y logs)
    raw_text: String,

    /// Resultado de la validación de formato
    is_valid: bool,

    /// Método tal como llegó (puede ser vacío o desconocido)
    method: String,

    /// Path absoluto normalizado del recurso pedido
    target_path: PathBuf,

    /// Parámetros de la query y, en POST, del body
    query_params: Params,

    referer: String,
    user_agent: String,

    /// El cliente pidió respuesta chunked (`chunked: yes`)
    chunked: bool,

    content_type: String,
    content_length: usize,
    content: Vec<u8>,

    /// Ya se inició una respuesta de error; evita recursión
    error_flag: bool,
}

impl ParsedRequest {
    /// Parsea un request crudo
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use webserver::config::ServerConfig;
    /// use webserver::http::ParsedRequest;
    ///
    /// let config = ServerConfig::new("/srv/site", 8080, "index.html", 4);
    /// let raw = "GET /page.html?num=10 HTTP/1.1\r\n\r\n";
    /// let request = ParsedRequest::parse(raw, &config);
    ///
    /// assert!(request.is_valid());
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.target_path().to_str(), Some("/srv/site/page.html"));
    /// assert_eq!(request.query_param("num"), Some("10"));
    /// assert_eq!(request.content_type(), "text/html");
    /// ```
    pub fn parse(raw_text: &str, config: &ServerConfig) -> Self {
        let mut request = Self {
            raw_text: raw_text.to_string(),
            is_valid: is_valid_format(raw_text),
            method: String::new(),
            target_path: config.root_directory.clone(),
            query_params: Params::new(),
            referer: String::new(),
            user_agent: String::new(),
            chunked: false,
            content_type: String::new(),
            content_length: 0,
            content: Vec::new(),
            error_flag: false,
        };

        if !request.is_valid {
            return request;
        }

        let (method, target) = parse_request_line(raw_text);
        request.method = method.to_string();
        if let Some(target) = target {
            request.target_path = resolve_target(target, config);
        }

        request.content_type = content_type_for(&request.target_path).to_string();
        request.referer = header_value(raw_text, "Referer").to_string();
        request.user_agent = header_value(raw_text, "User-Agent").to_string();
        request.chunked = header_value(raw_text, "chunked").eq_ignore_ascii_case("yes");

        if let Some(raw_query) = query::raw_query(raw_text) {
            query::merge_query_string(&mut request.query_params, raw_query);
        }

        if request.method.eq_ignore_ascii_case("POST") {
            request.content_length = header_value(raw_text, "Content-Length").parse().unwrap_or(0);
        }

        request
    }

    // === Accessors ===

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// Obtiene un parámetro específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn error_flag_set(&self) -> bool {
        self.error_flag
    }

    /// ¿Es un HEAD? En ese caso nunca se escribe body
    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }

    /// GET y POST con al menos un parámetro actualizan el log de parámetros
    pub fn should_record_params(&self) -> bool {
        let method_logs = self.method.eq_ignore_ascii_case("GET") || self.method.eq_ignore_ascii_case("POST");
        method_logs && !self.query_params.is_empty()
    }

    // === Mutaciones del despacho ===

    /// Agrega los pares de un body ya decodificado
    pub fn merge_body_params(&mut self, decoded_body: &str) {
        query::merge_query_string(&mut self.query_params, decoded_body);
    }

    /// Fija el payload a enviar; el largo declarado pasa a ser el del payload
    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content_length = content.len();
        self.content = content;
    }

    /// Fija el largo sin payload (usado por HEAD)
    pub fn set_content_length(&mut self, length: usize) {
        self.content_length = length;
    }

    /// Cambia el content type; un valor vacío se ignora
    pub fn set_content_type(&mut self, content_type: &str) {
        if !content_type.is_empty() {
            self.content_type = content_type.to_string();
        }
    }

    pub fn set_error_flag(&mut self) {
        self.error_flag = true;
    }

    /// Prepara el body de texto plano `"<code> <reason>"`
    pub fn prepare_error_body(&mut self, status: StatusCode) {
        self.set_content_type("text/plain");
        self.set_content(status.to_string().into_bytes());
    }

    /// Prepara el eco de TRACE: el request crudo como body
    pub fn prepare_trace_body(&mut self) {
        let echo = self.raw_text.clone().into_bytes();
        self.set_content(echo);
        self.set_content_type(DEFAULT_CONTENT_TYPE);
    }
}

/// Reglas de formato; todas deben cumplirse
///
/// 1. El texto no es vacío.
/// 2. Contiene `HTTP/`.
/// 3. Separado por `/` da al menos 3 segmentos.
/// 4. El segmento antes del primer `/` termina en espacio.
/// 5. Ese segmento no empieza con espacio ni es exactamente `/`.
///
/// # Ejemplo
/// ```
/// use webserver::http::request::is_valid_format;
/// assert!(is_valid_format("GET / HTTP/1.1\r\n\r\n"));
/// assert!(!is_valid_format("GET / \r\n\r\n"));
/// ```
pub fn is_valid_format(text: &str) -> bool {
    if text.is_empty() || !text.contains("HTTP/") {
        return false;
    }

    let mut segments: Vec<&str> = text.split('/').collect();
    // Segmentos vacíos al final no cuentan
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    if segments.len() < 3 {
        return false;
    }

    let leading = segments[0];
    leading.ends_with(' ') && !leading.starts_with(' ') && leading != "/"
}

/// Método y target crudo de la primera línea
///
/// El target es `None` si la línea tiene un solo token.
pub fn parse_request_line(text: &str) -> (&str, Option<&str>) {
    let first_line = text.split(CRLF).next().unwrap_or("");
    let mut tokens = first_line.split_whitespace();
    let method = tokens.next().unwrap_or("");
    (method, tokens.next())
}

/// Resuelve el target del request a un path bajo el root
///
/// - `""` o `"/"` exactos → página por defecto.
/// - `/algo?query` → `root/algo`; `/?query` queda en el root mismo.
/// - Cualquier otra cosa se resuelve tal cual relativa al root.
///
/// El resultado se normaliza léxicamente; puede quedar fuera del root
/// (p. ej. con `..`), eso lo rechaza el despacho con 404.
pub fn resolve_target(target: &str, config: &ServerConfig) -> PathBuf {
    if target.is_empty() || target == "/" {
        return config.default_page.clone();
    }

    let relative = match target.strip_prefix('/') {
        Some(rest) => rest.split('?').next().unwrap_or(""),
        None => target,
    };
    config.root_directory.join(relative).clean()
}

/// Valor del último header `name:` (sensible a mayúsculas), o `""`
///
/// # Ejemplo
/// ```
/// use webserver::http::request::header_value;
/// let raw = "GET / HTTP/1.1\r\nUser-Agent: a\r\nUser-Agent:  b \r\n\r\n";
/// assert_eq!(header_value(raw, "User-Agent"), "b");
/// assert_eq!(header_value(raw, "Referer"), "");
/// ```
pub fn header_value<'a>(text: &'a str, name: &str) -> &'a str {
    let prefix = format!("{name}:");
    text.split(CRLF)
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .last()
        .map(str::trim)
        .unwrap_or("")
}

/// Content type según la extensión del archivo pedido
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" => "text/html",
        "bmp" | "jpg" | "gif" | "png" | "jpeg" => "image",
        "ico" => "icon",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
