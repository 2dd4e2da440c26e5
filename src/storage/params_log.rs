//! # Log de Parámetros
//! src/storage/params_log.rs
//!
//! Cada GET/POST con parámetros reescribe la tabla de
//! `<root>/params_info.html`. Solo cambia lo que está entre `<table>` y
//! `</table>`; el resto del documento y los propios tags quedan intactos.
//! La tabla se sobrescribe, no se acumula.
//!
//! ```text
//! <table>
//!  <tr><th>Parameter Name</th><th>Parameter Value</th></tr>
//! <tr><td>a</td><td>1</td></tr>
//! </table>
//! ```

use crate::error::{Result, ServerError};
use crate::http::query::Params;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Nombre del documento dentro del root
pub const PARAMS_PAGE: &str = "params_info.html";

const HEADER_ROW: &str = " <tr><th>Parameter Name</th><th>Parameter Value</th></tr>\n";

/// Destino de los parámetros de cada request
pub trait ParamLogger: Send + Sync {
    /// Reemplaza la tabla registrada por `params`
    fn record(&self, params: &Params) -> Result<()>;
}

/// Reescribe la tabla de un documento HTML
pub struct HtmlParamLogger {
    path: PathBuf,
    table: Regex,
    /// Serializa la lectura-modificación-escritura entre workers
    lock: Mutex<()>,
}

impl HtmlParamLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            // Primer bloque <table>...</table>, multilínea
            table: Regex::new(r"(?s)(<table>)(.*?)(</table>)").expect("static regex"),
            lock: Mutex::new(()),
        }
    }

    /// Logger para `<root>/params_info.html`
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(PARAMS_PAGE))
    }

    /// Documento con la tabla reemplazada, o `None` si no hay tabla
    fn rewrite(&self, document: &str, params: &Params) -> Option<String> {
        let captures = self.table.captures(document)?;
        let inner = captures.get(2)?;

        let mut rewritten = String::with_capacity(document.len());
        rewritten.push_str(&document[..inner.start()]);
        rewritten.push('\n');
        rewritten.push_str(&table_rows(params));
        rewritten.push_str(&document[inner.end()..]);
        Some(rewritten)
    }
}

impl ParamLogger for HtmlParamLogger {
    fn record(&self, params: &Params) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let document = fs::read_to_string(&self.path)
            .map_err(|e| ServerError::ParamsLog(format!("{}: {}", self.path.display(), e)))?;

        let rewritten = self.rewrite(&document, params).ok_or_else(|| {
            ServerError::ParamsLog(format!("{}: no <table> block", self.path.display()))
        })?;

        fs::write(&self.path, rewritten)
            .map_err(|e| ServerError::ParamsLog(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), count = params.len(), "Params table updated");
        Ok(())
    }
}

/// Fila de encabezado + una fila por parámetro
fn table_rows(params: &Params) -> String {
    let mut rows = String::from(HEADER_ROW);
    for (key, value) in params {
        rows.push_str(&format!("<tr><td>{key}</td><td>{value}</td></tr>\n"));
    }
    rows
}
