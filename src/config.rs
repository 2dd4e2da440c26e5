//! # Configuración del Servidor
//! src/config.rs
//!
//! La configuración vive en un archivo clave/valor (estilo `.properties`):
//!
//! ```text
//! # Server Configuration
//! port=8080
//! root=/home/user/www/lab/html
//! defaultPage=/home/user/www/lab/html/index.html
//! maxThreads=10
//! ```
//!
//! Si el archivo no existe se genera con los valores por defecto. Un valor
//! malformado no aborta la carga: esa clave vuelve a su default y se loguea.
//!
//! Desde la línea de comandos se puede indicar el archivo y sobrescribir
//! algunos valores:
//!
//! ```bash
//! ./webserver --config ./config.ini --port 9090 --max-threads 4
//! WEBSERVER_CONFIG=/etc/webserver.ini ./webserver
//! ```

use clap::Parser;
use path_clean::PathClean;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_WORKERS: usize = 10;
const DEFAULT_INDEX_PAGE: &str = "index.html";

/// Argumentos de línea de comandos
#[derive(Debug, Clone, Parser)]
#[command(name = "webserver")]
#[command(about = "Servidor web HTTP/1.1 multihilo")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Archivo de configuración clave/valor
    #[arg(short, long, default_value = "config.ini", env = "WEBSERVER_CONFIG")]
    pub config: PathBuf,

    /// Sobrescribe `port` del archivo
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Sobrescribe `root` del archivo
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Sobrescribe `maxThreads` del archivo
    #[arg(long = "max-threads")]
    pub max_threads: Option<usize>,

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "WEBSERVER_LOG")]
    pub log_level: String,
}

impl Cli {
    /// Carga el archivo indicado y aplica los overrides de la CLI
    pub fn resolve(&self) -> ServerConfig {
        let mut config = ServerConfig::load(&self.config);

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = &self.root {
            let old_root = config.root_directory.clone();
            config.root_directory = root.clean();
            // Si la página por defecto colgaba del root anterior, la movemos
            if let Ok(relative) = config.default_page.strip_prefix(&old_root) {
                config.default_page = config.root_directory.join(relative);
            }
        }
        if let Some(max_threads) = self.max_threads {
            if max_threads >= 1 {
                config.max_workers = max_threads;
            } else {
                warn!(max_threads, "Ignoring --max-threads below 1");
            }
        }

        config
    }
}

/// Configuración de solo lectura compartida por todas las conexiones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Puerto TCP de escucha
    pub port: u16,

    /// Directorio raíz: nada fuera de aquí se sirve
    pub root_directory: PathBuf,

    /// Página servida para `/` (path absoluto bajo el root)
    pub default_page: PathBuf,

    /// Tamaño del pool de workers
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let root = default_root();
        Self {
            port: DEFAULT_PORT,
            default_page: root.join(DEFAULT_INDEX_PAGE),
            root_directory: root,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

/// `$HOME/www/lab/html`, o el directorio actual si no hay HOME
fn default_root() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("/"));
    home.join("www").join("lab").join("html").clean()
}

impl ServerConfig {
    /// Crea una configuración explícita
    ///
    /// `default_page` relativo se resuelve contra `root`.
    pub fn new(root: impl AsRef<Path>, port: u16, default_page: impl AsRef<Path>, max_workers: usize) -> Self {
        let root_directory = root.as_ref().clean();
        let default_page = root_directory.join(default_page).clean();
        Self {
            port,
            root_directory,
            default_page,
            max_workers,
        }
    }

    /// Carga la configuración desde archivo
    ///
    /// Si no existe, escribe los defaults en `path` y los retorna.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(text) => {
                info!(path = %path.display(), "Loading configuration");
                Self::from_properties(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                info!(path = %path.display(), "Config file missing, generating defaults");
                if let Err(e) = fs::write(path, config.to_properties()) {
                    warn!(path = %path.display(), error = %e, "Failed to generate config file");
                }
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// Parsea el contenido de un archivo clave/valor
    ///
    /// Claves desconocidas se ignoran; valores inválidos caen al default.
    pub fn from_properties(text: &str) -> Self {
        let mut config = Self::default();
        let mut default_page: Option<String> = None;

        for (key, value) in parse_properties(text) {
            match key.as_str() {
                "port" => match value.parse::<u16>() {
                    Ok(port) => config.port = port,
                    Err(_) => warn!(value = %value, "Illegal port number, using default"),
                },
                "root" => {
                    if value.is_empty() {
                        warn!("Missing root path, using default");
                    } else {
                        config.root_directory = PathBuf::from(&value).clean();
                    }
                }
                "defaultPage" => {
                    if value.is_empty() {
                        warn!("Missing default page path, using default");
                    } else {
                        default_page = Some(value);
                    }
                }
                "maxThreads" => match value.parse::<usize>() {
                    Ok(n) if n >= 1 => config.max_workers = n,
                    _ => warn!(value = %value, "Illegal number of threads (must be at least 1), using default"),
                },
                _ => {}
            }
        }

        // La página por defecto se resuelve al final: depende del root
        config.default_page = match default_page {
            Some(page) => config.root_directory.join(page).clean(),
            None => config.root_directory.join(DEFAULT_INDEX_PAGE),
        };

        config
    }

    /// Serializa al formato del archivo de configuración
    pub fn to_properties(&self) -> String {
        format!(
            "# Server Configuration\nport={}\nroot={}\ndefaultPage={}\nmaxThreads={}\n",
            self.port,
            self.root_directory.display(),
            self.default_page.display(),
            self.max_workers
        )
    }

    /// Dirección de bind (todas las interfaces)
    pub fn address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Verifica que `path` esté dentro del directorio raíz
    ///
    /// Compara componente a componente después de normalizar, así
    /// `/root/../etc` no pasa por tener `/root` como prefijo textual.
    pub fn contains(&self, path: &Path) -> bool {
        path.clean().starts_with(&self.root_directory)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if !self.root_directory.is_absolute() {
            return Err(format!(
                "Root directory must be absolute: {}",
                self.root_directory.display()
            ));
        }
        if self.max_workers == 0 {
            return Err("Max workers must be >= 1".to_string());
        }
        if !self.contains(&self.default_page) {
            return Err(format!(
                "Default page must be under root: {}",
                self.default_page.display()
            ));
        }
        Ok(())
    }
}

/// Lee pares `clave=valor` o `clave: valor`; `#` y `!` comentan la línea
fn parse_properties(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let sep = line.find(['=', ':'])?;
            let key = line[..sep].trim().to_string();
            let value = line[sep + 1..].trim().to_string();
            Some((key, value))
        })
        .collect()
}
