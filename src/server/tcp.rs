//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! El thread principal solo acepta conexiones; cada conexión se entrega al
//! pool de workers. Un fallo al aceptar o encolar una conexión se loguea y
//! el loop sigue.

use super::connection::{handle_connection, ServerContext};
use super::pool::WorkerPool;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use std::net::{SocketAddr, TcpListener};
use tracing::{debug, error, info};

/// Servidor HTTP con pool de workers acotado
pub struct Server {
    context: ServerContext,
    listener: TcpListener,
    pool: WorkerPool,
}

impl Server {
    /// Hace bind al puerto configurado y arranca el pool
    pub fn bind(config: ServerConfig) -> Result<Self> {
        Self::bind_with(ServerContext::new(config))
    }

    /// Igual que [`Server::bind`] pero con dependencias propias
    pub fn bind_with(context: ServerContext) -> Result<Self> {
        let address = context.config.address();
        info!("Starting server on {}", address);

        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;
        let pool = WorkerPool::new(context.config.max_workers)?;

        info!(
            address = %address,
            root = %context.config.root_directory.display(),
            workers = context.config.max_workers,
            "Server listening"
        );

        Ok(Self {
            context,
            listener,
            pool,
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Loop de accept; solo retorna si el pool ya fue cerrado
    pub fn run(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Ok(peer) = stream.peer_addr() {
                        debug!(peer = %peer, "Connection accepted");
                    }

                    let context = self.context.clone();
                    let submitted = self.pool.execute(move || handle_connection(stream, &context));

                    match submitted {
                        Ok(()) => {}
                        Err(ServerError::PoolClosed) => {
                            info!("Worker pool closed, stopping accept loop");
                            return Err(ServerError::PoolClosed);
                        }
                        Err(e) => error!(error = %e, "Failed to dispatch connection"),
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }

        Ok(())
    }

    /// Cierra el pool: no entra trabajo nuevo y los workers no se esperan
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
