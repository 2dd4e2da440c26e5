//! # Pool de Workers
//! src/server/pool.rs
//!
//! Número fijo de threads que sacan trabajos de una cola compartida.
//! La cola no tiene límite: si todos los workers están ocupados, las
//! conexiones nuevas esperan su turno.
//!
//! ```text
//! accept loop ──execute()──► [ cola mpsc ] ──► worker-0
//!                                         ├──► worker-1
//!                                         └──► worker-N
//! ```
//!
//! Un panic dentro de un trabajo se captura y se loguea; el worker sigue
//! vivo. `shutdown` cierra la cola sin esperar a los trabajos en curso.

use crate::error::{Result, ServerError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Trabajo a ejecutar en un worker
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pool de threads con cola ilimitada
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Vec<Worker>,
}

struct Worker {
    /// Se mantiene solo para que el thread tenga dueño; no se hace join
    _handle: JoinHandle<()>,
}

impl WorkerPool {
    /// Crea un pool con `size` workers (al menos 1)
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ServerError::Config("Worker pool size must be >= 1".to_string()));
        }

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(id, Arc::clone(&receiver))?);
        }

        debug!(size, "Worker pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers,
        })
    }

    /// Encola un trabajo
    ///
    /// Falla con [`ServerError::PoolClosed`] después de `shutdown`.
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(Box::new(job)).map_err(|_| ServerError::PoolClosed),
            None => Err(ServerError::PoolClosed),
        }
    }

    /// Deja de aceptar trabajo; los workers terminan al vaciar la cola
    pub fn shutdown(&self) {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.take().is_some() {
            debug!(size = self.workers.len(), "Worker pool shut down");
        }
    }

}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Worker {
    fn spawn(id: usize, receiver: Arc<Mutex<Receiver<Job>>>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("worker-{id}"))
            .spawn(move || loop {
                // El lock se suelta antes de ejecutar el trabajo
                let message = receiver.lock().unwrap_or_else(PoisonError::into_inner).recv();

                match message {
                    Ok(job) => {
                        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!(worker = id, "Job panicked, worker continues");
                        }
                    }
                    // La cola se cerró
                    Err(_) => break,
                }
            })?;

        Ok(Self { _handle: handle })
    }
}
