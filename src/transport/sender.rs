//! Traits and implementations for sending serialized simulation data.
//!
//! - `Sender` is the byte-sink interface.
//! - `FileSender` appends one record per line; `NullSender` drops everything.

use std::fs::File;
use std::io::{Error as IoError, Write};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

use super::serializer::SerializationError;

/// Error types that can occur during data transport (sending).
#[derive(Error, Debug)]
pub enum TransportError {
    /// An I/O error occurred (e.g., writing to a file).
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
    /// An error occurred during serialization before sending.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerializationError),
    /// A shared sender handle was poisoned by a panicking writer.
    #[error("Runtime error: {0}")]
    RuntimeError(String),
    /// An error occurred due to invalid transport configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Base trait for sending serialized data.
///
/// Requires `Send + Sync` so a boxed sender can live in an ECS resource.
pub trait Sender: Send + Sync {
    /// Sends the provided byte slice to the destination.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the send operation fails.
    fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Flushes any internal buffers.
    fn flush(&self) -> Result<(), TransportError>;
}

/// Sender implementation that writes data to a file.
///
/// Each call to `send` appends the data followed by a newline character.
#[derive(Clone)]
pub struct FileSender {
    file: Arc<Mutex<File>>,
}

impl FileSender {
    /// Creates the file if it doesn't exist, truncates it if it does.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::IoError` if the file cannot be created or opened.
    pub fn new(file_path: &str) -> Result<Self, TransportError> {
        if file_path.is_empty() {
            return Err(TransportError::ConfigurationError(
                "File sender requires a non-empty output_path".to_string(),
            ));
        }
        let file = File::create(file_path)?;
        info!("Initialized FileSender for path: {}", file_path);
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>, TransportError> {
        self.file
            .lock()
            .map_err(|_| TransportError::RuntimeError("File mutex poisoned".to_string()))
    }
}

impl Sender for FileSender {
    fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut file_guard = self.lock()?;
        file_guard.write_all(data)?;
        file_guard.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), TransportError> {
        self.lock()?.flush()?;
        Ok(())
    }
}

/// A sender implementation that does nothing.
/// Useful for disabling data transport via configuration.
#[derive(Clone)]
pub struct NullSender;

impl Sender for NullSender {
    fn send(&self, _data: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
