//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes, un thread por conexión
//! 3. Parsea el request y lo despacha al handler de su path
//! 4. Escribe la respuesta y cierra la conexión

pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::{ConnectionError, Server, ServerBuilder, ServerError};
