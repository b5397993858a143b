//! # Errores de Parsing
//! src/http/error.rs
//!
//! Cualquier desviación de la gramática aborta el parsing completo del
//! mensaje. No hay recuperación ni reintentos.

use thiserror::Error;

/// Errores que pueden ocurrir durante el parsing de un mensaje HTTP
#[derive(Debug, Error)]
pub enum ParseError {
    /// Fallo de I/O al llenar el buffer del lexer
    #[error("I/O error while reading HTTP message: {0}")]
    Io(#[from] std::io::Error),

    /// Se esperaba un byte concreto y llegó otro
    #[error("unexpected byte {found:#04x}, expected {expected:?}")]
    UnexpectedByte { expected: char, found: u8 },

    /// El stream terminó antes de completar el mensaje
    #[error("unexpected end of stream while parsing {0}")]
    UnexpectedEof(&'static str),

    /// Un token obligatorio quedó vacío
    #[error("expected {0}, found nothing")]
    EmptyToken(&'static str),

    /// Método fuera del conjunto soportado
    #[error("unsupported HTTP method: {0}")]
    UnknownMethod(String),

    /// Versión HTTP mal formada
    #[error("invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// Código de estado que no son tres dígitos
    #[error("invalid status code: {0:?}")]
    InvalidStatusCode(String),

    /// El request-target no es un URI válido
    #[error("invalid request target {target:?}: {source}")]
    InvalidUri {
        target: String,
        #[source]
        source: http::uri::InvalidUri,
    },
}

impl ParseError {
    /// Indica si el error viene del transporte y no de la gramática
    pub fn is_io(&self) -> bool {
        matches!(self, ParseError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
