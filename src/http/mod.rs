//! # Módulo HTTP
//!
//! Capa de protocolo HTTP/1.1 implementada desde cero:
//!
//! - `lexer`: lectura incremental byte a byte del socket
//! - `grammar`: parser descendente recursivo de requests y respuestas
//! - `request` / `response`: mensajes inmutables y serialización
//!
//! ## Limitaciones conocidas
//!
//! - Sin keep-alive: un request y una respuesta por conexión
//! - Sin `Content-Length` ni chunked: el body termina con el cierre del stream
//! - La versión solo admite un dígito por componente (`HTTP/10.1` falla)
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod request;
pub mod response;
pub mod status;
pub mod version;

// Re-exportamos los tipos principales para facilitar su uso
pub use error::ParseError;
pub use grammar::{parse_request, parse_response};
pub use lexer::ByteLexer;
pub use request::{Headers, Method, Request};
pub use response::Response;
pub use status::StatusCode;
pub use version::Version;
