//! # HTTP Dispatch
//! src/lib.rs
//!
//! Servidor HTTP/1.1 minimalista implementado desde cero: un lexer byte a
//! byte sobre el socket, un parser descendente recursivo, routing por path
//! exacto y un thread por conexión.
//!
//! ## Arquitectura
//!
//! - `http`: lexer, gramática, mensajes Request/Response y serialización
//! - `router`: trait `Handler` y registro inmutable path → handler
//! - `server`: accept loop y procesamiento de cada conexión
//! - `commands`: handlers de ejemplo que registra el binario
//! - `config`: configuración CLI / variables de entorno
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use http_dispatch::http::{Request, Response, StatusCode};
//! use http_dispatch::router::{HandlerRegistry, Route};
//! use http_dispatch::server::Server;
//!
//! fn ping(_req: &Request) -> Response {
//!     Response::new(StatusCode::Ok).with_body("OK")
//! }
//!
//! let registry = HandlerRegistry::builder()
//!     .register(Route::new("/ping").on_get(ping))
//!     .build();
//!
//! let mut server = Server::builder().port(8080).registry(registry).build();
//! server.start().expect("Error al iniciar servidor");
//! server.join().expect("accept loop");
//! ```

pub mod commands;
pub mod config;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
