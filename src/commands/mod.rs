//! # Handlers de Ejemplo
//! src/commands/mod.rs
//!
//! Handlers que registra el binario:
//!
//! - `/`: saludo en texto plano (GET)
//! - `/ping`: `OK` (GET)
//! - `/echo`: devuelve el body recibido (POST, PUT)
//! - `/json`: valida y normaliza un body JSON (POST, PUT)
//! - `/status`: estado del servidor en JSON (GET)

use crate::http::{Request, Response, StatusCode};
use crate::router::{Handler, HandlerError, HandlerRegistry, HandlerResult, Route};
use serde::Serialize;

/// Handler para /
pub fn hello_handler(_req: &Request) -> Response {
    Response::text("HELLO").with_header("Content-Encoding", "UTF-8")
}

/// Handler para /ping
///
/// Sin headers: `HTTP/1.1 200 OK\r\n\r\nOK`
pub fn ping_handler(_req: &Request) -> Response {
    Response::new(StatusCode::Ok).with_body("OK")
}

/// Handler para /echo
///
/// Devuelve el body tal cual, con el mismo `Content-Type` si vino uno.
/// Sin body responde 204.
pub fn echo_handler(req: &Request) -> Response {
    let Some(body) = req.body() else {
        return Response::new(StatusCode::NoContent);
    };
    let response = Response::new(StatusCode::Ok).with_body_bytes(body.to_vec());
    match req.header("Content-Type") {
        Some(content_type) => response.with_header("Content-Type", content_type),
        None => response,
    }
}

/// Cuerpo de la respuesta de /status
#[derive(Debug, Serialize)]
struct Status<'a> {
    status: &'a str,
    version: &'a str,
    method: &'a str,
    query: Option<&'a str>,
}

/// Handler para /status
///
/// # Ejemplo de response
/// ```json
/// {"status":"running","version":"0.1.0","method":"GET","query":null}
/// ```
pub fn status_handler(req: &Request) -> Response {
    let status = Status {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        method: req.method().as_str(),
        query: req.query(),
    };
    match serde_json::to_string(&status) {
        Ok(body) => Response::json(&body),
        Err(_) => Response::new(StatusCode::InternalServerError),
    }
}

/// Recurso /json: devuelve el body JSON re-serializado en forma compacta
///
/// Un body ausente o que no es JSON válido es un fallo del handler, y la
/// conexión se cierra sin respuesta como cualquier otro error.
pub struct JsonEcho;

impl JsonEcho {
    fn normalize(&self, req: &Request) -> HandlerResult {
        let body = req
            .body()
            .ok_or_else(|| HandlerError::Failed("empty JSON body".to_string()))?;
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| HandlerError::Failed(format!("invalid JSON body: {}", e)))?;
        let compact = serde_json::to_string(&value)
            .map_err(|e| HandlerError::Failed(format!("JSON serialization: {}", e)))?;
        Ok(Response::json(&compact))
    }
}

impl Handler for JsonEcho {
    fn path(&self) -> &str {
        "/json"
    }

    fn post(&self, req: &Request) -> HandlerResult {
        self.normalize(req)
    }

    fn put(&self, req: &Request) -> HandlerResult {
        self.normalize(req)
    }
}

/// Registro con todos los handlers de ejemplo
pub fn default_registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .register(Route::new("/").on_get(hello_handler))
        .register(Route::new("/ping").on_get(ping_handler))
        .register(Route::new("/echo").on_post(echo_handler).on_put(echo_handler))
        .register(Route::new("/status").on_get(status_handler))
        .register(JsonEcho)
        .build()
}
