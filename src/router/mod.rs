//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea paths exactos a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → HandlerRegistry::lookup(path) → Handler::handle(method) → Response
//! ```
//!
//! - La búsqueda es por igualdad exacta del path (sin prefijos ni comodines)
//!   y la query string no participa.
//! - Cada handler expone cuatro operaciones (GET, POST, PUT, DELETE). Las que
//!   no implementa retornan [`HandlerError::NotImplemented`].
//! - El registro se construye una vez antes de arrancar el servidor y después
//!   es de solo lectura, por eso se comparte entre threads sin locks.

use crate::http::{Method, Request, Response};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Función handler: recibe un Request y retorna una Response
pub type HandlerFn = fn(&Request) -> Response;

/// Errores que un handler puede señalar
#[derive(Debug, Error)]
pub enum HandlerError {
    /// El handler existe pero no soporta el método pedido
    #[error("{method} is not implemented for {path}")]
    NotImplemented { method: Method, path: String },

    /// El handler falló al procesar el request
    #[error("handler failed: {0}")]
    Failed(String),
}

pub type HandlerResult = Result<Response, HandlerError>;

/// Un recurso registrado en un path, con una operación por método
///
/// Todas las operaciones tienen una implementación por defecto que
/// retorna `NotImplemented`; basta con sobrescribir las que se soporten.
///
/// # Ejemplo
/// ```
/// use http_dispatch::http::{Request, Response};
/// use http_dispatch::router::{Handler, HandlerResult};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn path(&self) -> &str {
///         "/"
///     }
///
///     fn get(&self, _req: &Request) -> HandlerResult {
///         Ok(Response::text("HELLO"))
///     }
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Path exacto en el que se registra
    fn path(&self) -> &str;

    fn get(&self, _req: &Request) -> HandlerResult {
        Err(self.not_implemented(Method::GET))
    }

    fn post(&self, _req: &Request) -> HandlerResult {
        Err(self.not_implemented(Method::POST))
    }

    fn put(&self, _req: &Request) -> HandlerResult {
        Err(self.not_implemented(Method::PUT))
    }

    fn delete(&self, _req: &Request) -> HandlerResult {
        Err(self.not_implemented(Method::DELETE))
    }

    /// Despacha a la operación correspondiente al método del request
    fn handle(&self, req: &Request) -> HandlerResult {
        match req.method() {
            Method::GET => self.get(req),
            Method::POST => self.post(req),
            Method::PUT => self.put(req),
            Method::DELETE => self.delete(req),
        }
    }

    fn not_implemented(&self, method: Method) -> HandlerError {
        HandlerError::NotImplemented {
            method,
            path: self.path().to_string(),
        }
    }
}

/// Handler armado con funciones sueltas, un slot opcional por método
///
/// # Ejemplo
/// ```
/// use http_dispatch::http::{Request, Response};
/// use http_dispatch::router::Route;
///
/// fn ping(_req: &Request) -> Response {
///     Response::text("OK")
/// }
///
/// let route = Route::new("/ping").on_get(ping);
/// ```
#[derive(Clone)]
pub struct Route {
    path: String,
    get: Option<HandlerFn>,
    post: Option<HandlerFn>,
    put: Option<HandlerFn>,
    delete: Option<HandlerFn>,
}

impl Route {
    /// Crea una ruta sin ninguna operación
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            get: None,
            post: None,
            put: None,
            delete: None,
        }
    }

    pub fn on_get(mut self, handler: HandlerFn) -> Self {
        self.get = Some(handler);
        self
    }

    pub fn on_post(mut self, handler: HandlerFn) -> Self {
        self.post = Some(handler);
        self
    }

    pub fn on_put(mut self, handler: HandlerFn) -> Self {
        self.put = Some(handler);
        self
    }

    pub fn on_delete(mut self, handler: HandlerFn) -> Self {
        self.delete = Some(handler);
        self
    }

    fn call(&self, method: Method, req: &Request) -> HandlerResult {
        self.slot(method)
            .map(|handler| handler(req))
            .ok_or_else(|| self.not_implemented(method))
    }

    fn slot(&self, method: Method) -> Option<HandlerFn> {
        match method {
            Method::GET => self.get,
            Method::POST => self.post,
            Method::PUT => self.put,
            Method::DELETE => self.delete,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: Vec<&str> = [Method::GET, Method::POST, Method::PUT, Method::DELETE]
            .into_iter()
            .filter(|m| self.slot(*m).is_some())
            .map(|m| m.as_str())
            .collect();
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("methods", &methods)
            .finish()
    }
}

impl Handler for Route {
    fn path(&self) -> &str {
        &self.path
    }

    fn get(&self, req: &Request) -> HandlerResult {
        self.call(Method::GET, req)
    }

    fn post(&self, req: &Request) -> HandlerResult {
        self.call(Method::POST, req)
    }

    fn put(&self, req: &Request) -> HandlerResult {
        self.call(Method::PUT, req)
    }

    fn delete(&self, req: &Request) -> HandlerResult {
        self.call(Method::DELETE, req)
    }
}

/// Registro inmutable path → handler
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Busca el handler para un path exacto
    pub fn lookup(&self, path: &str) -> Option<&dyn Handler> {
        self.routes.get(path).map(|h| h.as_ref())
    }

    /// Paths registrados, ordenados (para logs)
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(|p| p.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}

/// Builder del registro. Registrar dos handlers en el mismo path deja el último.
#[derive(Default)]
pub struct RegistryBuilder {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl RegistryBuilder {
    /// Registra un handler en su path declarado
    pub fn register<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.routes.insert(handler.path().to_string(), Arc::new(handler));
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            routes: self.routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_handler(_req: &Request) -> Response {
        Response::json(r#"{"test": "ok"}"#)
    }

    fn hello_handler(_req: &Request) -> Response {
        Response::text("hello")
    }

    struct OnlyDelete;

    impl Handler for OnlyDelete {
        fn path(&self) -> &str {
            "/items"
        }

        fn delete(&self, _req: &Request) -> HandlerResult {
            Ok(Response::with_status(204, None).unwrap())
        }
    }

    fn request(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = HandlerRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.lookup("/").is_none());
    }

    #[test]
    fn test_register_route() {
        let registry = HandlerRegistry::builder()
            .register(Route::new("/test").on_get(test_handler))
            .build();

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("/test").is_some());
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = HandlerRegistry::builder()
            .register(Route::new("/test").on_get(test_handler))
            .build();

        assert!(registry.lookup("/test/").is_none());
        assert!(registry.lookup("/tes").is_none());
        assert!(registry.lookup("/TEST").is_none());
        assert!(registry.lookup("/test/sub").is_none());
    }

    #[test]
    fn test_route_dispatches_by_method() {
        let route = Route::new("/hello").on_get(hello_handler).on_post(test_handler);

        let get = route.handle(&request(b"GET /hello HTTP/1.1\r\n\r\n")).unwrap();
        assert_eq!(get.body(), Some(&b"hello"[..]));

        let post = route.handle(&request(b"POST /hello HTTP/1.1\r\n\r\n")).unwrap();
        assert_eq!(post.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_route_missing_slot_is_not_implemented() {
        let route = Route::new("/hello").on_get(hello_handler);
        let err = route
            .handle(&request(b"PUT /hello HTTP/1.1\r\n\r\n"))
            .unwrap_err();

        assert!(matches!(
            err,
            HandlerError::NotImplemented { method: Method::PUT, ref path } if path == "/hello"
        ));
        assert_eq!(err.to_string(), "PUT is not implemented for /hello");
    }

    #[test]
    fn test_trait_defaults_are_not_implemented() {
        let handler = OnlyDelete;

        let deleted = handler.handle(&request(b"DELETE /items HTTP/1.1\r\n\r\n")).unwrap();
        assert_eq!(deleted.status(), 204);

        for raw in [
            &b"GET /items HTTP/1.1\r\n\r\n"[..],
            &b"POST /items HTTP/1.1\r\n\r\n"[..],
            &b"PUT /items HTTP/1.1\r\n\r\n"[..],
        ] {
            assert!(matches!(
                handler.handle(&request(raw)),
                Err(HandlerError::NotImplemented { .. })
            ));
        }
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = HandlerRegistry::builder()
            .register(Route::new("/x").on_get(test_handler))
            .register(Route::new("/x").on_get(hello_handler))
            .build();

        let response = registry
            .lookup("/x")
            .unwrap()
            .handle(&request(b"GET /x HTTP/1.1\r\n\r\n"))
            .unwrap();
        assert_eq!(response.body(), Some(&b"hello"[..]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_paths_sorted() {
        let registry = HandlerRegistry::builder()
            .register(Route::new("/b"))
            .register(Route::new("/a"))
            .register(OnlyDelete)
            .build();
        assert_eq!(registry.paths(), vec!["/a", "/b", "/items"]);
    }
}
