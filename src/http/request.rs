//! # Requests HTTP/1.1
//! src/http/request.rs
//!
//! ## Formato de un Request HTTP/1.1
//!
//! ```text
//! POST /path/to/resource?param1=1 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! \r\n
//! {"param3": 3}
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD SP URI SP VERSION CRLF`
//! 2. **Headers**: Pares `Name: Value` (uno por línea), opcionales
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: todo lo que llegue hasta que el cliente cierre su lado
//!
//! Un `Request` es inmutable: solo lo construye el parser.

use super::error::{ParseError, Result};
use super::grammar;
use super::version::Version;
use http::Uri;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Headers de un mensaje. Claves sensibles a mayúsculas, el último gana.
pub type Headers = HashMap<String, String>;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// POST - Enviar datos a un recurso
    POST,

    /// PUT - Reemplazar un recurso
    PUT,

    /// DELETE - Eliminar un recurso
    DELETE,
}

impl Method {
    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    /// Comparación exacta: "get" no es un método válido
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            _ => Err(ParseError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representa un request HTTP parseado
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,

    /// Request-target tal como llegó (sin decodificar ni resolver)
    uri: Uri,

    version: Version,

    /// `None` si el request no trae ninguna línea de header
    headers: Option<Headers>,

    /// `None` si no llegó ningún byte después de la línea vacía
    body: Option<Vec<u8>>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        uri: Uri,
        version: Version,
        headers: Option<Headers>,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            method,
            uri,
            version,
            headers,
            body,
        }
    }

    /// Parsea un request completo desde bytes en memoria
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use http_dispatch::http::{Method, Request};
    ///
    /// let raw = b"GET /ping?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/ping");
    /// assert_eq!(request.header("Host"), Some("localhost"));
    /// assert!(request.body().is_none());
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        grammar::parse_request(buffer)
    }

    /// Parsea un request leyendo de un stream hasta su final
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        grammar::parse_request(reader)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path del URI, sin query string. Es la clave de routing.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Query string sin el `?`
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Obtiene un header específico (comparación exacta del nombre)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(name))
            .map(|s| s.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        self.body
            .as_ref()
            .and_then(|b| String::from_utf8(b.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::GET);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::DELETE);
        assert!(matches!(
            "PATCH".parse::<Method>(),
            Err(ParseError::UnknownMethod(m)) if m == "PATCH"
        ));
    }

    #[test]
    fn test_method_is_case_sensitive() {
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::PUT.to_string(), "PUT");
    }

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), Version::HTTP_1_1);
        assert!(request.headers().is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn test_path_and_query() {
        let request =
            Request::parse(b"GET /path/to/resource?param1=1&param2=2 HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(request.path(), "/path/to/resource");
        assert_eq!(request.query(), Some("param1=1&param2=2"));
        assert_eq!(request.uri().to_string(), "/path/to/resource?param1=1&param2=2");
    }

    #[test]
    fn test_body_string() {
        let request = Request::parse(b"POST /echo HTTP/1.1\r\n\r\nhola").unwrap();
        assert_eq!(request.body_string().as_deref(), Some("hola"));
    }

    #[test]
    fn test_header_lookup_is_case_sensitive() {
        let request = Request::parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(request.header("Host"), Some("x"));
        assert_eq!(request.header("host"), None);
    }
}
