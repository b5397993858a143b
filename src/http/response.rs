//! # Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas y convertirlas a bytes para el socket.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! HELLO
//! ```
//!
//! El servidor nunca agrega `Content-Length`: el cliente sabe que terminó
//! el body porque se cierra la conexión.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use http_dispatch::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("HELLO");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::error::{ParseError, Result};
use super::grammar::{self, is_field_char, is_tchar};
use super::request::Headers;
use super::status::StatusCode;
use super::version::Version;
use std::io::Read;

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: Version,

    /// Código numérico de tres dígitos
    status: u16,

    /// `None` omite el texto pero conserva el espacio antes del CRLF
    reason: Option<String>,

    /// `None` si no hay ninguna línea de header
    headers: Option<Headers>,

    /// `None` si no hay body
    body: Option<Vec<u8>>,
}

impl Response {
    pub(crate) fn from_parts(
        version: Version,
        status: u16,
        reason: Option<String>,
        headers: Option<Headers>,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            version,
            status,
            reason,
            headers,
            body,
        }
    }

    /// Crea una respuesta HTTP/1.1 con la reason phrase canónica del código
    ///
    /// Por defecto, la respuesta no tiene headers ni body.
    pub fn new(status: StatusCode) -> Self {
        Self::from_parts(
            Version::HTTP_1_1,
            status.as_u16(),
            Some(status.reason_phrase().to_string()),
            None,
            None,
        )
    }

    /// Crea una respuesta con un código arbitrario y reason opcional
    ///
    /// El código tiene que tener exactamente tres dígitos (100-999). En la
    /// reason, CR, LF y demás bytes de control se reemplazan por espacios;
    /// una reason vacía equivale a no tenerla.
    ///
    /// # Ejemplo
    /// ```
    /// use http_dispatch::http::Response;
    ///
    /// let response = Response::with_status(299, None).unwrap();
    /// assert_eq!(response.to_bytes(), b"HTTP/1.1 299 \r\n\r\n");
    ///
    /// assert!(Response::with_status(7, None).is_err());
    /// ```
    pub fn with_status(status: u16, reason: Option<&str>) -> Result<Self> {
        if !(100..=999).contains(&status) {
            return Err(ParseError::InvalidStatusCode(status.to_string()));
        }
        let reason = reason.filter(|r| !r.is_empty()).map(field_value);
        Ok(Self::from_parts(Version::HTTP_1_1, status, reason, None, None))
    }

    /// Crea una respuesta 200 con `Content-Type: text/plain`
    pub fn text(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// Crea una respuesta 200 con `Content-Type: application/json`
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Cambia la versión del status line
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Agrega un header. Si ya existe, se sobrescribe.
    ///
    /// Los caracteres que no son `tchar` en el nombre pasan a `_`, y CR, LF
    /// y demás bytes de control en el valor pasan a espacio: un header nunca
    /// puede partirse en dos líneas.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(field_name(name), field_value(value));
        self
    }

    /// Establece el cuerpo desde un string
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes. Un body vacío equivale a no tener body.
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    /// Parsea una respuesta completa desde bytes en memoria
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        grammar::parse_response(buffer)
    }

    /// Parsea una respuesta leyendo de un stream hasta su final
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        grammar::parse_response(reader)
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n` (o `HTTP/1.1 200 \r\n` sin reason)
    /// - Headers: `Header-Name: Value\r\n`, en el orden del mapa
    /// - Línea vacía: `\r\n`
    /// - Body: bytes sin ninguna recodificación
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        let status_line = format!("{} {} ", self.version, self.status);
        result.extend_from_slice(status_line.as_bytes());
        if let Some(reason) = &self.reason {
            encode_latin1(reason, &mut result);
        }
        result.extend_from_slice(b"\r\n");

        if let Some(headers) = &self.headers {
            for (name, value) in headers {
                encode_latin1(name, &mut result);
                result.extend_from_slice(b": ");
                encode_latin1(value, &mut result);
                result.extend_from_slice(b"\r\n");
            }
        }

        result.extend_from_slice(b"\r\n");

        if let Some(body) = &self.body {
            result.extend_from_slice(body);
        }

        result
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Código de estado numérico
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(name))
            .map(|s| s.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Nombre de header con solo caracteres `tchar`
fn field_name(name: &str) -> String {
    name.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if is_tchar(b) => c,
            _ => '_',
        })
        .collect()
}

/// Texto de header o reason sin bytes de control. Los caracteres fuera de
/// Latin-1 se dejan: `encode_latin1` los escribe como `?`.
fn field_value(text: &str) -> String {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if !is_field_char(b) => ' ',
            _ => c,
        })
        .collect()
}

/// Escribe un string como ISO-8859-1: un byte por carácter.
///
/// Es la inversa de cómo el parser convierte bytes de headers a `char`, así
/// que los bytes obs-text (0x80-0xFF) salen iguales a como entraron.
/// Caracteres fuera de Latin-1 se escriben como `?`.
fn encode_latin1(text: &str, out: &mut Vec<u8>) {
    out.extend(text.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')));
}
