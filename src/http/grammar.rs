//! # Gramática de Mensajes HTTP/1.1
//! src/http/grammar.rs
//!
//! Parser descendente recursivo sobre un [`ByteLexer`]. Una sola pasada, sin
//! backtracking: la única anticipación es `fetch()` (un byte).
//!
//! ```text
//! request      = method SP uri SP version CRLF fields CRLF body
//! response     = version SP 3DIGIT SP [ reason ] CRLF fields CRLF body
//! fields       = *( field-name ":" OWS field-value OWS CRLF )
//! version      = "HTTP" "/" DIGIT "." DIGIT
//! body         = *OCTET            ; hasta el final del stream
//! ```
//!
//! No se usa `Content-Length` ni chunked: el body termina cuando el otro
//! extremo cierra su lado de la conexión.

use super::error::{ParseError, Result};
use super::lexer::ByteLexer;
use super::request::{Headers, Method, Request};
use super::response::Response;
use super::version::Version;
use http::Uri;
use std::io::Read;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const SP: u8 = b' ';
const HTAB: u8 = b'\t';

// === Clases de caracteres (RFC 7230) ===

/// `tchar`: letras, dígitos y ``! # $ % & ' * + - . ^ _ ` | ~``
pub fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

/// `vchar`: ASCII visible, 0x21-0x7E
pub fn is_vchar(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
}

/// `obs-text`: 0x80-0xFF
pub fn is_obs_text(b: u8) -> bool {
    b >= 0x80
}

/// Caracteres permitidos en un field-value y en la reason phrase
pub fn is_field_char(b: u8) -> bool {
    is_vchar(b) || is_obs_text(b) || b == HTAB || b == SP
}

/// Cualquier byte que no sea whitespace. Además de SP/HTAB/CR/LF cuenta
/// VT, FF y los separadores 0x1C-0x1F.
fn is_uri_char(b: u8) -> bool {
    !matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | 0x1C..=0x1F)
}

// === Entradas públicas ===

/// Parsea exactamente un request desde el stream
pub fn parse_request<R: Read>(reader: R) -> Result<Request> {
    let mut lexer = ByteLexer::new(reader)?;
    request(&mut lexer)
}

/// Parsea exactamente una respuesta desde el stream
pub fn parse_response<R: Read>(reader: R) -> Result<Response> {
    let mut lexer = ByteLexer::new(reader)?;
    response(&mut lexer)
}

// === Reglas ===

fn request<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Request> {
    let method = method(lexer)?;
    expect(lexer, SP)?;
    let uri = uri(lexer)?;
    expect(lexer, SP)?;
    let version = version(lexer)?;
    expect_crlf(lexer)?;
    let headers = headers(lexer)?;
    expect_crlf(lexer)?;
    let body = body(lexer)?;
    Ok(Request::new(method, uri, version, headers, body))
}

fn response<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Response> {
    let version = version(lexer)?;
    expect(lexer, SP)?;
    let status = status_code(lexer)?;
    expect(lexer, SP)?;
    let reason = reason(lexer)?;
    expect_crlf(lexer)?;
    let headers = headers(lexer)?;
    expect_crlf(lexer)?;
    let body = body(lexer)?;
    Ok(Response::from_parts(version, status, reason, headers, body))
}

fn method<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Method> {
    value(lexer, is_tchar, "method")?.parse()
}

/// El target se pasa byte a byte a `Uri`, sin decodificar
fn uri<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Uri> {
    let target = value_bytes(lexer, is_uri_char, "request target")?;
    let lossy = String::from_utf8_lossy(&target).into_owned();
    Uri::try_from(target).map_err(|source| ParseError::InvalidUri {
        target: lossy,
        source,
    })
}

fn version<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Version> {
    let word = value(lexer, is_tchar, "HTTP version")?;
    if word != "HTTP" {
        return Err(ParseError::InvalidVersion(word));
    }
    expect(lexer, b'/')?;
    let major = digit(lexer)?;
    expect(lexer, b'.')?;
    let minor = digit(lexer)?;
    Ok(Version::new(major, minor))
}

/// Un único dígito decimal de la versión
fn digit<R: Read>(lexer: &mut ByteLexer<R>) -> Result<u8> {
    match lexer.fetch() {
        Some(b) if b.is_ascii_digit() => {
            lexer.advance()?;
            Ok(b - b'0')
        }
        Some(b) => Err(ParseError::InvalidVersion(char::from(b).to_string())),
        None => Err(ParseError::UnexpectedEof("HTTP version")),
    }
}

/// Exactamente tres bytes, todos dígitos
fn status_code<R: Read>(lexer: &mut ByteLexer<R>) -> Result<u16> {
    let mut raw = String::with_capacity(3);
    for _ in 0..3 {
        let b = lexer.fetch().ok_or(ParseError::UnexpectedEof("status code"))?;
        raw.push(char::from(b));
        lexer.advance()?;
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidStatusCode(raw));
    }
    raw.parse::<u16>().map_err(|_| ParseError::InvalidStatusCode(raw))
}

/// Si lo siguiente es CR, la reason no existe (no es un string vacío)
fn reason<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Option<String>> {
    if lexer.fetch() == Some(CR) {
        return Ok(None);
    }
    value(lexer, is_field_char, "reason phrase").map(Some)
}

/// Si la primera línea después del start-line está vacía, no hay headers.
/// El CRLF que cierra el bloque lo consume quien llama.
fn headers<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Option<Headers>> {
    if lexer.fetch() == Some(CR) {
        return Ok(None);
    }
    let mut headers = Headers::new();
    while lexer.fetch() != Some(CR) {
        let (name, value) = header(lexer)?;
        headers.insert(name, value);
    }
    Ok(Some(headers))
}

fn header<R: Read>(lexer: &mut ByteLexer<R>) -> Result<(String, String)> {
    let name = value(lexer, is_tchar, "header field name")?;
    expect(lexer, b':')?;
    skip_ows(lexer)?;
    // field-value es greedy sobre SP/HTAB: el OWS final queda en el valor
    let field = value(lexer, is_field_char, "header field value")?;
    skip_ows(lexer)?;
    expect_crlf(lexer)?;
    Ok((name, field))
}

/// Todo lo que quede hasta el final del stream. Vacío equivale a sin body.
fn body<R: Read>(lexer: &mut ByteLexer<R>) -> Result<Option<Vec<u8>>> {
    let bytes = lexer.read_to_end()?;
    Ok(if bytes.is_empty() { None } else { Some(bytes) })
}

// === Primitivas ===

/// Acumula bytes mientras se cumpla el predicado. Un resultado vacío es un
/// error de gramática.
fn value_bytes<R: Read>(
    lexer: &mut ByteLexer<R>,
    predicate: impl Fn(u8) -> bool,
    what: &'static str,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(b) = lexer.fetch().filter(|&b| predicate(b)) {
        out.push(b);
        lexer.advance()?;
    }
    if out.is_empty() {
        return Err(ParseError::EmptyToken(what));
    }
    Ok(out)
}

/// Como `value_bytes`, pero cada byte se convierte a `char` tal cual
/// (ISO-8859-1), así los bytes obs-text sobreviven a la vuelta por
/// `Response::to_bytes`.
fn value<R: Read>(
    lexer: &mut ByteLexer<R>,
    predicate: impl Fn(u8) -> bool,
    what: &'static str,
) -> Result<String> {
    let bytes = value_bytes(lexer, predicate, what)?;
    Ok(bytes.into_iter().map(char::from).collect())
}

/// Consume exactamente el byte esperado o falla
fn expect<R: Read>(lexer: &mut ByteLexer<R>, expected: u8) -> Result<()> {
    match lexer.fetch() {
        Some(b) if b == expected => lexer.advance(),
        Some(found) => Err(ParseError::UnexpectedByte {
            expected: char::from(expected),
            found,
        }),
        None => Err(ParseError::UnexpectedEof("HTTP message")),
    }
}

/// CR seguido de LF. Un LF suelto no se tolera.
fn expect_crlf<R: Read>(lexer: &mut ByteLexer<R>) -> Result<()> {
    expect(lexer, CR)?;
    expect(lexer, LF)
}

/// OWS: cero o más SP/HTAB, descartados
fn skip_ows<R: Read>(lexer: &mut ByteLexer<R>) -> Result<()> {
    while matches!(lexer.fetch(), Some(SP | HTAB)) {
        lexer.advance()?;
    }
    Ok(())
}
