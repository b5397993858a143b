//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread de larga vida acepta conexiones y cada conexión aceptada se
//! procesa en su propio thread nuevo:
//!
//! ```text
//! accept → parse → lookup(path) → handler(method) → to_bytes → write → close
//! ```
//!
//! - Sin pool ni cola: un thread por conexión, sin límite.
//! - Sin timeouts: un cliente que deja de enviar bytes retiene su thread.
//! - Una sola petición por conexión. El cliente marca el fin del body
//!   cerrando su lado de escritura.
//! - Si algo falla (I/O, gramática, path sin handler, método no soportado)
//!   la conexión se cierra sin escribir ningún byte y el error solo queda
//!   en el log del operador.

use crate::config::Config;
use crate::http::{ParseError, Request};
use crate::router::{HandlerError, HandlerRegistry};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Puerto por defecto del builder
pub const DEFAULT_PORT: u16 = 80;

/// Host por defecto del builder (todas las interfaces IPv4)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Errores del ciclo de vida del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server is already running")]
    AlreadyRunning,

    #[error("previous accept loop is still alive; call join() before restarting")]
    NotJoined,

    #[error("failed to spawn accept thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("accept thread panicked")]
    AcceptThreadPanicked,
}

/// Motivo por el que una conexión terminó sin respuesta
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid request: {0}")]
    Parse(#[from] ParseError),

    #[error("no handler registered for path {0}")]
    RouteNotFound(String),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Servidor HTTP/1.1 con un thread por conexión
pub struct Server {
    host: String,
    port: u16,
    registry: Arc<HandlerRegistry>,

    /// Running/Stopped. El accept loop lo consulta una vez por iteración.
    running: Arc<AtomicBool>,

    local_addr: Option<SocketAddr>,
    accept_thread: Option<JoinHandle<()>>,
}

/// Builder del servidor
///
/// # Ejemplo
/// ```
/// use http_dispatch::router::HandlerRegistry;
/// use http_dispatch::server::Server;
///
/// let server = Server::builder()
///     .port(8080)
///     .registry(HandlerRegistry::builder().build())
///     .build();
/// assert!(!server.is_running());
/// ```
#[derive(Debug)]
pub struct ServerBuilder {
    host: String,
    port: u16,
    registry: HandlerRegistry,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            registry: HandlerRegistry::default(),
        }
    }
}

impl ServerBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Server {
        Server {
            host: self.host,
            port: self.port,
            registry: Arc::new(self.registry),
            running: Arc::new(AtomicBool::new(false)),
            local_addr: None,
            accept_thread: None,
        }
    }
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Crea el servidor con host y puerto de la configuración
    pub fn from_config(config: &Config, registry: HandlerRegistry) -> Self {
        Self::builder()
            .host(&config.host)
            .port(config.port)
            .registry(registry)
            .build()
    }

    /// Abre el socket y lanza el accept loop en su propio thread
    ///
    /// Retorna en cuanto el socket está escuchando. Con puerto 0 el sistema
    /// elige uno libre; la dirección real es el valor de retorno.
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }
        // Un loop detenido sigue vivo hasta que su accept() retorna
        let previous_alive = self.accept_thread.as_ref().map(|h| !h.is_finished());
        match previous_alive {
            Some(true) => return Err(ServerError::NotJoined),
            Some(false) => self.join()?,
            None => {}
        }

        let address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        // Cada arranque tiene su propio flag: un stop() nunca queda pisado
        // por un start() posterior
        self.running = Arc::new(AtomicBool::new(true));

        let registry = Arc::clone(&self.registry);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("accept-loop".to_string())
            .spawn(move || accept_loop(listener, registry, running))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ServerError::Spawn(e)
            })?;

        info!(
            address = %local_addr,
            routes = ?self.registry.paths(),
            "servidor escuchando, un thread por conexión"
        );

        self.local_addr = Some(local_addr);
        self.accept_thread = Some(handle);
        Ok(local_addr)
    }

    /// Pide al accept loop que termine
    ///
    /// No interrumpe un `accept()` en curso: el loop sale después de la
    /// próxima conexión entrante. Los workers en vuelo siguen hasta el final.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("stop solicitado, el accept loop sale en la próxima iteración");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Dirección real en la que escucha (después de `start`)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Bloquea hasta que el accept loop termine
    pub fn join(&mut self) -> Result<(), ServerError> {
        match self.accept_thread.take() {
            Some(handle) => handle.join().map_err(|_| ServerError::AcceptThreadPanicked),
            None => Ok(()),
        }
    }
}

/// Loop de aceptación. Cada conexión va a un thread nuevo.
fn accept_loop(listener: TcpListener, registry: Arc<HandlerRegistry>, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "nueva conexión (spawning thread)");
                let registry = Arc::clone(&registry);
                let spawned = thread::Builder::new()
                    .name(format!("conn-{}", peer))
                    .spawn(move || {
                        if let Err(e) = handle_connection(stream, &registry) {
                            warn!(%peer, error = %e, "conexión cerrada sin respuesta");
                        }
                    });
                if let Err(e) = spawned {
                    error!(%peer, error = %e, "no se pudo crear el thread de la conexión");
                }
            }
            Err(e) => {
                error!(error = %e, "error al aceptar conexión");
            }
        }
    }
    info!("accept loop detenido");
}

/// Procesa una conexión completa: un request, una respuesta
///
/// En caso de error no se escribe nada; al soltar el stream se cierra.
pub(crate) fn handle_connection(
    stream: TcpStream,
    registry: &HandlerRegistry,
) -> Result<(), ConnectionError> {
    // El lexer se queda con su propio handle y lo suelta al llegar a EOF
    let reader = stream.try_clone()?;
    let request = Request::read_from(reader)?;

    let path = request.path();
    debug!(method = %request.method(), path, "request parseado");

    let handler = registry
        .lookup(path)
        .ok_or_else(|| ConnectionError::RouteNotFound(path.to_string()))?;
    let response = handler.handle(&request)?;

    let mut stream = stream;
    stream.write_all(&response.to_bytes())?;
    stream.flush()?;
    // El peer pudo haber cerrado ya; el drop cierra igual
    let _ = stream.shutdown(Shutdown::Both);

    debug!(
        method = %request.method(),
        path,
        status = response.status(),
        "respuesta enviada"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Response, StatusCode};
    use crate::router::{Handler, HandlerResult, Route};
    use std::io::Read;
    use std::time::Duration;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    fn ping_handler(_req: &Request) -> Response {
        Response::new(StatusCode::Ok).with_body("OK")
    }

    fn echo_handler(req: &Request) -> Response {
        Response::new(StatusCode::Ok).with_body_bytes(req.body().unwrap_or_default().to_vec())
    }

    struct Broken;

    impl Handler for Broken {
        fn path(&self) -> &str {
            "/broken"
        }

        fn get(&self, _req: &Request) -> HandlerResult {
            Err(HandlerError::Failed("backend unavailable".to_string()))
        }
    }

    fn registry() -> HandlerRegistry {
        HandlerRegistry::builder()
            .register(Route::new("/ping").on_get(ping_handler))
            .register(Route::new("/echo").on_post(echo_handler))
            .register(Broken)
            .build()
    }

    /// Acepta una conexión, la procesa y retorna el resultado junto con lo
    /// que recibió el cliente
    fn exchange(raw: &[u8]) -> (Result<(), ConnectionError>, Vec<u8>) {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let registry = registry();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &registry)
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        // Si el servidor cierra sin responder puede llegar un RST en vez de EOF
        let mut buf = Vec::new();
        let _ = client.read_to_end(&mut buf);

        (t.join().unwrap(), buf)
    }

    #[test]
    fn test_handle_connection_ping_ok() {
        let (result, bytes) = exchange(b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n");
        assert!(result.is_ok());
        assert_eq!(bytes, b"HTTP/1.1 200 OK\r\n\r\nOK");
    }

    #[test]
    fn test_handle_connection_query_ignored_for_routing() {
        let (result, bytes) = exchange(b"GET /ping?verbose=1 HTTP/1.1\r\n\r\n");
        assert!(result.is_ok());
        assert!(bytes.starts_with(b"HTTP/1.1 200 OK"));
    }

    #[test]
    fn test_handle_connection_echo_body() {
        let (result, bytes) = exchange(b"POST /echo HTTP/1.1\r\n\r\n{\"a\": 1}");
        assert!(result.is_ok());
        assert_eq!(bytes, b"HTTP/1.1 200 OK\r\n\r\n{\"a\": 1}");
    }

    #[test]
    fn test_handle_connection_route_not_found() {
        let (result, bytes) = exchange(b"GET /missing HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(ConnectionError::RouteNotFound(p)) if p == "/missing"));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_handle_connection_not_implemented() {
        let (result, bytes) = exchange(b"DELETE /ping HTTP/1.1\r\n\r\n");
        assert!(matches!(
            result,
            Err(ConnectionError::Handler(HandlerError::NotImplemented { .. }))
        ));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_handle_connection_handler_failed() {
        let (result, bytes) = exchange(b"GET /broken HTTP/1.1\r\n\r\n");
        assert!(matches!(
            result,
            Err(ConnectionError::Handler(HandlerError::Failed(ref msg))) if msg == "backend unavailable"
        ));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let (result, bytes) = exchange(b"\x00\x01\x02\x03garbage");
        assert!(matches!(result, Err(ConnectionError::Parse(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let registry = registry();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &registry)
        });

        // Cliente que conecta y cierra sin mandar datos
        drop(TcpStream::connect(addr).unwrap());

        let result = t.join().unwrap();
        assert!(matches!(
            result,
            Err(ConnectionError::Parse(ParseError::EmptyToken("method")))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let server = Server::builder().build();
        assert_eq!(server.port, DEFAULT_PORT);
        assert_eq!(server.host, DEFAULT_HOST);
        assert!(server.registry().is_empty());
        assert!(server.local_addr().is_none());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        let server = Server::from_config(&config, registry());
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 0);
        assert_eq!(server.registry().len(), 3);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut server = Server::builder().host("127.0.0.1").port(0).build();
        let addr = server.start().unwrap();
        assert!(matches!(server.start(), Err(ServerError::AlreadyRunning)));

        server.stop();
        // Conexión para destrabar el accept() pendiente
        drop(TcpStream::connect(addr).unwrap());
        server.join().unwrap();
    }

    fn get_ping(addr: SocketAddr) -> Vec<u8> {
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        client.write_all(b"GET /ping HTTP/1.1\r\n\r\n").unwrap();
        client.shutdown(Shutdown::Write).unwrap();
        let mut buf = Vec::new();
        let _ = client.read_to_end(&mut buf);
        buf
    }

    #[test]
    fn test_restart_before_join_is_rejected() {
        let mut server = Server::builder().host("127.0.0.1").port(0).registry(registry()).build();
        let old = server.start().unwrap();
        server.stop();

        // El loop viejo sigue bloqueado en accept(); no se puede arrancar otro
        assert!(matches!(server.start(), Err(ServerError::NotJoined)));
        assert!(!server.is_running());

        // La conexión que destraba el accept() se atiende y el loop sale
        assert_eq!(get_ping(old), b"HTTP/1.1 200 OK\r\n\r\nOK");
        server.join().unwrap();

        // El puerto del loop detenido quedó liberado
        assert!(TcpStream::connect_timeout(&old, Duration::from_millis(500)).is_err());
    }

    #[test]
    fn test_restart_after_join() {
        let mut server = Server::builder().host("127.0.0.1").port(0).registry(registry()).build();
        let first = server.start().unwrap();
        server.stop();
        drop(TcpStream::connect(first).unwrap());
        server.join().unwrap();

        let second = server.start().unwrap();
        assert!(server.is_running());
        assert_eq!(server.local_addr(), Some(second));
        assert_eq!(get_ping(second), b"HTTP/1.1 200 OK\r\n\r\nOK");

        // El segundo stop detiene el segundo loop
        server.stop();
        assert!(!server.is_running());
        drop(TcpStream::connect(second).unwrap());
        server.join().unwrap();
        assert!(TcpStream::connect_timeout(&second, Duration::from_millis(500)).is_err());
    }

    #[test]
    fn test_restart_reaps_finished_loop() {
        let mut server = Server::builder().host("127.0.0.1").port(0).registry(registry()).build();
        let first = server.start().unwrap();
        server.stop();
        drop(TcpStream::connect(first).unwrap());

        // Sin join() explícito: start() espera a que el loop viejo termine
        let mut attempts = 0;
        let second = loop {
            match server.start() {
                Ok(addr) => break addr,
                Err(ServerError::NotJoined) if attempts < 100 => {
                    attempts += 1;
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        };
        assert_eq!(get_ping(second), b"HTTP/1.1 200 OK\r\n\r\nOK");

        server.stop();
        drop(TcpStream::connect(second).unwrap());
        server.join().unwrap();
    }

    #[test]
    fn test_bind_error() {
        let taken = ephemeral_listener();
        let port = taken.local_addr().unwrap().port();

        let mut server = Server::builder().host("127.0.0.1").port(port).build();
        assert!(matches!(server.start(), Err(ServerError::Bind { .. })));
        assert!(!server.is_running());
    }
}
