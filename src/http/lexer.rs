//! # Lexer de Bytes
//! src/http/lexer.rs
//!
//! Lector incremental con buffer sobre el stream de entrada de una conexión.
//! Expone dos primitivas:
//!
//! - `fetch()`: byte actual sin consumirlo (`None` al final del stream)
//! - `advance()`: avanza el cursor un byte, rellenando el buffer si hace falta
//!
//! El relleno es bloqueante: si el cliente deja de enviar bytes, el thread
//! que parsea queda esperando.

use super::error::Result;
use std::io::{ErrorKind, Read};

/// Capacidad del buffer interno
pub const BUFFER_SIZE: usize = 1024;

/// Lexer sobre cualquier `Read` (un `TcpStream`, un slice de bytes, ...)
pub struct ByteLexer<R: Read> {
    /// Stream de entrada. Se suelta (y por lo tanto se cierra) al llegar a EOF
    reader: Option<R>,

    buffer: Box<[u8; BUFFER_SIZE]>,

    /// Cantidad de bytes válidos en `buffer`
    filled: usize,

    /// Posición actual dentro de `buffer`
    position: usize,

    /// Fin del stream alcanzado. Una vez activo nunca se vuelve a leer
    eof: bool,
}

impl<R: Read> ByteLexer<R> {
    /// Crea el lexer y hace el primer llenado del buffer
    ///
    /// # Errores
    ///
    /// Cualquier error de I/O en el primer llenado aborta el parsing.
    pub fn new(reader: R) -> Result<Self> {
        let mut lexer = Self {
            reader: Some(reader),
            buffer: Box::new([0u8; BUFFER_SIZE]),
            filled: 0,
            position: 0,
            eof: false,
        };
        lexer.refill()?;
        Ok(lexer)
    }

    /// Retorna el byte actual sin consumirlo
    ///
    /// Llamadas repetidas sin `advance()` retornan siempre lo mismo.
    pub fn fetch(&self) -> Option<u8> {
        if self.eof {
            None
        } else {
            Some(self.buffer[self.position])
        }
    }

    /// Indica si ya se alcanzó el final del stream
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Avanza el cursor un byte
    ///
    /// Si el cursor sale del buffer se hace un relleno bloqueante.
    /// Avanzar estando en EOF no tiene efecto.
    pub fn advance(&mut self) -> Result<()> {
        if self.eof {
            return Ok(());
        }
        self.position += 1;
        if self.position >= self.filled {
            self.refill()?;
        }
        Ok(())
    }

    /// Consume todos los bytes restantes hasta el final del stream
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut rest = Vec::new();
        while !self.eof {
            rest.extend_from_slice(&self.buffer[self.position..self.filled]);
            self.position = self.filled;
            self.refill()?;
        }
        Ok(rest)
    }

    /// Rellena el buffer desde el stream
    ///
    /// Una lectura de cero bytes activa `eof` para siempre y suelta el stream.
    fn refill(&mut self) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            self.eof = true;
            return Ok(());
        };

        let read = loop {
            match reader.read(&mut self.buffer[..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.close();
                    return Err(e.into());
                }
            }
        };

        self.position = 0;
        self.filled = read;
        if read == 0 {
            self.close();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.eof = true;
        self.filled = 0;
        self.position = 0;
        self.reader = None;
    }
}
