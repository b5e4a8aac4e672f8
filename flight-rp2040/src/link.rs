//! UART command-link port.
//!
//! Reads line-based protocol messages from the pilot client and writes the
//! replies back on the same UART. One request in, one reply out; the
//! lockstep pairing itself is enforced by the task wiring in `main`.
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 8: TX (replies)
//! - GPIO 9: RX (requests)

use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};
use heapless::Vec;
use link_proto::{parse_request, LinkReply, LinkRequest, ParseError, Serialize, MAX_LINE_LENGTH};

/// Error type for link port operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum LinkError {
    /// UART framing error.
    Framing,
    /// A line exceeded the protocol's maximum length.
    BufferOverflow,
    /// Other UART transfer failure.
    Io,
    /// The line did not parse as a request.
    Protocol(ParseError),
}

/// Convert UART errors to [`LinkError`].
#[inline]
fn uart_error_to_link_error(e: UartError) -> LinkError {
    match e {
        UartError::Framing => LinkError::Framing,
        UartError::Overrun => LinkError::BufferOverflow,
        _ => LinkError::Io,
    }
}

/// UART port carrying the pilot command link.
pub struct LinkPort<'d> {
    rx: UartRx<'d, Async>,
    tx: UartTx<'d, Async>,
    buffer: Vec<u8, MAX_LINE_LENGTH>,
}

impl<'d> LinkPort<'d> {
    /// Create a port from a split UART.
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>, tx: UartTx<'d, Async>) -> Self {
        Self {
            rx,
            tx,
            buffer: Vec::new(),
        }
    }

    /// Receive and parse the next request line.
    ///
    /// # Errors
    ///
    /// Transfer errors and malformed lines; the caller logs and keeps
    /// listening, since a corrupt request must never become a command.
    pub async fn receive(&mut self) -> Result<LinkRequest, LinkError> {
        self.read_line().await?;
        parse_request(&self.buffer).map_err(LinkError::Protocol)
    }

    /// Serialize and send one reply line.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] if the transfer fails.
    pub async fn send(&mut self, reply: &LinkReply) -> Result<(), LinkError> {
        let mut buf = [0u8; link_proto::MAX_REPLY_SIZE];
        let len = reply.serialize(&mut buf).map_err(|_| LinkError::Io)?;
        self.tx
            .write(&buf[..len])
            .await
            .map_err(|_| LinkError::Io)
    }

    /// Read bytes until a newline is found or buffer is full.
    ///
    /// If a line exceeds the buffer capacity, the rest of the line is
    /// discarded to prevent cascading parse errors on subsequent reads.
    async fn read_line(&mut self) -> Result<(), LinkError> {
        self.buffer.clear();
        let mut byte = [0u8; 1];

        loop {
            self.rx
                .read(&mut byte)
                .await
                .map_err(uart_error_to_link_error)?;

            if byte[0] == b'\n' {
                return Ok(());
            }

            if self.buffer.push(byte[0]).is_err() {
                // Buffer overflow - discard rest of line until newline
                loop {
                    self.rx
                        .read(&mut byte)
                        .await
                        .map_err(uart_error_to_link_error)?;
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                return Err(LinkError::BufferOverflow);
            }
        }
    }
}
