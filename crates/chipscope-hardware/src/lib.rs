//! Transport abstraction for contactless chip identification.
//!
//! Detectors reach the tag through the [`Transport`] trait, wrapped in a
//! cancellable [`Session`]. Platform adapters implement the trait; this crate
//! ships [`MockTransport`], which answers from a script or a recorded
//! [`ScanFixture`].
//!
//! # Design
//!
//! - **Async-first**: native `async fn` in traits (Rust 1.90 + Edition 2024
//!   RPITIT), with [`AnyTransport`] for runtime dispatch.
//! - **Thread-safe**: transports are `Send + Sync`.
//! - **Cancellable**: every exchange and delay in a [`Session`] races its
//!   [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! # Error Handling
//!
//! Operations return [`Result<T>`] with [`TransportError`]. Only
//! [`TransportError::Rejected`] is recoverable; everything else ends the
//! session (see [`TransportError::is_fatal`]).
//!
//! # Example
//!
//! ```
//! use chipscope_core::RawTagReading;
//! use chipscope_hardware::{Channel, Exchange, MockTransport, ScanFixture, Session};
//!
//! #[tokio::main]
//! async fn main() -> chipscope_hardware::Result<()> {
//!     let reading = RawTagReading::new(vec![0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]).unwrap();
//!     let fixture = ScanFixture::new(reading)
//!         .exchange(Exchange::reply(Channel::NfcA, vec![0x60], vec![0x00, 0x04, 0x04]));
//!     let (transport, _handle) = MockTransport::from_fixture(fixture);
//!
//!     let mut session = Session::new(transport);
//!     let reply = session.transceive(Channel::NfcA, &[0x60]).await?;
//!     assert_eq!(reply[1], 0x04);
//!     session.finish().await?;
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod fixture;
pub mod mock;
pub mod session;
pub mod traits;

pub use devices::AnyTransport;
pub use error::{Result, TransportError};
pub use fixture::{Exchange, ExchangeFault, ScanFixture};
pub use mock::{MockTransport, MockTransportHandle};
pub use session::{Session, SessionId};
pub use traits::{Channel, Transport};
