//! Browser side of wacast: a persistent WhatsApp Web session over the
//! Chrome DevTools Protocol, and the composer locator that types into it.

pub mod launcher;
pub mod locator;
pub mod session;
pub mod transport;
