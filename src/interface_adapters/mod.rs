// Interface adapters: HTTP backend client, its wire shapes and the system clock.

pub mod clients;
pub mod clock;
pub mod protocol;

pub use clients::HttpBackend;
pub use clock::SystemClock;
