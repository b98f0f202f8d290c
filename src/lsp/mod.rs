//! Minimal Language Server Protocol client used to drive
//! `pyright-langserver --stdio` for symbol lookup.

pub mod client;
pub mod codec;
pub mod session;

pub use client::{LspClient, LspClientOptions};
pub use codec::{encode_message, read_message, write_message};
pub use session::{symbols_from_response, LspSession, VIRTUAL_DOCUMENT};
