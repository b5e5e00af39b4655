//! TreeFS wire protocol: framing and request tokens.
//!
//! Two primitives make up the transport: [`send_frame`] and
//! [`recv_frame`], both operating on one connected stream socket. On top
//! of the frames, [`Request`] carries the `::`-delimited command tokens;
//! response payloads are the command's return value serialized as JSON
//! by the caller.

mod frame;
mod request;

pub use frame::{recv_frame, send_frame};
pub use request::{Command, Request, DELIMITER, NAMESPACE};
