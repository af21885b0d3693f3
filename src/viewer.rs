//! Contract between the token provider and an opaque viewer runtime.
//!
//! The runtime itself (rendering, scene graph, extensions) lives outside this crate. What the
//! crate owns is the handshake: a [`TokenSupplier`] the runtime calls whenever it needs a
//! token, the `urn:`-prefixed [`DocumentUrn`] it loads, and the [`ViewerSession`] sequencing
//! that obtains a token before initializing the runtime and then loads the document.

mod session;
mod supplier;
mod urn;

pub use session::*;
pub use supplier::*;
pub use urn::*;
