//! Layer decoding, alpha compositing and PNG output.

pub mod composite;
pub mod decode;
pub(crate) mod labels;
pub mod layers;
/// Rendering composed rigs into their image variants.
pub mod rig;
