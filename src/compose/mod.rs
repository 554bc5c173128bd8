pub mod composer;
pub mod random;
pub mod rig;
