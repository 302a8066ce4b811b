pub mod deploy;
pub mod destroy;
pub mod diff;
pub mod synth;
pub mod validate;
