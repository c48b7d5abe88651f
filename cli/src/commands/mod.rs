pub mod allocate;
pub mod diff;
pub mod fingerprint;
