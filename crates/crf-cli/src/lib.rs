//! Library components of the CRF visibility command-line front end.

pub mod logging;
pub mod replay;
pub mod script;
