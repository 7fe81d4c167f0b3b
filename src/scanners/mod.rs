//! The two opportunity scanners: cross-exchange and triangular.

pub mod cross;
pub mod triangular;

pub use cross::CrossScanner;
pub use triangular::TriangularScanner;
