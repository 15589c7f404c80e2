pub mod engine;
pub mod exchange;
pub mod export;
pub mod hash;
pub mod io;
pub mod pdml;
pub mod report;
pub mod stats;

pub mod prelude {
    pub use crate::engine::Engine;
    pub use crate::hash::KrbHash;
}
