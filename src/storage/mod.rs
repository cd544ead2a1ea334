pub mod filesystem;
pub mod rekor;
pub mod traits;
