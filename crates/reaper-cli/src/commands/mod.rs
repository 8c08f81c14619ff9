pub mod reap;

pub use reap::ReapCommand;
