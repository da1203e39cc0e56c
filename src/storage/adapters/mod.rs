pub mod local;
pub mod memory;
pub mod noop;
pub mod redis;
