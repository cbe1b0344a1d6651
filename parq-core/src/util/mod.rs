pub mod bit_util;
pub mod memory;
