//! Value and level encoders. Every scheme lives under [`schemes`] and
//! implements the uniform [`schemes::Encoder`] contract: typed puts, size
//! accounting, and `take_bytes` handing back the encoded stream.

pub mod schemes;
