mod errors;
mod transaction_codec;

pub use errors::DecodeError;
pub use transaction_codec::{decode, decode_at};
