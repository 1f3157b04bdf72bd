pub mod dates;
pub mod markdown;
pub mod token_cache;
