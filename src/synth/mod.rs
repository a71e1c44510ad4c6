// Purpose: voice management and polyphony
// Control side books voices (pool), render side plays them (voice, poly)

pub mod message;
pub mod pool;
pub mod poly;
pub mod timbre;
pub mod voice;
