// handlers/mod.rs - two handler tiers
//
// public:    no authentication (/authenticate, /books, /health)
// protected: bearer token required (/users/*)
//
// Each handler extracts its inputs, runs an inner `async fn` returning
// `ApiResult<T>`, and hands that to `Negotiated::respond`.

pub mod protected;
pub mod public;
