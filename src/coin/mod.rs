pub mod coin_trait;
pub mod metaverse;
