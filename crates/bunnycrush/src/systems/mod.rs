pub mod animation;
pub mod cascade;
pub mod matcher;
