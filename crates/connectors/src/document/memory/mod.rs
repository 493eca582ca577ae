pub mod adapter;
pub mod expr;
pub mod filter;
pub mod index;
pub mod pipeline;
pub mod projection;
pub mod update;
