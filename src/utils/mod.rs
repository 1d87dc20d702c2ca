pub mod geo;
pub mod jwt;
pub mod parse;
pub mod text;
