pub mod game;
pub mod health;
pub mod mapper;
pub mod validation;
