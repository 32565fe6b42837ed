// handlers/public/auth/mod.rs - Session acquisition through the hosted auth provider

pub mod callback;
pub mod login;
pub mod logout;
pub mod magic_link;
pub mod oauth;
pub mod register;

pub use callback::callback;
pub use login::login;
pub use logout::logout;
pub use magic_link::magic_link;
pub use oauth::oauth_start;
pub use register::register;
