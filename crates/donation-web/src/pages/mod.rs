//! Page Components

mod home;
mod thanks;

pub use home::HomePage;
pub use thanks::ThanksPage;
