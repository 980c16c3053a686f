mod model;
mod repository;

pub use model::CurrencyDB;
pub use repository::CurrencyRepository;
