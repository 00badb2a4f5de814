pub mod catalog;
pub mod export;
pub mod headers;
pub mod report;
pub mod series;
pub mod table;

pub use headers::{resolve, HeaderLabel, ResolvedHeaders, Strategy};
pub use table::BalanceSheet;
