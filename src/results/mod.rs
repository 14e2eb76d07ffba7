mod result_set;
mod row;
mod shaped;

pub use result_set::ResultSet;
pub use row::CustomDbRow;
pub use shaped::{AssocRow, FetchedRow};
