pub mod fields;
pub mod request;

mod error;

pub use error::{Error, Result};
pub use fields::{Combinator, FilterField, SearchField, SuggestMode, ValueKind};
pub use request::{
	DateRange, FilterValue, Format, Hierarchy, Lens, SearchRequest, SortMode, TrendInterval,
	TrendParams,
};
