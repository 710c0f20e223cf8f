//! List-management core: query state, filters, table contract, pagination
//! and request fencing, shared by every resource list

pub mod filter;
pub mod matching;
pub mod page;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod slice;
pub mod table;

pub use filter::{ApplyMode, FieldKind, FilterField, FilterPanel, QuickRange};
pub use matching::{Matchable, SEARCH_FIELD, row_matches};
pub use page::{Page, total_pages};
pub use pagination::{PAGE_SIZE_OPTIONS, PageItem, PaginationControl};
pub use query::{DateRange, FilterValue, Filters, ListQuery, SortOrder};
pub use resource::{Resource, ResourceKind, SortKey};
pub use slice::{AsyncState, Phase, RequestId, Slice};
pub use table::{Column, RowAction, SortState, TableView, Tone, click_header, column_at, table_view};
