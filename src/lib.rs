// Personal finance dashboard core
// Exposes the expense store, aggregation, import and quote modules for the
// CLI binary and tests

pub mod aggregate;
pub mod budget;
pub mod import;
pub mod model;
pub mod stocks;
pub mod store;

// Re-export commonly used types
pub use aggregate::{by_category, category_pairs, total};
pub use budget::{BudgetBreakdown, BudgetSplit};
pub use import::{import_into, parse_csv, parse_xlsx, ImportError, ImportFormat, ImportSummary};
pub use model::{parse_amount, parse_iso_date, Category, ExpenseRecord, ValidationError};
pub use stocks::{FetchError, PricePoint, PriceProvider, StooqProvider, PORTFOLIO};
pub use store::{AddOutcome, BatchOutcome, ExpenseStore, StoreError, DB_FILE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
