pub mod filters;
pub mod source;

pub use filters::{
    BUSINESS_UNIT_COLUMN, DEV_STATUS_COLUMN, LedgerFilter, PlanningFilter, RESERVE_CATEGORY_COLUMN,
    SCENARIO_COLUMN,
};
pub use source::{
    BUDGET_FILE, LedgerTables, PROPERTY_FILE, USER_FILE, read_frame, read_ledger_dir,
    write_frame, write_ledger_dir,
};
