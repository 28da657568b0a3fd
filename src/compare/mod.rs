pub mod differ;

pub use differ::{
    diff_reports, percentage_change, round2, summarize, DiffEntry, DiffResult, Direction,
};
