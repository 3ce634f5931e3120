pub mod bulk;
pub mod cluster;
pub mod indices;
pub mod search;

pub use bulk::run_bulk;
pub use cluster::{run_health, run_info};
pub use indices::{run_create_index, run_delete_index};
pub use search::{run_count, run_search, SearchOptions};
