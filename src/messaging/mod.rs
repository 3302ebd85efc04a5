pub mod memory_queue;
pub mod sql_queue;
pub mod work_queue;

pub use memory_queue::InMemoryWorkQueue;
pub use sql_queue::PgWorkQueue;
pub use work_queue::{QueueItem, WorkQueue};
