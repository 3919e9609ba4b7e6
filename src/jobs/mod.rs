pub mod optimize;
pub mod queue;
pub mod worker;

pub use queue::{ClaimedJob, JobQueue, OptimizeImagePayload, OPTIMIZE_IMAGE_TASK};
