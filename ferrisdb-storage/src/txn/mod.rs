//! Transaction machinery: timestamp allocation, SSI conflict detection, the
//! singular update queue, and the read-only/read-write transaction handles
//! built on top of them.
//!
//! [`Oracle`] hands out begin/commit timestamps and checks reads against
//! recently committed write sets; [`TransactionExecutor`] is the single
//! thread that applies committed [`batch::TimestampedBatch`]es to the
//! workspace in commit-timestamp order; [`WaterMark`] is the ordered
//! completion tracker both of those lean on to know when a timestamp is
//! safe to act on.

mod batch;
mod executor;
mod oracle;
mod transaction;
mod watermark;

pub use batch::{Batch, TimestampedBatch};
pub use executor::TransactionExecutor;
pub use oracle::Oracle;
pub use transaction::{ReadWriteTransaction, ReadonlyTransaction};
pub use watermark::WaterMark;
