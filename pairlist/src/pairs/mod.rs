//! Pair lists and the helper structures used to store and query them.

mod record;
pub use self::record::{PairRecord, PairRecordView};

mod excluded;
pub use self::excluded::PairExcluded;

mod connections;
pub use self::connections::PairConnections;

mod list;
pub use self::list::{PairList, PairListIter};

mod transforms;
