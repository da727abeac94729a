// Markline state managers
// The reconciliation store and the components that write to it: the feed
// listener, the mutation coordinator, and the session that wires them up.

pub mod feed_listener;
pub mod mutation_coordinator;
pub mod reconciliation_store;
pub mod session_manager;
pub mod view_projection;
