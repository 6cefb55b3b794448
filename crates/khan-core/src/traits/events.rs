use crate::events::DomainEvent;

/// Receiver of committed domain events.
///
/// `emit` never blocks and never fails from the caller's point of view.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}
