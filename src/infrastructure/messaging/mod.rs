pub mod background_processor;
pub mod broadcast_hub;
pub mod event_dispatcher;
pub mod mpsc_job_queue;

pub use background_processor::{BackgroundProcessor, DeadLetter, DeadLetterQueue};
pub use broadcast_hub::BroadcastHub;
pub use event_dispatcher::EventDispatcher;
pub use mpsc_job_queue::{MpscJobQueue, MpscJobQueueReceiver};
